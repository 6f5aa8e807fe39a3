use std::fmt;

use serde::Serialize;

/// Why an input item was skipped, or resolved with a caveat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    NoExactMatch,
    NoMatch,
    MultipleMatches { count: usize },
    NoFormFamily,
    NoQualifyingActivity,
    NoSingleProteinTarget,
    OverlappingFamily { replaced: String },
    AccessionNotFound,
    AccessionAmbiguous,
    MissingRecordName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoExactMatch => write!(f, "no exact match, trying a synonym search"),
            SkipReason::NoMatch => write!(f, "no match found, skipping"),
            SkipReason::MultipleMatches { count } => {
                write!(f, "found {count} matches, picking the first one")
            }
            SkipReason::NoFormFamily => write!(f, "no molecule forms found"),
            SkipReason::NoQualifyingActivity => {
                write!(f, "no activity passed the organism, unit and potency filters")
            }
            SkipReason::NoSingleProteinTarget => write!(f, "no single-protein target"),
            SkipReason::OverlappingFamily { replaced } => {
                write!(f, "molecule form also belongs to {replaced}, keeping the later compound")
            }
            SkipReason::AccessionNotFound => write!(f, "entry not found on uniprot (status 404)"),
            SkipReason::AccessionAmbiguous => {
                write!(f, "accession is ambiguous on uniprot (status 300)")
            }
            SkipReason::MissingRecordName => write!(f, "record has no RecName line"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub item: String,
    pub reason: SkipReason,
}

impl Warning {
    pub fn new(item: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            item: item.into(),
            reason,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

/// A best-effort result together with the items that were skipped on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Collects warnings while a batch runs and mirrors each one to the log.
#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, item: impl Into<String>, reason: SkipReason) {
        let warning = Warning::new(item, reason);
        tracing::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome {
            value,
            warnings: self.0,
        }
    }
}
