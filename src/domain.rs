use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LigmapError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChemblId(String);

impl ChemblId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChemblId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChemblId {
    type Err = LigmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = normalized
            .strip_prefix("CHEMBL")
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid {
            return Err(LigmapError::InvalidChemblId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for ChemblId {
    type Error = LigmapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChemblId> for String {
    fn from(value: ChemblId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UniprotAccession(String);

impl UniprotAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniprotAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UniprotAccession {
    type Err = LigmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let (base, isoform) = match normalized.split_once('-') {
            Some((base, isoform)) => (base, Some(isoform)),
            None => (normalized.as_str(), None),
        };
        let base_ok = base.len() >= 2
            && base.chars().all(|ch| ch.is_ascii_alphanumeric())
            && base.starts_with(|ch: char| ch.is_ascii_alphabetic());
        let isoform_ok = isoform
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(true);
        if !base_ok || !isoform_ok {
            return Err(LigmapError::InvalidUniprotAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for UniprotAccession {
    type Error = LigmapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UniprotAccession> for String {
    fn from(value: UniprotAccession) -> Self {
        value.0
    }
}

/// Input of a similarity search: a registered compound or a raw SMILES string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureQuery {
    ChemblId(ChemblId),
    Smiles(String),
}

impl StructureQuery {
    pub fn as_str(&self) -> &str {
        match self {
            StructureQuery::ChemblId(id) => id.as_str(),
            StructureQuery::Smiles(smiles) => smiles,
        }
    }
}

impl fmt::Display for StructureQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StructureQuery {
    type Err = LigmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.parse::<ChemblId>() {
            Ok(id) => Ok(StructureQuery::ChemblId(id)),
            Err(_) => Ok(StructureQuery::Smiles(value.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoAspect {
    CellularComponent,
    MolecularFunction,
    BiologicalProcess,
}

impl GoAspect {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(GoAspect::CellularComponent),
            "F" => Some(GoAspect::MolecularFunction),
            "P" => Some(GoAspect::BiologicalProcess),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoTerm {
    pub code: String,
    pub aspect: Option<GoAspect>,
    pub description: String,
}

/// What to do when one molecule form shows up in the families of two input compounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    #[default]
    Fail,
    LastWriteWins,
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapPolicy::Fail => write!(f, "fail"),
            OverlapPolicy::LastWriteWins => write!(f, "last-write-wins"),
        }
    }
}
