#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use ligmap::chembl::{ChemblClient, Filter, Query, Resource};
use ligmap::domain::{ChemblId, StructureQuery, UniprotAccession};
use ligmap::error::LigmapError;
use ligmap::uniprot::UniprotClient;

/// In-memory compound database evaluating filters the way the service does.
#[derive(Default)]
pub struct FakeChembl {
    records: HashMap<Resource, Vec<Value>>,
    search_hits: HashMap<String, Vec<Value>>,
    similar: HashMap<String, Vec<Value>>,
    calls: Mutex<Vec<Query>>,
}

impl FakeChembl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: Resource, record: Value) -> Self {
        self.records.entry(resource).or_default().push(record);
        self
    }

    pub fn with_form(self, parent: &str, molecule: &str) -> Self {
        self.with(
            Resource::MoleculeForm,
            json!({"parent_chembl_id": parent, "molecule_chembl_id": molecule}),
        )
    }

    pub fn with_activity(self, molecule: &str, target: &str, value: Value, units: &str) -> Self {
        self.with(
            Resource::Activity,
            json!({
                "molecule_chembl_id": molecule,
                "target_chembl_id": target,
                "target_organism": "Homo sapiens",
                "standard_value": value,
                "standard_units": units
            }),
        )
    }

    pub fn with_target(self, target: &str, kind: &str, accessions: &[&str]) -> Self {
        let components: Vec<Value> = accessions
            .iter()
            .map(|accession| json!({"accession": accession}))
            .collect();
        self.with(
            Resource::Target,
            json!({
                "target_chembl_id": target,
                "target_type": kind,
                "target_components": components
            }),
        )
    }

    pub fn with_search(mut self, text: &str, record: Value) -> Self {
        self.search_hits
            .entry(text.to_lowercase())
            .or_default()
            .push(record);
        self
    }

    pub fn with_similar(mut self, query: &str, chembl_id: &str, similarity: &str) -> Self {
        self.similar
            .entry(query.to_string())
            .or_default()
            .push(json!({"molecule_chembl_id": chembl_id, "similarity": similarity}));
        self
    }

    pub fn calls(&self) -> Vec<Query> {
        self.calls.lock().unwrap().clone()
    }

    /// Values of the `__in` filter on `field`, concatenated over all calls.
    pub fn requested_ids(&self, resource: Resource, field: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|query| query.resource == resource)
            .flat_map(|query| query.filters)
            .filter_map(|filter| match filter {
                Filter::In(name, values) if name == field => Some(values),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn call_count(&self, resource: Resource) -> usize {
        self.calls()
            .iter()
            .filter(|query| query.resource == resource)
            .count()
    }
}

impl ChemblClient for FakeChembl {
    fn filter(&self, query: &Query) -> Result<Vec<Value>, LigmapError> {
        self.calls.lock().unwrap().push(query.clone());
        Ok(self
            .records
            .get(&query.resource)
            .into_iter()
            .flatten()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    fn search(&self, _resource: Resource, text: &str) -> Result<Vec<Value>, LigmapError> {
        Ok(self
            .search_hits
            .get(&text.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    fn similarity(
        &self,
        query: &StructureQuery,
        _threshold: u8,
    ) -> Result<Vec<Value>, LigmapError> {
        Ok(self.similar.get(query.as_str()).cloned().unwrap_or_default())
    }
}

pub enum FakeEntry {
    Found { text: String, fasta: String },
    NotFound,
    Ambiguous,
    Broken,
}

#[derive(Default)]
pub struct FakeUniprot {
    entries: HashMap<String, FakeEntry>,
    fetches: Mutex<Vec<String>>,
}

impl FakeUniprot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, accession: &str, entry: FakeEntry) -> Self {
        self.entries.insert(accession.to_string(), entry);
        self
    }

    pub fn with_record(self, accession: &str, text: &str, fasta: &str) -> Self {
        self.with(
            accession,
            FakeEntry::Found {
                text: text.to_string(),
                fasta: fasta.to_string(),
            },
        )
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn lookup(&self, accession: &UniprotAccession, fasta: bool) -> Result<String, LigmapError> {
        self.fetches.lock().unwrap().push(accession.to_string());
        match self.entries.get(accession.as_str()) {
            Some(FakeEntry::Found { text, fasta: seq }) => {
                Ok(if fasta { seq.clone() } else { text.clone() })
            }
            Some(FakeEntry::Ambiguous) => Err(LigmapError::UniprotAmbiguous(accession.to_string())),
            Some(FakeEntry::Broken) => Err(LigmapError::UniprotStatus {
                status: 503,
                message: "service unavailable".to_string(),
            }),
            Some(FakeEntry::NotFound) | None => {
                Err(LigmapError::UniprotNotFound(accession.to_string()))
            }
        }
    }
}

impl UniprotClient for FakeUniprot {
    fn fetch_text(&self, accession: &UniprotAccession) -> Result<String, LigmapError> {
        self.lookup(accession, false)
    }

    fn fetch_fasta(&self, accession: &UniprotAccession) -> Result<String, LigmapError> {
        self.lookup(accession, true)
    }
}

pub fn chembl_id(value: &str) -> ChemblId {
    value.parse().unwrap()
}

pub fn accession(value: &str) -> UniprotAccession {
    value.parse().unwrap()
}

pub fn chembl_ids(range: std::ops::RangeInclusive<usize>) -> Vec<ChemblId> {
    range.map(|n| chembl_id(&format!("CHEMBL{n}"))).collect()
}
