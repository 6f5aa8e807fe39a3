use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::chembl::{ChemblClient, SimilarityRecord, decode_records};
use crate::domain::{ChemblId, StructureQuery};
use crate::error::LigmapError;

pub const DEFAULT_SIMILARITY: u8 = 90;

#[derive(Debug, Clone, Copy)]
pub struct SimilarityOptions {
    /// Minimum percentage similarity, 0 to 100.
    pub threshold: u8,
    pub with_scores: bool,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY,
            with_scores: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub chembl_id: ChemblId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// Structural similarity search over ChEMBL ids or SMILES strings.
///
/// Matches keep the order the service returned them in. That order often looks
/// like descending similarity but is not guaranteed to be.
pub struct SimilarityExpander<'a, C: ChemblClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ChemblClient + ?Sized> SimilarityExpander<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn expand<'q, I>(
        &self,
        queries: I,
        options: SimilarityOptions,
    ) -> Result<BTreeMap<String, Vec<SimilarMatch>>, LigmapError>
    where
        I: IntoIterator<Item = &'q StructureQuery>,
    {
        if options.threshold > 100 {
            return Err(LigmapError::InvalidSimilarity(options.threshold));
        }
        let mut expanded = BTreeMap::new();
        for query in queries {
            let matches = self.expand_one(query, options)?;
            expanded.insert(query.to_string(), matches);
        }
        Ok(expanded)
    }

    fn expand_one(
        &self,
        query: &StructureQuery,
        options: SimilarityOptions,
    ) -> Result<Vec<SimilarMatch>, LigmapError> {
        let records: Vec<SimilarityRecord> =
            decode_records(self.client.similarity(query, options.threshold)?)?;
        let mut matches = Vec::with_capacity(records.len());
        for record in records {
            if let StructureQuery::ChemblId(own) = query {
                if record.molecule_chembl_id == *own {
                    debug!(query = %own, "dropping self match");
                    continue;
                }
            }
            let similarity = if options.with_scores {
                let score = record.score().ok_or_else(|| {
                    LigmapError::ChemblDecode(format!(
                        "similarity record {} has no numeric score",
                        record.molecule_chembl_id
                    ))
                })?;
                Some(score)
            } else {
                None
            };
            matches.push(SimilarMatch {
                chembl_id: record.molecule_chembl_id,
                similarity,
            });
        }
        Ok(matches)
    }
}
