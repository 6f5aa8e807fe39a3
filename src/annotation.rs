use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::diagnostics::{Outcome, SkipReason, Warnings};
use crate::domain::{GoTerm, UniprotAccession};
use crate::error::LigmapError;
use crate::uniprot::{UniprotClient, parse_gene_name, parse_go_terms, parse_protein_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneName {
    pub accession: UniprotAccession,
    pub gene: String,
}

/// Batch annotation of UniProt accessions.
///
/// Accessions UniProt reports as missing or ambiguous are skipped with a
/// warning. Any other failure aborts the batch.
pub struct Annotator<'a, U: UniprotClient + ?Sized> {
    client: &'a U,
}

impl<'a, U: UniprotClient + ?Sized> Annotator<'a, U> {
    pub fn new(client: &'a U) -> Self {
        Self { client }
    }

    pub fn names<'i, I>(
        &self,
        accessions: I,
    ) -> Result<Outcome<BTreeMap<UniprotAccession, String>>, LigmapError>
    where
        I: IntoIterator<Item = &'i UniprotAccession>,
    {
        let mut warnings = Warnings::default();
        let mut names = BTreeMap::new();
        for accession in accessions {
            let Some(record) = self.record(accession, &mut warnings)? else {
                continue;
            };
            match parse_protein_name(&record) {
                Some(name) => {
                    names.insert(accession.clone(), name);
                }
                None => warnings.push(accession.as_str(), SkipReason::MissingRecordName),
            }
        }
        Ok(warnings.finish(names))
    }

    pub fn go_terms<'i, I>(
        &self,
        accessions: I,
    ) -> Result<Outcome<BTreeMap<UniprotAccession, Vec<GoTerm>>>, LigmapError>
    where
        I: IntoIterator<Item = &'i UniprotAccession>,
    {
        let mut warnings = Warnings::default();
        let mut terms = BTreeMap::new();
        for accession in accessions {
            if let Some(record) = self.record(accession, &mut warnings)? {
                terms.insert(accession.clone(), parse_go_terms(&record));
            }
        }
        Ok(warnings.finish(terms))
    }

    /// The full flat-file record of every accession, one entry per line.
    pub fn info<'i, I>(
        &self,
        accessions: I,
    ) -> Result<Outcome<BTreeMap<UniprotAccession, Vec<String>>>, LigmapError>
    where
        I: IntoIterator<Item = &'i UniprotAccession>,
    {
        let mut warnings = Warnings::default();
        let mut info = BTreeMap::new();
        for accession in accessions {
            if let Some(record) = self.record(accession, &mut warnings)? {
                info.insert(
                    accession.clone(),
                    record.lines().map(str::to_string).collect(),
                );
            }
        }
        Ok(warnings.finish(info))
    }

    /// Gene names in input order, repeats included.
    ///
    /// With `cache` set, an accession seen earlier in the same call is not
    /// fetched again. A FASTA header without a `GN=` token fails the call.
    pub fn gene_names<'i, I>(
        &self,
        accessions: I,
        cache: bool,
    ) -> Result<Outcome<Vec<GeneName>>, LigmapError>
    where
        I: IntoIterator<Item = &'i UniprotAccession>,
    {
        let mut warnings = Warnings::default();
        let mut seen: HashMap<UniprotAccession, String> = HashMap::new();
        let mut genes = Vec::new();
        for accession in accessions {
            let cached = if cache { seen.get(accession).cloned() } else { None };
            let gene = match cached {
                Some(gene) => gene,
                None => {
                    let fetched = self.client.fetch_fasta(accession);
                    let Some(fasta) = skip_absent(fetched, accession, &mut warnings)? else {
                        continue;
                    };
                    let header = fasta.lines().next().unwrap_or_default();
                    let gene = parse_gene_name(header)?;
                    if cache {
                        seen.insert(accession.clone(), gene.clone());
                    }
                    gene
                }
            };
            genes.push(GeneName {
                accession: accession.clone(),
                gene,
            });
        }
        Ok(warnings.finish(genes))
    }

    fn record(
        &self,
        accession: &UniprotAccession,
        warnings: &mut Warnings,
    ) -> Result<Option<String>, LigmapError> {
        skip_absent(self.client.fetch_text(accession), accession, warnings)
    }
}

fn skip_absent(
    fetched: Result<String, LigmapError>,
    accession: &UniprotAccession,
    warnings: &mut Warnings,
) -> Result<Option<String>, LigmapError> {
    match fetched {
        Ok(text) => Ok(Some(text)),
        Err(LigmapError::UniprotNotFound(_)) => {
            warnings.push(accession.as_str(), SkipReason::AccessionNotFound);
            Ok(None)
        }
        Err(LigmapError::UniprotAmbiguous(_)) => {
            warnings.push(accession.as_str(), SkipReason::AccessionAmbiguous);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Items present in every list. An empty input has nothing in common.
pub fn common_terms<T: Ord + Clone>(lists: &[Vec<T>]) -> BTreeSet<T> {
    let Some((first, rest)) = lists.split_first() else {
        return BTreeSet::new();
    };
    let mut common: BTreeSet<T> = first.iter().cloned().collect();
    for list in rest {
        let other: BTreeSet<&T> = list.iter().collect();
        common.retain(|item| other.contains(item));
    }
    common
}
