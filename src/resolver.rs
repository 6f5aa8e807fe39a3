use std::collections::BTreeMap;

use crate::chembl::{ChemblClient, Filter, MoleculeRecord, Query, Resource, decode_records};
use crate::diagnostics::{Outcome, SkipReason, Warnings};
use crate::domain::ChemblId;
use crate::error::LigmapError;

/// Turns free-text compound names into ChEMBL ids.
pub struct Resolver<'a, C: ChemblClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ChemblClient + ?Sized> Resolver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolves every name; names without any match are left out of the map.
    pub fn resolve<I, S>(&self, names: I) -> Result<Outcome<BTreeMap<String, ChemblId>>, LigmapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut warnings = Warnings::default();
        let mut ids = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            if let Some(id) = self.resolve_name(name, &mut warnings)? {
                ids.insert(name.to_string(), id);
            }
        }
        Ok(warnings.finish(ids))
    }

    pub fn resolve_one(&self, name: &str) -> Result<Outcome<BTreeMap<String, ChemblId>>, LigmapError> {
        self.resolve([name])
    }

    fn resolve_name(
        &self,
        name: &str,
        warnings: &mut Warnings,
    ) -> Result<Option<ChemblId>, LigmapError> {
        let query = Query::new(Resource::Molecule).filter(Filter::iexact("pref_name", name));
        let mut matches: Vec<MoleculeRecord> = decode_records(self.client.filter(&query)?)?;

        if matches.is_empty() {
            warnings.push(name, SkipReason::NoExactMatch);
            let candidates: Vec<MoleculeRecord> =
                decode_records(self.client.search(Resource::Molecule, name)?)?;
            matches = candidates
                .into_iter()
                .filter(|candidate| candidate.has_synonym(name))
                .collect();
            if matches.is_empty() {
                warnings.push(name, SkipReason::NoMatch);
                return Ok(None);
            }
        }

        if matches.len() > 1 {
            warnings.push(
                name,
                SkipReason::MultipleMatches {
                    count: matches.len(),
                },
            );
        }
        Ok(matches.into_iter().next().map(|record| record.molecule_chembl_id))
    }
}
