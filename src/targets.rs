//! Compound to protein-target mapping.
//!
//! The mapping runs in four batched stages:
//!
//! 1. form closure: every input compound is expanded to its salt/parent family,
//!    querying the parent and the child direction separately;
//! 2. reverse index: each discovered form points back to its input compound;
//! 3. activity filter: activities of all forms, restricted to one organism,
//!    nanomolar units and a strict potency threshold, yield target ids;
//! 4. accession projection: single-protein targets contribute their UniProt
//!    accessions, every other target type contributes nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::chembl::{
    ActivityRecord, ChemblClient, Filter, MoleculeFormRecord, Query, Resource, TargetRecord,
    fetch_chunked,
};
use crate::diagnostics::{Outcome, SkipReason, Warnings};
use crate::domain::{ChemblId, OverlapPolicy, UniprotAccession};
use crate::error::LigmapError;

pub const DEFAULT_ORGANISM: &str = "Homo sapiens";
pub const NANOMOLAR: &str = "nM";

pub type FormFamilies = BTreeMap<ChemblId, BTreeSet<ChemblId>>;
pub type TargetMap = BTreeMap<ChemblId, BTreeSet<UniprotAccession>>;

#[derive(Debug, Clone)]
pub struct MappingOptions {
    /// Matched as a case-insensitive prefix of the target organism.
    pub organism: String,
    /// Upper bound in nM, exclusive. `None` keeps every numeric value.
    pub potency_threshold: Option<f64>,
    pub drop_empty: bool,
    pub overlap: OverlapPolicy,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            organism: DEFAULT_ORGANISM.to_string(),
            potency_threshold: None,
            drop_empty: false,
            overlap: OverlapPolicy::Fail,
        }
    }
}

/// Maps every discovered molecule form to the input compound owning it.
#[derive(Debug, Clone, Default)]
pub struct FormIndex {
    owners: BTreeMap<ChemblId, ChemblId>,
}

impl FormIndex {
    /// Inverts the families in input order. A form claimed by two compounds is
    /// an error under `OverlapPolicy::Fail` and goes to the later compound otherwise.
    pub fn build(
        compounds: &[ChemblId],
        families: &FormFamilies,
        policy: OverlapPolicy,
        warnings: &mut Warnings,
    ) -> Result<Self, LigmapError> {
        let mut owners = BTreeMap::new();
        for compound in compounds {
            let Some(family) = families.get(compound) else {
                continue;
            };
            for form in family {
                let Some(previous) = owners.insert(form.clone(), compound.clone()) else {
                    continue;
                };
                match policy {
                    OverlapPolicy::Fail => {
                        return Err(LigmapError::OverlappingFormFamily {
                            form: form.to_string(),
                            first: previous.to_string(),
                            second: compound.to_string(),
                        });
                    }
                    OverlapPolicy::LastWriteWins => warnings.push(
                        form.as_str(),
                        SkipReason::OverlappingFamily {
                            replaced: previous.to_string(),
                        },
                    ),
                }
            }
        }
        Ok(Self { owners })
    }

    pub fn owner(&self, form: &ChemblId) -> Option<&ChemblId> {
        self.owners.get(form)
    }

    pub fn forms(&self) -> Vec<ChemblId> {
        self.owners.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Strictly below the threshold and reported in nanomolar.
pub fn activity_passes(record: &ActivityRecord, threshold: f64) -> bool {
    let Some(value) = record.potency() else {
        return false;
    };
    value < threshold && record.standard_units.as_deref() == Some(NANOMOLAR)
}

pub struct TargetMapper<'a, C: ChemblClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ChemblClient + ?Sized> TargetMapper<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn map_targets(
        &self,
        compound_ids: &[ChemblId],
        options: &MappingOptions,
    ) -> Result<Outcome<TargetMap>, LigmapError> {
        let mut warnings = Warnings::default();
        let compounds = unique_in_order(compound_ids);

        let families = self.form_families(&compounds)?;
        let index = FormIndex::build(&compounds, &families, options.overlap, &mut warnings)?;
        debug!(
            compounds = compounds.len(),
            forms = index.len(),
            "form closure complete"
        );

        let compound_targets = self.qualifying_targets(&index, options)?;
        let target_ids = compound_targets
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let accessions = self.single_protein_accessions(&target_ids)?;

        let mut mapping = TargetMap::new();
        for compound in &compounds {
            let targets = compound_targets.get(compound);
            let projected: BTreeSet<UniprotAccession> = targets
                .into_iter()
                .flatten()
                .filter_map(|target| accessions.get(target))
                .flatten()
                .cloned()
                .collect();
            if projected.is_empty() {
                let reason = if families.get(compound).is_none_or(BTreeSet::is_empty) {
                    SkipReason::NoFormFamily
                } else if targets.is_none_or(BTreeSet::is_empty) {
                    SkipReason::NoQualifyingActivity
                } else {
                    SkipReason::NoSingleProteinTarget
                };
                warnings.push(compound.as_str(), reason);
            }
            mapping.insert(compound.clone(), projected);
        }

        if options.drop_empty {
            mapping.retain(|_, accessions| !accessions.is_empty());
        }
        Ok(warnings.finish(mapping))
    }

    /// Collects the molecule-form family of every compound.
    ///
    /// Neither direction of the form relation is complete on its own, so the
    /// children of each compound and the parent recorded against each compound
    /// are queried separately and unioned.
    pub fn form_families(&self, compounds: &[ChemblId]) -> Result<FormFamilies, LigmapError> {
        let mut families: FormFamilies = compounds
            .iter()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();

        let children: Vec<MoleculeFormRecord> = fetch_chunked(self.client, compounds, |chunk| {
            Query::new(Resource::MoleculeForm).filter(Filter::within("parent_chembl_id", chunk))
        })?;
        for form in children {
            match families.get_mut(&form.parent_chembl_id) {
                Some(family) => {
                    family.insert(form.molecule_chembl_id);
                }
                None => debug!(parent = %form.parent_chembl_id, "form for unrequested parent"),
            }
        }

        let parents: Vec<MoleculeFormRecord> = fetch_chunked(self.client, compounds, |chunk| {
            Query::new(Resource::MoleculeForm).filter(Filter::within("molecule_chembl_id", chunk))
        })?;
        for form in parents {
            match families.get_mut(&form.molecule_chembl_id) {
                Some(family) => {
                    family.insert(form.parent_chembl_id);
                }
                None => debug!(molecule = %form.molecule_chembl_id, "form for unrequested molecule"),
            }
        }

        Ok(families)
    }

    fn qualifying_targets(
        &self,
        index: &FormIndex,
        options: &MappingOptions,
    ) -> Result<BTreeMap<ChemblId, BTreeSet<ChemblId>>, LigmapError> {
        let threshold = options.potency_threshold.unwrap_or(f64::INFINITY);
        let forms = index.forms();
        let activities: Vec<ActivityRecord> = fetch_chunked(self.client, &forms, |chunk| {
            Query::new(Resource::Activity)
                .filter(Filter::within("molecule_chembl_id", chunk))
                .filter(Filter::istartswith("target_organism", options.organism.as_str()))
        })?;

        let mut targets: BTreeMap<ChemblId, BTreeSet<ChemblId>> = BTreeMap::new();
        for activity in activities {
            if activity.potency().is_none() {
                debug!(
                    molecule = %activity.molecule_chembl_id,
                    target_id = %activity.target_chembl_id,
                    "activity without a numeric standard value"
                );
                continue;
            }
            if !activity_passes(&activity, threshold) {
                continue;
            }
            match index.owner(&activity.molecule_chembl_id) {
                Some(owner) => {
                    targets
                        .entry(owner.clone())
                        .or_default()
                        .insert(activity.target_chembl_id);
                }
                None => debug!(molecule = %activity.molecule_chembl_id, "activity for unknown form"),
            }
        }
        Ok(targets)
    }

    fn single_protein_accessions(
        &self,
        target_ids: &[ChemblId],
    ) -> Result<BTreeMap<ChemblId, BTreeSet<UniprotAccession>>, LigmapError> {
        let records: Vec<TargetRecord> = fetch_chunked(self.client, target_ids, |chunk| {
            Query::new(Resource::Target).filter(Filter::within("target_chembl_id", chunk))
        })?;

        let mut accessions: BTreeMap<ChemblId, BTreeSet<UniprotAccession>> = BTreeMap::new();
        for target in records {
            if !target.is_single_protein() {
                debug!(target_id = %target.target_chembl_id, kind = ?target.target_type, "not a single protein");
                continue;
            }
            let entry = accessions.entry(target.target_chembl_id).or_default();
            for component in target.target_components {
                let Some(raw) = component.accession else {
                    continue;
                };
                match raw.parse::<UniprotAccession>() {
                    Ok(accession) => {
                        entry.insert(accession);
                    }
                    Err(err) => debug!(%err, "skipping target component"),
                }
            }
        }
        Ok(accessions)
    }
}

fn unique_in_order(ids: &[ChemblId]) -> Vec<ChemblId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
