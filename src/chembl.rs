use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::{ChemblId, StructureQuery};
use crate::error::LigmapError;

pub const DEFAULT_CHEMBL_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

/// Largest id list the service accepts in a single `__in` filter.
pub const CHUNK_SIZE: usize = 50;

const PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Molecule,
    MoleculeForm,
    Activity,
    Target,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Molecule => "molecule",
            Resource::MoleculeForm => "molecule_form",
            Resource::Activity => "activity",
            Resource::Target => "target",
        }
    }

    /// Key of the record array in a paginated response.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Resource::Molecule => "molecules",
            Resource::MoleculeForm => "molecule_forms",
            Resource::Activity => "activities",
            Resource::Target => "targets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Exact(String, String),
    IExact(String, String),
    IStartsWith(String, String),
    In(String, Vec<String>),
}

impl Filter {
    pub fn exact(field: &str, value: impl Into<String>) -> Self {
        Filter::Exact(field.to_string(), value.into())
    }

    pub fn iexact(field: &str, value: impl Into<String>) -> Self {
        Filter::IExact(field.to_string(), value.into())
    }

    pub fn istartswith(field: &str, value: impl Into<String>) -> Self {
        Filter::IStartsWith(field.to_string(), value.into())
    }

    pub fn within<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Filter::In(
            field.to_string(),
            values.into_iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn query_pair(&self) -> (String, String) {
        match self {
            Filter::Exact(field, value) => (field.clone(), value.clone()),
            Filter::IExact(field, value) => (format!("{field}__iexact"), value.clone()),
            Filter::IStartsWith(field, value) => (format!("{field}__istartswith"), value.clone()),
            Filter::In(field, values) => (format!("{field}__in"), values.join(",")),
        }
    }

    /// Evaluates the filter against a top-level field of a record.
    pub fn matches(&self, record: &Value) -> bool {
        let field = match self {
            Filter::Exact(field, _)
            | Filter::IExact(field, _)
            | Filter::IStartsWith(field, _)
            | Filter::In(field, _) => field,
        };
        let Some(actual) = record.get(field).and_then(scalar_text) else {
            return false;
        };
        match self {
            Filter::Exact(_, value) => actual == *value,
            Filter::IExact(_, value) => actual.to_lowercase() == value.to_lowercase(),
            Filter::IStartsWith(_, value) => {
                actual.to_lowercase().starts_with(&value.to_lowercase())
            }
            Filter::In(_, values) => values.iter().any(|value| *value == actual),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub resource: Resource,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }
}

/// Field-filter, free-text and similarity access to the compound database.
///
/// Implementations return every matching record, walking all result pages.
pub trait ChemblClient: Send + Sync {
    fn filter(&self, query: &Query) -> Result<Vec<Value>, LigmapError>;
    fn search(&self, resource: Resource, text: &str) -> Result<Vec<Value>, LigmapError>;
    fn similarity(
        &self,
        query: &StructureQuery,
        threshold: u8,
    ) -> Result<Vec<Value>, LigmapError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeRecord {
    pub molecule_chembl_id: ChemblId,
    #[serde(default)]
    pub pref_name: Option<String>,
    #[serde(default)]
    pub molecule_synonyms: Option<Vec<MoleculeSynonym>>,
}

impl MoleculeRecord {
    pub fn has_synonym(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.molecule_synonyms
            .iter()
            .flatten()
            .any(|syn| syn.molecule_synonym.to_lowercase() == term)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeSynonym {
    pub molecule_synonym: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeFormRecord {
    pub parent_chembl_id: ChemblId,
    pub molecule_chembl_id: ChemblId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRecord {
    pub molecule_chembl_id: ChemblId,
    pub target_chembl_id: ChemblId,
    #[serde(default)]
    pub target_organism: Option<String>,
    #[serde(default)]
    pub standard_value: Value,
    #[serde(default)]
    pub standard_units: Option<String>,
}

impl ActivityRecord {
    /// Numeric potency, if the record carries one.
    pub fn potency(&self) -> Option<f64> {
        numeric(&self.standard_value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetRecord {
    pub target_chembl_id: ChemblId,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_components: Vec<TargetComponent>,
}

impl TargetRecord {
    pub fn is_single_protein(&self) -> bool {
        self.target_type.as_deref() == Some("SINGLE PROTEIN")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetComponent {
    #[serde(default)]
    pub accession: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityRecord {
    pub molecule_chembl_id: ChemblId,
    #[serde(default)]
    pub similarity: Value,
}

impl SimilarityRecord {
    pub fn score(&self) -> Option<f64> {
        numeric(&self.similarity)
    }
}

pub fn decode_records<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, LigmapError> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|err| LigmapError::ChemblDecode(err.to_string()))
        })
        .collect()
}

/// Runs `make_query` once per chunk of `ids` and decodes every returned record.
pub fn fetch_chunked<C, T, F>(
    client: &C,
    ids: &[ChemblId],
    make_query: F,
) -> Result<Vec<T>, LigmapError>
where
    C: ChemblClient + ?Sized,
    T: DeserializeOwned,
    F: Fn(&[ChemblId]) -> Query,
{
    let mut records = Vec::new();
    for (index, chunk) in ids.chunks(CHUNK_SIZE).enumerate() {
        let query = make_query(chunk);
        debug!(
            resource = query.resource.path(),
            chunk = index,
            size = chunk.len(),
            "chembl batch"
        );
        records.extend(decode_records(client.filter(&query)?)?);
    }
    Ok(records)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[derive(Clone)]
pub struct ChemblHttpClient {
    client: Client,
    base_url: Url,
}

impl ChemblHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LigmapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ligmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LigmapError::ChemblHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| LigmapError::ChemblHttp(err.to_string()))?;
        let base_url =
            Url::parse(base_url).map_err(|err| LigmapError::ChemblHttp(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LigmapError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LigmapError::ChemblHttp(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("limit", &PAGE_LIMIT.to_string());
        Ok(url)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, LigmapError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "ChEMBL request failed".to_string());
        Err(LigmapError::ChemblStatus { status, message })
    }

    fn collect_pages(&self, first: Url, key: &str) -> Result<Vec<Value>, LigmapError> {
        let mut records = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            debug!(%url, "chembl request");
            let response = self
                .client
                .get(url.clone())
                .send()
                .map_err(|err| LigmapError::ChemblHttp(err.to_string()))?;
            let response = Self::handle_status(response)?;
            let mut page: Value = response
                .json()
                .map_err(|err| LigmapError::ChemblDecode(err.to_string()))?;
            match page.get_mut(key).map(Value::take) {
                Some(Value::Array(items)) => records.extend(items),
                _ => {
                    return Err(LigmapError::ChemblDecode(format!(
                        "response has no `{key}` array"
                    )));
                }
            }
            next = page
                .get("page_meta")
                .and_then(|meta| meta.get("next"))
                .and_then(Value::as_str)
                .map(|path| url.join(path))
                .transpose()
                .map_err(|err| LigmapError::ChemblDecode(err.to_string()))?;
        }
        Ok(records)
    }
}

impl ChemblClient for ChemblHttpClient {
    fn filter(&self, query: &Query) -> Result<Vec<Value>, LigmapError> {
        let mut url = self.endpoint(&[query.resource.path()])?;
        {
            let mut pairs = url.query_pairs_mut();
            for filter in &query.filters {
                let (key, value) = filter.query_pair();
                pairs.append_pair(&key, &value);
            }
        }
        self.collect_pages(url, query.resource.collection_key())
    }

    fn search(&self, resource: Resource, text: &str) -> Result<Vec<Value>, LigmapError> {
        let mut url = self.endpoint(&[resource.path(), "search"])?;
        url.query_pairs_mut().append_pair("q", text);
        self.collect_pages(url, resource.collection_key())
    }

    fn similarity(
        &self,
        query: &StructureQuery,
        threshold: u8,
    ) -> Result<Vec<Value>, LigmapError> {
        let threshold = threshold.to_string();
        let url = self.endpoint(&["similarity", query.as_str(), &threshold])?;
        self.collect_pages(url, Resource::Molecule.collection_key())
    }
}
