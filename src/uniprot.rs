use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{GoAspect, GoTerm, UniprotAccession};
use crate::error::LigmapError;

pub const DEFAULT_UNIPROT_URL: &str = "https://rest.uniprot.org/uniprotkb";

const RECORD_NAME_PREFIX: &str = "DE   RecName:";
const GO_XREF_PREFIX: &str = "DR   GO;";

/// Raw access to UniProtKB entries.
///
/// Absent entries surface as `UniprotNotFound` and ambiguous accessions as
/// `UniprotAmbiguous`; every other failure is a transport error.
pub trait UniprotClient: Send + Sync {
    fn fetch_text(&self, accession: &UniprotAccession) -> Result<String, LigmapError>;
    fn fetch_fasta(&self, accession: &UniprotAccession) -> Result<String, LigmapError>;
}

#[derive(Clone)]
pub struct UniprotHttpClient {
    client: Client,
    base_url: String,
}

impl UniprotHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LigmapError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ligmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LigmapError::UniprotHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| LigmapError::UniprotHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn text_url(&self, accession: &UniprotAccession) -> String {
        format!("{}/{}.txt", self.base_url, accession.as_str())
    }

    pub fn fasta_url(&self, accession: &UniprotAccession) -> String {
        format!("{}/{}.fasta", self.base_url, accession.as_str())
    }

    fn get_text(&self, url: &str, accession: &UniprotAccession) -> Result<String, LigmapError> {
        tracing::debug!(url, "uniprot request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| LigmapError::UniprotHttp(err.to_string()))?;
        let response = Self::handle_status(response, accession)?;
        response
            .text()
            .map_err(|err| LigmapError::UniprotHttp(err.to_string()))
    }

    fn handle_status(
        response: reqwest::blocking::Response,
        accession: &UniprotAccession,
    ) -> Result<reqwest::blocking::Response, LigmapError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(LigmapError::UniprotNotFound(accession.to_string())),
            StatusCode::MULTIPLE_CHOICES => {
                Err(LigmapError::UniprotAmbiguous(accession.to_string()))
            }
            status => {
                let message = response
                    .text()
                    .unwrap_or_else(|_| "UniProt request failed".to_string());
                Err(LigmapError::UniprotStatus {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl UniprotClient for UniprotHttpClient {
    fn fetch_text(&self, accession: &UniprotAccession) -> Result<String, LigmapError> {
        self.get_text(&self.text_url(accession), accession)
    }

    fn fetch_fasta(&self, accession: &UniprotAccession) -> Result<String, LigmapError> {
        self.get_text(&self.fasta_url(accession), accession)
    }
}

/// Recommended full name from the first `RecName` line of a flat-file record.
///
/// Later name lines are ignored; the primary name always comes first.
pub fn parse_protein_name(record: &str) -> Option<String> {
    let line = record
        .lines()
        .find(|line| line.starts_with(RECORD_NAME_PREFIX))?;
    let (_, value) = line.split_once("Full=")?;
    let value = value.split(';').next().unwrap_or(value);
    let value = match value.find(" {") {
        Some(evidence) => &value[..evidence],
        None => value,
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// GO cross-references in the order they appear in the record.
///
/// A line looks like `DR   GO; GO:0005829; C:cytosol; IDA:UniProtKB.`
pub fn parse_go_terms(record: &str) -> Vec<GoTerm> {
    record
        .lines()
        .filter(|line| line.starts_with(GO_XREF_PREFIX))
        .filter_map(|line| {
            let mut fields = line.split(';').skip(1).map(str::trim);
            let code = fields.next()?;
            let term = fields.next()?;
            let (aspect, description) = match term.split_once(':') {
                Some((aspect, description)) => (GoAspect::from_code(aspect), description),
                None => (None, term),
            };
            Some(GoTerm {
                code: code.to_string(),
                aspect,
                description: description.to_string(),
            })
        })
        .collect()
}

/// Gene name from a FASTA header: the `GN=` token up to the next `;` or whitespace.
pub fn parse_gene_name(header: &str) -> Result<String, LigmapError> {
    static GENE_NAME: OnceLock<Regex> = OnceLock::new();
    let regex = GENE_NAME.get_or_init(|| Regex::new(r"GN=([^;\s]+)").unwrap());
    regex
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LigmapError::GeneNameParse(header.trim().to_string()))
}
