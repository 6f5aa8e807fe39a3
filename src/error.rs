use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LigmapError {
    #[error("invalid ChEMBL id: {0}")]
    InvalidChemblId(String),

    #[error("invalid UniProt accession: {0}")]
    InvalidUniprotAccession(String),

    #[error("similarity threshold must be between 0 and 100, got {0}")]
    InvalidSimilarity(u8),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("ChEMBL request failed: {0}")]
    ChemblHttp(String),

    #[error("ChEMBL returned status {status}: {message}")]
    ChemblStatus { status: u16, message: String },

    #[error("unexpected ChEMBL payload: {0}")]
    ChemblDecode(String),

    #[error("molecule form {form} belongs to both {first} and {second}")]
    #[diagnostic(help("pass --overlap last-write-wins to keep the later compound"))]
    OverlappingFormFamily {
        form: String,
        first: String,
        second: String,
    },

    #[error("uniprot request failed: {0}")]
    UniprotHttp(String),

    #[error("uniprot returned status {status}: {message}")]
    UniprotStatus { status: u16, message: String },

    #[error("uniprot entry not found: {0}")]
    UniprotNotFound(String),

    #[error("uniprot accession is ambiguous: {0}")]
    UniprotAmbiguous(String),

    #[error("could not parse gene name from FASTA header: {0}")]
    GeneNameParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
