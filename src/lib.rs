pub mod annotation;
pub mod chembl;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod output;
pub mod resolver;
pub mod similarity;
pub mod targets;
pub mod uniprot;
