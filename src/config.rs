use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::chembl::DEFAULT_CHEMBL_URL;
use crate::domain::OverlapPolicy;
use crate::error::LigmapError;
use crate::similarity::DEFAULT_SIMILARITY;
use crate::targets::{DEFAULT_ORGANISM, MappingOptions};
use crate::uniprot::DEFAULT_UNIPROT_URL;

pub const CONFIG_FILE: &str = "ligmap.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub chembl_url: Option<String>,
    #[serde(default)]
    pub uniprot_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub potency_threshold: Option<f64>,
    #[serde(default)]
    pub similarity: Option<u8>,
    #[serde(default)]
    pub drop_empty: Option<bool>,
    #[serde(default)]
    pub overlap: Option<OverlapPolicy>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub chembl_url: String,
    pub uniprot_url: String,
    pub timeout: Duration,
    pub similarity: u8,
    pub mapping: MappingOptions,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` if given, otherwise the first of `./ligmap.json` and the
    /// per-user config file that exists. With neither present the defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LigmapError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };
        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| LigmapError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LigmapError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path.display(), "loaded config");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, LigmapError> {
        let similarity = config.similarity.unwrap_or(DEFAULT_SIMILARITY);
        if similarity > 100 {
            return Err(LigmapError::InvalidSimilarity(similarity));
        }
        if let Some(threshold) = config.potency_threshold {
            if threshold.is_nan() {
                return Err(LigmapError::ConfigParse(
                    "potency_threshold must be a number".to_string(),
                ));
            }
        }

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            chembl_url: config
                .chembl_url
                .unwrap_or_else(|| DEFAULT_CHEMBL_URL.to_string()),
            uniprot_url: config
                .uniprot_url
                .unwrap_or_else(|| DEFAULT_UNIPROT_URL.to_string()),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            similarity,
            mapping: MappingOptions {
                organism: config
                    .organism
                    .unwrap_or_else(|| DEFAULT_ORGANISM.to_string()),
                potency_threshold: config.potency_threshold,
                drop_empty: config.drop_empty.unwrap_or(false),
                overlap: config.overlap.unwrap_or_default(),
            },
        })
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "ligmap")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .filter(|path| path.exists())
    }
}
