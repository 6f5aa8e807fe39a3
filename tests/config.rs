use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use tempfile::tempdir;

use ligmap::config::ConfigLoader;
use ligmap::domain::OverlapPolicy;
use ligmap::error::LigmapError;

#[test]
fn explicit_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ligmap.json");
    fs::write(
        &path,
        r#"{
            "chembl_url": "http://localhost:8080/chembl/api/data",
            "timeout_secs": 5,
            "organism": "Mus musculus",
            "potency_threshold": 1000,
            "similarity": 70,
            "overlap": "last-write-wins"
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.chembl_url, "http://localhost:8080/chembl/api/data");
    assert_eq!(resolved.timeout, Duration::from_secs(5));
    assert_eq!(resolved.similarity, 70);
    assert_eq!(resolved.mapping.organism, "Mus musculus");
    assert_eq!(resolved.mapping.potency_threshold, Some(1000.0));
    assert_eq!(resolved.mapping.overlap, OverlapPolicy::LastWriteWins);
    assert!(!resolved.mapping.drop_empty);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, LigmapError::ConfigRead(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ligmap.json");
    fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, LigmapError::ConfigParse(_));
}

#[test]
fn out_of_range_similarity_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ligmap.json");
    fs::write(&path, r#"{"similarity": 150}"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, LigmapError::InvalidSimilarity(150));
}
