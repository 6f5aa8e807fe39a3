mod common;

use std::fs;

use assert_matches::assert_matches;

use common::{FakeEntry, FakeUniprot, accession};
use ligmap::annotation::{Annotator, common_terms};
use ligmap::diagnostics::SkipReason;
use ligmap::domain::GoAspect;
use ligmap::error::LigmapError;

fn hemoglobin() -> FakeUniprot {
    let text = fs::read_to_string("tests/fixtures/uniprot_P69905.txt").unwrap();
    let fasta = fs::read_to_string("tests/fixtures/uniprot_P69905.fasta").unwrap();
    FakeUniprot::new().with_record("P69905", &text, &fasta)
}

#[test]
fn names_skip_missing_accessions() {
    let client = hemoglobin()
        .with_record(
            "P68871",
            "ID   HBB_HUMAN\nDE   RecName: Full=Hemoglobin subunit beta;\n",
            "",
        )
        .with("Q99999", FakeEntry::NotFound);
    let accessions = vec![accession("P69905"), accession("Q99999"), accession("P68871")];

    let outcome = Annotator::new(&client).names(&accessions).unwrap();
    assert_eq!(outcome.value.len(), 2);
    assert_eq!(outcome.value[&accession("P69905")], "Hemoglobin subunit alpha");
    assert_eq!(outcome.value[&accession("P68871")], "Hemoglobin subunit beta");
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].item, "Q99999");
    assert_eq!(outcome.warnings[0].reason, SkipReason::AccessionNotFound);
}

#[test]
fn record_without_name_is_reported() {
    let client = FakeUniprot::new().with_record("A0A000", "ID   X\nDE   SubName: Full=Y;\n", "");
    let outcome = Annotator::new(&client)
        .names(&[accession("A0A000")])
        .unwrap();
    assert!(outcome.value.is_empty());
    assert_eq!(outcome.warnings[0].reason, SkipReason::MissingRecordName);
}

#[test]
fn ambiguous_accession_is_skipped() {
    let client = hemoglobin().with("P12345", FakeEntry::Ambiguous);
    let outcome = Annotator::new(&client)
        .go_terms(&[accession("P12345"), accession("P69905")])
        .unwrap();
    assert_eq!(outcome.value.len(), 1);
    assert_eq!(outcome.warnings[0].reason, SkipReason::AccessionAmbiguous);
}

#[test]
fn transport_failure_aborts_the_batch() {
    let client = hemoglobin().with("P12345", FakeEntry::Broken);
    let err = Annotator::new(&client)
        .names(&[accession("P69905"), accession("P12345")])
        .unwrap_err();
    assert_matches!(err, LigmapError::UniprotStatus { status: 503, .. });
}

#[test]
fn go_terms_keep_record_order() {
    let client = hemoglobin();
    let outcome = Annotator::new(&client)
        .go_terms(&[accession("P69905")])
        .unwrap();
    let terms = &outcome.value[&accession("P69905")];

    let codes: Vec<&str> = terms.iter().map(|term| term.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["GO:0072562", "GO:0005833", "GO:0020037", "GO:0005344", "GO:0015671"]
    );
    assert_eq!(terms[2].aspect, Some(GoAspect::MolecularFunction));
    assert_eq!(terms[2].description, "heme binding");
    assert_eq!(terms[4].aspect, Some(GoAspect::BiologicalProcess));
}

#[test]
fn info_returns_every_line() {
    let client = hemoglobin();
    let outcome = Annotator::new(&client).info(&[accession("P69905")]).unwrap();
    let lines = &outcome.value[&accession("P69905")];
    assert_eq!(lines.first().map(String::as_str), Some("ID   HBA_HUMAN               Reviewed;         142 AA."));
    assert_eq!(lines.last().map(String::as_str), Some("//"));
}

#[test]
fn gene_names_keep_input_order_and_repeats() {
    let client = hemoglobin().with_record(
        "P68871",
        "",
        ">sp|P68871|HBB_HUMAN Hemoglobin subunit beta OS=Homo sapiens OX=9606 GN=HBB PE=1 SV=2\nMVHLT\n",
    );
    let accessions = vec![accession("P69905"), accession("P68871"), accession("P69905")];

    let cached = Annotator::new(&client)
        .gene_names(&accessions, true)
        .unwrap();
    let genes: Vec<&str> = cached.value.iter().map(|gene| gene.gene.as_str()).collect();
    assert_eq!(genes, vec!["HBA1", "HBB", "HBA1"]);
    assert_eq!(client.fetches(), vec!["P69905", "P68871"]);

    let uncached = Annotator::new(&client)
        .gene_names(&accessions, false)
        .unwrap();
    assert_eq!(uncached.value, cached.value);
    assert_eq!(client.fetches().len(), 5);
}

#[test]
fn gene_name_without_token_fails() {
    let client = FakeUniprot::new().with_record(
        "P00001",
        "",
        ">sp|P00001|X_HUMAN Uncharacterized protein OS=Homo sapiens\nMAAA\n",
    );
    let err = Annotator::new(&client)
        .gene_names(&[accession("P00001")], true)
        .unwrap_err();
    assert_matches!(err, LigmapError::GeneNameParse(_));
}

#[test]
fn common_go_terms_across_proteins() {
    let client = hemoglobin().with_record(
        "P68871",
        "DR   GO; GO:0005833; C:hemoglobin complex; IDA:UniProtKB.\nDR   GO; GO:0015671; P:oxygen transport; IDA:UniProtKB.\nDR   GO; GO:0042744; P:hydrogen peroxide catabolic process; IDA:UniProtKB.\n",
        "",
    );
    let outcome = Annotator::new(&client)
        .go_terms(&[accession("P69905"), accession("P68871")])
        .unwrap();
    let lists: Vec<Vec<String>> = outcome
        .value
        .values()
        .map(|terms| terms.iter().map(|term| term.code.clone()).collect())
        .collect();
    let common: Vec<String> = common_terms(&lists).into_iter().collect();
    assert_eq!(common, vec!["GO:0005833", "GO:0015671"]);
}
