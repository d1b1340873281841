mod common;

use assert_matches::assert_matches;

use common::MockEntrez;
use kira_taxon_report::domain::{LengthBounds, SequenceRecord, TaxonId};
use kira_taxon_report::error::KiraError;
use kira_taxon_report::retriever::Retriever;

fn taxon() -> TaxonId {
    "9606".parse().unwrap()
}

#[test]
fn fetch_without_search_makes_no_remote_call() {
    let mock = MockEntrez::with_fixture("three_records.gb", 3);
    let retriever = Retriever::new(&mock);

    let err = retriever.fetch(0, 10).unwrap_err();

    assert_matches!(err, KiraError::NoActiveSession);
    assert!(mock.calls().fetches.is_empty());
    assert_eq!(mock.calls().taxonomy, 0);
}

#[test]
fn search_with_zero_count_keeps_retriever_idle() {
    let mock = MockEntrez::with_fixture("three_records.gb", 0);
    let mut retriever = Retriever::new(&mock);

    let err = retriever
        .search(&taxon(), LengthBounds::default())
        .unwrap_err();

    assert_matches!(
        err,
        KiraError::NoRecords { ref taxon, ref organism }
            if taxon == "9606" && organism == "Homo sapiens"
    );
    assert!(!err.is_remote());
    assert!(retriever.session().is_none());
    assert_matches!(retriever.fetch(0, 10), Err(KiraError::NoActiveSession));
    assert!(mock.calls().fetches.is_empty());
}

#[test]
fn search_uses_organism_term_and_stores_session() {
    let mock = MockEntrez::with_fixture("three_records.gb", 3);
    let mut retriever = Retriever::new(&mock);
    let bounds = LengthBounds::new(150, 300).unwrap();

    let count = retriever.search(&taxon(), bounds).unwrap();

    assert_eq!(count, 3);
    assert_eq!(mock.calls().search_terms, vec!["txid9606[Organism]"]);
    let session = retriever.session().unwrap();
    assert_eq!(session.organism, "Homo sapiens");
    assert_eq!(session.count, 3);
    assert_eq!(session.bounds, bounds);
    assert_eq!(session.history.web_env, "MCID_test");
}

#[test]
fn taxonomy_failure_is_typed_and_skips_search() {
    let mut mock = MockEntrez::with_fixture("three_records.gb", 3);
    mock.organism = None;
    let mut retriever = Retriever::new(&mock);

    let err = retriever
        .search(&taxon(), LengthBounds::default())
        .unwrap_err();

    assert_matches!(err, KiraError::MalformedResponse(_));
    assert!(err.is_remote());
    assert!(mock.calls().search_terms.is_empty());
    assert!(retriever.session().is_none());
}

#[test]
fn fetch_filters_by_inclusive_bounds_in_database_order() {
    let mock = MockEntrez::with_fixture("three_records.gb", 3);
    let mut retriever = Retriever::new(&mock);
    retriever
        .search(&taxon(), LengthBounds::new(150, 300).unwrap())
        .unwrap();

    let records = retriever.fetch(0, 10).unwrap();

    assert_eq!(records, vec![SequenceRecord::new("AB003.1", 200)]);
}

#[test]
fn every_fetched_record_respects_bounds() {
    let mock = MockEntrez::with_fixture("equal_lengths.gb", 4);
    let mut retriever = Retriever::new(&mock);
    let bounds = LengthBounds::new(150, 200).unwrap();
    retriever.search(&taxon(), bounds).unwrap();

    let records = retriever.fetch(0, 10).unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| bounds.contains(record.length)));
    assert_eq!(records[0].accession, "AB010.1");
    assert_eq!(records[1].accession, "AB012.1");
}

#[test]
fn fetch_caps_batch_size_at_500() {
    let mock = MockEntrez::with_fixture("three_records.gb", 1200);
    let mut retriever = Retriever::new(&mock);
    retriever.search(&taxon(), LengthBounds::default()).unwrap();

    retriever.fetch(40, 600).unwrap();

    assert_eq!(mock.calls().fetches, vec![(40, 500)]);
}

#[test]
fn fetch_report_counts_parsed_and_kept() {
    let mock = MockEntrez::with_fixture("three_records.gb", 1200);
    let mut retriever = Retriever::new(&mock);
    retriever
        .search(&taxon(), LengthBounds::new(150, 300).unwrap())
        .unwrap();

    let batch = retriever.fetch_report(0, 600).unwrap();

    assert_eq!(batch.requested, 500);
    assert_eq!(batch.parsed, 3);
    assert_eq!(batch.records, vec![SequenceRecord::new("AB003.1", 200)]);
}

#[test]
fn fetch_failure_is_typed() {
    let mut mock = MockEntrez::with_fixture("three_records.gb", 3);
    mock.fail_fetch = true;
    let mut retriever = Retriever::new(&mock);
    retriever.search(&taxon(), LengthBounds::default()).unwrap();

    let err = retriever.fetch(0, 20).unwrap_err();

    assert_matches!(err, KiraError::NcbiStatus { status: 500, .. });
    assert_eq!(mock.calls().fetches.len(), 1);
}

#[test]
fn failed_search_discards_previous_session() {
    let mock = MockEntrez::with_fixture("three_records.gb", 3);
    let mut retriever = Retriever::new(&mock);
    retriever.search(&taxon(), LengthBounds::default()).unwrap();
    assert!(retriever.session().is_some());

    mock.set_count(0);
    assert!(retriever.search(&taxon(), LengthBounds::default()).is_err());

    assert!(retriever.session().is_none());
    assert_matches!(retriever.fetch(0, 10), Err(KiraError::NoActiveSession));
    assert!(mock.calls().fetches.is_empty());
}
