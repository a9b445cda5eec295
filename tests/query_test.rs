use gridtune::metrics::extract_metrics;
use gridtune::query::{parse_query, run_query, Comparator};
use gridtune::store::ResultsStore;
use gridtune::sweep::Scalar;
use gridtune::SweepError;

fn seeded_store(dir: &tempfile::TempDir) -> ResultsStore {
    let store = ResultsStore::new(dir.path().join("results.csv"));
    let runs = [(1usize, 10i64, 0.8), (2, 20, 0.95)];
    let mut clear = true;
    for (id, n, accuracy) in runs {
        let combo = vec![("n_estimators".to_string(), Scalar::Int(n))];
        let metrics = extract_metrics(&format!("Accuracy: {}\n", accuracy));
        store.append(id, &combo, &metrics, clear).expect("append ok");
        clear = false;
    }
    store
}

#[test]
fn parses_clauses_out_of_free_text() {
    let clauses = parse_query("show me accuracy>=0.9 and loss < 0.2 please");
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0].name, "accuracy");
    assert_eq!(clauses[0].comparator, Comparator::Ge);
    assert_eq!(clauses[0].threshold, 0.9);
    assert_eq!(clauses[1].name, "loss");
    assert_eq!(clauses[1].comparator, Comparator::Lt);
}

#[test]
fn filters_rows_by_comparison() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let matches = run_query(&store, "accuracy>=0.9").expect("query ok");
    assert_eq!(matches, vec!["n_estimators: 20"]);
}

#[test]
fn clauses_are_anded() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let matches = run_query(&store, "accuracy>=0.5 accuracy<=0.9").expect("query ok");
    assert_eq!(matches, vec!["n_estimators: 10"]);
}

#[test]
fn empty_match_set_is_not_an_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let matches = run_query(&store, "accuracy>=0.99").expect("query ok");
    assert!(matches.is_empty());
}

#[test]
fn equals_comparator_matches_exact_values() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let matches = run_query(&store, "accuracy=0.8").expect("query ok");
    assert_eq!(matches, vec!["n_estimators: 10"]);
}

#[test]
fn unknown_column_is_a_query_error_naming_the_column() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let err = run_query(&store, "precision>=0.9").expect_err("should fail");
    match err {
        SweepError::Query(message) => assert!(message.contains("precision")),
        other => panic!("expected query error, got {other:?}"),
    }
}

#[test]
fn clause_free_text_is_a_query_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = seeded_store(&dir);
    let err = run_query(&store, "tell me everything").expect_err("should fail");
    assert!(matches!(err, SweepError::Query(_)));
}

#[test]
fn uncoercible_cell_is_a_query_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = ResultsStore::new(dir.path().join("results.csv"));
    std::fs::write(
        store.path(),
        "ID,Input Parameters,accuracy\n1,n: 10,not-a-number\n",
    )
    .expect("write ok");
    let err = run_query(&store, "accuracy>=0.5").expect_err("should fail");
    assert!(matches!(err, SweepError::Query(_)));
}
