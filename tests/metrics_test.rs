use gridtune::metrics::extract_metrics;

#[test]
fn extracts_key_value_lines() {
    let out = extract_metrics("Accuracy: 0.95\nLoss: 0.1234 extra text\n");
    let entries: Vec<_> = out.iter().collect();
    assert_eq!(entries, vec![("accuracy", 0.95), ("loss", 0.1234)]);
}

#[test]
fn skips_lines_without_colon() {
    let out = extract_metrics("no colon here\n");
    assert!(out.is_empty());
}

#[test]
fn skips_lines_without_numeric_token() {
    let out = extract_metrics("Note: see section\n");
    assert!(out.is_empty());
}

#[test]
fn splits_at_first_colon_only() {
    let out = extract_metrics("time: 12:30\n");
    assert_eq!(out.get("time"), Some(12.0));
}

#[test]
fn keys_are_lowercased_and_trimmed() {
    let out = extract_metrics("  F1 Score : 0.5\n");
    assert_eq!(out.get("f1 score"), Some(0.5));
}

#[test]
fn later_value_overwrites_but_keeps_first_seen_order() {
    let out = extract_metrics("a: 1\nb: 2\na: 3\n");
    let entries: Vec<_> = out.iter().collect();
    assert_eq!(entries, vec![("a", 3.0), ("b", 2.0)]);
}

#[test]
fn finds_first_embedded_numeric_token() {
    let out = extract_metrics("elapsed: took 12.5s on run\n");
    assert_eq!(out.get("elapsed"), Some(12.5));
}

#[test]
fn accepts_signed_and_bare_decimal_values() {
    let out = extract_metrics("delta: -0.25\nshare: .5\n");
    assert_eq!(out.get("delta"), Some(-0.25));
    assert_eq!(out.get("share"), Some(0.5));
}
