//! Contract ids stored in subscription metadata.
use std::collections::HashMap;
use uuid::Uuid;

use sitework_backend::billing::metadata::{build_contracts, parse_contracts, replace_contracts};

fn ids(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[test]
fn test_long_lists_spread_over_numbered_keys() {
    let contracts = ids(30);
    let metadata = build_contracts(&contracts);

    assert_eq!(metadata.len(), 3);
    assert!(metadata.contains_key("contracts_0"));
    assert!(metadata.contains_key("contracts_2"));
    assert!(metadata.values().all(|v| v.len() <= 500));
    assert_eq!(parse_contracts(&metadata), contracts);
}

#[test]
fn test_parse_follows_key_number_not_text_order() {
    let contracts = ids(13);
    let mut metadata = build_contracts(&contracts);
    // "contracts_10" sorts before "contracts_2" as text.
    metadata.insert("contracts_10".to_string(), String::new());
    metadata.insert("unrelated".to_string(), "value".to_string());

    assert_eq!(parse_contracts(&metadata), contracts);
}

#[test]
fn test_parse_skips_garbage() {
    let id = Uuid::new_v4();
    let metadata = HashMap::from([("contracts_0".to_string(), format!("nope, {id},"))]);

    assert_eq!(parse_contracts(&metadata), vec![id]);
}

#[test]
fn test_replace_clears_keys_no_longer_needed() {
    let before = build_contracts(&ids(20));
    let remaining = ids(3);

    let update = replace_contracts(&before, &remaining);

    assert_eq!(update.get("contracts_1").map(String::as_str), Some(""));
    assert_eq!(parse_contracts(&update), remaining);
}

#[test]
fn test_removing_last_contract_clears_everything() {
    let before = build_contracts(&ids(1));
    let update = replace_contracts(&before, &[]);

    assert_eq!(update.get("contracts_0").map(String::as_str), Some(""));
    assert!(parse_contracts(&update).is_empty());
}
