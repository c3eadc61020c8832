//! The provider keeps the list of contracts a subscription pays for in its
//! metadata. Metadata values are limited to 500 characters, so the ids are
//! spread over numbered keys: `contracts_0`, `contracts_1`, ...

use std::collections::HashMap;
use uuid::Uuid;

pub const CONTRACTS_KEY: &str = "contracts";

const IDS_PER_KEY: usize = 12;

/// Read every contract id listed under the `contracts_*` keys, in key order.
pub fn parse_contracts(metadata: &HashMap<String, String>) -> Vec<Uuid> {
    let mut keys: Vec<(usize, &String)> = metadata
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(CONTRACTS_KEY)
                .and_then(|rest| rest.strip_prefix('_'))
                .and_then(|n| n.parse::<usize>().ok())
                .map(|n| (n, value))
        })
        .collect();
    keys.sort_by_key(|(n, _)| *n);

    keys.into_iter()
        .flat_map(|(_, value)| value.split(','))
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .collect()
}

/// Build the metadata for `ids`.
pub fn build_contracts(ids: &[Uuid]) -> HashMap<String, String> {
    ids.chunks(IDS_PER_KEY)
        .enumerate()
        .map(|(n, chunk)| {
            let value = chunk
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            (format!("{CONTRACTS_KEY}_{n}"), value)
        })
        .collect()
}

/// Metadata update that replaces the current list with `ids`. Keys that held
/// ids before but are no longer needed are sent empty, which deletes them at the
/// provider.
pub fn replace_contracts(
    current: &HashMap<String, String>,
    ids: &[Uuid],
) -> HashMap<String, String> {
    let mut update = build_contracts(ids);
    for key in current.keys() {
        if key.starts_with(CONTRACTS_KEY) && !update.contains_key(key) {
            update.insert(key.clone(), String::new());
        }
    }
    update
}
