//! Content-based fingerprints for query runs.

use sha2::{Digest, Sha256};
use tg_graph::TemperingRecord;
use tg_optim::Query;

/// SHA-256 over the records and the query, hex encoded.
///
/// Identical inputs always give the same fingerprint, so a report can be
/// matched to the exact data and query that produced it.
pub fn fingerprint(records: &[TemperingRecord], query: &Query) -> String {
    let mut hasher = Sha256::new();

    let records_json = serde_json::to_string(records).unwrap_or_default();
    hasher.update(records_json.as_bytes());

    let query_json = serde_json::to_string(query).unwrap_or_default();
    hasher.update(query_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
