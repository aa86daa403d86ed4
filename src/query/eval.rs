//! In-memory evaluation for the complex query bucket.
//!
//! Documents arriving here are in stored (canonical) form, so the query must
//! have been through [`Query::canonicalized`] first.

use bson::{Bson, Document};
use regex::RegexBuilder;

use super::types::Query;

pub fn matches(document: &Document, query: &Query) -> bool {
    match query {
        Query::Empty => true,
        Query::Eq { field, value } => {
            document.get(field).is_some_and(|v| values_equal(v, value))
        }
        Query::Regex { field, pattern } => match document.get(field) {
            Some(Bson::String(s)) => contains_ci(s, pattern),
            _ => false,
        },
        Query::And(members) => members.iter().all(|q| matches(document, q)),
        Query::Or(members) => members.iter().any(|q| matches(document, q)),
    }
}

/// Equality with numeric leniency: `Int32(2)`, `Int64(2)` and `Double(2.0)`
/// all compare equal, matching what the native backend's filter does.
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn numeric(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

// The dialect's `$regex` is a case-insensitive substring match, so the
// pattern is taken literally.
fn contains_ci(haystack: &str, pattern: &str) -> bool {
    RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(true)
        .build()
        .is_ok_and(|re| re.is_match(haystack))
}
