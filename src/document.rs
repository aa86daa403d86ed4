//! Document serialization helpers.
//!
//! Backends differ in which value types they can hold natively, so every
//! document passes through a canonicalizing transform before it is written:
//! timestamps become RFC-3339 strings at millisecond precision, nested
//! documents and arrays are transformed recursively, and everything else
//! passes through unchanged. Reads apply the exact inverse, so a timestamp
//! round-trips to the same instant at the stored precision.

use bson::{Bson, Document};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::{StoreError, StoreResult};

/// Canonical wire form for timestamps, e.g. `2024-03-01T09:30:00.000Z`.
pub const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Nesting bound for the recursive transform. Documents deeper than this are
/// rejected before any backend call is made.
pub(crate) const MAX_DOCUMENT_DEPTH: usize = 32;

/// Identity field present in every stored document.
pub const ID_FIELD: &str = "id";

/// Generates a fresh identity token for a document inserted without one.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Applies the write-side transform to a whole document.
pub fn serialize_document(document: &Document) -> StoreResult<Document> {
    serialize_fields(document, 0)
}

/// Applies the write-side transform to a single value.
pub fn serialize_value(value: &Bson) -> StoreResult<Bson> {
    serialize_bson(value, 0)
}

fn serialize_fields(document: &Document, depth: usize) -> StoreResult<Document> {
    if depth >= MAX_DOCUMENT_DEPTH {
        return Err(StoreError::Serialization(format!(
            "document nesting exceeds {MAX_DOCUMENT_DEPTH} levels"
        )));
    }
    let mut out = Document::new();
    for (key, value) in document.iter() {
        out.insert(key.clone(), serialize_bson(value, depth + 1)?);
    }
    Ok(out)
}

fn serialize_bson(value: &Bson, depth: usize) -> StoreResult<Bson> {
    if depth >= MAX_DOCUMENT_DEPTH {
        return Err(StoreError::Serialization(format!(
            "value nesting exceeds {MAX_DOCUMENT_DEPTH} levels"
        )));
    }
    Ok(match value {
        Bson::DateTime(dt) => Bson::String(format_timestamp(*dt)?),
        Bson::Document(doc) => Bson::Document(serialize_fields(doc, depth)?),
        Bson::Array(items) => Bson::Array(
            items.iter().map(|v| serialize_bson(v, depth + 1)).collect::<StoreResult<Vec<_>>>()?,
        ),
        other => other.clone(),
    })
}

/// Inverse of [`serialize_document`]: strings in the canonical timestamp
/// shape become `Bson::DateTime` again. Pure and total; a value the forward
/// transform never produces is returned untouched.
#[must_use]
pub fn deserialize_document(document: Document) -> Document {
    let mut out = Document::new();
    for (key, value) in document {
        out.insert(key, deserialize_value(value));
    }
    out
}

pub(crate) fn deserialize_value(value: Bson) -> Bson {
    match value {
        Bson::String(s) => match parse_timestamp(&s) {
            Some(dt) => Bson::DateTime(dt),
            None => Bson::String(s),
        },
        Bson::Document(doc) => Bson::Document(deserialize_document(doc)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(deserialize_value).collect()),
        other => other,
    }
}

// The canonical form has a four-digit year. Outside 0000..=9999 chrono emits
// a signed wide year that the strict parse refuses, so such values are
// rejected before any write instead of coming back as plain strings.
pub(crate) const MIN_STORABLE_MILLIS: i64 = -62_167_219_200_000; // 0000-01-01T00:00:00.000Z
pub(crate) const MAX_STORABLE_MILLIS: i64 = 253_402_300_799_999; // 9999-12-31T23:59:59.999Z

fn format_timestamp(dt: bson::DateTime) -> StoreResult<String> {
    let millis = dt.timestamp_millis();
    if !(MIN_STORABLE_MILLIS..=MAX_STORABLE_MILLIS).contains(&millis) {
        return Err(StoreError::Serialization(format!(
            "timestamp outside the storable year range 0000-9999: {millis}ms"
        )));
    }
    let chrono_dt: DateTime<Utc> = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Serialization(format!("timestamp out of range: {dt}")))?;
    Ok(chrono_dt.format(CANONICAL_TIME_FORMAT).to_string())
}

fn parse_timestamp(s: &str) -> Option<bson::DateTime> {
    // Strict shape check: only strings produced by format_timestamp convert.
    if s.len() != 24 || !s.ends_with('Z') {
        return None;
    }
    let parsed = NaiveDateTime::parse_from_str(s, CANONICAL_TIME_FORMAT).ok()?;
    Some(bson::DateTime::from_millis(parsed.and_utc().timestamp_millis()))
}
