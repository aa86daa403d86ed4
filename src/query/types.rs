use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::document::{self, ID_FIELD};
use crate::errors::{StoreError, StoreResult};

/// The closed query dialect accepted by the shim.
///
/// Anything outside this variant set is a construction-time error in
/// [`parse`](super::parse), never a runtime surprise for the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    Empty,
    /// Literal equality on a single field.
    Eq { field: String, value: Bson },
    /// Case-insensitive substring match on a string field (`$regex` with
    /// `$options: "i"` in the wire form).
    Regex { field: String, pattern: String },
    /// All members must match (a multi-field query document).
    And(Vec<Query>),
    /// At least one member must match (`$or`).
    Or(Vec<Query>),
}

impl Query {
    /// Returns the `(field, value)` pair when the query is a single
    /// equality condition, the only shape with a native pushdown.
    #[must_use]
    pub fn as_single_equality(&self) -> Option<(&str, &Bson)> {
        match self {
            Self::Eq { field, value } => Some((field.as_str(), value)),
            _ => None,
        }
    }

    /// Maps every literal value through the write-side transform so that
    /// comparisons happen against the stored representation. Timestamps in a
    /// query value otherwise never match their canonical string form.
    pub fn canonicalized(&self) -> StoreResult<Self> {
        Ok(match self {
            Self::Empty => Self::Empty,
            Self::Eq { field, value } => {
                Self::Eq { field: field.clone(), value: document::serialize_value(value)? }
            }
            Self::Regex { field, pattern } => {
                Self::Regex { field: field.clone(), pattern: pattern.clone() }
            }
            Self::And(members) => {
                Self::And(members.iter().map(Self::canonicalized).collect::<StoreResult<_>>()?)
            }
            Self::Or(members) => {
                Self::Or(members.iter().map(Self::canonicalized).collect::<StoreResult<_>>()?)
            }
        })
    }
}

/// A parsed `{"$set": {...}}` update. Field replacement only; the dialect has
/// no increment, unset, or array operators.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    set: Document,
}

impl UpdateSpec {
    /// Builds an update from the fields to replace. The identity field is
    /// immutable and may not appear.
    pub fn set(fields: Document) -> StoreResult<Self> {
        if fields.contains_key(ID_FIELD) {
            return Err(StoreError::UnsupportedQuery(format!(
                "update may not replace the `{ID_FIELD}` field"
            )));
        }
        Ok(Self { set: fields })
    }

    #[must_use]
    pub fn fields(&self) -> &Document {
        &self.set
    }
}

/// Identity of the document written by `insert_one`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    pub inserted_id: String,
}

/// Outcome of `update_one`; `modified_count` is 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub modified_count: u64,
}

/// Outcome of `delete_one`; `deleted_count` is 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
