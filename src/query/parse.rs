//! Conversion from raw Mongo-shaped query/update documents into the closed
//! dialect. The upstream request layer holds queries as JSON, so both
//! `bson::Document` and `serde_json::Value` entry points are provided.

use bson::{Bson, Document};

use super::types::{Query, UpdateSpec};
use crate::errors::{StoreError, StoreResult};

const OR_OPERATOR: &str = "$or";
const REGEX_OPERATOR: &str = "$regex";
const OPTIONS_OPERATOR: &str = "$options";
const SET_OPERATOR: &str = "$set";

impl TryFrom<&Document> for Query {
    type Error = StoreError;

    fn try_from(raw: &Document) -> StoreResult<Self> {
        let mut terms = Vec::with_capacity(raw.len());
        for (key, value) in raw.iter() {
            terms.push(parse_term(key, value)?);
        }
        Ok(match terms.len() {
            0 => Self::Empty,
            1 => terms.remove(0),
            _ => Self::And(terms),
        })
    }
}

impl TryFrom<&serde_json::Value> for Query {
    type Error = StoreError;

    fn try_from(raw: &serde_json::Value) -> StoreResult<Self> {
        let doc = bson::serialize_to_document(raw)
            .map_err(|e| StoreError::UnsupportedQuery(format!("query must be an object: {e}")))?;
        Self::try_from(&doc)
    }
}

fn parse_term(key: &str, value: &Bson) -> StoreResult<Query> {
    if key == OR_OPERATOR {
        return parse_or(value);
    }
    if key.starts_with('$') {
        return Err(StoreError::UnsupportedQuery(format!("unknown top-level operator `{key}`")));
    }
    match value {
        Bson::Document(operators) if is_operator_object(operators) => {
            parse_operator_object(key, operators)
        }
        literal => Ok(Query::Eq { field: key.to_string(), value: literal.clone() }),
    }
}

fn parse_or(value: &Bson) -> StoreResult<Query> {
    let Bson::Array(branches) = value else {
        return Err(StoreError::UnsupportedQuery(format!(
            "`{OR_OPERATOR}` expects an array of sub-queries"
        )));
    };
    let mut members = Vec::with_capacity(branches.len());
    for branch in branches {
        let Bson::Document(doc) = branch else {
            return Err(StoreError::UnsupportedQuery(format!(
                "`{OR_OPERATOR}` branch must be an object"
            )));
        };
        members.push(Query::try_from(doc)?);
    }
    Ok(Query::Or(members))
}

// A nested plain document is a literal equality match; a document whose keys
// start with `$` is an operator object.
fn is_operator_object(doc: &Document) -> bool {
    doc.keys().any(|k| k.starts_with('$'))
}

fn parse_operator_object(field: &str, operators: &Document) -> StoreResult<Query> {
    let mut pattern = None;
    for (op, value) in operators.iter() {
        match op.as_str() {
            REGEX_OPERATOR => match value {
                Bson::String(p) => pattern = Some(p.clone()),
                other => {
                    return Err(StoreError::UnsupportedQuery(format!(
                        "`{REGEX_OPERATOR}` expects a string pattern, got {other:?}"
                    )));
                }
            },
            // Matching is always case-insensitive in this dialect; the
            // accompanying `$options: "i"` is accepted and implied.
            OPTIONS_OPERATOR => {}
            other => {
                return Err(StoreError::UnsupportedQuery(format!(
                    "unsupported operator `{other}` on field `{field}`"
                )));
            }
        }
    }
    match pattern {
        Some(pattern) => Ok(Query::Regex { field: field.to_string(), pattern }),
        None => Err(StoreError::UnsupportedQuery(format!(
            "operator object on field `{field}` has no `{REGEX_OPERATOR}`"
        ))),
    }
}

impl TryFrom<&Document> for UpdateSpec {
    type Error = StoreError;

    fn try_from(raw: &Document) -> StoreResult<Self> {
        let mut set = None;
        for (key, value) in raw.iter() {
            match (key.as_str(), value) {
                (SET_OPERATOR, Bson::Document(fields)) => set = Some(fields.clone()),
                (SET_OPERATOR, other) => {
                    return Err(StoreError::UnsupportedQuery(format!(
                        "`{SET_OPERATOR}` expects an object, got {other:?}"
                    )));
                }
                (other, _) => {
                    return Err(StoreError::UnsupportedQuery(format!(
                        "unsupported update operator `{other}`"
                    )));
                }
            }
        }
        match set {
            Some(fields) => UpdateSpec::set(fields),
            None => Err(StoreError::UnsupportedQuery(format!(
                "update must contain `{SET_OPERATOR}`"
            ))),
        }
    }
}
