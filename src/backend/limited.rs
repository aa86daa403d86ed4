//! Embedded Firestore-flavored engine: equality filter and identity ops
//! only, and a value model without native timestamps. Writes carrying a type
//! the store cannot hold are rejected, which is what makes the canonical
//! string transform on the write path load-bearing.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::RwLock;

use super::Backend;
use crate::document::{ID_FIELD, new_document_id};
use crate::errors::{StoreError, StoreResult};
use crate::query::eval::values_equal;

pub struct LimitedBackend {
    project_id: Option<String>,
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
}

impl LimitedBackend {
    #[must_use]
    pub fn new(project_id: Option<String>) -> Self {
        Self { project_id, collections: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    fn write_doc(&self, collection: &str, id: &str, mut document: Document) -> StoreResult<()> {
        check_document(&document)?;
        document.insert(ID_FIELD, id.to_string());
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }
}

// Store identities are short random tokens rather than full hex identifiers.
fn short_id() -> String {
    let mut id = new_document_id();
    id.truncate(20);
    id
}

fn check_document(document: &Document) -> StoreResult<()> {
    for (_, value) in document.iter() {
        check_value(value)?;
    }
    Ok(())
}

fn check_value(value: &Bson) -> StoreResult<()> {
    match value {
        Bson::Double(_)
        | Bson::String(_)
        | Bson::Int32(_)
        | Bson::Int64(_)
        | Bson::Boolean(_)
        | Bson::Null => Ok(()),
        Bson::Document(doc) => check_document(doc),
        Bson::Array(items) => items.iter().try_for_each(check_value),
        other => Err(StoreError::Serialization(format!(
            "value not representable in the limited store: {other:?}"
        ))),
    }
}

#[async_trait]
impl Backend for LimitedBackend {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.collections.read().get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()> {
        self.write_doc(collection, id, document)
    }

    async fn add(&self, collection: &str, document: Document) -> StoreResult<String> {
        let id = short_id();
        self.write_doc(collection, &id, document)?;
        Ok(id)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<bool> {
        check_document(&fields)?;
        let mut collections = self.collections.write();
        let Some(existing) = collections.get_mut(collection).and_then(|c| c.get_mut(id)) else {
            return Ok(false);
        };
        for (key, value) in fields {
            existing.insert(key, value);
        }
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .is_some_and(|c| c.remove(id).is_some()))
    }

    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Bson,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let docs = collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|d| d.get(field).is_some_and(|v| values_equal(v, value)))
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn scan(&self, collection: &str, limit: Option<usize>) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let docs = collections
            .get(collection)
            .map(|c| c.values().take(limit.unwrap_or(usize::MAX)).cloned().collect())
            .unwrap_or_default();
        Ok(docs)
    }
}
