//! Embedded Mongo-flavored engine: stores BSON documents as-is and keys them
//! by the `id` field.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::RwLock;

use super::Backend;
use crate::document::{ID_FIELD, new_document_id};
use crate::errors::StoreResult;
use crate::query::eval::values_equal;

#[derive(Default)]
pub struct NativeBackend {
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
}

impl NativeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write_doc(&self, collection: &str, id: &str, mut document: Document) {
        document.insert(ID_FIELD, id.to_string());
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }
}

#[async_trait]
impl Backend for NativeBackend {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.collections.read().get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()> {
        self.write_doc(collection, id, document);
        Ok(())
    }

    async fn add(&self, collection: &str, document: Document) -> StoreResult<String> {
        let id = new_document_id();
        self.write_doc(collection, &id, document);
        Ok(id)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<bool> {
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
