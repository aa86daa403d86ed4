//! The fixed CRUD/query surface.
//!
//! Every incoming query falls into one of three buckets: *empty* (full
//! scan), *single equality* (native pushdown, the common path), or *complex*
//! (`$or`, multi-field, regex), which fetches a bounded candidate set and
//! filters client-side. Shapes the dialect does not guarantee degrade to "no
//! match" rather than raising, so single-lookup callers never see an error
//! they cannot act on.

use std::sync::Arc;

use bson::{Bson, Document};
use log::warn;

use crate::backend::Backend;
use crate::document::{self, ID_FIELD};
use crate::errors::{StoreError, StoreResult};
use crate::query::{Cursor, DeleteResult, InsertResult, Query, UpdateResult, UpdateSpec};

#[derive(Clone)]
pub struct Collection {
    backend: Arc<dyn Backend>,
    name: String,
}

impl Collection {
    pub(crate) fn new(backend: Arc<dyn Backend>, name: String) -> Self {
        Self { backend, name }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first document matching a single-field equality query.
    /// Any other shape answers `None`; only equality lookups are part of the
    /// guaranteed dialect here.
    pub async fn find_one(&self, query: &Query) -> StoreResult<Option<Document>> {
        Ok(self.first_match(query).await?.map(document::deserialize_document))
    }

    /// Builds a lazy cursor; no backend call happens until the cursor is
    /// materialized.
    #[must_use]
    pub fn find(&self, query: Query) -> Cursor {
        Cursor::new(self.backend.clone(), self.name.clone(), query)
    }

    /// Writes a document. With an `id` field present this is an upsert by
    /// identity (an existing document with that id is replaced, never a
    /// duplicate-key failure); without one the backend assigns a fresh
    /// identity.
    pub async fn insert_one(&self, document: Document) -> StoreResult<InsertResult> {
        let doc = document::serialize_document(&document)?;
        match doc.get(ID_FIELD) {
            Some(Bson::String(id)) => {
                let id = id.clone();
                self.backend.set(&self.name, &id, doc).await?;
                Ok(InsertResult { inserted_id: id })
            }
            Some(other) => Err(StoreError::Serialization(format!(
                "`{ID_FIELD}` must be a string, got {other:?}"
            ))),
            None => {
                let id = self.backend.add(&self.name, doc).await?;
                Ok(InsertResult { inserted_id: id })
            }
        }
    }

    /// Replaces the `$set` fields on the first document matched by a
    /// single-field equality query. A count of 0 means nothing matched and
    /// is not an error.
    pub async fn update_one(
        &self,
        query: &Query,
        update: &UpdateSpec,
    ) -> StoreResult<UpdateResult> {
        let fields = document::serialize_document(update.fields())?;
        let Some(target) = self.first_match(query).await? else {
            return Ok(UpdateResult { modified_count: 0 });
        };
        let modified = match target.get(ID_FIELD) {
            Some(Bson::String(id)) => self.backend.merge(&self.name, id, fields).await?,
            _ => {
                warn!("{}: matched document has no `{ID_FIELD}`, skipping update", self.name);
                false
            }
        };
        Ok(UpdateResult { modified_count: u64::from(modified) })
    }

    /// Removes the first document matched by a single-field equality query.
    pub async fn delete_one(&self, query: &Query) -> StoreResult<DeleteResult> {
        let Some(target) = self.first_match(query).await? else {
            return Ok(DeleteResult { deleted_count: 0 });
        };
        let deleted = match target.get(ID_FIELD) {
            Some(Bson::String(id)) => self.backend.delete(&self.name, id).await?,
            _ => {
                warn!("{}: matched document has no `{ID_FIELD}`, skipping delete", self.name);
                false
            }
        };
        Ok(DeleteResult { deleted_count: u64::from(deleted) })
    }

    /// Counts all documents (empty query) or those matching a single-field
    /// equality. Any other shape answers 0, a documented looseness of the
    /// dialect kept so reference-data callers stay simple.
    pub async fn count_documents(&self, query: &Query) -> StoreResult<u64> {
        match query {
            Query::Empty => Ok(self.backend.scan(&self.name, None).await?.len() as u64),
            Query::Eq { field, value } => {
                let value = document::serialize_value(value)?;
                Ok(self.backend.find_eq(&self.name, field, &value, None).await?.len() as u64)
            }
            other => {
                warn!("{}: count on unsupported shape {other:?} answers 0", self.name);
                Ok(0)
            }
        }
    }

    /// Distinct values of a field across the whole collection, each value
    /// once, order unspecified. Always a full scan; meant for small
    /// reference collections.
    pub async fn distinct(&self, field: &str) -> StoreResult<Vec<Bson>> {
        let docs = self.backend.scan(&self.name, None).await?;
        let mut values: Vec<Bson> = Vec::new();
        for mut doc in docs {
            if let Some(value) = doc.remove(field) {
                let value = document::deserialize_value(value);
                if !values.iter().any(|v| crate::query::eval::values_equal(v, &value)) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    // Shared lookup for the single-document operations. Returns the stored
    // (canonical) form of the first match.
    async fn first_match(&self, query: &Query) -> StoreResult<Option<Document>> {
        let Some((field, value)) = query.as_single_equality() else {
            warn!("{}: unsupported shape {query:?} degraded to no match", self.name);
            return Ok(None);
        };
        let value = document::serialize_value(value)?;
        // Identity lookups are the hot path and have a direct get.
        if field == ID_FIELD
            && let Bson::String(id) = &value
        {
            return self.backend.get(&self.name, id).await;
        }
        Ok(self.backend.find_eq(&self.name, field, &value, Some(1)).await?.into_iter().next())
    }
}
