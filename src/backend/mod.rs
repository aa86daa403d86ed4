//! The capability interface both physical stores are reduced to.
//!
//! The collection and cursor logic is written once against [`Backend`] and
//! never branches on which store is behind it. The interface is deliberately
//! the weaker store's: one native equality filter, identity-keyed
//! get/set/merge/delete, a bounded scan, and identity generation on insert.

pub mod limited;
pub mod native;

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::errors::StoreResult;

pub use limited::LimitedBackend;
pub use native::NativeBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches a document by identity.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Writes a document under the given identity, replacing any existing
    /// document with that identity.
    async fn set(&self, collection: &str, id: &str, document: Document) -> StoreResult<()>;

    /// Writes a document under a backend-assigned identity and returns it.
    /// The identity is also stored in the document's `id` field.
    async fn add(&self, collection: &str, document: Document) -> StoreResult<String>;

    /// Replaces the named fields on an existing document, leaving the rest
    /// untouched. Returns false when no document has that identity.
    async fn merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<bool>;

    /// Removes a document by identity. Returns false when absent.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// The one native filter: documents whose field equals the value, up to
    /// `limit` when given. Order is backend-native and unspecified.
    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Bson,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>>;

    /// Enumerates a collection's documents, up to `limit` when given.
    async fn scan(&self, collection: &str, limit: Option<usize>) -> StoreResult<Vec<Document>>;
}
