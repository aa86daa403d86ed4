use std::sync::Arc;

use bson::Document;
use log::debug;

use super::eval;
use super::types::Query;
use crate::backend::Backend;
use crate::document::deserialize_document;
use crate::errors::StoreResult;

/// A lazy handle over a pending `find`. Nothing touches the backend until
/// [`to_list`](Cursor::to_list) runs.
#[derive(Clone)]
pub struct Cursor {
    backend: Arc<dyn Backend>,
    collection: String,
    query: Query,
    limit: Option<usize>,
}

impl Cursor {
    pub(crate) fn new(backend: Arc<dyn Backend>, collection: String, query: Query) -> Self {
        Self { backend, collection, query, limit: None }
    }

    /// Caps the result size. Calling this again replaces the previous cap
    /// (last write wins).
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Executes the query and materializes at most
    /// `min(limit, max_length)` documents. Each call re-executes; results are
    /// never cached.
    pub async fn to_list(&self, max_length: usize) -> StoreResult<Vec<Document>> {
        let cap = self.limit.map_or(max_length, |l| l.min(max_length));
        let query = self.query.canonicalized()?;
        let mut raw = match &query {
            Query::Empty => {
                debug!("find {}: full scan, cap {cap}", self.collection);
                self.backend.scan(&self.collection, Some(cap)).await?
            }
            Query::Eq { field, value } => {
                debug!("find {}: pushdown on `{field}`, cap {cap}", self.collection);
                self.backend.find_eq(&self.collection, field, value, Some(cap)).await?
            }
            complex => {
                // Bounded candidate fetch, then client-side filtering. The
                // bound is applied before the filter, matching the pushdown
                // paths: at most `cap` documents are ever pulled.
                debug!("find {}: in-memory filter, cap {cap}", self.collection);
                let mut candidates = self.backend.scan(&self.collection, Some(cap)).await?;
                candidates.retain(|doc| eval::matches(doc, complex));
                candidates
            }
        };
        raw.truncate(cap);
        Ok(raw.into_iter().map(deserialize_document).collect())
    }
}
