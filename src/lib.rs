//! `duostore` presents a single MongoDB-shaped query/update/cursor interface
//! over interchangeable document-store backends, including one whose native
//! query language is strictly weaker (single equality filter, no `$or`, no
//! regex, field-replace updates only).
//!
//! The shim accepts a small fixed dialect (literal equality, `$regex`
//! as case-insensitive substring, top-level `$or`, `$set` updates) and
//! classifies each query as empty / single-equality / complex. The first two
//! run at native backend cost; only the complex bucket fetches a bounded
//! candidate set and filters in memory. Queries outside the dialect are a
//! construction-time error; operations that only guarantee equality lookups
//! degrade other shapes to "not found" instead of raising.
//!
//! ```no_run
//! use bson::doc;
//! use duostore::{Query, StoreConfig, StoreHandle};
//!
//! # async fn demo() -> duostore::StoreResult<()> {
//! let store = StoreHandle::connect(&StoreConfig::from_env())?;
//! let equipment = store.collection("equipment");
//! equipment.insert_one(doc! { "id": "eq-1", "marca": "Dell" }).await?;
//! let query = Query::try_from(&doc! { "marca": "Dell" })?;
//! let found = equipment.find(query).limit(10).to_list(1000).await?;
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod collection;
pub mod config;
pub mod document;
pub mod errors;
pub mod query;
pub mod store;

pub use backend::{Backend, LimitedBackend, NativeBackend};
pub use collection::Collection;
pub use config::{BackendKind, StoreConfig};
pub use errors::{StoreError, StoreResult};
pub use query::{Cursor, DeleteResult, InsertResult, Query, UpdateResult, UpdateSpec};
pub use store::StoreHandle;
