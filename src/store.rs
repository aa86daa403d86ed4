use std::sync::Arc;

use log::info;

use crate::backend::{Backend, LimitedBackend, NativeBackend};
use crate::collection::Collection;
use crate::config::{BackendKind, StoreConfig};
use crate::errors::{StoreError, StoreResult};

/// Owns the backend connection for the process lifetime. Cheap to clone;
/// every clone shares the same backend.
#[derive(Clone)]
pub struct StoreHandle {
    backend: Arc<dyn Backend>,
    database: String,
}

impl StoreHandle {
    /// Binds the backend selected by the configuration. Selection is
    /// immutable afterwards.
    pub fn connect(config: &StoreConfig) -> StoreResult<Self> {
        if config.database.is_empty() {
            return Err(StoreError::Config("database name must not be empty".to_string()));
        }
        let backend: Arc<dyn Backend> = match config.backend {
            BackendKind::Native => {
                info!(
                    "binding native store, endpoint {}, database {}",
                    config.endpoint.as_deref().unwrap_or("(default)"),
                    config.database
                );
                Arc::new(NativeBackend::new())
            }
            BackendKind::Limited => {
                info!(
                    "binding limited store, project {}, database {}",
                    config.project_id.as_deref().unwrap_or("(default)"),
                    config.database
                );
                Arc::new(LimitedBackend::new(config.project_id.clone()))
            }
        };
        Ok(Self { backend, database: config.database.clone() })
    }

    /// Wraps an already-constructed backend driver.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn Backend>, database: impl Into<String>) -> Self {
        Self { backend, database: database.into() }
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns an accessor for the named collection. Accessors are stateless
    /// beyond the shared backend; repeated calls with the same name are
    /// interchangeable.
    #[must_use]
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.backend.clone(), name.to_string())
    }
}
