//! Backend selection happens once at process start: a boolean flag picks the
//! store flavor, plus a backend-specific connection parameter (endpoint for
//! the native store, project id for the limited one).

use serde::{Deserialize, Serialize};

/// Which physical store flavor to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Native,
    Limited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Connection endpoint for the native store.
    pub endpoint: Option<String>,
    /// Project identifier for the limited store.
    pub project_id: Option<String>,
    /// Logical database name.
    pub database: String,
}

const USE_LIMITED_VAR: &str = "DUOSTORE_USE_LIMITED";
const ENDPOINT_VAR: &str = "DUOSTORE_ENDPOINT";
const PROJECT_ID_VAR: &str = "DUOSTORE_PROJECT_ID";
const DB_NAME_VAR: &str = "DUOSTORE_DB_NAME";

const DEFAULT_DATABASE: &str = "inventory";

impl StoreConfig {
    /// Reads the selection from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injected lookup, so
    /// callers and tests never have to mutate process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let use_limited = lookup(USE_LIMITED_VAR)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        Self {
            backend: if use_limited { BackendKind::Limited } else { BackendKind::Native },
            endpoint: lookup(ENDPOINT_VAR),
            project_id: lookup(PROJECT_ID_VAR),
            database: lookup(DB_NAME_VAR).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Native,
            endpoint: None,
            project_id: None,
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_native() {
        let cfg = StoreConfig::from_lookup(|_| None);
        assert_eq!(cfg.backend, BackendKind::Native);
        assert_eq!(cfg.database, DEFAULT_DATABASE);
    }

    #[test]
    fn flag_selects_limited() {
        for flag in ["true", "TRUE", "1", "yes"] {
            let cfg = StoreConfig::from_lookup(|key| {
                (key == USE_LIMITED_VAR).then(|| flag.to_string())
            });
            assert_eq!(cfg.backend, BackendKind::Limited, "flag {flag}");
        }
        let cfg =
            StoreConfig::from_lookup(|key| (key == USE_LIMITED_VAR).then(|| "false".to_string()));
        assert_eq!(cfg.backend, BackendKind::Native);
    }

    #[test]
    fn connection_parameters_are_read() {
        let cfg = StoreConfig::from_lookup(|key| match key {
            ENDPOINT_VAR => Some("store://localhost:27017".to_string()),
            PROJECT_ID_VAR => Some("inventory-prod".to_string()),
            DB_NAME_VAR => Some("assets".to_string()),
            _ => None,
        });
        assert_eq!(cfg.endpoint.as_deref(), Some("store://localhost:27017"));
        assert_eq!(cfg.project_id.as_deref(), Some("inventory-prod"));
        assert_eq!(cfg.database, "assets");
    }
}
