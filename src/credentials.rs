//! Read-only credential store, filled once from configuration at startup.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::CredentialConfig;
use crate::error::ProxyError;

/// Opaque credential token. Debug output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Names of the shared credentials outside the `open` sub-API table
pub const DATA_PORTAL: &str = "dataPortal";
pub const SEOUL: &str = "seoul";
pub const LOCAL_SEARCH_ID: &str = "localSearchId";
pub const LOCAL_SEARCH_SECRET: &str = "localSearchSecret";

#[derive(Debug, Clone, Default)]
pub struct CredentialVault {
    /// Sub-API name → certKey for the `open` route
    open: BTreeMap<String, Credential>,
    /// Shared provider keys
    shared: BTreeMap<&'static str, Credential>,
}

impl CredentialVault {
    pub fn from_config(config: &CredentialConfig) -> Self {
        let open = config
            .open
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), Credential::new(v.clone())))
            .collect();

        let mut shared = BTreeMap::new();
        for (name, value) in [
            (DATA_PORTAL, &config.data_portal),
            (SEOUL, &config.seoul),
            (LOCAL_SEARCH_ID, &config.local_search_id),
            (LOCAL_SEARCH_SECRET, &config.local_search_secret),
        ] {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                shared.insert(name, Credential::new(value.clone()));
            }
        }

        Self { open, shared }
    }

    /// Look up an `open` sub-API credential by name.
    pub fn lookup(&self, name: &str) -> Result<&Credential, ProxyError> {
        self.open
            .get(name)
            .ok_or_else(|| ProxyError::CredentialMissing {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Look up one of the shared provider keys.
    pub fn shared(&self, name: &'static str) -> Result<&Credential, ProxyError> {
        self.shared
            .get(name)
            .ok_or_else(|| ProxyError::CredentialMissing {
                name: name.to_string(),
                available: self.shared.keys().map(|k| k.to_string()).collect(),
            })
    }

    /// Configured sub-API names, sorted
    pub fn names(&self) -> Vec<String> {
        self.open.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> CredentialVault {
        let mut config = CredentialConfig::default();
        config.open.insert("stores".to_string(), "key-1".to_string());
        config.open.insert("sales".to_string(), "key-2".to_string());
        config.open.insert("blank".to_string(), String::new());
        config.seoul = Some("seoul-key".to_string());
        CredentialVault::from_config(&config)
    }

    #[test]
    fn test_lookup_known_name() {
        assert_eq!(vault().lookup("sales").unwrap().expose(), "key-2");
    }

    #[test]
    fn test_lookup_unknown_lists_names_not_values() {
        match vault().lookup("weather").unwrap_err() {
            ProxyError::CredentialMissing { name, available } => {
                assert_eq!(name, "weather");
                assert_eq!(available, vec!["sales".to_string(), "stores".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_shared_keys() {
        let vault = vault();
        assert_eq!(vault.shared(SEOUL).unwrap().expose(), "seoul-key");
        assert!(vault.shared(DATA_PORTAL).is_err());
    }

    #[test]
    fn test_debug_hides_value() {
        assert_eq!(format!("{:?}", Credential::new("abc")), "Credential(***)");
    }
}
