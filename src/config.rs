use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub upstreams: UpstreamConfig,
    pub credentials: CredentialConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Big-data host serving the administrative-boundary and commercial-district APIs
    pub sbiz_base: String,
    /// Path on `sbiz_base` answering point-in-box administrative lookups
    pub coord_endpoint: String,
    /// Public data portal, store listing service
    pub data_portal_base: String,
    pub seoul_base: String,
    pub local_search_base: String,
    pub user_agent: String,
    pub referer: String,
    pub admin_timeout_secs: u64,
    pub default_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            sbiz_base: "https://bigdata.sbiz.or.kr".to_string(),
            coord_endpoint: "/gis/api/searchAdmiList.json".to_string(),
            data_portal_base: "http://apis.data.go.kr/B553077/api/open/sdsc2".to_string(),
            seoul_base: "http://openapi.seoul.go.kr:8088".to_string(),
            local_search_base: "https://openapi.naver.com/v1/search/local.json".to_string(),
            user_agent: "Mozilla/5.0 (compatible; geogate/0.1; +https://bigdata.sbiz.or.kr)"
                .to_string(),
            referer: "https://bigdata.sbiz.or.kr/".to_string(),
            admin_timeout_secs: 15,
            default_timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    pub fn admin_timeout(&self) -> Duration {
        Duration::from_secs(self.admin_timeout_secs)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CredentialConfig {
    /// Sub-API name → certKey for the `open` route
    pub open: BTreeMap<String, String>,
    pub data_portal: Option<String>,
    pub seoul: Option<String>,
    pub local_search_id: Option<String>,
    pub local_search_secret: Option<String>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Overlay credentials from `GEOGATE_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let creds = &mut self.credentials;
        for (var, slot) in [
            ("GEOGATE_DATA_PORTAL_KEY", &mut creds.data_portal),
            ("GEOGATE_SEOUL_KEY", &mut creds.seoul),
            ("GEOGATE_LOCAL_SEARCH_ID", &mut creds.local_search_id),
            ("GEOGATE_LOCAL_SEARCH_SECRET", &mut creds.local_search_secret),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
    }
}
