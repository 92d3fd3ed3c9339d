//! Inbound request model for the aggregation proxy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Parameters consumed by the gateway itself and never forwarded upstream.
pub const RESERVED_PARAMS: &[&str] = &["api", "endpoint", "apiName"];

/// Logical upstream selected by the `api` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKind {
    /// Administrative-boundary GIS endpoints
    Gis,
    /// Keyed open API on the big-data host
    Open,
    /// Commercial-district endpoints on the big-data host
    Sbiz,
    /// Point to administrative unit lookup
    Coord,
    /// Store listing by administrative district
    Store,
    /// Store listing within a radius
    StoreRadius,
    /// Store listing by industry classification
    StoreInds,
    /// Seoul open-data portal
    Seoul,
}

impl ApiKind {
    pub fn all() -> &'static [ApiKind] {
        &[
            ApiKind::Gis,
            ApiKind::Open,
            ApiKind::Sbiz,
            ApiKind::Coord,
            ApiKind::Store,
            ApiKind::StoreRadius,
            ApiKind::StoreInds,
            ApiKind::Seoul,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Gis => "gis",
            ApiKind::Open => "open",
            ApiKind::Sbiz => "sbiz",
            ApiKind::Coord => "coord",
            ApiKind::Store => "store",
            ApiKind::StoreRadius => "storeRadius",
            ApiKind::StoreInds => "storeInds",
            ApiKind::Seoul => "seoul",
        }
    }

    pub fn names() -> Vec<String> {
        Self::all().iter().map(|k| k.as_str().to_string()).collect()
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiKind {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                ProxyError::invalid_choice("api", format!("unknown api '{}'", s), Self::names())
            })
    }
}

/// Normalized inbound query
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub api_kind: ApiKind,
    pub endpoint: Option<String>,
    pub sub_api_name: Option<String>,
    /// Every non-reserved parameter, in arrival order
    pub raw_params: Vec<(String, String)>,
}

impl RouteRequest {
    /// Parse query pairs. Fails before anything else happens if `api` is missing or unknown.
    pub fn from_query(pairs: Vec<(String, String)>) -> Result<Self, ProxyError> {
        let mut api = None;
        let mut endpoint = None;
        let mut sub_api_name = None;
        let mut raw_params = Vec::with_capacity(pairs.len());

        for (key, value) in pairs {
            match key.as_str() {
                "api" => api = Some(value),
                "endpoint" => endpoint = Some(value),
                "apiName" => sub_api_name = Some(value),
                _ => raw_params.push((key, value)),
            }
        }

        let api_kind = match api.filter(|a| !a.is_empty()) {
            Some(api) => api.parse::<ApiKind>()?,
            None => {
                return Err(ProxyError::invalid_choice(
                    "api",
                    "missing required parameter 'api'",
                    ApiKind::names(),
                ))
            }
        };

        Ok(Self {
            api_kind,
            endpoint: endpoint.filter(|e| !e.is_empty()),
            sub_api_name: sub_api_name.filter(|n| !n.is_empty()),
            raw_params,
        })
    }

    /// First value of a non-reserved parameter, ignoring empty strings
    pub fn param(&self, name: &str) -> Option<&str> {
        self.raw_params
            .iter()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn require_endpoint(&self) -> Result<&str, ProxyError> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| ProxyError::missing("endpoint"))
    }

    pub fn require_param(&self, name: &str) -> Result<&str, ProxyError> {
        self.param(name).ok_or_else(|| ProxyError::missing(name))
    }
}
