//! Uniform response envelope for the aggregation path.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub success: bool,
    pub status: u16,
    pub data: Value,
    pub elapsed_ms: u128,
}

impl ProxyResult {
    pub fn ok(data: Value, elapsed_ms: u128) -> Self {
        Self {
            success: true,
            status: 200,
            data,
            elapsed_ms,
        }
    }
}
