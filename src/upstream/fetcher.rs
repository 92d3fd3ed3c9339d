//! Single-shot GET against an upstream with per-route TLS policy.

use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::models::UpstreamDescriptor;

/// Successful upstream exchange
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    /// Parsed JSON, or the raw text as a JSON string when parsing failed
    pub body: Value,
}

pub struct HttpFetcher {
    /// Verifies certificates
    strict: Client,
    /// Accepts invalid certificates; only used when a route opts out of verification
    relaxed: Client,
    referer: String,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let build = |accept_invalid: bool| {
            Client::builder()
                .user_agent(config.user_agent.as_str())
                .danger_accept_invalid_certs(accept_invalid)
                .build()
                .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))
        };

        Ok(Self {
            strict: build(false)?,
            relaxed: build(true)?,
            referer: config.referer.clone(),
        })
    }

    /// Issue the request described by `descriptor`.
    ///
    /// Non-2xx answers become [`ProxyError::UpstreamStatus`] carrying the raw body;
    /// connection failures and timeouts become [`ProxyError::Transport`].
    pub async fn fetch(&self, descriptor: &UpstreamDescriptor) -> Result<Fetched, ProxyError> {
        let client = if descriptor.verify_tls {
            &self.strict
        } else {
            &self.relaxed
        };

        debug!(
            "GET {} (timeout {:?}, verify_tls {})",
            descriptor.redacted(),
            descriptor.timeout,
            descriptor.verify_tls
        );

        let mut request = client
            .get(descriptor.resolve())
            .timeout(descriptor.timeout)
            .header(header::REFERER, self.referer.as_str())
            .header(header::ACCEPT, "application/json, text/plain, */*");
        for (name, value) in descriptor.credential_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            warn!("Upstream request to {} failed: {}", descriptor.url, e);
            ProxyError::transport(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ProxyError::transport)?;

        if !status.is_success() {
            warn!(
                "Upstream {} answered with status {}",
                descriptor.url,
                status.as_u16()
            );
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(v) => v,
            Err(e) => {
                debug!("Upstream body is not JSON ({}), returning raw text", e);
                Value::String(text)
            }
        };

        Ok(Fetched {
            status: status.as_u16(),
            body,
        })
    }
}
