//! Descriptor handed from the routing table to the fetcher.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::credentials::Credential;

/// Wire transport of an upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Https,
}

impl Transport {
    pub fn of(url: &Url) -> Self {
        if url.scheme() == "https" {
            Transport::Https
        } else {
            Transport::Http
        }
    }
}

/// Where a credential is placed when the request is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSlot {
    /// Appended as a query parameter with this name
    Query(&'static str),
    /// Inserted as the first path segment
    LeadingPathSegment,
    /// Sent as a request header with this name
    Header(&'static str),
}

/// Fully-formed outbound request. Consumed once by the fetcher.
#[derive(Clone)]
pub struct UpstreamDescriptor {
    /// Target URL without credential material
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub transport: Transport,
    pub verify_tls: bool,
    pub credentials: Vec<(CredentialSlot, Credential)>,
    pub timeout: Duration,
}

impl UpstreamDescriptor {
    pub fn new(url: Url, query: Vec<(String, String)>, verify_tls: bool, timeout: Duration) -> Self {
        Self {
            transport: Transport::of(&url),
            url,
            query,
            verify_tls,
            credentials: Vec::new(),
            timeout,
        }
    }

    pub fn with_credential(mut self, slot: CredentialSlot, credential: Credential) -> Self {
        self.credentials.push((slot, credential));
        self
    }

    /// URL actually sent upstream, credential included. Never log this.
    pub fn resolve(&self) -> Url {
        let mut url = self.url.clone();

        let mut pairs: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        for (slot, credential) in &self.credentials {
            match slot {
                CredentialSlot::LeadingPathSegment => {
                    let rest: Vec<String> = url
                        .path_segments()
                        .map(|s| s.filter(|seg| !seg.is_empty()).map(String::from).collect())
                        .unwrap_or_default();
                    if let Ok(mut segments) = url.path_segments_mut() {
                        segments.clear().push(credential.expose());
                        for seg in &rest {
                            segments.push(seg);
                        }
                    }
                }
                CredentialSlot::Query(name) => pairs.push((*name, credential.expose())),
                CredentialSlot::Header(_) => {}
            }
        }

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        url
    }

    /// Header-borne credentials as (name, value)
    pub fn credential_headers(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.credentials.iter().filter_map(|(slot, credential)| match slot {
            CredentialSlot::Header(name) => Some((*name, credential.expose())),
            _ => None,
        })
    }

    /// URL with query but no credential, for logs
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url.to_string()
    }
}

impl fmt::Debug for UpstreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamDescriptor")
            .field("url", &self.redacted())
            .field("transport", &self.transport)
            .field("verify_tls", &self.verify_tls)
            .field(
                "credentials",
                &self.credentials.iter().map(|(slot, _)| slot).collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}
