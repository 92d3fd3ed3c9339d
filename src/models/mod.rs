//! Core data models for the proxy.

pub mod envelope;
pub mod geo;
pub mod route;
pub mod upstream;

pub use envelope::ProxyResult;
pub use geo::{BoundingBox, GeoPoint, PlanarPoint};
pub use route::{ApiKind, RouteRequest, RESERVED_PARAMS};
pub use upstream::{CredentialSlot, Transport, UpstreamDescriptor};
