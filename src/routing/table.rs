//! Routing rules keyed by `api`.
//!
//! Pass-through routes forward every non-reserved parameter verbatim. That is
//! a trust boundary: the upstream sees whatever the caller sent. Only the
//! `gis` + coordinates route filters its parameters.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::config::UpstreamConfig;
use crate::credentials::{self, CredentialVault};
use crate::error::ProxyError;
use crate::models::{
    ApiKind, BoundingBox, CredentialSlot, GeoPoint, RouteRequest, UpstreamDescriptor,
};
use crate::projection::wgs84_to_planar;

pub const DEFAULT_MARGIN_M: i64 = 1000;
pub const DEFAULT_MAP_LEVEL: u32 = 14;
/// Widest search window accepted on the `gis` route, in meters
pub const MAX_MARGIN_M: i64 = 20_000;

/// Classification filters forwarded on the `gis` + coordinates route
pub const GIS_FILTER_PARAMS: &[&str] = &[
    "chkedList",
    "indsLclsCd",
    "indsLclsNm",
    "indsMclsCd",
    "indsMclsNm",
];

/// Parameters forwarded to the local-search provider
pub const LOCAL_SEARCH_PARAMS: &[&str] = &["query", "display", "start", "sort"];

const SEOUL_DEFAULT_SERVICE: &str = "VwsmTrdarSelngQq";
const SEOUL_DEFAULT_START: u32 = 1;
const SEOUL_DEFAULT_END: u32 = 1000;

/// Outcome of routing a request
#[derive(Debug)]
pub enum Route {
    /// Send this request once
    Direct(UpstreamDescriptor),
    /// Resolve the point through the expanding-margin search
    Adaptive(GeoPoint),
}

pub struct RoutingTable {
    sbiz_base: Url,
    coord_endpoint: String,
    data_portal_base: Url,
    seoul_base: Url,
    local_search_base: Url,
    admin_timeout: Duration,
    default_timeout: Duration,
}

impl RoutingTable {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            sbiz_base: Url::parse(&config.sbiz_base).context("Invalid sbiz_base URL")?,
            coord_endpoint: config.coord_endpoint.clone(),
            data_portal_base: Url::parse(&config.data_portal_base)
                .context("Invalid data_portal_base URL")?,
            seoul_base: Url::parse(&config.seoul_base).context("Invalid seoul_base URL")?,
            local_search_base: Url::parse(&config.local_search_base)
                .context("Invalid local_search_base URL")?,
            admin_timeout: config.admin_timeout(),
            default_timeout: config.default_timeout(),
        })
    }

    /// Map a request to its upstream. No network access happens here.
    pub fn route(&self, req: &RouteRequest, vault: &CredentialVault) -> Result<Route, ProxyError> {
        match req.api_kind {
            ApiKind::Gis => self.route_gis(req),
            ApiKind::Open => {
                let endpoint = req.require_endpoint()?;
                let name = req
                    .sub_api_name
                    .as_deref()
                    .ok_or_else(|| ProxyError::missing("apiName"))?;
                let cert_key = vault.lookup(name)?.clone();

                let url = join_endpoint(&self.sbiz_base, endpoint)?;
                Ok(Route::Direct(
                    self.big_data(url, req.raw_params.clone(), self.default_timeout)
                        .with_credential(CredentialSlot::Query("certKey"), cert_key),
                ))
            }
            ApiKind::Sbiz => {
                let url = join_endpoint(&self.sbiz_base, req.require_endpoint()?)?;
                Ok(Route::Direct(self.big_data(
                    url,
                    req.raw_params.clone(),
                    self.default_timeout,
                )))
            }
            ApiKind::Coord => {
                let point = parse_point(req)?.ok_or_else(|| ProxyError::missing("lat"))?;
                Ok(Route::Adaptive(point))
            }
            ApiKind::Store => self.route_store(req, vault, "storeListInDong"),
            ApiKind::StoreInds => self.route_store(req, vault, "storeListInUpjong"),
            ApiKind::StoreRadius => {
                for field in ["cx", "cy"] {
                    let value = req.require_param(field)?;
                    if value.parse::<f64>().is_err() {
                        return Err(ProxyError::invalid(
                            field,
                            format!("'{}' must be numeric", field),
                        ));
                    }
                }
                self.route_store(req, vault, "storeListInRadius")
            }
            ApiKind::Seoul => self.route_seoul(req, vault),
        }
    }

    /// Administrative lookup for one bounding box, as used by the `coord` search.
    pub fn admin_lookup(&self, bbox: &BoundingBox) -> Result<UpstreamDescriptor, ProxyError> {
        let url = join_endpoint(&self.sbiz_base, &self.coord_endpoint)?;
        Ok(self.big_data(url, bbox.to_query_pairs(), self.admin_timeout))
    }

    /// Free-text place search. `query` is required; provider credentials go in headers.
    pub fn local_search(
        &self,
        params: &[(String, String)],
        vault: &CredentialVault,
    ) -> Result<UpstreamDescriptor, ProxyError> {
        let has_query = params
            .iter()
            .any(|(k, v)| k == "query" && !v.trim().is_empty());
        if !has_query {
            return Err(ProxyError::missing("query"));
        }

        let client_id = vault.shared(credentials::LOCAL_SEARCH_ID)?.clone();
        let client_secret = vault.shared(credentials::LOCAL_SEARCH_SECRET)?.clone();

        let query = params
            .iter()
            .filter(|(k, _)| LOCAL_SEARCH_PARAMS.contains(&k.as_str()))
            .cloned()
            .collect();

        Ok(
            UpstreamDescriptor::new(self.local_search_base.clone(), query, true, self.default_timeout)
                .with_credential(CredentialSlot::Header("X-Naver-Client-Id"), client_id)
                .with_credential(CredentialSlot::Header("X-Naver-Client-Secret"), client_secret),
        )
    }

    /// Request against the big-data host, which needs relaxed TLS verification.
    fn big_data(
        &self,
        url: Url,
        query: Vec<(String, String)>,
        timeout: Duration,
    ) -> UpstreamDescriptor {
        UpstreamDescriptor::new(url, query, false, timeout)
    }

    fn route_gis(&self, req: &RouteRequest) -> Result<Route, ProxyError> {
        let url = join_endpoint(&self.sbiz_base, req.require_endpoint()?)?;

        let point = match parse_point(req)? {
            Some(point) => point,
            None => {
                return Ok(Route::Direct(self.big_data(
                    url,
                    req.raw_params.clone(),
                    self.admin_timeout,
                )))
            }
        };

        let margin = match req.param("margin") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_MARGIN_M).contains(m))
                .ok_or_else(|| {
                    ProxyError::invalid(
                        "margin",
                        format!("'margin' must be an integer between 1 and {}", MAX_MARGIN_M),
                    )
                })?,
            None => DEFAULT_MARGIN_M,
        };
        let map_level = match req.param("mapLevel") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ProxyError::invalid("mapLevel", "'mapLevel' must be an integer"))?,
            None => DEFAULT_MAP_LEVEL,
        };

        let bbox = BoundingBox::around(wgs84_to_planar(point.lat, point.lng), margin, map_level);

        let mut query = bbox.to_query_pairs();
        query.extend(
            req.raw_params
                .iter()
                .filter(|(k, _)| GIS_FILTER_PARAMS.contains(&k.as_str()))
                .cloned(),
        );

        Ok(Route::Direct(self.big_data(url, query, self.admin_timeout)))
    }

    fn route_store(
        &self,
        req: &RouteRequest,
        vault: &CredentialVault,
        operation: &str,
    ) -> Result<Route, ProxyError> {
        let service_key = vault.shared(credentials::DATA_PORTAL)?.clone();

        let mut url = self.data_portal_base.clone();
        url.path_segments_mut()
            .map_err(|_| ProxyError::Internal("data portal base URL cannot hold a path".into()))?
            .pop_if_empty()
            .push(operation);

        let mut query = req.raw_params.clone();
        if req.param("type").is_none() {
            query.push(("type".to_string(), "json".to_string()));
        }

        Ok(Route::Direct(
            UpstreamDescriptor::new(url, query, true, self.default_timeout)
                .with_credential(CredentialSlot::Query("serviceKey"), service_key),
        ))
    }

    fn route_seoul(&self, req: &RouteRequest, vault: &CredentialVault) -> Result<Route, ProxyError> {
        let key = vault.shared(credentials::SEOUL)?.clone();

        let service = req.param("service").unwrap_or(SEOUL_DEFAULT_SERVICE);
        let start = parse_index(req, "startIndex", SEOUL_DEFAULT_START)?;
        let end = parse_index(req, "endIndex", SEOUL_DEFAULT_END)?;
        if end < start {
            return Err(ProxyError::invalid(
                "endIndex",
                "'endIndex' must not be smaller than 'startIndex'",
            ));
        }

        let mut url = self.seoul_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProxyError::Internal("Seoul base URL cannot hold a path".into()))?;
            segments
                .pop_if_empty()
                .push("json")
                .push(service)
                .push(&start.to_string())
                .push(&end.to_string());
            if let Some(quarter) = req.param("stdrYyquCd") {
                segments.push(quarter);
            }
        }

        Ok(Route::Direct(
            UpstreamDescriptor::new(url, Vec::new(), true, self.default_timeout)
                .with_credential(CredentialSlot::LeadingPathSegment, key),
        ))
    }
}

/// Append a caller-supplied endpoint path to `base`, refusing anything that
/// would change the host.
fn join_endpoint(base: &Url, endpoint: &str) -> Result<Url, ProxyError> {
    if !endpoint.starts_with('/') || endpoint.starts_with("//") || endpoint.contains('\\') {
        return Err(ProxyError::invalid(
            "endpoint",
            "'endpoint' must be an absolute path such as /gis/api/x.json",
        ));
    }

    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), endpoint);
    let url = Url::parse(&joined)
        .map_err(|e| ProxyError::invalid("endpoint", format!("invalid endpoint: {}", e)))?;

    if url.host_str() != base.host_str() || url.port_or_known_default() != base.port_or_known_default()
    {
        return Err(ProxyError::invalid("endpoint", "'endpoint' must not change the host"));
    }

    Ok(url)
}

/// Read `lat`/`lng`. Both absent is `None`; one without the other is an error.
fn parse_point(req: &RouteRequest) -> Result<Option<GeoPoint>, ProxyError> {
    let (lat, lng) = match (req.param("lat"), req.param("lng")) {
        (None, None) => return Ok(None),
        (Some(_), None) => return Err(ProxyError::missing("lng")),
        (None, Some(_)) => return Err(ProxyError::missing("lat")),
        (Some(lat), Some(lng)) => (lat, lng),
    };

    let lat: f64 = lat
        .parse()
        .map_err(|_| ProxyError::invalid("lat", "'lat' must be numeric"))?;
    let lng: f64 = lng
        .parse()
        .map_err(|_| ProxyError::invalid("lng", "'lng' must be numeric"))?;

    GeoPoint::new(lat, lng)
        .map(Some)
        .ok_or_else(|| ProxyError::invalid("lat", "coordinate outside the WGS84 range"))
}

fn parse_index(req: &RouteRequest, field: &str, default: u32) -> Result<u32, ProxyError> {
    match req.param(field) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ProxyError::invalid(field, format!("'{}' must be a positive integer", field))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialConfig;
    use crate::models::Transport;

    fn table() -> RoutingTable {
        RoutingTable::new(&UpstreamConfig::default()).unwrap()
    }

    fn vault() -> CredentialVault {
        let mut config = CredentialConfig::default();
        config.open.insert("sales".to_string(), "cert-123".to_string());
        config.data_portal = Some("portal-key".to_string());
        config.seoul = Some("seoul-key".to_string());
        config.local_search_id = Some("client-id".to_string());
        config.local_search_secret = Some("client-secret".to_string());
        CredentialVault::from_config(&config)
    }

    fn request(items: &[(&str, &str)]) -> RouteRequest {
        RouteRequest::from_query(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    fn direct(route: Route) -> UpstreamDescriptor {
        match route {
            Route::Direct(d) => d,
            Route::Adaptive(p) => panic!("expected direct route, got adaptive {:?}", p),
        }
    }

    fn query_value<'a>(d: &'a UpstreamDescriptor, name: &str) -> Option<&'a str> {
        d.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_gis_without_coordinates_forwards_everything() {
        let req = request(&[
            ("api", "gis"),
            ("endpoint", "/x"),
            ("foo", "1"),
            ("bar", "two"),
            ("foo", "3"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());

        assert_eq!(d.url.path(), "/x");
        assert_eq!(
            d.query,
            vec![
                ("foo".to_string(), "1".to_string()),
                ("bar".to_string(), "two".to_string()),
                ("foo".to_string(), "3".to_string()),
            ]
        );
        assert!(!d.verify_tls);
        assert_eq!(d.transport, Transport::Https);
    }

    #[test]
    fn test_gis_with_coordinates_builds_box_and_filters() {
        let req = request(&[
            ("api", "gis"),
            ("endpoint", "/gis/api/stores.json"),
            ("lat", "38.0"),
            ("lng", "127.0"),
            ("indsLclsCd", "Q"),
            ("evil", "drop-me"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());

        assert_eq!(query_value(&d, "minXAxis"), Some("199000"));
        assert_eq!(query_value(&d, "maxXAxis"), Some("201000"));
        assert_eq!(query_value(&d, "minYAxis"), Some("499000"));
        assert_eq!(query_value(&d, "maxYAxis"), Some("501000"));
        assert_eq!(query_value(&d, "mapLevel"), Some("14"));
        assert_eq!(query_value(&d, "indsLclsCd"), Some("Q"));
        assert_eq!(query_value(&d, "evil"), None);
        assert_eq!(query_value(&d, "lat"), None);
        assert_eq!(d.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_gis_box_uses_requested_margin() {
        let req = request(&[
            ("api", "gis"),
            ("endpoint", "/x"),
            ("lat", "37.5665"),
            ("lng", "126.978"),
            ("margin", "250"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());

        let get = |n| query_value(&d, n).unwrap().parse::<i64>().unwrap();
        assert_eq!(get("maxXAxis") - get("minXAxis"), 500);
        assert_eq!(get("maxYAxis") - get("minYAxis"), 500);

        let center = wgs84_to_planar(37.5665, 126.978);
        assert_eq!((get("maxXAxis") + get("minXAxis")) / 2, center.x);
    }

    #[test]
    fn test_gis_rejects_bad_margin() {
        for margin in ["9223372036854775807", "20001", "0", "-5", "wide", "1.5"] {
            let req = request(&[
                ("api", "gis"),
                ("endpoint", "/x"),
                ("lat", "37.5"),
                ("lng", "127.0"),
                ("margin", margin),
            ]);
            match table().route(&req, &vault()).unwrap_err() {
                ProxyError::Validation { field, .. } => assert_eq!(field, "margin", "{}", margin),
                other => panic!("unexpected error for {}: {:?}", margin, other),
            }
        }
    }

    #[test]
    fn test_gis_accepts_widest_margin() {
        let req = request(&[
            ("api", "gis"),
            ("endpoint", "/x"),
            ("lat", "38.0"),
            ("lng", "127.0"),
            ("margin", "20000"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());
        assert_eq!(query_value(&d, "minXAxis"), Some("180000"));
        assert_eq!(query_value(&d, "maxYAxis"), Some("520000"));
    }

    #[test]
    fn test_gis_rejects_bad_map_level() {
        for level in ["-1", "fourteen", "99999999999"] {
            let req = request(&[
                ("api", "gis"),
                ("endpoint", "/x"),
                ("lat", "37.5"),
                ("lng", "127.0"),
                ("mapLevel", level),
            ]);
            match table().route(&req, &vault()).unwrap_err() {
                ProxyError::Validation { field, .. } => assert_eq!(field, "mapLevel", "{}", level),
                other => panic!("unexpected error for {}: {:?}", level, other),
            }
        }
    }

    #[test]
    fn test_gis_rejects_half_coordinate() {
        let req = request(&[("api", "gis"), ("endpoint", "/x"), ("lat", "37.5")]);
        let err = table().route(&req, &vault()).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_missing_endpoint_is_client_error() {
        for api in ["gis", "open", "sbiz"] {
            let req = request(&[("api", api), ("apiName", "sales")]);
            match table().route(&req, &vault()).unwrap_err() {
                ProxyError::Validation { field, .. } => assert_eq!(field, "endpoint"),
                other => panic!("unexpected error for {}: {:?}", api, other),
            }
        }
    }

    #[test]
    fn test_endpoint_cannot_change_host() {
        for endpoint in ["//evil.example.org/x", "x.json", "@evil.example.org/x"] {
            let req = request(&[("api", "sbiz"), ("endpoint", endpoint)]);
            assert!(table().route(&req, &vault()).is_err(), "{}", endpoint);
        }
    }

    #[test]
    fn test_open_injects_cert_key() {
        let req = request(&[
            ("api", "open"),
            ("endpoint", "/openApi/sales"),
            ("apiName", "sales"),
            ("adongCd", "1111"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());

        assert_eq!(query_value(&d, "adongCd"), Some("1111"));
        assert!(d.resolve().as_str().ends_with("adongCd=1111&certKey=cert-123"));
        assert!(!d.redacted().contains("cert-123"));
    }

    #[test]
    fn test_open_unknown_name() {
        let req = request(&[("api", "open"), ("endpoint", "/x"), ("apiName", "nope")]);
        match table().route(&req, &vault()).unwrap_err() {
            ProxyError::CredentialMissing { available, .. } => {
                assert_eq!(available, vec!["sales".to_string()])
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_coord_delegates_to_search() {
        let req = request(&[("api", "coord"), ("lat", "37.5"), ("lng", "127.0")]);
        match table().route(&req, &vault()).unwrap() {
            Route::Adaptive(p) => assert_eq!(p, GeoPoint { lat: 37.5, lng: 127.0 }),
            Route::Direct(d) => panic!("expected adaptive route, got {:?}", d),
        }

        let req = request(&[("api", "coord")]);
        assert!(table().route(&req, &vault()).is_err());
    }

    #[test]
    fn test_store_variants_use_fixed_paths() {
        for (api, op) in [
            ("store", "storeListInDong"),
            ("storeInds", "storeListInUpjong"),
        ] {
            let req = request(&[("api", api), ("divId", "adongCd"), ("key", "11110")]);
            let d = direct(table().route(&req, &vault()).unwrap());
            assert!(d.url.path().ends_with(op), "{}", d.url);
            assert_eq!(d.transport, Transport::Http);
            assert!(d.verify_tls);
            assert_eq!(query_value(&d, "type"), Some("json"));
            assert!(d.resolve().as_str().contains("serviceKey=portal-key"));
        }
    }

    #[test]
    fn test_store_radius_requires_center() {
        let req = request(&[("api", "storeRadius"), ("cx", "127.0")]);
        match table().route(&req, &vault()).unwrap_err() {
            ProxyError::Validation { field, .. } => assert_eq!(field, "cy"),
            other => panic!("unexpected error: {:?}", other),
        }

        let req = request(&[
            ("api", "storeRadius"),
            ("cx", "127.0"),
            ("cy", "37.5"),
            ("radius", "500"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());
        assert!(d.url.path().ends_with("storeListInRadius"));
        assert_eq!(query_value(&d, "radius"), Some("500"));
    }

    #[test]
    fn test_seoul_path_layout() {
        let req = request(&[
            ("api", "seoul"),
            ("service", "VwsmTrdarStorQq"),
            ("startIndex", "1"),
            ("endIndex", "5"),
            ("stdrYyquCd", "20241"),
        ]);
        let d = direct(table().route(&req, &vault()).unwrap());

        assert_eq!(d.url.path(), "/json/VwsmTrdarStorQq/1/5/20241");
        assert_eq!(d.resolve().path(), "/seoul-key/json/VwsmTrdarStorQq/1/5/20241");
        assert!(d.query.is_empty());
    }

    #[test]
    fn test_seoul_defaults_and_missing_key() {
        let req = request(&[("api", "seoul")]);
        let d = direct(table().route(&req, &vault()).unwrap());
        assert_eq!(d.url.path(), "/json/VwsmTrdarSelngQq/1/1000");

        let err = table()
            .route(&req, &CredentialVault::default())
            .unwrap_err();
        assert!(matches!(err, ProxyError::CredentialMissing { .. }));
    }

    #[test]
    fn test_admin_lookup_descriptor() {
        let bbox = BoundingBox::around(wgs84_to_planar(38.0, 127.0), 2000, 14);
        let d = table().admin_lookup(&bbox).unwrap();

        assert_eq!(d.url.path(), "/gis/api/searchAdmiList.json");
        assert_eq!(query_value(&d, "minXAxis"), Some("198000"));
        assert!(!d.verify_tls);
        assert_eq!(d.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_local_search_descriptor() {
        let params = vec![
            ("query".to_string(), "coffee".to_string()),
            ("display".to_string(), "5".to_string()),
            ("callback".to_string(), "x".to_string()),
        ];
        let d = table().local_search(&params, &vault()).unwrap();

        assert_eq!(query_value(&d, "query"), Some("coffee"));
        assert_eq!(query_value(&d, "callback"), None);
        assert!(d.verify_tls);
        let headers: Vec<_> = d.credential_headers().collect();
        assert_eq!(headers.len(), 2);
        assert!(!d.resolve().as_str().contains("client-secret"));
    }

    #[test]
    fn test_local_search_requires_query() {
        let params = vec![("query".to_string(), "  ".to_string())];
        match table().local_search(&params, &vault()).unwrap_err() {
            ProxyError::Validation { field, .. } => assert_eq!(field, "query"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
