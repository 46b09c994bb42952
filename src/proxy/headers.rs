//! Header manipulation for forwarded requests and responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Point `Host` at the upstream and record the original in `X-Forwarded-Host`
//! - Append the client address to `X-Forwarded-For`
//! - Rewrite upstream redirects back onto the host the client used

use std::net::SocketAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::{Authority, Uri};
use axum::http::StatusCode;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Prepare inbound request headers for the upstream.
pub fn prepare_request(
    headers: &mut HeaderMap,
    upstream: &Authority,
    original_host: Option<&HeaderValue>,
    peer: Option<SocketAddr>,
) {
    strip_hop_by_hop(headers);

    if let Ok(host) = HeaderValue::from_str(upstream.as_str()) {
        headers.insert(header::HOST, host);
    }

    if let Some(original) = original_host {
        if !headers.contains_key(&X_FORWARDED_HOST) {
            headers.insert(X_FORWARDED_HOST, original.clone());
        }
    }

    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }

    if let Some(peer) = peer {
        let client_ip = peer.ip().to_string();
        let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}

/// Prepare upstream response headers for the client.
///
/// Redirects (201 and 3xx with `Location`) that point at the upstream itself
/// are rewritten onto the host the client originally addressed.
pub fn prepare_response(
    status: StatusCode,
    headers: &mut HeaderMap,
    upstream: &Authority,
    original_host: Option<&HeaderValue>,
) {
    strip_hop_by_hop(headers);

    if !(status == StatusCode::CREATED || status.is_redirection()) {
        return;
    }
    let Some(original_host) = original_host.and_then(|v| v.to_str().ok()) else {
        return;
    };
    let Some(location) = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uri>().ok())
    else {
        return;
    };

    if location.authority() != Some(upstream) {
        return;
    }

    let path = location.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let scheme = location.scheme_str().unwrap_or("http");
    let rewritten = format!("{}://{}{}", scheme, original_host, path);
    if let Ok(value) = HeaderValue::from_str(&rewritten) {
        tracing::debug!(location = %rewritten, "Rewrote upstream redirect");
        headers.insert(header::LOCATION, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_strips_hop_by_hop_and_connection_listed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session-hint"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session-hint", HeaderValue::from_static("abc"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get("x-session-hint").is_none());
        assert!(headers.get(header::ACCEPT).is_some());
    }

    #[test]
    fn test_prepare_request_sets_forwarding_headers() {
        let mut headers = HeaderMap::new();
        let original = HeaderValue::from_static("www.example.com");
        headers.insert(header::HOST, original.clone());
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));

        let upstream = Authority::from_str("127.0.0.1:9000").unwrap();
        let peer: SocketAddr = "192.168.1.7:51234".parse().unwrap();
        prepare_request(&mut headers, &upstream, Some(&original), Some(peer));

        assert_eq!(headers[header::HOST], "127.0.0.1:9000");
        assert_eq!(headers[X_FORWARDED_HOST], "www.example.com");
        assert_eq!(headers[X_FORWARDED_PROTO], "http");
        assert_eq!(headers[X_FORWARDED_FOR], "10.0.0.1, 192.168.1.7");
    }

    #[test]
    fn test_redirect_to_upstream_is_rewritten() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::LOCATION,
            HeaderValue::from_static("http://127.0.0.1:9000/login?next=%2F"),
        );
        let upstream = Authority::from_str("127.0.0.1:9000").unwrap();
        let original = HeaderValue::from_static("www.example.com");

        prepare_response(StatusCode::FOUND, &mut headers, &upstream, Some(&original));

        assert_eq!(headers[header::LOCATION], "http://www.example.com/login?next=%2F");
    }

    #[test]
    fn test_foreign_or_non_redirect_location_untouched() {
        let upstream = Authority::from_str("127.0.0.1:9000").unwrap();
        let original = HeaderValue::from_static("www.example.com");

        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("http://sso.example.org/auth"));
        prepare_response(StatusCode::FOUND, &mut headers, &upstream, Some(&original));
        assert_eq!(headers[header::LOCATION], "http://sso.example.org/auth");

        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("http://127.0.0.1:9000/x"));
        prepare_response(StatusCode::OK, &mut headers, &upstream, Some(&original));
        assert_eq!(headers[header::LOCATION], "http://127.0.0.1:9000/x");
    }
}
