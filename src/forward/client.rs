//! HTTP forwarder built on the hyper-util legacy client.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the backend target
//! - Strip hop-by-hop headers in both directions
//! - Append the client IP to `X-Forwarded-For`
//! - Bound every forward attempt with the upstream timeout

use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, Request, Response, Uri,
    },
};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::{Position, Url};

use crate::forward::{ForwardError, Forwarder, UpstreamRequest};

/// Headers that apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Forwards requests over plain HTTP using a shared pooled client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    /// Create a forwarder whose attempts time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { client, timeout }
    }
}

impl Forwarder for HttpForwarder {
    fn forward<'a>(
        &'a self,
        target: &'a Url,
        request: UpstreamRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
        Box::pin(async move {
            let outbound = build_outbound(target, request)?;

            match tokio::time::timeout(self.timeout, self.client.request(outbound)).await {
                Ok(Ok(response)) => {
                    let (mut parts, body) = response.into_parts();
                    strip_hop_by_hop(&mut parts.headers);
                    Ok(Response::from_parts(parts, Body::new(body)))
                }
                Ok(Err(e)) => Err(ForwardError::Transport(e)),
                Err(_) => Err(ForwardError::Timeout(self.timeout)),
            }
        })
    }
}

/// Build the request sent to `target` from a buffered inbound request.
fn build_outbound(target: &Url, request: UpstreamRequest) -> Result<Request<Body>, ForwardError> {
    let uri = rewrite_uri(target, &request.uri)?;

    let mut headers = request.headers;
    strip_hop_by_hop(&mut headers);
    if let Some(client_addr) = request.client_addr {
        append_forwarded_for(&mut headers, &client_addr.ip().to_string());
    }

    let mut outbound = Request::builder()
        .method(request.method)
        .uri(uri)
        .body(Body::from(request.body))
        .map_err(|e| ForwardError::InvalidTarget(e.to_string()))?;
    *outbound.headers_mut() = headers;

    Ok(outbound)
}

/// Map an inbound URI onto the backend target.
///
/// The target's base path is joined with the request path using exactly one
/// slash, and a target query is prepended to the request query.
pub fn rewrite_uri(target: &Url, uri: &Uri) -> Result<Uri, ForwardError> {
    let authority = &target[Position::BeforeHost..Position::AfterPort];
    if authority.is_empty() {
        return Err(ForwardError::InvalidTarget(format!("{} has no host", target)));
    }

    let path = join_paths(target.path(), uri.path());

    let target_query = target.query().unwrap_or("");
    let request_query = uri.query().unwrap_or("");
    let query = if target_query.is_empty() || request_query.is_empty() {
        format!("{}{}", target_query, request_query)
    } else {
        format!("{}&{}", target_query, request_query)
    };

    let path_and_query = if query.is_empty() {
        path
    } else {
        format!("{}?{}", path, query)
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ForwardError::InvalidTarget(e.to_string()))
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, client_ip: &str) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, client_ip),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
