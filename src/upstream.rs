use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use reqwest::{Client, Url, redirect};
use std::error::Error as StdError;

use crate::error::ProxyError;

/// Largest request body forwarded to the page renderer (form posts, uploads).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single connection and must not be relayed (RFC 9110 §7.6.1).
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Upstream
///
/// The page renderer behind the gate. Every request the gate allows is replayed
/// against `base_url` and the response is relayed verbatim, redirects included.
#[derive(Clone, Debug)]
pub struct Upstream {
    client: Client,
    base_url: Url,
}

impl Upstream {
    pub fn new(base_url: &str) -> Result<Self, ProxyError> {
        let base_url = Url::parse(base_url).map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;

        // The browser, not the gate, follows the renderer's redirects.
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Router that forwards every request it receives to this upstream.
    pub fn into_router(self) -> Router {
        Router::new().fallback(proxy).with_state(self)
    }

    /// Resolves the request path against `base_url`. The url parser would silently
    /// resolve dot segments, so a path it rewrites is refused instead of forwarded.
    fn target_url(&self, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
        let expected = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);

        let mut url = self.base_url.clone();
        url.set_path(&expected);
        url.set_query(query);

        if url.path() != expected {
            return Err(ProxyError::NonCanonicalPath(path.to_string()));
        }
        Ok(url)
    }
}

/// proxy
///
/// Replays the request (method, path and query, headers, body) against the upstream.
pub async fn proxy(
    State(upstream): State<Upstream>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let url = upstream.target_url(parts.uri.path(), parts.uri.query())?;

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        let inner = e.into_inner();
        if exceeds_limit(&*inner) {
            ProxyError::PayloadTooLarge {
                limit: MAX_BODY_BYTES,
            }
        } else {
            ProxyError::Body(inner.to_string())
        }
    })?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    // reqwest derives Host from the target url.
    headers.remove(header::HOST);

    tracing::debug!(target: "edge_gate.upstream", method = %parts.method, %url, "Forwarding request");

    let upstream_response = upstream
        .client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream_response.status();
    let mut response_headers = upstream_response.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    let bytes = upstream_response.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn exceeds_limit(error: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(error), |&e: &&(dyn StdError + 'static)| e.source()).any(|e| e.is::<LengthLimitError>())
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
