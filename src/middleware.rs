use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, Uri, header, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    classifier::{canonicalize_path, encode_path},
    config::GateConfig,
    error::PathError,
    models::Decision,
};

/// RequestMatcher
///
/// Decides which requests are routed through the gate at all. A request is skipped
/// when its path, minus the leading '/', starts with one of the excluded prefixes
/// (API routes, build assets, favicon, sitemap, robots file).
#[derive(Clone, Debug)]
pub struct RequestMatcher {
    excluded: Vec<String>,
}

impl RequestMatcher {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.excluded_paths.iter().cloned())
    }

    pub fn is_gated(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        !self
            .excluded
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Reads a cookie value from every `Cookie` header on the request. Headers that are
/// not valid visible ASCII are ignored; the first matching pair wins.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// edge_gate
///
/// Applies the gate's decision to a request before anything else handles it.
///
/// - The path is canonicalized first and the request is rewritten to it, so the
///   exclusion filter, the classifier and the inner service all see the same path.
///   Paths that cannot be canonicalized get `400 Bad Request`.
/// - Requests the matcher excludes go straight through.
/// - `Allow` forwards the request.
/// - `RedirectTo` answers with `307 Temporary Redirect` and the inner service never
///   sees the request.
pub async fn edge_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = match canonicalize_path(request.uri().path()) {
        Ok(path) => path,
        Err(reason) => return reject_path(request.uri().path(), reason),
    };
    if let Err(reason) = rewrite_path(&mut request, &path) {
        return reject_path(request.uri().path(), reason);
    }

    if !state.matcher.is_gated(&path) {
        return next.run(request).await;
    }

    let token = read_cookie(request.headers(), &state.config.gate.cookie_name);
    let now = Utc::now().timestamp();
    let evaluation = state.gate.inspect(token, &path, now);

    tracing::debug!(
        target: "edge_gate.decision",
        path = %path,
        category = ?evaluation.category,
        authenticated = evaluation.authenticated,
        decision = ?evaluation.decision,
        "Gate evaluated request"
    );

    match evaluation.decision {
        Decision::Allow => next.run(request).await,
        Decision::RedirectTo(target) => {
            Redirect::temporary(state.config.gate.target_path(target)).into_response()
        }
    }
}

/// Replaces the request's path with its canonical encoding, keeping the query.
fn rewrite_path(request: &mut Request, canonical: &str) -> Result<(), PathError> {
    let encoded = encode_path(canonical);
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{encoded}?{query}"),
        None => encoded,
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query =
        Some(PathAndQuery::try_from(path_and_query).map_err(|_| PathError::InvalidEncoding)?);
    *request.uri_mut() = Uri::from_parts(parts).map_err(|_| PathError::InvalidEncoding)?;
    Ok(())
}

fn reject_path(raw: &str, reason: PathError) -> Response {
    tracing::debug!(target: "edge_gate.decision", path = raw, %reason, "Request path rejected");
    (StatusCode::BAD_REQUEST, reason.to_string()).into_response()
}
