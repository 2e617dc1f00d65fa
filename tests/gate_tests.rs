use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, Uri, header},
    response::Response,
};
use edge_gate::{
    AppConfig, AppState, Decision, Gate, GateConfig, RedirectTarget, create_router,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tower::ServiceExt;

// --- Helper Functions ---

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn token(role: &str, exp: i64) -> String {
    let claims = json!({
        "sub": "3b8f1c2e-0000-4000-8000-000000000001",
        "email": "visitor@example.com",
        "role": role,
        "iat": now(),
        "exp": exp,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"issuer-secret"),
    )
    .unwrap()
}

/// Stand-in page renderer: echoes the path it was asked to render.
fn fake_upstream() -> Router {
    Router::new().fallback(|uri: Uri| async move { format!("page {}", uri.path()) })
}

fn app_with(config: AppConfig) -> Router {
    create_router(AppState::new(config), fake_upstream())
}

fn app() -> Router {
    app_with(AppConfig::default())
}

async fn get(app: Router, path: &str, cookie: Option<String>) -> Response {
    let mut request = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn assert_passes(response: Response, path: &str) {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, format!("page {path}"));
}

fn assert_redirects(response: &Response, target: &str) {
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response), target);
}

// --- Gate scenarios ---

#[test]
fn test_gate_scenarios() {
    let gate = Gate::from_config(&GateConfig::default());
    let now = now();

    let admin = token("admin", now + 3600);
    let administrator = token("administrator", now + 3600);
    let user = token("user", now + 3600);
    let expired_user = token("user", now - 1);

    assert_eq!(
        gate.evaluate(None, "/dashboard/users", now),
        Decision::RedirectTo(RedirectTarget::SiteRoot)
    );
    assert_eq!(gate.evaluate(Some(&admin), "/dashboard", now), Decision::Allow);
    assert_eq!(gate.evaluate(Some(&user), "/profile", now), Decision::Allow);
    assert_eq!(
        gate.evaluate(Some(&admin), "/profile", now),
        Decision::RedirectTo(RedirectTarget::DashboardRoot)
    );
    assert_eq!(
        gate.evaluate(Some(&administrator), "/auth/login", now),
        Decision::RedirectTo(RedirectTarget::DashboardRoot)
    );
    assert_eq!(gate.evaluate(None, "/auth/login", now), Decision::Allow);
    assert_eq!(gate.evaluate(Some(&expired_user), "/gallery", now), Decision::Allow);
}

#[test]
fn test_gate_inspect_reports_intermediate_results() {
    let gate = Gate::from_config(&GateConfig::default());
    let now = now();
    let user = token("user", now + 60);

    let evaluation = gate.inspect(Some(&user), "/dashboard", now);
    assert_eq!(evaluation.category, edge_gate::RouteCategory::Dashboard);
    assert!(evaluation.authenticated);
    assert_eq!(evaluation.decision, Decision::RedirectTo(RedirectTarget::SiteRoot));

    let garbage = gate.inspect(Some("garbage"), "/auth/register", now);
    assert!(!garbage.authenticated);
    assert_eq!(garbage.decision, Decision::Allow);
}

#[test]
fn test_expired_token_matches_no_token_for_every_path() {
    let gate = Gate::from_config(&GateConfig::default());
    let now = now();
    let expired = token("admin", now);

    for path in ["/dashboard", "/profile", "/auth/login", "/gallery", "/"] {
        assert_eq!(
            gate.evaluate(Some(&expired), path, now),
            gate.evaluate(None, path, now),
            "path {path}"
        );
    }
}

// --- Router scenarios ---

#[tokio::test]
async fn test_dashboard_without_token_redirects_to_root() {
    let response = get(app(), "/dashboard/users", None).await;
    assert_redirects(&response, "/");
}

#[tokio::test]
async fn test_dashboard_with_admin_token_passes_through() {
    let cookie = format!("token={}", token("admin", now() + 3600));
    let response = get(app(), "/dashboard", Some(cookie)).await;
    assert_passes(response, "/dashboard").await;
}

#[tokio::test]
async fn test_profile_with_user_token_passes_through() {
    let cookie = format!("token={}", token("user", now() + 3600));
    let response = get(app(), "/profile", Some(cookie)).await;
    assert_passes(response, "/profile").await;
}

#[tokio::test]
async fn test_profile_with_admin_token_redirects_to_dashboard() {
    let cookie = format!("token={}", token("admin", now() + 3600));
    let response = get(app(), "/profile", Some(cookie)).await;
    assert_redirects(&response, "/dashboard");
}

#[tokio::test]
async fn test_profile_without_token_redirects_to_login() {
    let response = get(app(), "/profile", None).await;
    assert_redirects(&response, "/auth/login");
}

#[tokio::test]
async fn test_login_page_with_administrator_token_redirects_to_dashboard() {
    let cookie = format!("token={}", token("administrator", now() + 3600));
    let response = get(app(), "/auth/login", Some(cookie)).await;
    assert_redirects(&response, "/dashboard");
}

#[tokio::test]
async fn test_login_page_with_user_token_redirects_to_root() {
    let cookie = format!("token={}", token("user", now() + 3600));
    let response = get(app(), "/auth/register", Some(cookie)).await;
    assert_redirects(&response, "/");
}

#[tokio::test]
async fn test_login_page_without_token_passes_through() {
    let response = get(app(), "/auth/login", None).await;
    assert_passes(response, "/auth/login").await;
}

#[tokio::test]
async fn test_public_page_with_expired_token_passes_through() {
    let cookie = format!("token={}", token("user", now() - 1));
    let response = get(app(), "/gallery", Some(cookie)).await;
    assert_passes(response, "/gallery").await;
}

#[tokio::test]
async fn test_token_found_among_other_cookies() {
    let cookie = format!(
        "theme=dark; token={}; consent=yes",
        token("admin", now() + 3600)
    );
    let response = get(app(), "/dashboard/settings", Some(cookie)).await;
    assert_passes(response, "/dashboard/settings").await;
}

#[tokio::test]
async fn test_token_in_wrong_cookie_is_ignored() {
    let cookie = format!("session={}", token("admin", now() + 3600));
    let response = get(app(), "/dashboard", Some(cookie)).await;
    assert_redirects(&response, "/");
}

#[tokio::test]
async fn test_custom_cookie_name_and_targets() {
    let mut config = AppConfig::default();
    config.gate.cookie_name = "sb-session".to_string();
    config.gate.dashboard_prefix = "/admin".to_string();
    config.gate.login_path = "/auth/sign-in".to_string();

    let cookie = format!("sb-session={}", token("admin", now() + 3600));
    let response = get(app_with(config.clone()), "/profile", Some(cookie)).await;
    assert_redirects(&response, "/admin");

    let response = get(app_with(config), "/profile", None).await;
    assert_redirects(&response, "/auth/sign-in");
}

#[tokio::test]
async fn test_excluded_paths_bypass_the_gate() {
    let mut config = AppConfig::default();
    config.gate.excluded_paths.push("dashboard/assets".to_string());

    // Would redirect if it were gated.
    let response = get(app_with(config.clone()), "/dashboard/assets/logo.png", None).await;
    assert_passes(response, "/dashboard/assets/logo.png").await;

    for path in ["/api/projects", "/_next/static/chunk.js", "/favicon.ico", "/robots.txt"] {
        let response = get(app_with(config.clone()), path, None).await;
        assert_passes(response, path).await;
    }

    let response = get(app_with(config), "/dashboard", None).await;
    assert_redirects(&response, "/");
}

#[tokio::test]
async fn test_health_is_served_locally_and_carries_request_id() {
    let response = get(app(), "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["token_mode"], "structural");
}

#[tokio::test]
async fn test_verified_mode_rejects_forged_admin_token() {
    let mut config = AppConfig::default();
    config.gate.jwt_secret = Some("the-real-secret".to_string());

    // Signed with "issuer-secret", not the configured secret.
    let cookie = format!("token={}", token("admin", now() + 3600));
    let response = get(app_with(config), "/dashboard", Some(cookie)).await;
    assert_redirects(&response, "/");
}

// --- Path canonicalization ---

#[tokio::test]
async fn test_dot_segments_cannot_reach_dashboard_without_token() {
    for path in [
        "/gallery/../dashboard/users",
        "/api/../dashboard",
        "/./dashboard",
        "/%64ashboard",
        "/gallery/%2e%2e/dashboard",
    ] {
        let response = get(app(), path, None).await;
        assert_redirects(&response, "/");
    }
}

#[tokio::test]
async fn test_dot_segments_cannot_reach_profile_without_token() {
    let response = get(app(), "/x/%2e%2e/profile", None).await;
    assert_redirects(&response, "/auth/login");

    let response = get(app(), "/gallery/../profile/", None).await;
    assert_redirects(&response, "/auth/login");
}

#[tokio::test]
async fn test_excluded_prefix_is_judged_after_resolution() {
    // Resolves into an excluded prefix, so it passes ungated with the resolved path.
    let response = get(app(), "/dashboard/../api/projects", None).await;
    assert_passes(response, "/api/projects").await;
}

#[tokio::test]
async fn test_upstream_sees_the_path_that_was_judged() {
    let cookie = format!("token={}", token("admin", now() + 3600));
    let response = get(app(), "/gallery/../dashboard/./users", Some(cookie)).await;
    assert_passes(response, "/dashboard/users").await;

    let response = get(app(), "/gallery/./art//pieces/", None).await;
    assert_passes(response, "/gallery/art/pieces/").await;
}

#[tokio::test]
async fn test_ambiguous_paths_are_bad_requests() {
    for path in ["/gallery%2f..%2fdashboard", "/gallery%5C..%5Cdashboard", "/dash%00board"] {
        let response = get(app(), path, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "path {path}");
    }
}
