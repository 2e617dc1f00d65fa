use std::{env, net::SocketAddr};

use crate::{error::ConfigError, models::RedirectTarget};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOCAL_UPSTREAM: &str = "http://localhost:3001";

/// Requests whose path (without the leading '/') starts with one of these never reach
/// the gate: API routes, build-internal assets, and crawler/browser well-known files.
pub const DEFAULT_EXCLUDED_PATHS: [&str; 6] = [
    "api",
    "_next/static",
    "_next/image",
    "favicon.ico",
    "sitemap.xml",
    "robots.txt",
];

/// AppConfig
///
/// Holds the service's entire configuration. Built once at start-up and never mutated
/// afterwards; handlers and middleware pull it from the shared state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and which variables are mandatory.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    // Base URL of the page renderer that allowed requests are forwarded to.
    pub upstream_url: String,
    // Everything the gate itself needs to evaluate a request.
    pub gate: GateConfig,
}

/// Env
///
/// Defines the runtime context. Local favours readable logs and fallbacks,
/// Production demands every deployment-specific value explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// GateConfig
///
/// The static configuration surface of the edge gate: which cookie carries the
/// session token, the prefixes/paths that define each route category, where
/// redirects point, and which requests bypass the gate entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    pub cookie_name: String,
    /// Prefix of the admin area. Also the `DashboardRoot` redirect target.
    pub dashboard_prefix: String,
    /// Exact path of the user profile page.
    pub profile_path: String,
    /// Prefix shared by login, registration and password reset pages.
    pub auth_prefix: String,
    pub login_path: String,
    pub site_root: String,
    pub excluded_paths: Vec<String>,
    /// When set, session tokens must carry a valid HS256 signature made with this secret.
    /// When unset, tokens are only checked for structure and expiry.
    pub jwt_secret: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            dashboard_prefix: "/dashboard".to_string(),
            profile_path: "/profile".to_string(),
            auth_prefix: "/auth".to_string(),
            login_path: "/auth/login".to_string(),
            site_root: "/".to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            jwt_secret: None,
        }
    }
}

impl GateConfig {
    /// Resolves a redirect target to the absolute path sent in the `Location` header.
    pub fn target_path(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::SiteRoot => &self.site_root,
            RedirectTarget::LoginPage => &self.login_path,
            RedirectTarget::DashboardRoot => &self.dashboard_prefix,
        }
    }

    /// Rejects path settings that could never match a request path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("GATE_DASHBOARD_PREFIX", &self.dashboard_prefix),
            ("GATE_PROFILE_PATH", &self.profile_path),
            ("GATE_AUTH_PREFIX", &self.auth_prefix),
            ("GATE_LOGIN_PATH", &self.login_path),
            ("GATE_SITE_ROOT", &self.site_root),
        ];

        for (var, value) in paths {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    var,
                    value: value.clone(),
                });
            }
        }

        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "GATE_COOKIE_NAME",
                reason: "cookie name cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// A ready-to-use local configuration, mainly for tests and embedding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upstream_url: DEFAULT_LOCAL_UPSTREAM.to_string(),
            gate: GateConfig::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first if a
    /// `.env` file should be honoured). Fails fast: an invalid value or a variable
    /// that is mandatory in production aborts start-up with a `ConfigError`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        // Upstream resolution. Production must name its page renderer explicitly.
        let upstream_url = match (env::var("UPSTREAM_URL").ok(), &env) {
            (Some(url), _) => url,
            (None, Env::Production) => return Err(ConfigError::MissingVar("UPSTREAM_URL")),
            (None, Env::Local) => DEFAULT_LOCAL_UPSTREAM.to_string(),
        };

        let bind_addr = var_or("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let defaults = GateConfig::default();
        let excluded_paths = match env::var("GATE_EXCLUDED_PATHS") {
            Ok(list) => parse_list(&list),
            Err(_) => defaults.excluded_paths,
        };

        let gate = GateConfig {
            cookie_name: var_or("GATE_COOKIE_NAME", &defaults.cookie_name),
            dashboard_prefix: var_or("GATE_DASHBOARD_PREFIX", &defaults.dashboard_prefix),
            profile_path: var_or("GATE_PROFILE_PATH", &defaults.profile_path),
            auth_prefix: var_or("GATE_AUTH_PREFIX", &defaults.auth_prefix),
            login_path: var_or("GATE_LOGIN_PATH", &defaults.login_path),
            site_root: var_or("GATE_SITE_ROOT", &defaults.site_root),
            excluded_paths,
            jwt_secret: env::var("GATE_JWT_SECRET").ok().filter(|s| !s.is_empty()),
        };
        gate.validate()?;

        Ok(Self {
            env,
            bind_addr,
            upstream_url,
            gate,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma-separated list, trimming whitespace and any leading '/' so that
/// `/api` and `api` configure the same exclusion.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().trim_start_matches('/'))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
