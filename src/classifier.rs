use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::{config::GateConfig, error::PathError, models::RouteCategory};

/// Everything but RFC 3986 unreserved characters is escaped inside a segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// PathClassifier
///
/// Maps a request path to exactly one `RouteCategory`. Rules are evaluated in a fixed
/// priority order and the first match wins:
///
/// 1. starts with the dashboard prefix  -> `Dashboard`
/// 2. equals the profile path           -> `Profile`
/// 3. starts with the auth prefix       -> `AuthPage`
/// 4. anything else                     -> `Public`
///
/// Prefix rules are plain string prefixes, matching how the site's links are laid out
/// (`/dashboard`, `/dashboard/users`, ...).
#[derive(Clone, Debug)]
pub struct PathClassifier {
    dashboard_prefix: String,
    profile_path: String,
    auth_prefix: String,
}

impl PathClassifier {
    pub fn new(
        dashboard_prefix: impl Into<String>,
        profile_path: impl Into<String>,
        auth_prefix: impl Into<String>,
    ) -> Self {
        Self {
            dashboard_prefix: dashboard_prefix.into(),
            profile_path: profile_path.into(),
            auth_prefix: auth_prefix.into(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            config.dashboard_prefix.clone(),
            config.profile_path.clone(),
            config.auth_prefix.clone(),
        )
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        let path = normalize_path(path);

        if path.starts_with(&self.dashboard_prefix) {
            RouteCategory::Dashboard
        } else if path == self.profile_path {
            RouteCategory::Profile
        } else if path.starts_with(&self.auth_prefix) {
            RouteCategory::AuthPage
        } else {
            RouteCategory::Public
        }
    }
}

/// An empty path is the site root; one trailing slash is insignificant
/// (`/profile/` is `/profile`).
pub fn normalize_path(path: &str) -> &str {
    match path {
        "" => "/",
        "/" => path,
        _ => path.strip_suffix('/').unwrap_or(path),
    }
}

/// canonicalize_path
///
/// The one spelling of a request path that the gate both judges and forwards.
/// Percent-escapes are decoded, a backslash counts as a separator, empty and `.` segments
/// are dropped and `..` removes the previous segment (never climbing above `/`).
/// A trailing separator is kept.
///
/// Encoded separators (`%2F`, `%5C`) and control characters are refused: there is
/// no spelling of them every downstream parser agrees on.
pub fn canonicalize_path(raw: &str) -> Result<String, PathError> {
    let lowered = raw.to_ascii_lowercase();
    if lowered.contains("%2f") || lowered.contains("%5c") {
        return Err(PathError::EncodedSeparator);
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding)?;
    if decoded.chars().any(char::is_control) {
        return Err(PathError::ControlCharacter);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut canonical = format!("/{}", segments.join("/"));
    if !segments.is_empty() && decoded.ends_with(['/', '\\']) {
        canonical.push('/');
    }
    Ok(canonical)
}

/// Percent-encodes a canonical path segment by segment for use in a URI.
pub fn encode_path(canonical: &str) -> String {
    canonical
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
