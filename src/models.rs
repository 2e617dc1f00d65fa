use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// --- Identity ---

/// Role
///
/// The closed set of roles a session token may carry. Every policy decision matches
/// on this enum exhaustively, so introducing a role forces each route category's
/// handling to be revisited.
///
/// Parsing is case-insensitive (`"admin"`, `"ADMIN"` and `"Admin"` are the same role).
/// Serialization always uses the lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    User,
    Admin,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role {:?}", self.0)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Claims
///
/// The decoded payload of a session token. Issued by the login/registration flow
/// (outside this service) and only ever read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): identifier of the signed-in account.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued At (iat), Unix seconds.
    pub iat: i64,
    /// Expiration Time (exp), Unix seconds. The token is usable while `exp > now`.
    pub exp: i64,
}

impl Claims {
    pub fn is_live_at(&self, now: i64) -> bool {
        self.exp > now
    }
}

// --- Routing ---

/// RouteCategory
///
/// Every request path falls into exactly one category; the category selects the
/// row of the policy table that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteCategory {
    /// Admin-only area.
    Dashboard,
    /// Login, registration and password reset pages.
    AuthPage,
    /// Signed-in user's own page.
    Profile,
    Public,
}

/// RedirectTarget
///
/// The fixed set of places the gate may send a visitor. The concrete path for
/// each target is resolved from `GateConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectTarget {
    SiteRoot,
    LoginPage,
    DashboardRoot,
}

/// Decision
///
/// The gate's only output for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(RedirectTarget),
}
