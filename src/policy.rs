use crate::models::{Claims, Decision, RedirectTarget, Role, RouteCategory};

/// evaluate
///
/// The gate's decision table. A pure function of its inputs: no clock read, no
/// shared state, same answer every time.
///
/// | Category  | Visitor                 | Decision                |
/// |-----------|-------------------------|-------------------------|
/// | Dashboard | anonymous or User       | redirect to site root   |
/// | Dashboard | Admin / Administrator   | allow                   |
/// | Profile   | anonymous               | redirect to login page  |
/// | Profile   | Admin / Administrator   | redirect to dashboard   |
/// | Profile   | User                    | allow                   |
/// | AuthPage  | Admin / Administrator   | redirect to dashboard   |
/// | AuthPage  | User                    | redirect to site root   |
/// | AuthPage  | anonymous               | allow                   |
/// | Public    | anyone                  | allow                   |
///
/// Claims that have expired at `now` count as anonymous.
///
/// Every (category, role) pair is spelled out below without wildcard arms. Adding a
/// role or a category will not compile until its row is written.
pub fn evaluate(category: RouteCategory, claims: Option<&Claims>, now: i64) -> Decision {
    use Decision::{Allow, RedirectTo};
    use RedirectTarget::{DashboardRoot, LoginPage, SiteRoot};

    let role = claims
        .filter(|claims| claims.is_live_at(now))
        .map(|claims| claims.role);

    match (category, role) {
        (RouteCategory::Dashboard, None | Some(Role::User)) => RedirectTo(SiteRoot),
        (RouteCategory::Dashboard, Some(Role::Admin | Role::Administrator)) => Allow,

        (RouteCategory::Profile, None) => RedirectTo(LoginPage),
        (RouteCategory::Profile, Some(Role::Admin | Role::Administrator)) => {
            RedirectTo(DashboardRoot)
        }
        (RouteCategory::Profile, Some(Role::User)) => Allow,

        (RouteCategory::AuthPage, Some(Role::Admin | Role::Administrator)) => {
            RedirectTo(DashboardRoot)
        }
        (RouteCategory::AuthPage, Some(Role::User)) => RedirectTo(SiteRoot),
        (RouteCategory::AuthPage, None) => Allow,

        // Public pages ignore the visitor, admins included.
        (RouteCategory::Public, None | Some(Role::User | Role::Admin | Role::Administrator)) => {
            Allow
        }
    }
}
