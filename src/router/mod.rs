// Privilege-gated navigation: the guard consulted before route transitions,
// and the navigator seam the pipeline uses to redirect on session expiry.
use std::sync::Arc;

use url::form_urlencoded;

use crate::alert::{AlertGate, AlertKind};
use crate::session::TokenStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const REDIRECT_QUERY_PARAM: &str = "redirect";

/// Access requirement attached to a route, mirroring the route table's
/// `requiresAuth` / `minPrivilege` metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No credential needed.
    Public,
    /// Credential must be present.
    Authenticated,
    /// Credential must be present and carry at least this privilege level.
    Privileged(i64),
}

/// Outcome of a guard check. The embedding router enacts the decision; the
/// cancelled transition is never queued or replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Transition cancelled; navigate to the login route instead, carrying
    /// the original target so it can be restored after login.
    RedirectToLogin { redirect: String },
    /// Transition cancelled; stay on the current route.
    Cancel,
}

/// Abstraction over the embedding application's router. The pipeline reads
/// the current path when a session expires and requests the login redirect
/// through it.
pub trait Navigator: Send + Sync {
    /// Full path of the current route, including query.
    fn current_path(&self) -> String;
    /// Navigate to the given path. Navigating to the route already being
    /// shown must be a no-op.
    fn go(&self, path: String);
}

/// Login route carrying the given path in the redirect query parameter.
pub fn login_redirect(redirect: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_QUERY_PARAM, redirect)
        .finish();
    format!("{LOGIN_ROUTE}?{query}")
}

/// Consulted before every route transition. Resolves fully, including any
/// alert dismissal, before the transition proceeds or is cancelled.
pub struct NavigationGuard {
    session: Arc<TokenStore>,
    gate: Arc<AlertGate>,
}

impl NavigationGuard {
    pub fn new(session: Arc<TokenStore>, gate: Arc<AlertGate>) -> Self {
        Self { session, gate }
    }

    pub async fn check(&self, target: &str, access: RouteAccess) -> GuardDecision {
        let min_privilege = match access {
            RouteAccess::Public => return GuardDecision::Allow,
            RouteAccess::Authenticated => None,
            RouteAccess::Privileged(min) => Some(min),
        };

        if self.session.get().is_none() {
            tracing::debug!(target, "guard: no credential, redirecting to login");
            self.gate.show_once(AlertKind::LoginRequired).await;
            return GuardDecision::RedirectToLogin {
                redirect: login_redirect(target),
            };
        }

        if let Some(min) = min_privilege {
            let level = self.session.privilege_level();
            if level < min {
                tracing::debug!(target, level, min, "guard: insufficient privileges");
                self.gate.show_once(AlertKind::InsufficientPrivileges).await;
                return GuardDecision::Cancel;
            }
        }

        GuardDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_encodes_query() {
        assert_eq!(
            login_redirect("/host/3/detail?tab=items"),
            "/login?redirect=%2Fhost%2F3%2Fdetail%3Ftab%3Ditems"
        );
    }
}
