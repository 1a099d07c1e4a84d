//! Pure access-policy derivation.
//!
//! Nothing here talks to the backend or the store. Capabilities are a
//! function of the current session and guard decisions are a function of
//! capabilities; a denied check redirects, it never mutates.

use crate::session::{Role, Session};

/// Capability flags derived from the current session. Never stored;
/// recompute after every session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub is_subscribed: bool,
}

impl Capabilities {
    /// Derive the flags from a session, present or absent.
    pub fn of(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self {
                is_authenticated: true,
                is_admin: session.user.role == Role::Admin,
                is_subscribed: session.user.is_subscribed,
            },
            None => Self::default(),
        }
    }
}

/// What a view requires before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Anyone, signed in or not.
    Public,
    /// Any authenticated account.
    RequiresAuth,
    /// Admin role only. Checked on the role flag alone, so an
    /// unauthenticated caller lands on Home, not Login.
    AdminOnly,
    /// Active subscription; admins bypass the check.
    SubscriberOnly,
}

/// Navigation target for a denied view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Pricing,
}

impl Route {
    /// The client-side path for this route.
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Pricing => "/pricing",
        }
    }
}

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Evaluate a view's access rule against the caller's capabilities.
pub fn evaluate(rule: AccessRule, caps: Capabilities) -> GuardDecision {
    match rule {
        AccessRule::Public => GuardDecision::Allow,
        AccessRule::RequiresAuth => {
            if caps.is_authenticated {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(Route::Login)
            }
        }
        AccessRule::AdminOnly => {
            if caps.is_admin {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(Route::Home)
            }
        }
        AccessRule::SubscriberOnly => {
            if !caps.is_authenticated {
                GuardDecision::Redirect(Route::Login)
            } else if caps.is_subscribed || caps.is_admin {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(Route::Pricing)
            }
        }
    }
}
