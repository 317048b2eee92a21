//! Handler-level admin guard.
//!
//! The second enforcement point behind the middleware. It decides only from the
//! `AuthContext` the middleware attached to the request.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use super::{AuthContext, IdentityState, HOME_PATH};

/// What an admin view should do for the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity not resolved yet; show a placeholder.
    Loading,
    Redirect(&'static str),
    Render,
}

pub fn guard(identity: &IdentityState) -> GuardDecision {
    match identity {
        IdentityState::Unresolved => GuardDecision::Loading,
        IdentityState::Resolved(user) if user.is_admin() => GuardDecision::Render,
        IdentityState::Resolved(_) => GuardDecision::Redirect(HOME_PATH),
    }
}

/// Extractor that only succeeds for admins.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(context) = parts.extensions.get::<AuthContext>().cloned() else {
            tracing::warn!("Admin view reached without an auth context: {}", parts.uri.path());
            return Err(Redirect::temporary(HOME_PATH).into_response());
        };

        match guard(&context.identity) {
            GuardDecision::Render => Ok(RequireAdmin(context)),
            GuardDecision::Redirect(to) => Err(Redirect::temporary(to).into_response()),
            GuardDecision::Loading => {
                Err((StatusCode::SERVICE_UNAVAILABLE, "Loading...").into_response())
            }
        }
    }
}
