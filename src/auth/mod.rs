//! Access gate.
//!
//! Every intercepted request is checked for a session. Requests under `/admin`
//! additionally have their role looked up with the identity provider.

mod guard;
mod identity;
mod session;

pub use guard::*;
pub use identity::*;
pub use session::*;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::AppState;

pub const HOME_PATH: &str = "/";
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";
pub const ADMIN_PREFIX: &str = "/admin";

/// Paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &[HOME_PATH, SIGN_IN_PATH, SIGN_UP_PATH, "/health"];

/// Prefix of build assets served alongside the app.
const ASSETS_PREFIX: &str = "_assets";

/// Whether the identity behind a request has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    Unresolved,
    Resolved(IdentityUser),
}

/// What the gate learned about a request. Attached as a request extension.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: Option<Session>,
    pub identity: IdentityState,
}

impl AuthContext {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }
}

/// Whether the gate runs for `path` at all.
///
/// Files (a trailing `.ext`) and build assets are skipped unless under `/api`.
pub fn is_intercepted(path: &str) -> bool {
    if path == "/api" || path.starts_with("/api/") {
        return true;
    }

    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.starts_with(ASSETS_PREFIX) {
        return false;
    }

    let is_file = match rest.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    !is_file
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

pub fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/admin/")
}

/// Middleware enforcing sign-in everywhere and the admin role under `/admin`.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_intercepted(&path) {
        return next.run(request).await;
    }

    let session = state.sessions.session_from_headers(request.headers());
    let mut context = AuthContext {
        session: session.clone(),
        identity: IdentityState::Unresolved,
    };

    if is_public(&path) {
        request.extensions_mut().insert(context);
        return next.run(request).await;
    }

    let Some(session) = session else {
        tracing::debug!("No session for {}, redirecting to sign-in", path);
        return Redirect::temporary(SIGN_IN_PATH).into_response();
    };

    if is_admin_path(&path) {
        match state.identity.fetch_user(&session.user_id).await {
            Ok(user) if user.is_admin() => {
                tracing::debug!(
                    "Admin {} (session {:?}) allowed into {}",
                    user.id,
                    session.session_id,
                    path
                );
                context.identity = IdentityState::Resolved(user);
            }
            Ok(user) => {
                tracing::warn!(
                    "User {} with role {:?} denied access to {}",
                    user.id,
                    user.role(),
                    path
                );
                return Redirect::temporary(HOME_PATH).into_response();
            }
            Err(e) => {
                tracing::error!("Error checking admin status for {}: {}", session.user_id, e);
                return Redirect::temporary(HOME_PATH).into_response();
            }
        }
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}
