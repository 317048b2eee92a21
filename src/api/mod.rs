//! REST API module.
//!
//! Public views, the admin dashboard and the admin CRUD endpoints.

mod admin;
mod public;

pub use admin::*;
pub use public::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{ADMIN_PREFIX, HOME_PATH};
use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// A navigation link, flagged when it points at the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// Navigation bar for the page at `pathname`.
pub fn nav(pathname: &str) -> Vec<NavLink> {
    [("Home", HOME_PATH), ("Admin", ADMIN_PREFIX)]
        .into_iter()
        .map(|(label, href)| NavLink {
            label,
            href,
            active: pathname == href,
        })
        .collect()
}
