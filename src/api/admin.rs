//! Admin endpoints: dashboard view, entry forms and CRUD over the three tables.
//!
//! Every handler builds a fresh `AdminShell` for the request and goes through it,
//! so the API and the dashboard share one set of binding rules.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{nav, success, ApiResult, NavLink};
use crate::auth::{RequireAdmin, ADMIN_PREFIX};
use crate::errors::AppError;
use crate::forms::draft_from_form;
use crate::shell::{AdminShell, Changes, Draft, Intent, Outcome, Row, Tab};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub nav: Vec<NavLink>,
    pub tab: Tab,
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub total: usize,
    pub rows: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedRow {
    pub id: i64,
}

fn parse_tab(raw: Option<&str>) -> Result<Tab, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Tab::default()),
        Some(name) => name.parse(),
    }
}

/// Run one intent against `tab` and return what it produced.
///
/// A store failure is answered with the view-model's alert; the store's own
/// message stays in the log.
async fn apply(state: &AppState, tab: Tab, intent: Intent) -> Result<Outcome, AppError> {
    let mut shell = AdminShell::new(state.gateway.clone());
    shell.select(tab);

    let result = shell.dispatch(intent).await;
    result.map_err(|e| alert_error(e, shell.alert()))
}

fn alert_error(err: AppError, alert: Option<&str>) -> AppError {
    match (err, alert) {
        (AppError::Remote(detail), Some(alert)) => {
            tracing::warn!("{}: {}", alert, detail);
            AppError::Remote(alert.to_string())
        }
        (err, _) => err,
    }
}

fn into_row(outcome: Outcome) -> Result<Row, AppError> {
    match outcome {
        Outcome::Created(row) | Outcome::Updated(row) => Ok(row),
        Outcome::Deleted(id) => Err(AppError::Internal(format!(
            "Expected a row, got deletion of {}",
            id
        ))),
    }
}

/// GET /admin - Dashboard for the selected tab.
///
/// A failed read is reported in `error` with no rows rather than as an error response.
pub async fn dashboard(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<DashboardView> {
    let tab = parse_tab(query.tab.as_deref())?;

    let mut shell = AdminShell::new(state.gateway.clone());
    shell.set_search(query.q.unwrap_or_default());
    if let Err(e) = shell.activate(tab).await {
        tracing::debug!("Dashboard for {} rendered without rows: {}", tab.table(), e);
    }

    let visible = shell.visible();
    let total = visible.len();
    let rows = serde_json::to_value(&visible)?;

    success(DashboardView {
        nav: nav(ADMIN_PREFIX),
        tab: shell.active(),
        search: shell.search().to_string(),
        loading: shell.is_loading(),
        error: shell.error().map(str::to_string),
        total,
        rows,
    })
}

/// GET /admin/api/:tab - Rows of one table, optionally filtered by name.
pub async fn list_rows(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Value> {
    let tab = parse_tab(Some(&tab))?;

    let mut shell = AdminShell::new(state.gateway.clone());
    shell.set_search(query.q.unwrap_or_default());
    shell.activate(tab).await?;

    success(serde_json::to_value(shell.visible())?)
}

/// POST /admin/api/:tab - Create a row from a JSON draft.
pub async fn create_row(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Row> {
    let tab = parse_tab(Some(&tab))?;
    let draft = Draft::from_json(tab, body)?;

    let row = into_row(apply(&state, tab, Intent::Add(draft)).await?)?;
    tracing::info!("{:?} created a {} row", admin.user_id(), tab.table());
    success(row)
}

/// PATCH /admin/api/:tab/:id - Partially update a row.
pub async fn update_row(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((tab, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> ApiResult<Row> {
    let tab = parse_tab(Some(&tab))?;
    let changes = Changes::from_json(tab, body)?;

    let row = into_row(apply(&state, tab, Intent::Edit { id, changes }).await?)?;
    tracing::info!("{:?} updated {} row {}", admin.user_id(), tab.table(), id);
    success(row)
}

/// DELETE /admin/api/:tab/:id - Delete a row.
pub async fn delete_row(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((tab, id)): Path<(String, i64)>,
) -> ApiResult<DeletedRow> {
    let tab = parse_tab(Some(&tab))?;

    apply(&state, tab, Intent::Delete { id }).await?;
    tracing::info!("{:?} deleted {} row {}", admin.user_id(), tab.table(), id);
    success(DeletedRow { id })
}

/// POST /admin/:tab/new - Submit an entry form, then return to the tab.
pub async fn submit_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let tab = parse_tab(Some(&tab))?;
    let draft = draft_from_form(tab, fields)?;

    apply(&state, tab, Intent::Add(draft)).await?;
    tracing::info!("{:?} submitted a {} form", admin.user_id(), tab.table());
    Ok(Redirect::to(&format!(
        "{}?tab={}",
        ADMIN_PREFIX,
        tab.table().name()
    )))
}
