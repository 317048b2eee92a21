//! Public endpoints: landing view, sign-in hand-off and the league listing.

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use super::{nav, success, ApiResult, NavLink};
use crate::auth::{AuthContext, HOME_PATH, SIGN_IN_PATH, SIGN_UP_PATH};
use crate::errors::AppError;
use crate::gateway::{Gateway, OrderBy, SelectQuery, Table};
use crate::models::{from_record, Entity, League, LeagueStatus};
use crate::viewmodel::EntityList;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    pub city: Option<String>,
}

/// Leagues split by status, each group in start-date order.
#[derive(Debug, Default, Serialize)]
pub struct LeagueGroups {
    pub upcoming: Vec<League>,
    pub current: Vec<League>,
    pub past: Vec<League>,
}

impl LeagueGroups {
    pub fn from_leagues(leagues: Vec<League>) -> Self {
        let mut groups = Self::default();
        for league in leagues {
            match league.status {
                LeagueStatus::Upcoming => groups.upcoming.push(league),
                LeagueStatus::Current => groups.current.push(league),
                LeagueStatus::Past => groups.past.push(league),
            }
        }
        groups
    }
}

#[derive(Debug, Serialize)]
pub struct LandingView {
    pub nav: Vec<NavLink>,
    pub signed_in: bool,
    pub city: String,
    pub leagues: LeagueGroups,
}

/// Keep leagues whose city name contains `term`, ignoring case.
pub fn filter_by_city(leagues: Vec<League>, term: &str) -> Vec<League> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return leagues;
    }
    leagues
        .into_iter()
        .filter(|league| {
            league
                .city_name()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

async fn select_leagues<G: Gateway>(gateway: &G, query: &SelectQuery) -> Result<Vec<League>, AppError> {
    gateway
        .select(Table::Leagues, query)
        .await?
        .into_iter()
        .map(from_record::<League>)
        .collect()
}

/// GET / - Landing view with leagues grouped by status.
pub async fn landing(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
    Query(query): Query<LandingQuery>,
) -> ApiResult<LandingView> {
    let city = query.city.unwrap_or_default();
    let select = SelectQuery::new()
        .with_relations(League::RELATIONS)
        .order_by(OrderBy::asc("start_date"));

    let leagues = select_leagues(state.gateway.as_ref(), &select)
        .await
        .inspect_err(|e| tracing::error!("Error fetching leagues: {}", e))?;

    success(LandingView {
        nav: nav(HOME_PATH),
        signed_in: context.is_some_and(|Extension(ctx)| ctx.is_signed_in()),
        leagues: LeagueGroups::from_leagues(filter_by_city(leagues, &city)),
        city,
    })
}

/// Where to authenticate and where to come back to.
#[derive(Debug, Serialize)]
pub struct IdentityHandoff {
    pub action: &'static str,
    pub provider_url: Option<String>,
    pub return_to: &'static str,
    pub signed_in: bool,
    pub nav: Vec<NavLink>,
}

fn handoff(
    state: &AppState,
    context: Option<Extension<AuthContext>>,
    action: &'static str,
    path: &str,
) -> ApiResult<IdentityHandoff> {
    success(IdentityHandoff {
        action,
        provider_url: state.config.identity_url.clone(),
        return_to: HOME_PATH,
        signed_in: context.is_some_and(|Extension(ctx)| ctx.is_signed_in()),
        nav: nav(path),
    })
}

/// GET /sign-in - Identity provider hand-off for signing in.
pub async fn sign_in(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<IdentityHandoff> {
    handoff(&state, context, "sign-in", SIGN_IN_PATH)
}

/// GET /sign-up - Identity provider hand-off for registering.
pub async fn sign_up(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<IdentityHandoff> {
    handoff(&state, context, "sign-up", SIGN_UP_PATH)
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaguesQuery {
    pub status: Option<String>,
}

/// GET /api/leagues - Leagues with city and sport names, newest first.
pub async fn list_leagues(
    State(state): State<AppState>,
    Query(query): Query<LeaguesQuery>,
) -> ApiResult<Vec<League>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(LeagueStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown league status '{}'", raw))
        })?),
    };

    let mut leagues =
        select_leagues(state.gateway.as_ref(), &EntityList::<League>::display_query()).await?;
    if let Some(status) = status {
        leagues.retain(|league| league.status == status);
    }

    success(leagues)
}
