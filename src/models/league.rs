//! League model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{int_or_string, not_blank, opt_int_or_string, Entity, RelatedName};
use crate::gateway::Table;

/// Image used when a league is created without one.
pub const DEFAULT_LEAGUE_IMAGE: &str = "https://i.imgur.com/rq0aY15.png";

/// Lifecycle label of a league, set by an administrator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeagueStatus {
    #[default]
    Upcoming,
    #[serde(alias = "active")]
    Current,
    #[serde(alias = "completed")]
    Past,
}

impl LeagueStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(LeagueStatus::Upcoming),
            "current" | "active" => Some(LeagueStatus::Current),
            "past" | "completed" => Some(LeagueStatus::Past),
            _ => None,
        }
    }
}

/// A league played in one city for one sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub city_id: i64,
    pub sport_id: i64,
    pub max_teams: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub status: LeagueStatus,
    pub image: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cities: Option<RelatedName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sports: Option<RelatedName>,
}

impl League {
    pub fn city_name(&self) -> Option<&str> {
        self.cities.as_ref().map(|c| c.name.as_str())
    }
}

fn default_image() -> String {
    DEFAULT_LEAGUE_IMAGE.to_string()
}

/// Request body for creating a new league.
///
/// Date ordering (deadline before start, start before end) is not enforced.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLeague {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(deserialize_with = "int_or_string")]
    #[validate(range(min = 1, message = "City is required"))]
    pub city_id: i64,
    #[serde(deserialize_with = "int_or_string")]
    #[validate(range(min = 1, message = "Sport is required"))]
    pub sport_id: i64,
    #[serde(deserialize_with = "int_or_string")]
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub max_teams: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: LeagueStatus,
    #[serde(default = "default_image")]
    #[validate(url)]
    pub image: String,
}

/// Request body for updating an existing league.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LeaguePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_int_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 1))]
    pub city_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "opt_int_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 1))]
    pub sport_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "opt_int_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub max_teams: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeagueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub image: Option<String>,
}

impl Entity for League {
    const TABLE: Table = Table::Leagues;
    const RELATIONS: &'static [Table] = &[Table::Cities, Table::Sports];
    type Draft = NewLeague;
    type Patch = LeaguePatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
