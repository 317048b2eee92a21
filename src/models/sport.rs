//! Sport model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{int_or_string, not_blank, opt_int_or_string, Entity};
use crate::gateway::Table;

/// A sport leagues can be organized around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub players_per_team: i64,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new sport.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSport {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "int_or_string")]
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub players_per_team: i64,
}

/// Request body for updating an existing sport.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_int_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub players_per_team: Option<i64>,
}

impl Entity for Sport {
    const TABLE: Table = Table::Sports;
    type Draft = NewSport;
    type Patch = SportPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
