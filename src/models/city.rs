//! City model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{not_blank, Entity};
use crate::gateway::Table;

/// A city that hosts leagues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new city.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewCity {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
}

/// Request body for updating an existing city.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Entity for City {
    const TABLE: Table = Table::Cities;
    type Draft = NewCity;
    type Patch = CityPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_is_rejected() {
        let draft = NewCity {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_patch_without_name_is_valid() {
        let patch = CityPatch {
            country: Some("USA".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "country": "USA" })
        );
    }
}
