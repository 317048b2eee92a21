//! Entry forms for the add dialogs.
//!
//! Forms arrive as plain strings, exactly as typed. Each form coerces its fields
//! into the entity's draft and then runs the same validation as the JSON API.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{LeagueStatus, NewCity, NewLeague, NewSport, DEFAULT_LEAGUE_IMAGE};
use crate::shell::{Draft, Tab};

/// Field-level problems found while coercing form strings.
#[derive(Debug, Default)]
struct FieldErrors(Vec<String>);

impl FieldErrors {
    fn push(&mut self, field: &str, reason: &str) {
        self.0.push(format!("{}: {}", field, reason));
    }

    fn integer(&mut self, field: &str, raw: &str) -> i64 {
        match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) if raw.trim().is_empty() => {
                self.push(field, "is required");
                0
            }
            Err(_) => {
                self.push(field, "must be an integer");
                0
            }
        }
    }

    fn date(&mut self, field: &str, raw: &str) -> DateTime<Utc> {
        match parse_date(raw) {
            Some(value) => value,
            None => {
                if raw.trim().is_empty() {
                    self.push(field, "is required");
                } else {
                    self.push(field, "must be a date");
                }
                DateTime::<Utc>::MIN_UTC
            }
        }
    }

    fn finish<T: Validate>(mut self, draft: T) -> Result<T, AppError> {
        if let Err(errors) = draft.validate() {
            if let AppError::Validation(message) = AppError::from(errors) {
                for part in message.split("; ") {
                    if !self.0.iter().any(|e| e.split(':').next() == part.split(':').next()) {
                        self.0.push(part.to_string());
                    }
                }
            }
        }

        if self.0.is_empty() {
            Ok(draft)
        } else {
            self.0.sort();
            Err(AppError::Validation(self.0.join("; ")))
        }
    }
}

/// Accept an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CityForm {
    pub name: String,
    pub state: String,
    pub country: String,
}

impl CityForm {
    pub fn into_draft(self) -> Result<NewCity, AppError> {
        FieldErrors::default().finish(NewCity {
            name: self.name.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SportForm {
    pub name: String,
    pub description: String,
    pub players_per_team: String,
}

impl SportForm {
    pub fn into_draft(self) -> Result<NewSport, AppError> {
        let mut errors = FieldErrors::default();
        let players_per_team = errors.integer("players_per_team", &self.players_per_team);

        errors.finish(NewSport {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            players_per_team,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeagueForm {
    pub name: String,
    pub city_id: String,
    pub sport_id: String,
    pub max_teams: String,
    pub start_date: String,
    pub end_date: String,
    pub registration_deadline: String,
    pub status: String,
    pub image: String,
}

impl LeagueForm {
    pub fn into_draft(self) -> Result<NewLeague, AppError> {
        let mut errors = FieldErrors::default();

        let city_id = errors.integer("city_id", &self.city_id);
        let sport_id = errors.integer("sport_id", &self.sport_id);
        let max_teams = errors.integer("max_teams", &self.max_teams);
        let start_date = errors.date("start_date", &self.start_date);
        let end_date = errors.date("end_date", &self.end_date);
        let registration_deadline =
            errors.date("registration_deadline", &self.registration_deadline);

        let status = if self.status.trim().is_empty() {
            LeagueStatus::default()
        } else {
            LeagueStatus::parse(&self.status).unwrap_or_else(|| {
                errors.push("status", "must be upcoming, current or past");
                LeagueStatus::default()
            })
        };

        let image = match self.image.trim() {
            "" => DEFAULT_LEAGUE_IMAGE.to_string(),
            url => url.to_string(),
        };

        errors.finish(NewLeague {
            name: self.name.trim().to_string(),
            city_id,
            sport_id,
            max_teams,
            start_date,
            end_date,
            registration_deadline,
            status,
            image,
        })
    }
}

/// Build the draft for `tab` from submitted form fields.
pub fn draft_from_form(tab: Tab, fields: HashMap<String, String>) -> Result<Draft, AppError> {
    let value = serde_json::to_value(fields)?;
    Ok(match tab {
        Tab::Cities => Draft::City(serde_json::from_value::<CityForm>(value)?.into_draft()?),
        Tab::Sports => Draft::Sport(serde_json::from_value::<SportForm>(value)?.into_draft()?),
        Tab::Leagues => Draft::League(serde_json::from_value::<LeagueForm>(value)?.into_draft()?),
    })
}
