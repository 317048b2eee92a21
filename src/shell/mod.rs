//! Admin shell.
//!
//! Tab selection, search filtering over the active tab, and dispatch of
//! add/edit/delete intents to the matching view-model.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::gateway::{Gateway, Table};
use crate::models::{
    City, CityPatch, Entity, League, LeaguePatch, NewCity, NewLeague, NewSport, Sport, SportPatch,
};
use crate::viewmodel::EntityList;

/// Dashboard tab; one per managed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Cities,
    Sports,
    Leagues,
}

impl Tab {
    pub fn table(self) -> Table {
        match self {
            Tab::Cities => Table::Cities,
            Tab::Sports => Table::Sports,
            Tab::Leagues => Table::Leagues,
        }
    }
}

impl FromStr for Tab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Table>()? {
            Table::Cities => Ok(Tab::Cities),
            Table::Sports => Ok(Tab::Sports),
            Table::Leagues => Ok(Tab::Leagues),
        }
    }
}

/// Case-insensitive substring match on the display name. An empty term keeps everything.
pub fn filter_by_name<'a, E: Entity>(items: &'a [E], term: &str) -> Vec<&'a E> {
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.display_name().to_lowercase().contains(&needle))
        .collect()
}

/// A candidate record for one of the tables.
#[derive(Debug, Clone)]
pub enum Draft {
    City(NewCity),
    Sport(NewSport),
    League(NewLeague),
}

impl Draft {
    pub fn tab(&self) -> Tab {
        match self {
            Draft::City(_) => Tab::Cities,
            Draft::Sport(_) => Tab::Sports,
            Draft::League(_) => Tab::Leagues,
        }
    }

    /// Decode a JSON body as the draft type of `tab`.
    pub fn from_json(tab: Tab, body: Value) -> Result<Self, AppError> {
        Ok(match tab {
            Tab::Cities => Draft::City(serde_json::from_value(body)?),
            Tab::Sports => Draft::Sport(serde_json::from_value(body)?),
            Tab::Leagues => Draft::League(serde_json::from_value(body)?),
        })
    }
}

/// Partial changes for one of the tables.
#[derive(Debug, Clone)]
pub enum Changes {
    City(CityPatch),
    Sport(SportPatch),
    League(LeaguePatch),
}

impl Changes {
    pub fn tab(&self) -> Tab {
        match self {
            Changes::City(_) => Tab::Cities,
            Changes::Sport(_) => Tab::Sports,
            Changes::League(_) => Tab::Leagues,
        }
    }

    pub fn from_json(tab: Tab, body: Value) -> Result<Self, AppError> {
        Ok(match tab {
            Tab::Cities => Changes::City(serde_json::from_value(body)?),
            Tab::Sports => Changes::Sport(serde_json::from_value(body)?),
            Tab::Leagues => Changes::League(serde_json::from_value(body)?),
        })
    }
}

/// A user action on the active tab.
#[derive(Debug, Clone)]
pub enum Intent {
    Add(Draft),
    Edit { id: i64, changes: Changes },
    Delete { id: i64 },
}

/// One row of any table.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Row {
    City(City),
    Sport(Sport),
    League(League),
}

/// Result of a dispatched intent.
#[derive(Debug, Clone)]
pub enum Outcome {
    Created(Row),
    Updated(Row),
    Deleted(i64),
}

/// Filtered rows of the active tab.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Rows<'a> {
    Cities(Vec<&'a City>),
    Sports(Vec<&'a Sport>),
    Leagues(Vec<&'a League>),
}

impl Rows<'_> {
    pub fn len(&self) -> usize {
        match self {
            Rows::Cities(rows) => rows.len(),
            Rows::Sports(rows) => rows.len(),
            Rows::Leagues(rows) => rows.len(),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dashboard state: one view-model per table, one active tab, one search term.
pub struct AdminShell<G: Gateway> {
    gateway: Arc<G>,
    active: Tab,
    search: String,
    cities: EntityList<City>,
    sports: EntityList<Sport>,
    leagues: EntityList<League>,
}

impl<G: Gateway> AdminShell<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            active: Tab::default(),
            search: String::new(),
            cities: EntityList::new(),
            sports: EntityList::new(),
            leagues: EntityList::new(),
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    #[cfg(test)]
    pub fn cities(&self) -> &EntityList<City> {
        &self.cities
    }

    #[cfg(test)]
    pub fn sports(&self) -> &EntityList<Sport> {
        &self.sports
    }

    #[cfg(test)]
    pub fn leagues(&self) -> &EntityList<League> {
        &self.leagues
    }

    /// Switch tabs without fetching.
    pub fn select(&mut self, tab: Tab) {
        self.active = tab;
    }

    /// Switch tabs and refetch that tab's table only.
    pub async fn activate(&mut self, tab: Tab) -> Result<(), AppError> {
        self.active = tab;
        let gateway = self.gateway.as_ref();
        match tab {
            Tab::Cities => self.cities.refresh(gateway).await,
            Tab::Sports => self.sports.refresh(gateway).await,
            Tab::Leagues => self.leagues.refresh(gateway).await,
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Rows of the active tab matching the search term.
    pub fn visible(&self) -> Rows<'_> {
        match self.active {
            Tab::Cities => Rows::Cities(filter_by_name(self.cities.items(), &self.search)),
            Tab::Sports => Rows::Sports(filter_by_name(self.sports.items(), &self.search)),
            Tab::Leagues => Rows::Leagues(filter_by_name(self.leagues.items(), &self.search)),
        }
    }

    pub fn is_loading(&self) -> bool {
        match self.active {
            Tab::Cities => self.cities.is_loading(),
            Tab::Sports => self.sports.is_loading(),
            Tab::Leagues => self.leagues.is_loading(),
        }
    }

    /// Read error of the active tab, if its last refresh failed.
    pub fn error(&self) -> Option<&str> {
        match self.active {
            Tab::Cities => self.cities.error(),
            Tab::Sports => self.sports.error(),
            Tab::Leagues => self.leagues.error(),
        }
    }

    /// Write alert of the active tab, if its last mutation failed.
    pub fn alert(&self) -> Option<&str> {
        match self.active {
            Tab::Cities => self.cities.alert(),
            Tab::Sports => self.sports.alert(),
            Tab::Leagues => self.leagues.alert(),
        }
    }

    /// Route an intent to the active tab's view-model.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<Outcome, AppError> {
        let gateway = self.gateway.as_ref();

        match intent {
            Intent::Add(draft) => {
                self.check_tab(draft.tab())?;
                let row = match draft {
                    Draft::City(d) => Row::City(self.cities.create(gateway, &d).await?),
                    Draft::Sport(d) => Row::Sport(self.sports.create(gateway, &d).await?),
                    Draft::League(d) => Row::League(self.leagues.create(gateway, &d).await?),
                };
                Ok(Outcome::Created(row))
            }
            Intent::Edit { id, changes } => {
                self.check_tab(changes.tab())?;
                let row = match changes {
                    Changes::City(c) => Row::City(self.cities.patch(gateway, id, &c).await?),
                    Changes::Sport(c) => Row::Sport(self.sports.patch(gateway, id, &c).await?),
                    Changes::League(c) => Row::League(self.leagues.patch(gateway, id, &c).await?),
                };
                Ok(Outcome::Updated(row))
            }
            Intent::Delete { id } => {
                match self.active {
                    Tab::Cities => self.cities.remove(gateway, id).await?,
                    Tab::Sports => self.sports.remove(gateway, id).await?,
                    Tab::Leagues => self.leagues.remove(gateway, id).await?,
                }
                Ok(Outcome::Deleted(id))
            }
        }
    }

    fn check_tab(&self, tab: Tab) -> Result<(), AppError> {
        if tab != self.active {
            return Err(AppError::BadRequest(format!(
                "Cannot apply a {} change while the {} tab is active",
                tab.table().label().to_lowercase(),
                self.active.table()
            )));
        }
        Ok(())
    }
}
