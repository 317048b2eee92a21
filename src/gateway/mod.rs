//! Remote data gateway.
//!
//! A table-generic select/insert/update/delete contract over the relational store.
//! Records travel as JSON objects; the static schema below decides which columns
//! exist, which ones a client may write, and which relations can be joined.

#[cfg(test)]
pub mod fake;

use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// A row as exchanged with the store.
pub type Record = Map<String, Value>;

/// Tables exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Cities,
    Sports,
    Leagues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Server-assigned columns are readable but never accepted in a write.
    pub writable: bool,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        writable: true,
    }
}

const fn server(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        writable: false,
    }
}

const CITY_COLUMNS: &[Column] = &[
    server("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("state", ColumnKind::Text),
    col("country", ColumnKind::Text),
    server("created_at", ColumnKind::Text),
];

const SPORT_COLUMNS: &[Column] = &[
    server("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("players_per_team", ColumnKind::Integer),
    server("created_at", ColumnKind::Text),
];

const LEAGUE_COLUMNS: &[Column] = &[
    server("id", ColumnKind::Integer),
    col("name", ColumnKind::Text),
    col("city_id", ColumnKind::Integer),
    col("sport_id", ColumnKind::Integer),
    col("max_teams", ColumnKind::Integer),
    col("start_date", ColumnKind::Text),
    col("end_date", ColumnKind::Text),
    col("registration_deadline", ColumnKind::Text),
    col("status", ColumnKind::Text),
    col("image", ColumnKind::Text),
    server("created_at", ColumnKind::Text),
];

/// A many-to-one link resolvable as a nested `{name}` object.
#[derive(Debug)]
pub struct Relation {
    pub target: Table,
    pub foreign_key: &'static str,
}

const LEAGUE_RELATIONS: &[Relation] = &[
    Relation {
        target: Table::Cities,
        foreign_key: "city_id",
    },
    Relation {
        target: Table::Sports,
        foreign_key: "sport_id",
    },
];

impl Table {
    pub const ALL: [Table; 3] = [Table::Cities, Table::Sports, Table::Leagues];

    pub fn name(self) -> &'static str {
        match self {
            Table::Cities => "cities",
            Table::Sports => "sports",
            Table::Leagues => "leagues",
        }
    }

    /// Singular label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Table::Cities => "City",
            Table::Sports => "Sport",
            Table::Leagues => "League",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Cities => CITY_COLUMNS,
            Table::Sports => SPORT_COLUMNS,
            Table::Leagues => LEAGUE_COLUMNS,
        }
    }

    pub fn column(self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn relations(self) -> &'static [Relation] {
        match self {
            Table::Leagues => LEAGUE_RELATIONS,
            _ => &[],
        }
    }

    pub fn relation(self, target: Table) -> Option<&'static Relation> {
        self.relations().iter().find(|r| r.target == target)
    }
}

impl FromStr for Table {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cities" => Ok(Table::Cities),
            "sports" => Ok(Table::Sports),
            "leagues" => Ok(Table::Leagues),
            other => Err(AppError::BadRequest(format!("Unknown table '{}'", other))),
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering clause for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// Projection and ordering for a select.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub relations: Vec<Table>,
    pub order: Option<OrderBy>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relations(mut self, relations: &[Table]) -> Self {
        self.relations = relations.to_vec();
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }
}

/// A column value after schema coercion, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(i) => Value::from(i),
            FieldValue::Text(s) => Value::from(s),
        }
    }
}

/// Check a write payload against the table schema and coerce its values.
///
/// Unknown or server-assigned columns are rejected. Integer columns accept
/// numeric strings, text columns accept numbers.
pub fn prepare_write(
    table: Table,
    record: Record,
) -> Result<Vec<(&'static str, FieldValue)>, AppError> {
    if record.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Empty payload for table {}",
            table
        )));
    }

    let mut fields = Vec::with_capacity(record.len());
    for (key, value) in record {
        let column = table.column(&key).ok_or_else(|| {
            AppError::BadRequest(format!("Column '{}' does not exist on {}", key, table))
        })?;
        if !column.writable {
            return Err(AppError::BadRequest(format!(
                "Column '{}' on {} is assigned by the server",
                key, table
            )));
        }
        fields.push((column.name, coerce(column, value)?));
    }

    Ok(fields)
}

fn coerce(column: &Column, value: Value) -> Result<FieldValue, AppError> {
    let invalid = |v: &Value| {
        AppError::BadRequest(format!(
            "Invalid value {} for column '{}'",
            v, column.name
        ))
    };

    match (column.kind, value) {
        (_, Value::Null) => Ok(FieldValue::Null),
        (ColumnKind::Integer, Value::Number(n)) => {
            n.as_i64().map(FieldValue::Integer).ok_or_else(|| invalid(&Value::Number(n)))
        }
        (ColumnKind::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid(&Value::String(s))),
        (ColumnKind::Text, Value::String(s)) => Ok(FieldValue::Text(s)),
        (ColumnKind::Text, Value::Number(n)) => Ok(FieldValue::Text(n.to_string())),
        (_, other) => Err(invalid(&other)),
    }
}

/// Reject relations the table cannot join.
pub fn check_relations(table: Table, relations: &[Table]) -> Result<(), AppError> {
    for target in relations {
        if table.relation(*target).is_none() {
            return Err(AppError::BadRequest(format!(
                "No relation from {} to {}",
                table, target
            )));
        }
    }
    Ok(())
}

/// Reject ordering by a column the table does not have.
pub fn check_order(table: Table, order: Option<&OrderBy>) -> Result<(), AppError> {
    match order {
        Some(order) if table.column(order.column).is_none() => Err(AppError::BadRequest(
            format!("Cannot order {} by '{}'", table, order.column),
        )),
        _ => Ok(()),
    }
}

/// Query operations against the hosted relational store.
///
/// Every failure is a full failure of the operation; callers assume no partial effect.
pub trait Gateway: Send + Sync {
    /// Fetch all rows of `table` in the requested order.
    fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> impl Future<Output = Result<Vec<Record>, AppError>> + Send;

    /// Insert one row, returning it with server-assigned fields and requested relations.
    fn insert(
        &self,
        table: Table,
        record: Record,
        relations: &[Table],
    ) -> impl Future<Output = Result<Record, AppError>> + Send;

    /// Apply a partial update to the row with `id`, returning the updated row.
    fn update(
        &self,
        table: Table,
        id: i64,
        patch: Record,
        relations: &[Table],
    ) -> impl Future<Output = Result<Record, AppError>> + Send;

    /// Delete the row with `id`. `Ok(false)` means no row matched.
    fn delete(&self, table: Table, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;
}
