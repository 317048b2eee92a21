//! SQLite implementation of the data gateway.
//!
//! SQL is assembled only from the static table schema; every value is bound.

use serde_json::{json, Value};
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::gateway::{
    check_order, check_relations, prepare_write, ColumnKind, FieldValue, Gateway, OrderBy,
    Record, SelectQuery, Table,
};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Gateway over a SQLite pool.
#[derive(Clone)]
pub struct SqlGateway {
    pool: SqlitePool,
}

impl SqlGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch one row by id with the requested relations.
    pub async fn fetch_one(
        &self,
        table: Table,
        id: i64,
        relations: &[Table],
    ) -> Result<Record, AppError> {
        let sql = format!("{} WHERE t.id = ?", select_sql(table, relations));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", table.label(), id)))?;

        record_from_row(table, relations, &row)
    }
}

impl Gateway for SqlGateway {
    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Record>, AppError> {
        check_relations(table, &query.relations)?;
        check_order(table, query.order.as_ref())?;

        let mut sql = select_sql(table, &query.relations);
        if let Some(order) = &query.order {
            sql.push_str(&order_sql(order));
        }

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| record_from_row(table, &query.relations, row))
            .collect()
    }

    async fn insert(
        &self,
        table: Table,
        record: Record,
        relations: &[Table],
    ) -> Result<Record, AppError> {
        check_relations(table, relations)?;
        let fields = prepare_write(table, record)?;

        let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            table.name(),
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in fields {
            query = bind_value(query, value);
        }
        let row = query.fetch_one(&self.pool).await?;
        let id: i64 = row.try_get("id")?;

        tracing::debug!("Inserted {} {}", table.label(), id);
        self.fetch_one(table, id, relations).await
    }

    async fn update(
        &self,
        table: Table,
        id: i64,
        patch: Record,
        relations: &[Table],
    ) -> Result<Record, AppError> {
        check_relations(table, relations)?;
        let fields = prepare_write(table, patch)?;

        let assignments: Vec<String> = fields
            .iter()
            .map(|(name, _)| format!("{} = ?", name))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table.name(),
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in fields {
            query = bind_value(query, value);
        }
        let result = query.bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                table.label(),
                id
            )));
        }

        self.fetch_one(table, id, relations).await
    }

    async fn delete(&self, table: Table, id: i64) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

fn select_sql(table: Table, relations: &[Table]) -> String {
    let mut projection: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("t.{}", c.name))
        .collect();
    let mut joins = String::new();

    for (i, target) in relations.iter().enumerate() {
        // check_relations has already run for every caller
        let Some(relation) = table.relation(*target) else {
            continue;
        };
        projection.push(format!("r{}.name", i));
        joins.push_str(&format!(
            " LEFT JOIN {} r{} ON r{}.id = t.{}",
            target.name(),
            i,
            i,
            relation.foreign_key
        ));
    }

    format!(
        "SELECT {} FROM {} t{}",
        projection.join(", "),
        table.name(),
        joins
    )
}

fn order_sql(order: &OrderBy) -> String {
    let direction = if order.ascending { "ASC" } else { "DESC" };
    format!(
        " ORDER BY t.{} {}, t.id {}",
        order.column, direction, direction
    )
}

fn bind_value(query: SqliteQuery<'_>, value: FieldValue) -> SqliteQuery<'_> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Integer(i) => query.bind(i),
        FieldValue::Text(s) => query.bind(s),
    }
}

fn record_from_row(
    table: Table,
    relations: &[Table],
    row: &SqliteRow,
) -> Result<Record, AppError> {
    let mut record = Record::new();

    for (idx, column) in table.columns().iter().enumerate() {
        let value = match column.kind {
            ColumnKind::Integer => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
            ColumnKind::Text => row.try_get::<Option<String>, _>(idx)?.map(Value::from),
        };
        record.insert(column.name.to_string(), value.unwrap_or(Value::Null));
    }

    let offset = table.columns().len();
    for (i, target) in relations.iter().enumerate() {
        let name: Option<String> = row.try_get(offset + i)?;
        let nested = name.map(|n| json!({ "name": n })).unwrap_or(Value::Null);
        record.insert(target.name().to_string(), nested);
    }

    Ok(record)
}
