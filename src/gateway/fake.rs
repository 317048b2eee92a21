//! In-memory gateway for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};

use super::{check_order, check_relations, prepare_write, Gateway, Record, SelectQuery, Table};
use crate::errors::AppError;

pub const FIXED_CREATED_AT: &str = "2024-05-01T12:00:00.000Z";

#[derive(Default)]
pub struct FakeGateway {
    rows: Mutex<HashMap<Table, Vec<Record>>>,
    next_id: AtomicI64,
    failing: AtomicBool,
    pub calls: Mutex<Vec<(&'static str, Table)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Make every subsequent call fail with a remote error.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_next_id(&self, id: i64) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    pub fn seed(&self, table: Table, row: Value) {
        let mut rows = self.rows.lock().unwrap();
        rows.entry(table)
            .or_default()
            .push(row.as_object().cloned().unwrap());
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(&table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn calls_to(&self, op: &str) -> Vec<Table> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|(_, table)| *table)
            .collect()
    }

    fn enter(&self, op: &'static str, table: Table) -> Result<(), AppError> {
        self.calls.lock().unwrap().push((op, table));
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Remote(format!("{} on {} failed", op, table)));
        }
        Ok(())
    }

    fn with_relations(&self, table: Table, mut row: Record, relations: &[Table]) -> Record {
        let rows = self.rows.lock().unwrap();
        for target in relations {
            let Some(relation) = table.relation(*target) else {
                continue;
            };
            let fk = row.get(relation.foreign_key).cloned().unwrap_or(Value::Null);
            let name = rows.get(target).and_then(|candidates| {
                candidates
                    .iter()
                    .find(|c| c.get("id") == Some(&fk))
                    .and_then(|c| c.get("name").cloned())
            });
            let nested = name.map(|n| json!({ "name": n })).unwrap_or(Value::Null);
            row.insert(target.name().to_string(), nested);
        }
        row
    }
}

fn sort_key(row: &Record, column: &str) -> (String, i64) {
    let value = match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format!("{:020}", n.as_i64().unwrap_or(0)),
        _ => String::new(),
    };
    let id = row.get("id").and_then(Value::as_i64).unwrap_or(0);
    (value, id)
}

impl Gateway for FakeGateway {
    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Record>, AppError> {
        self.enter("select", table)?;
        check_relations(table, &query.relations)?;
        check_order(table, query.order.as_ref())?;

        let mut rows = self
            .rows
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by_key(|row| sort_key(row, order.column));
            if !order.ascending {
                rows.reverse();
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| self.with_relations(table, row, &query.relations))
            .collect())
    }

    async fn insert(
        &self,
        table: Table,
        record: Record,
        relations: &[Table],
    ) -> Result<Record, AppError> {
        self.enter("insert", table)?;
        check_relations(table, relations)?;

        let mut row = Record::new();
        row.insert(
            "id".to_string(),
            Value::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
        );
        for (name, value) in prepare_write(table, record)? {
            row.insert(name.to_string(), value.into());
        }
        row.insert("created_at".to_string(), Value::from(FIXED_CREATED_AT));

        self.rows
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(row.clone());
        Ok(self.with_relations(table, row, relations))
    }

    async fn update(
        &self,
        table: Table,
        id: i64,
        patch: Record,
        relations: &[Table],
    ) -> Result<Record, AppError> {
        self.enter("update", table)?;
        check_relations(table, relations)?;
        let fields = prepare_write(table, patch)?;

        let updated = {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&table)
                .and_then(|rows| {
                    rows.iter_mut()
                        .find(|r| r.get("id").and_then(Value::as_i64) == Some(id))
                })
                .ok_or_else(|| AppError::NotFound(format!("{} {} not found", table.label(), id)))?;
            for (name, value) in fields {
                row.insert(name.to_string(), value.into());
            }
            row.clone()
        };

        Ok(self.with_relations(table, updated, relations))
    }

    async fn delete(&self, table: Table, id: i64) -> Result<bool, AppError> {
        self.enter("delete", table)?;
        let mut rows = self.rows.lock().unwrap();
        let Some(rows) = rows.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.get("id").and_then(Value::as_i64) != Some(id));
        Ok(rows.len() != before)
    }
}
