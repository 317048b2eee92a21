//! Data models for cities, sports and leagues.
//!
//! Each entity carries one draft type (create) and one patch type (partial update).
//! Both derive `Validate`, and every creation or update path runs that same schema.

mod city;
mod league;
mod sport;

pub use city::*;
pub use league::*;
pub use sport::*;

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::AppError;
use crate::gateway::{Record, Table};

/// A row type mirrored from one table of the store.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;
    /// Relations joined whenever rows of this entity are read.
    const RELATIONS: &'static [Table] = &[];

    type Draft: Serialize + Validate + Send + Sync;
    type Patch: Serialize + Validate + Send + Sync;

    fn id(&self) -> i64;

    /// The name shown in tables and matched by search.
    fn display_name(&self) -> &str;
}

/// Serialize a draft or patch into a gateway record.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, AppError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "Expected an object payload, got {}",
            other
        ))),
    }
}

/// Decode a gateway record into an entity.
pub fn from_record<E: Entity>(record: Record) -> Result<E, AppError> {
    serde_json::from_value(serde_json::Value::Object(record)).map_err(|e| {
        tracing::error!("Unexpected {} row shape: {}", E::TABLE, e);
        AppError::Remote(format!("Unexpected {} row shape: {}", E::TABLE, e))
    })
}

/// Reject strings that are empty after trimming.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            IntOrString::Int(i) => Ok(i),
            IntOrString::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("'{}' is not an integer", s))),
        }
    }
}

/// Accept an integer or a string holding one.
pub(crate) fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    IntOrString::deserialize(deserializer)?.into_i64()
}

pub(crate) fn opt_int_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<IntOrString>::deserialize(deserializer)?
        .map(IntOrString::into_i64)
        .transpose()
}

/// Joined `{name}` of a related row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedName {
    pub name: String,
}
