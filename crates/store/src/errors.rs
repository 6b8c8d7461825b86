use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl StoreError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 2001,
            StoreError::NotFound(_) => 2002,
            StoreError::Conflict(_) => 2003,
            StoreError::Unauthorized => 2004,
            StoreError::Hash(_) => 2101,
            StoreError::Db(_) => 2200,
            StoreError::Model(_) => 2201,
        }
    }
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
            _ => StoreError::Db(e.to_string()),
        }
    }
}
