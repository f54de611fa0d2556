//! Pharmacy dispensing engine.
//!
//! Pipeline per request: locate patient → latest consultation → its
//! prescriptions → per entry, filter valid stock batches and (optionally)
//! draw stock greedily in stored batch order, updating dispensed quantities
//! and deriving the prescription status.
//!
//! All mutation happens inside one SQLite transaction per top-level
//! operation, so a stock decrement and the matching dispensed-quantity
//! increment land together or not at all.

mod engine;
mod report;
mod stock;

pub use engine::*;
pub use report::*;
pub use stock::*;

use thiserror::Error;

/// Dispensing errors.
#[derive(Error, Debug)]
pub enum DispenseError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Insufficient stock for medicine {medicine_id}: requested {requested}, available {available}")]
    InsufficientStock {
        medicine_id: i64,
        requested: u32,
        available: u32,
    },
}

pub type DispenseResult<T> = Result<T, DispenseError>;
