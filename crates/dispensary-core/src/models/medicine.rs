//! Medicine and stock batch models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Procurement state of a medicine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// A restock has been requested but not yet placed
    Requested,
    /// A restock order has been placed with the supplier
    Ordered,
    /// The restock request was cancelled
    Cancelled,
}

/// A single lot of a medicine, independently trackable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockBatch {
    /// Batch number, unique within the owning medicine
    pub batch_no: String,
    /// Units remaining in this batch
    pub quantity: u32,
    /// Expiry date
    pub expiry_date: NaiveDate,
    /// Manufacturing date
    pub mfg_date: NaiveDate,
    /// Price per unit
    pub unit_price: f64,
    /// Supplier name
    pub supplier: String,
}

impl StockBatch {
    /// Check whether this batch can be dispensed from on the given day.
    ///
    /// A batch is valid iff its expiry date is strictly in the future and it
    /// has stock left.
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.expiry_date > today && self.quantity > 0
    }
}

/// A medicine with its embedded stock batches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Auto-incrementing numeric id, assigned on insert (0 until stored)
    pub id: i64,
    /// Primary name
    pub name: String,
    /// Dosage form (e.g., "tablet", "syrup", "injection")
    pub dosage_form: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Whether the medicine is available for dispensing
    pub available: bool,
    /// Procurement state
    pub order_status: OrderStatus,
    /// Stock batches, in stored order
    pub batches: Vec<StockBatch>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Medicine {
    /// Create a new medicine with required fields. The id is assigned when
    /// the medicine is inserted into the database.
    pub fn new(name: String, dosage_form: String, manufacturer: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: 0,
            name,
            dosage_form,
            manufacturer,
            available: true,
            order_status: OrderStatus::Requested,
            batches: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

}
