//! Dispensary Core Library
//!
//! Hospital pharmacy dispensing core: medicines with expiry-tracked stock
//! batches, prescriptions issued by consultations, and the engine that
//! dispenses against them.
//!
//! # Architecture
//!
//! ```text
//! Caller (router / CLI / tests)
//!             │
//!             ▼
//!      DispensaryCore ──────── CRUD glue (medicines, patients,
//!             │                consultations, prescriptions)
//!             ▼
//!        Dispenser  ── one SQLite transaction per operation
//!             │
//!   ┌─────────┼─────────┐
//!   ▼         ▼         ▼
//! Patient  Prescription  Medicine
//! lookup   entries       stock batches
//!          (dispensed    (greedy draw over
//!           quantities,   valid batches)
//!           status)
//! ```
//!
//! # Core Principle
//!
//! **Stock and prescriptions reconcile.** A batch decrement and the matching
//! dispensed-quantity increment are committed together or not at all, batch
//! quantities never go negative, and a prescription's status is always a pure
//! function of its entries.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer with FTS5 medicine search
//! - [`models`]: Domain types (Medicine, StockBatch, Prescription, etc.)
//! - [`dispense`]: Stock selection, the dispensing engine, response views

pub mod db;
pub mod dispense;
pub mod models;

// Re-export commonly used types
pub use db::Database;
pub use dispense::{
    BatchDraw, BatchView, DispenseError, Dispenser, PatientPrescriptions, PatientSummary,
    PrescribedMedicine,
};
pub use models::{
    Consultation, Medicine, OrderStatus, Patient, Prescription, PrescriptionEntry,
    PrescriptionStatus, StockBatch,
};

use std::sync::{Arc, Mutex};

use tracing::error;

// =========================================================================
// Crate-Level Error Type
// =========================================================================

/// Operation-boundary errors, mapped onto the HTTP-ish taxonomy callers
/// expose: validation and stock errors are the caller's fault, not-found is
/// a missing resource, everything else is internal.
#[derive(Debug, thiserror::Error)]
pub enum DispensaryError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Storage error: {0}")]
    Storage(#[from] db::DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispensaryError {
    /// HTTP status code this error maps to at a routing boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            DispensaryError::Validation(_) => 400,
            DispensaryError::InsufficientStock(_) => 400,
            DispensaryError::NotFound(_) => 404,
            DispensaryError::Storage(_) => 500,
            DispensaryError::Internal(_) => 500,
        }
    }
}

impl From<DispenseError> for DispensaryError {
    fn from(e: DispenseError) -> Self {
        match e {
            DispenseError::Database(db) => DispensaryError::Storage(db),
            DispenseError::NotFound { entity, id } => {
                DispensaryError::NotFound(format!("{} {}", entity, id))
            }
            DispenseError::Validation(msg) => DispensaryError::Validation(msg),
            e @ DispenseError::InsufficientStock { .. } => {
                DispensaryError::InsufficientStock(e.to_string())
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DispensaryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DispensaryError::Internal(format!("Lock poisoned: {}", e))
    }
}

pub type DispensaryResult<T> = Result<T, DispensaryError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service object over the dispensary database. This is the
/// operation boundary a router or CLI calls into; each method takes the
/// database lock for the duration of one operation.
pub struct DispensaryCore {
    db: Arc<Mutex<Database>>,
}

impl DispensaryCore {
    /// Open or create a database at the given path.
    pub fn open(path: &str) -> DispensaryResult<Self> {
        let db = Database::open(path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> DispensaryResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    // =========================================================================
    // Dispensing Operations
    // =========================================================================

    /// Resolve the prescriptions of a patient's most recent consultation.
    ///
    /// With `dispense == false` this is a read-only preview; with `true`,
    /// stock is drawn and dispensed quantities and statuses are persisted.
    pub fn prescriptions_for_patient(
        &self,
        patient_id: &str,
        dispense: bool,
    ) -> DispensaryResult<PatientPrescriptions> {
        let mut db = self.db.lock()?;
        let report = Dispenser::new(&mut db)
            .resolve_prescriptions_for_patient(patient_id, dispense)
            .map_err(|e| self.log_internal(e))?;
        Ok(report)
    }

    /// Set the absolute dispensed quantity of one prescription entry.
    pub fn update_dispensed_qty(
        &self,
        prescription_id: &str,
        entry_id: &str,
        new_qty: u32,
    ) -> DispensaryResult<()> {
        let mut db = self.db.lock()?;
        Dispenser::new(&mut db)
            .update_entry_dispensed_qty(prescription_id, entry_id, new_qty)
            .map_err(|e| self.log_internal(e))?;
        Ok(())
    }

    // =========================================================================
    // Medicine Operations
    // =========================================================================

    /// Add a medicine, returning it with its assigned numeric id.
    pub fn add_medicine(&self, mut medicine: Medicine) -> DispensaryResult<Medicine> {
        let db = self.db.lock()?;
        medicine.id = db.insert_medicine(&medicine)?;
        Ok(medicine)
    }

    /// Get a medicine by id.
    pub fn get_medicine(&self, id: i64) -> DispensaryResult<Option<Medicine>> {
        let db = self.db.lock()?;
        Ok(db.get_medicine(id)?)
    }

    /// Update an existing medicine (inventory-management workflow).
    pub fn update_medicine(&self, medicine: &Medicine) -> DispensaryResult<bool> {
        let db = self.db.lock()?;
        Ok(db.update_medicine(medicine)?)
    }

    /// Search available medicines by name/manufacturer.
    pub fn search_medicines(&self, query: &str, limit: usize) -> DispensaryResult<Vec<Medicine>> {
        let db = self.db.lock()?;
        Ok(db.search_medicines(query, limit)?)
    }

    /// List medicines, optionally restricted to available ones.
    pub fn list_medicines(&self, available_only: bool) -> DispensaryResult<Vec<Medicine>> {
        let db = self.db.lock()?;
        Ok(db.list_medicines(available_only)?)
    }

    /// Set a medicine's availability flag.
    pub fn set_medicine_available(&self, id: i64, available: bool) -> DispensaryResult<bool> {
        let db = self.db.lock()?;
        Ok(db.set_medicine_available(id, available)?)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn create_patient(&self, name: String) -> DispensaryResult<Patient> {
        if name.trim().is_empty() {
            return Err(DispensaryError::Validation(
                "patient name must not be empty".into(),
            ));
        }
        let db = self.db.lock()?;
        let patient = Patient::new(name);
        db.insert_patient(&patient)?;
        Ok(patient)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, patient_id: &str) -> DispensaryResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db.get_patient(patient_id)?)
    }

    /// Search patients by name prefix.
    pub fn search_patients(&self, query: &str, limit: usize) -> DispensaryResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.search_patients(query, limit)?)
    }

    // =========================================================================
    // Consultation / Prescription Glue
    // =========================================================================

    /// Record a consultation starting now for an existing patient.
    pub fn record_consultation(&self, patient_id: &str) -> DispensaryResult<Consultation> {
        let db = self.db.lock()?;
        if db.get_patient(patient_id)?.is_none() {
            return Err(DispensaryError::NotFound(format!("patient {}", patient_id)));
        }
        let consultation = Consultation::new(patient_id.to_string());
        db.insert_consultation(&consultation)?;
        Ok(consultation)
    }

    /// Create a prescription under a consultation.
    pub fn create_prescription(
        &self,
        consultation_id: &str,
        entries: Vec<PrescriptionEntry>,
    ) -> DispensaryResult<Prescription> {
        if entries.iter().any(|e| e.prescribed_qty == 0) {
            return Err(DispensaryError::Validation(
                "prescribed quantity must be greater than zero".into(),
            ));
        }
        let db = self.db.lock()?;
        if db.get_consultation(consultation_id)?.is_none() {
            return Err(DispensaryError::NotFound(format!(
                "consultation {}",
                consultation_id
            )));
        }
        let prescription = Prescription::new(consultation_id.to_string(), entries);
        db.insert_prescription(&prescription)?;
        Ok(prescription)
    }

    /// Get a prescription by id.
    pub fn get_prescription(&self, prescription_id: &str) -> DispensaryResult<Option<Prescription>> {
        let db = self.db.lock()?;
        Ok(db.get_prescription(prescription_id)?)
    }

    /// Log storage-level failures server-side; callers only see the generic
    /// message carried by the error variant.
    fn log_internal(&self, e: DispenseError) -> DispenseError {
        if let DispenseError::Database(ref db_err) = e {
            error!(error = %db_err, "storage failure during dispensing operation");
        }
        e
    }
}
