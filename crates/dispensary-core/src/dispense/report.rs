//! Response views returned by the dispensing engine. Nothing here is
//! persisted; the ledger and batch views are rebuilt on every call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::BatchDraw;
use crate::models::{Patient, PrescriptionStatus, StockBatch};

/// Patient fields echoed back with a prescriptions report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub patient_id: String,
    pub name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            patient_id: patient.patient_id.clone(),
            name: patient.name.clone(),
            gender: patient.gender.clone(),
            date_of_birth: patient.date_of_birth.clone(),
        }
    }
}

/// A dispensable batch as shown to the caller: remaining quantity after any
/// draw in this call, plus price and supplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchView {
    pub batch_no: String,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
    pub unit_price: f64,
    pub supplier: String,
}

impl From<&StockBatch> for BatchView {
    fn from(batch: &StockBatch) -> Self {
        Self {
            batch_no: batch.batch_no.clone(),
            quantity: batch.quantity,
            expiry_date: batch.expiry_date,
            unit_price: batch.unit_price,
            supplier: batch.supplier.clone(),
        }
    }
}

/// One flattened row per prescription entry, with medicine details resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescribedMedicine {
    pub prescription_id: String,
    pub entry_id: String,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub dosage_form: String,
    pub manufacturer: String,
    pub available: bool,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub prescribed_qty: u32,
    pub dispensed_qty: u32,
    /// Status of the owning prescription after this call
    pub status: PrescriptionStatus,
    /// Creation date of the owning prescription
    pub prescription_date: String,
    /// Batches still dispensable after any draw in this call
    pub valid_batches: Vec<BatchView>,
    /// Ledger of stock drawn by this call (empty in preview mode)
    pub drawn_from: Vec<BatchDraw>,
}

/// Result of resolving a patient's prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientPrescriptions {
    pub patient: PatientSummary,
    pub prescribed_medicines: Vec<PrescribedMedicine>,
}
