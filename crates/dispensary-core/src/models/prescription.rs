//! Prescription models and status derivation.

use serde::{Deserialize, Serialize};

/// Fulfilment state of a prescription. Always a pure function of its
/// entries' dispensed/prescribed quantities, never set independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    /// Nothing has been dispensed yet
    Pending,
    /// Some, but not all, of the prescribed quantities have been dispensed
    PartiallyDispensed,
    /// Every entry is fully dispensed
    Dispensed,
}

/// One line item within a prescription, referencing exactly one medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionEntry {
    /// Stable entry id, unique within the prescription
    pub entry_id: String,
    /// Numeric id of the prescribed medicine
    pub medicine_id: i64,
    /// Dosage instruction (e.g., "500mg")
    pub dosage: String,
    /// Frequency instruction (e.g., "1-0-1")
    pub frequency: String,
    /// Duration instruction (e.g., "5 days")
    pub duration: String,
    /// Total quantity prescribed, always > 0
    pub prescribed_qty: u32,
    /// Quantity dispensed so far, 0 <= dispensed <= prescribed
    pub dispensed_qty: u32,
}

impl PrescriptionEntry {
    /// Create a new entry with nothing dispensed yet.
    pub fn new(
        medicine_id: i64,
        dosage: String,
        frequency: String,
        duration: String,
        prescribed_qty: u32,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            medicine_id,
            dosage,
            frequency,
            duration,
            prescribed_qty,
            dispensed_qty: 0,
        }
    }

    /// Quantity still owed to the patient.
    pub fn remaining_qty(&self) -> u32 {
        self.prescribed_qty.saturating_sub(self.dispensed_qty)
    }

    /// Whether the full prescribed quantity has been handed out.
    pub fn is_fully_dispensed(&self) -> bool {
        self.dispensed_qty >= self.prescribed_qty
    }
}

/// A prescription issued by a consultation, with embedded entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Unique prescription id
    pub prescription_id: String,
    /// Consultation that issued this prescription
    pub consultation_id: String,
    /// Fulfilment state, derived from the entries
    pub status: PrescriptionStatus,
    /// Line items, in stored order
    pub entries: Vec<PrescriptionEntry>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Prescription {
    /// Create a new prescription for a consultation.
    pub fn new(consultation_id: String, entries: Vec<PrescriptionEntry>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            prescription_id: uuid::Uuid::new_v4().to_string(),
            consultation_id,
            status: derive_status(&entries),
            entries,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Look up an entry by its stable id.
    pub fn entry(&self, entry_id: &str) -> Option<&PrescriptionEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    /// Look up an entry by its stable id, mutably.
    pub fn entry_mut(&mut self, entry_id: &str) -> Option<&mut PrescriptionEntry> {
        self.entries.iter_mut().find(|e| e.entry_id == entry_id)
    }

    /// Recompute the status from the current entries.
    pub fn recompute_status(&mut self) {
        self.status = derive_status(&self.entries);
    }
}

/// Derive a prescription's status from its entries.
///
/// `Dispensed` iff every entry is fully dispensed; `Pending` iff every entry
/// has nothing dispensed; `PartiallyDispensed` otherwise.
pub fn derive_status(entries: &[PrescriptionEntry]) -> PrescriptionStatus {
    if entries.iter().all(|e| e.is_fully_dispensed()) && !entries.is_empty() {
        PrescriptionStatus::Dispensed
    } else if entries.iter().all(|e| e.dispensed_qty == 0) {
        PrescriptionStatus::Pending
    } else {
        PrescriptionStatus::PartiallyDispensed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(prescribed: u32, dispensed: u32) -> PrescriptionEntry {
        let mut e = PrescriptionEntry::new(1, "500mg".into(), "1-0-1".into(), "5 days".into(), prescribed);
        e.dispensed_qty = dispensed;
        e
    }

    #[test]
    fn test_derive_status_pending() {
        assert_eq!(derive_status(&[entry(10, 0), entry(5, 0)]), PrescriptionStatus::Pending);
        // No entries at all: nothing dispensed
        assert_eq!(derive_status(&[]), PrescriptionStatus::Pending);
    }

    #[test]
    fn test_derive_status_partial() {
        // One entry part-filled
        assert_eq!(
            derive_status(&[entry(10, 4)]),
            PrescriptionStatus::PartiallyDispensed
        );
        // One entry full, one untouched
        assert_eq!(
            derive_status(&[entry(10, 10), entry(5, 0)]),
            PrescriptionStatus::PartiallyDispensed
        );
    }

    #[test]
    fn test_derive_status_dispensed() {
        assert_eq!(
            derive_status(&[entry(10, 10), entry(5, 5)]),
            PrescriptionStatus::Dispensed
        );
    }

    #[test]
    fn test_entry_lookup_by_id() {
        let e1 = entry(10, 0);
        let e2 = entry(5, 0);
        let wanted = e2.entry_id.clone();
        let mut prescription = Prescription::new("consult-1".into(), vec![e1, e2]);

        assert_eq!(prescription.entry(&wanted).unwrap().prescribed_qty, 5);
        assert!(prescription.entry("missing").is_none());

        prescription.entry_mut(&wanted).unwrap().dispensed_qty = 5;
        prescription.recompute_status();
        assert_eq!(prescription.status, PrescriptionStatus::PartiallyDispensed);
    }

    #[test]
    fn test_remaining_qty() {
        assert_eq!(entry(10, 3).remaining_qty(), 7);
        assert_eq!(entry(10, 10).remaining_qty(), 0);
    }
}
