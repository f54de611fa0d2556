//! Consultation models.

use serde::{Deserialize, Serialize};

/// A consultation between a patient and a doctor. Created by the
/// consultation workflow; the dispensing engine only reads the most recent
/// one per patient to find its prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    /// Unique consultation id
    pub consultation_id: String,
    /// Patient this consultation belongs to
    pub patient_id: String,
    /// Start timestamp (RFC 3339), used to order consultations
    pub started_at: String,
    /// Free-form notes
    pub notes: Option<String>,
}

impl Consultation {
    /// Create a new consultation starting now.
    pub fn new(patient_id: String) -> Self {
        Self {
            consultation_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            started_at: chrono::Utc::now().to_rfc3339(),
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_consultation() {
        let consultation = Consultation::new("patient-1".into());
        assert_eq!(consultation.patient_id, "patient-1");
        assert_eq!(consultation.consultation_id.len(), 36);
    }
}
