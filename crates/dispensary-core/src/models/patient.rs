//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient record. The dispensing core only reads patients; demographics
/// are maintained by the registration workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Unique patient id
    pub patient_id: String,
    /// Full name
    pub name: String,
    /// Gender
    pub gender: Option<String>,
    /// Date of birth (ISO 8601 date)
    pub date_of_birth: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            patient_id: uuid::Uuid::new_v4().to_string(),
            name,
            gender: None,
            date_of_birth: None,
            phone: None,
            address: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Asha Rao".into());
        assert_eq!(patient.name, "Asha Rao");
        assert_eq!(patient.patient_id.len(), 36); // UUID format
        assert!(patient.gender.is_none());
    }
}
