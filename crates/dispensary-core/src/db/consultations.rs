//! Consultation database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Consultation;

/// Insert a new consultation.
pub(crate) fn insert(conn: &Connection, consultation: &Consultation) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO consultations (consultation_id, patient_id, started_at, notes)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            consultation.consultation_id,
            consultation.patient_id,
            consultation.started_at,
            consultation.notes,
        ],
    )?;
    Ok(())
}

/// Get a consultation by id.
pub(crate) fn get(conn: &Connection, consultation_id: &str) -> DbResult<Option<Consultation>> {
    conn.query_row(
        r#"
        SELECT consultation_id, patient_id, started_at, notes
        FROM consultations
        WHERE consultation_id = ?
        "#,
        [consultation_id],
        map_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Get the patient's most recent consultation by start time.
pub(crate) fn latest_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> DbResult<Option<Consultation>> {
    conn.query_row(
        r#"
        SELECT consultation_id, patient_id, started_at, notes
        FROM consultations
        WHERE patient_id = ?
        ORDER BY started_at DESC
        LIMIT 1
        "#,
        [patient_id],
        map_row,
    )
    .optional()
    .map_err(Into::into)
}

impl Database {
    /// Insert a new consultation.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        insert(self.conn(), consultation)
    }

    /// Get a consultation by id.
    pub fn get_consultation(&self, consultation_id: &str) -> DbResult<Option<Consultation>> {
        get(self.conn(), consultation_id)
    }

    /// Get the patient's most recent consultation.
    pub fn latest_consultation_for_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Option<Consultation>> {
        latest_for_patient(self.conn(), patient_id)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        consultation_id: row.get(0)?,
        patient_id: row.get(1)?,
        started_at: row.get(2)?,
        notes: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn setup_db() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Asha Rao".into());
        db.insert_patient(&patient).unwrap();
        let id = patient.patient_id;
        (db, id)
    }

    #[test]
    fn test_insert_and_get() {
        let (db, patient_id) = setup_db();

        let mut consultation = Consultation::new(patient_id);
        consultation.notes = Some("Fever, 3 days".into());
        db.insert_consultation(&consultation).unwrap();

        let retrieved = db
            .get_consultation(&consultation.consultation_id)
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.notes, Some("Fever, 3 days".into()));
    }

    #[test]
    fn test_latest_for_patient() {
        let (db, patient_id) = setup_db();

        let mut older = Consultation::new(patient_id.clone());
        older.started_at = "2025-01-01T09:00:00+00:00".into();
        db.insert_consultation(&older).unwrap();

        let mut newer = Consultation::new(patient_id.clone());
        newer.started_at = "2025-03-15T10:30:00+00:00".into();
        db.insert_consultation(&newer).unwrap();

        let latest = db
            .latest_consultation_for_patient(&patient_id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.consultation_id, newer.consultation_id);
    }

    #[test]
    fn test_latest_for_patient_none() {
        let (db, _) = setup_db();
        let other = Patient::new("Meera Nair".into());
        db.insert_patient(&other).unwrap();

        let latest = db.latest_consultation_for_patient(&other.patient_id).unwrap();
        assert!(latest.is_none());
    }
}
