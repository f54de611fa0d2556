//! Prescription database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Prescription, PrescriptionEntry, PrescriptionStatus};

/// Insert a new prescription.
pub(crate) fn insert(conn: &Connection, prescription: &Prescription) -> DbResult<()> {
    let entries_json = serde_json::to_string(&prescription.entries)?;

    conn.execute(
        r#"
        INSERT INTO prescriptions (
            prescription_id, consultation_id, status, entries,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            prescription.prescription_id,
            prescription.consultation_id,
            status_to_string(&prescription.status),
            entries_json,
            prescription.created_at,
            prescription.updated_at,
        ],
    )?;
    Ok(())
}

/// Update an existing prescription (entries and derived status).
pub(crate) fn update(conn: &Connection, prescription: &Prescription) -> DbResult<bool> {
    let entries_json = serde_json::to_string(&prescription.entries)?;

    let rows_affected = conn.execute(
        r#"
        UPDATE prescriptions SET
            status = ?2,
            entries = ?3,
            updated_at = datetime('now')
        WHERE prescription_id = ?1
        "#,
        params![
            prescription.prescription_id,
            status_to_string(&prescription.status),
            entries_json,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Get a prescription by id.
pub(crate) fn get(conn: &Connection, prescription_id: &str) -> DbResult<Option<Prescription>> {
    conn.query_row(
        r#"
        SELECT prescription_id, consultation_id, status, entries,
               created_at, updated_at
        FROM prescriptions
        WHERE prescription_id = ?
        "#,
        [prescription_id],
        map_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// List all prescriptions of a consultation, newest first.
pub(crate) fn list_for_consultation(
    conn: &Connection,
    consultation_id: &str,
) -> DbResult<Vec<Prescription>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT prescription_id, consultation_id, status, entries,
               created_at, updated_at
        FROM prescriptions
        WHERE consultation_id = ?
        ORDER BY created_at DESC
        "#,
    )?;

    let rows = stmt.query_map([consultation_id], map_row)?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(row?.try_into()?);
    }
    Ok(prescriptions)
}

impl Database {
    /// Insert a new prescription.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        insert(self.conn(), prescription)
    }

    /// Update an existing prescription.
    pub fn update_prescription(&self, prescription: &Prescription) -> DbResult<bool> {
        update(self.conn(), prescription)
    }

    /// Get a prescription by id.
    pub fn get_prescription(&self, prescription_id: &str) -> DbResult<Option<Prescription>> {
        get(self.conn(), prescription_id)
    }

    /// List all prescriptions of a consultation, newest first.
    pub fn list_prescriptions_for_consultation(
        &self,
        consultation_id: &str,
    ) -> DbResult<Vec<Prescription>> {
        list_for_consultation(self.conn(), consultation_id)
    }
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    prescription_id: String,
    consultation_id: String,
    status: String,
    entries: String,
    created_at: String,
    updated_at: String,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        prescription_id: row.get(0)?,
        consultation_id: row.get(1)?,
        status: row.get(2)?,
        entries: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let entries: Vec<PrescriptionEntry> = serde_json::from_str(&row.entries)?;
        let status = string_to_status(&row.status)?;

        Ok(Prescription {
            prescription_id: row.prescription_id,
            consultation_id: row.consultation_id,
            status,
            entries,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn status_to_string(status: &PrescriptionStatus) -> &'static str {
    match status {
        PrescriptionStatus::Pending => "pending",
        PrescriptionStatus::PartiallyDispensed => "partially_dispensed",
        PrescriptionStatus::Dispensed => "dispensed",
    }
}

fn string_to_status(s: &str) -> Result<PrescriptionStatus, DbError> {
    match s {
        "pending" => Ok(PrescriptionStatus::Pending),
        "partially_dispensed" => Ok(PrescriptionStatus::PartiallyDispensed),
        "dispensed" => Ok(PrescriptionStatus::Dispensed),
        _ => Err(DbError::Constraint(format!(
            "Unknown prescription status: {}",
            s
        ))),
    }
}
