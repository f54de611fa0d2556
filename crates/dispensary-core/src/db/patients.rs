//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Patient;

/// Insert a new patient.
pub(crate) fn insert(conn: &Connection, patient: &Patient) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO patients (
            patient_id, name, gender, date_of_birth, phone, address,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            patient.patient_id,
            patient.name,
            patient.gender,
            patient.date_of_birth,
            patient.phone,
            patient.address,
            patient.created_at,
            patient.updated_at,
        ],
    )?;
    Ok(())
}

/// Get a patient by id.
pub(crate) fn get(conn: &Connection, patient_id: &str) -> DbResult<Option<Patient>> {
    conn.query_row(
        r#"
        SELECT patient_id, name, gender, date_of_birth, phone, address,
               created_at, updated_at
        FROM patients
        WHERE patient_id = ?
        "#,
        [patient_id],
        map_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Search patients by name (prefix match).
pub(crate) fn search(conn: &Connection, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
    let pattern = format!("{}%", query);
    let mut stmt = conn.prepare(
        r#"
        SELECT patient_id, name, gender, date_of_birth, phone, address,
               created_at, updated_at
        FROM patients
        WHERE name LIKE ?
        ORDER BY name
        LIMIT ?
        "#,
    )?;

    let rows = stmt.query_map(params![pattern, limit as i64], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// List all patients.
pub(crate) fn list(conn: &Connection) -> DbResult<Vec<Patient>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT patient_id, name, gender, date_of_birth, phone, address,
               created_at, updated_at
        FROM patients
        ORDER BY name
        "#,
    )?;

    let rows = stmt.query_map([], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        insert(self.conn(), patient)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<Patient>> {
        get(self.conn(), patient_id)
    }

    /// Search patients by name prefix.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        search(self.conn(), query, limit)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        list(self.conn())
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        patient_id: row.get(0)?,
        name: row.get(1)?,
        gender: row.get(2)?,
        date_of_birth: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
