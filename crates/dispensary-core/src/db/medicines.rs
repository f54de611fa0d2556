//! Medicine database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Medicine, OrderStatus, StockBatch};

const SELECT_COLUMNS: &str = "id, name, dosage_form, manufacturer, available, \
                              order_status, batches, created_at, updated_at";

/// Insert a new medicine, returning its assigned numeric id.
pub(crate) fn insert(conn: &Connection, medicine: &Medicine) -> DbResult<i64> {
    let batches_json = serde_json::to_string(&medicine.batches)?;

    conn.execute(
        r#"
        INSERT INTO medicines (
            name, dosage_form, manufacturer, available,
            order_status, batches, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            medicine.name,
            medicine.dosage_form,
            medicine.manufacturer,
            medicine.available,
            order_status_to_string(&medicine.order_status),
            batches_json,
            medicine.created_at,
            medicine.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a medicine by numeric id.
pub(crate) fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Medicine>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM medicines WHERE id = ?"),
        [id],
        map_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// Update all mutable fields of an existing medicine.
pub(crate) fn update(conn: &Connection, medicine: &Medicine) -> DbResult<bool> {
    let batches_json = serde_json::to_string(&medicine.batches)?;

    let rows_affected = conn.execute(
        r#"
        UPDATE medicines SET
            name = ?2,
            dosage_form = ?3,
            manufacturer = ?4,
            available = ?5,
            order_status = ?6,
            batches = ?7,
            updated_at = datetime('now')
        WHERE id = ?1
        "#,
        params![
            medicine.id,
            medicine.name,
            medicine.dosage_form,
            medicine.manufacturer,
            medicine.available,
            order_status_to_string(&medicine.order_status),
            batches_json,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Replace only the stock batches of a medicine. This is the write the
/// dispensing engine performs when drawing stock.
pub(crate) fn update_batches(
    conn: &Connection,
    id: i64,
    batches: &[StockBatch],
) -> DbResult<bool> {
    let batches_json = serde_json::to_string(batches)?;

    let rows_affected = conn.execute(
        "UPDATE medicines SET batches = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, batches_json],
    )?;
    Ok(rows_affected > 0)
}

/// List medicines, optionally restricted to available ones.
pub(crate) fn list(conn: &Connection, available_only: bool) -> DbResult<Vec<Medicine>> {
    let sql = if available_only {
        format!("SELECT {SELECT_COLUMNS} FROM medicines WHERE available = 1 ORDER BY name")
    } else {
        format!("SELECT {SELECT_COLUMNS} FROM medicines ORDER BY name")
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_row)?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(row?.try_into()?);
    }
    Ok(medicines)
}

/// Search medicines using FTS5 (BM25 ranking) over name and manufacturer.
pub(crate) fn search(conn: &Connection, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
    let escaped_query = escape_fts_query(query);
    if escaped_query.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT m.id, m.name, m.dosage_form, m.manufacturer, m.available,
               m.order_status, m.batches, m.created_at, m.updated_at,
               bm25(medicines_fts) as rank
        FROM medicines m
        JOIN medicines_fts fts ON m.id = fts.rowid
        WHERE medicines_fts MATCH ?
        AND m.available = 1
        ORDER BY rank
        LIMIT ?
        "#,
    )?;

    let rows = stmt.query_map(params![escaped_query, limit as i64], map_row)?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(row?.try_into()?);
    }
    Ok(medicines)
}

/// Set the availability flag (soft removal from dispensing).
pub(crate) fn set_available(conn: &Connection, id: i64, available: bool) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE medicines SET available = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, available],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Insert a new medicine, returning its assigned numeric id.
    pub fn insert_medicine(&self, medicine: &Medicine) -> DbResult<i64> {
        insert(self.conn(), medicine)
    }

    /// Get a medicine by id.
    pub fn get_medicine(&self, id: i64) -> DbResult<Option<Medicine>> {
        get_by_id(self.conn(), id)
    }

    /// Update an existing medicine.
    pub fn update_medicine(&self, medicine: &Medicine) -> DbResult<bool> {
        update(self.conn(), medicine)
    }

    /// List medicines, optionally restricted to available ones.
    pub fn list_medicines(&self, available_only: bool) -> DbResult<Vec<Medicine>> {
        list(self.conn(), available_only)
    }

    /// Search medicines by name/manufacturer.
    pub fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        search(self.conn(), query, limit)
    }

    /// Set the availability flag of a medicine.
    pub fn set_medicine_available(&self, id: i64, available: bool) -> DbResult<bool> {
        set_available(self.conn(), id, available)
    }
}

/// Intermediate row struct for database mapping.
struct MedicineRow {
    id: i64,
    name: String,
    dosage_form: String,
    manufacturer: String,
    available: bool,
    order_status: String,
    batches: String,
    created_at: String,
    updated_at: String,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MedicineRow> {
    Ok(MedicineRow {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage_form: row.get(2)?,
        manufacturer: row.get(3)?,
        available: row.get(4)?,
        order_status: row.get(5)?,
        batches: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = DbError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        Ok(Medicine {
            id: row.id,
            name: row.name,
            dosage_form: row.dosage_form,
            manufacturer: row.manufacturer,
            available: row.available,
            order_status: string_to_order_status(&row.order_status)?,
            batches: serde_json::from_str(&row.batches)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn order_status_to_string(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Requested => "requested",
        OrderStatus::Ordered => "ordered",
        OrderStatus::Cancelled => "cancelled",
    }
}

fn string_to_order_status(s: &str) -> Result<OrderStatus, DbError> {
    match s {
        "requested" => Ok(OrderStatus::Requested),
        "ordered" => Ok(OrderStatus::Ordered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        _ => Err(DbError::Constraint(format!("Unknown order status: {}", s))),
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}
