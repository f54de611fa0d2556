//! SQLite schema definition.

/// Complete database schema for the dispensary.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medicines
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    dosage_form TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    available INTEGER NOT NULL DEFAULT 1,
    order_status TEXT NOT NULL DEFAULT 'requested', -- requested, ordered, cancelled
    batches TEXT NOT NULL DEFAULT '[]',             -- JSON array of StockBatch
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- FTS5 virtual table for medicine name search
CREATE VIRTUAL TABLE IF NOT EXISTS medicines_fts USING fts5(
    name,
    manufacturer,
    content='medicines',
    content_rowid='id'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS medicines_ai AFTER INSERT ON medicines BEGIN
    INSERT INTO medicines_fts(rowid, name, manufacturer)
    VALUES (new.id, new.name, new.manufacturer);
END;

CREATE TRIGGER IF NOT EXISTS medicines_ad AFTER DELETE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name, manufacturer)
    VALUES ('delete', old.id, old.name, old.manufacturer);
END;

CREATE TRIGGER IF NOT EXISTS medicines_au AFTER UPDATE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name, manufacturer)
    VALUES ('delete', old.id, old.name, old.manufacturer);
    INSERT INTO medicines_fts(rowid, name, manufacturer)
    VALUES (new.id, new.name, new.manufacturer);
END;

CREATE INDEX IF NOT EXISTS idx_medicines_name ON medicines(name);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    gender TEXT,
    date_of_birth TEXT,
    phone TEXT,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    consultation_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id),
    started_at TEXT NOT NULL,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient
    ON consultations(patient_id, started_at);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    prescription_id TEXT PRIMARY KEY,
    consultation_id TEXT NOT NULL REFERENCES consultations(consultation_id),
    status TEXT NOT NULL DEFAULT 'pending',         -- pending, partially_dispensed, dispensed
    entries TEXT NOT NULL DEFAULT '[]',             -- JSON array of PrescriptionEntry
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_consultation
    ON prescriptions(consultation_id, created_at);
"#;
