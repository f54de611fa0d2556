//! Transactional dispensing engine over the database.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::{
    stock, BatchView, DispenseError, DispenseResult, PatientPrescriptions, PatientSummary,
    PrescribedMedicine,
};
use crate::db::{consultations, medicines, patients, prescriptions, Database};

/// The dispensing engine. Holds the database exclusively for the duration of
/// an operation; every operation is a single SQLite transaction.
pub struct Dispenser<'a> {
    db: &'a mut Database,
}

impl<'a> Dispenser<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Resolve the prescriptions of a patient's most recent consultation,
    /// optionally dispensing against them.
    ///
    /// In preview mode (`dispense == false`) this is strictly read-only. In
    /// dispense mode, stock is drawn greedily from valid batches in stored
    /// order for every entry that still has a remaining quantity, dispensed
    /// quantities are advanced by what was actually drawn, and each
    /// prescription's status is re-derived and persisted.
    pub fn resolve_prescriptions_for_patient(
        &mut self,
        patient_id: &str,
        dispense: bool,
    ) -> DispenseResult<PatientPrescriptions> {
        let today = Utc::now().date_naive();
        self.resolve_prescriptions_on(patient_id, dispense, today)
    }

    pub(crate) fn resolve_prescriptions_on(
        &mut self,
        patient_id: &str,
        dispense: bool,
        today: NaiveDate,
    ) -> DispenseResult<PatientPrescriptions> {
        if patient_id.trim().is_empty() {
            return Err(DispenseError::Validation(
                "patient id must not be empty".into(),
            ));
        }

        let tx = self.db.transaction()?;

        let patient = patients::get(&tx, patient_id)?.ok_or_else(|| DispenseError::NotFound {
            entity: "patient",
            id: patient_id.to_string(),
        })?;

        let consultation =
            consultations::latest_for_patient(&tx, patient_id)?.ok_or_else(|| {
                DispenseError::NotFound {
                    entity: "consultation",
                    id: patient_id.to_string(),
                }
            })?;

        let found = prescriptions::list_for_consultation(&tx, &consultation.consultation_id)?;
        if found.is_empty() {
            return Err(DispenseError::NotFound {
                entity: "prescriptions",
                id: consultation.consultation_id,
            });
        }

        let mut rows = Vec::new();
        for mut prescription in found {
            let prescription_id = prescription.prescription_id.clone();
            let prescription_date = prescription.created_at.clone();
            let mut entry_rows = Vec::new();

            for entry in prescription.entries.iter_mut() {
                let mut medicine = medicines::get_by_id(&tx, entry.medicine_id)?.ok_or_else(
                    || DispenseError::NotFound {
                        entity: "medicine",
                        id: entry.medicine_id.to_string(),
                    },
                )?;

                let required = entry.remaining_qty();
                let mut drawn = Vec::new();
                if dispense && required > 0 {
                    drawn = stock::draw_from_batches(&mut medicine.batches, required, today);
                    let total = stock::drawn_total(&drawn);
                    if total > 0 {
                        entry.dispensed_qty += total;
                        medicines::update_batches(&tx, medicine.id, &medicine.batches)?;
                        debug!(
                            medicine_id = medicine.id,
                            entry_id = %entry.entry_id,
                            drawn = total,
                            "drew stock for entry"
                        );
                    }
                }

                entry_rows.push(PrescribedMedicine {
                    prescription_id: prescription_id.clone(),
                    entry_id: entry.entry_id.clone(),
                    medicine_id: medicine.id,
                    medicine_name: medicine.name.clone(),
                    dosage_form: medicine.dosage_form.clone(),
                    manufacturer: medicine.manufacturer.clone(),
                    available: medicine.available,
                    dosage: entry.dosage.clone(),
                    frequency: entry.frequency.clone(),
                    duration: entry.duration.clone(),
                    prescribed_qty: entry.prescribed_qty,
                    dispensed_qty: entry.dispensed_qty,
                    status: prescription.status,
                    prescription_date: prescription_date.clone(),
                    valid_batches: stock::valid_batches(&medicine.batches, today)
                        .into_iter()
                        .map(BatchView::from)
                        .collect(),
                    drawn_from: drawn,
                });
            }

            if dispense {
                prescription.recompute_status();
                prescriptions::update(&tx, &prescription)?;
            }
            for mut row in entry_rows {
                row.status = prescription.status;
                rows.push(row);
            }
        }

        tx.commit().map_err(crate::db::DbError::from)?;
        info!(
            patient_id,
            dispense,
            entries = rows.len(),
            "resolved prescriptions"
        );

        Ok(PatientPrescriptions {
            patient: PatientSummary::from(&patient),
            prescribed_medicines: rows,
        })
    }

    /// Set the absolute dispensed quantity of one prescription entry.
    ///
    /// Only the dispensed quantity is mutable through this path; dosage,
    /// frequency, duration and the prescribed quantity belong to the
    /// consultation workflow. An increase draws the difference from valid
    /// stock batches and fails with `InsufficientStock` when the aggregate
    /// valid stock cannot cover it. A decrease leaves stock untouched.
    pub fn update_entry_dispensed_qty(
        &mut self,
        prescription_id: &str,
        entry_id: &str,
        new_qty: u32,
    ) -> DispenseResult<()> {
        let today = Utc::now().date_naive();
        self.update_entry_dispensed_qty_on(prescription_id, entry_id, new_qty, today)
    }

    pub(crate) fn update_entry_dispensed_qty_on(
        &mut self,
        prescription_id: &str,
        entry_id: &str,
        new_qty: u32,
        today: NaiveDate,
    ) -> DispenseResult<()> {
        if prescription_id.trim().is_empty() || entry_id.trim().is_empty() {
            return Err(DispenseError::Validation(
                "prescription id and entry id must not be empty".into(),
            ));
        }

        let tx = self.db.transaction()?;

        let mut prescription =
            prescriptions::get(&tx, prescription_id)?.ok_or_else(|| DispenseError::NotFound {
                entity: "prescription",
                id: prescription_id.to_string(),
            })?;

        let (medicine_id, prescribed_qty, current_qty) = match prescription.entry(entry_id) {
            Some(entry) => (entry.medicine_id, entry.prescribed_qty, entry.dispensed_qty),
            None => {
                return Err(DispenseError::NotFound {
                    entity: "entry",
                    id: entry_id.to_string(),
                })
            }
        };

        if new_qty > prescribed_qty {
            return Err(DispenseError::Validation(format!(
                "dispensed quantity {} exceeds prescribed quantity {}",
                new_qty, prescribed_qty
            )));
        }

        let mut medicine =
            medicines::get_by_id(&tx, medicine_id)?.ok_or_else(|| DispenseError::NotFound {
                entity: "medicine",
                id: medicine_id.to_string(),
            })?;

        if new_qty > current_qty {
            let delta = new_qty - current_qty;
            let available = stock::total_valid_stock(&medicine.batches, today);
            if available < delta {
                warn!(
                    medicine_id,
                    requested = delta,
                    available,
                    "insufficient stock for dispensed-quantity update"
                );
                return Err(DispenseError::InsufficientStock {
                    medicine_id,
                    requested: delta,
                    available,
                });
            }
            stock::draw_from_batches(&mut medicine.batches, delta, today);
            medicines::update_batches(&tx, medicine.id, &medicine.batches)?;
        }
        // A decrease does not restock: drawn units cannot be attributed back
        // to specific batches. Physical returns go through the inventory
        // replenishment workflow.

        if let Some(entry) = prescription.entry_mut(entry_id) {
            entry.dispensed_qty = new_qty;
        }
        prescription.recompute_status();
        prescriptions::update(&tx, &prescription)?;

        tx.commit().map_err(crate::db::DbError::from)?;
        info!(
            prescription_id,
            entry_id, new_qty, "updated dispensed quantity"
        );
        Ok(())
    }
}
