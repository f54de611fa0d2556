//! End-to-end dispensing scenarios through the service API.
//!
//! These tests verify the dispensing workflow against known scenarios:
//! stock draw, partial fulfilment, status derivation, and the error
//! taxonomy at the operation boundary.

use chrono::NaiveDate;
use dispensary_core::{
    DispensaryCore, DispensaryError, Medicine, PrescriptionEntry, PrescriptionStatus, StockBatch,
};

fn batch(batch_no: &str, quantity: u32, expiry: (i32, u32, u32)) -> StockBatch {
    StockBatch {
        batch_no: batch_no.into(),
        quantity,
        expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
        mfg_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        unit_price: 3.5,
        supplier: "Acme Pharma".into(),
    }
}

fn seed_medicine(core: &DispensaryCore, name: &str, batches: Vec<StockBatch>) -> i64 {
    let mut medicine = Medicine::new(name.into(), "tablet".into(), "Acme".into());
    medicine.batches = batches;
    core.add_medicine(medicine).unwrap().id
}

fn entry(medicine_id: i64, prescribed: u32) -> PrescriptionEntry {
    PrescriptionEntry::new(
        medicine_id,
        "500mg".into(),
        "1-0-1".into(),
        "5 days".into(),
        prescribed,
    )
}

/// Seed patient + consultation + prescription; returns (patient_id, prescription_id, entry_ids).
fn seed_workflow(
    core: &DispensaryCore,
    entries: Vec<PrescriptionEntry>,
) -> (String, String, Vec<String>) {
    let patient = core.create_patient("Asha Rao".into()).unwrap();
    let consultation = core.record_consultation(&patient.patient_id).unwrap();
    let prescription = core
        .create_prescription(&consultation.consultation_id, entries)
        .unwrap();
    let entry_ids = prescription
        .entries
        .iter()
        .map(|e| e.entry_id.clone())
        .collect();
    (patient.patient_id, prescription.prescription_id, entry_ids)
}

/// Single-batch fulfilment scenario.
struct DispenseCase {
    id: &'static str,
    batch_qty: u32,
    prescribed: u32,
    expected_dispensed: u32,
    expected_batch_left: u32,
    expected_status: PrescriptionStatus,
}

fn dispense_cases() -> Vec<DispenseCase> {
    vec![
        DispenseCase {
            id: "full-fulfilment",
            batch_qty: 100,
            prescribed: 10,
            expected_dispensed: 10,
            expected_batch_left: 90,
            expected_status: PrescriptionStatus::Dispensed,
        },
        DispenseCase {
            id: "partial-fulfilment",
            batch_qty: 5,
            prescribed: 10,
            expected_dispensed: 5,
            expected_batch_left: 0,
            expected_status: PrescriptionStatus::PartiallyDispensed,
        },
        DispenseCase {
            id: "exact-fulfilment",
            batch_qty: 10,
            prescribed: 10,
            expected_dispensed: 10,
            expected_batch_left: 0,
            expected_status: PrescriptionStatus::Dispensed,
        },
        DispenseCase {
            id: "empty-stock",
            batch_qty: 0,
            prescribed: 10,
            expected_dispensed: 0,
            expected_batch_left: 0,
            expected_status: PrescriptionStatus::Pending,
        },
    ]
}

#[test]
fn test_dispense_scenarios() {
    for case in dispense_cases() {
        let core = DispensaryCore::open_in_memory().unwrap();
        let medicine_id = seed_medicine(
            &core,
            "Amoxicillin 500mg",
            vec![batch("B1", case.batch_qty, (2099, 1, 1))],
        );
        let (patient_id, prescription_id, _) =
            seed_workflow(&core, vec![entry(medicine_id, case.prescribed)]);

        let report = core.prescriptions_for_patient(&patient_id, true).unwrap();

        let row = &report.prescribed_medicines[0];
        assert_eq!(row.dispensed_qty, case.expected_dispensed, "case {}", case.id);
        assert_eq!(row.status, case.expected_status, "case {}", case.id);

        let stored = core.get_medicine(medicine_id).unwrap().unwrap();
        assert_eq!(
            stored.batches[0].quantity, case.expected_batch_left,
            "case {}",
            case.id
        );
        let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
        assert_eq!(stored.status, case.expected_status, "case {}", case.id);
        assert_eq!(
            stored.entries[0].dispensed_qty, case.expected_dispensed,
            "case {}",
            case.id
        );
    }
}

#[test]
fn test_preview_then_dispense() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(
        &core,
        "Amoxicillin 500mg",
        vec![batch("B1", 100, (2099, 1, 1))],
    );
    let (patient_id, _, _) = seed_workflow(&core, vec![entry(medicine_id, 10)]);

    // Preview never mutates, no matter how often it runs
    for _ in 0..3 {
        let preview = core.prescriptions_for_patient(&patient_id, false).unwrap();
        let row = &preview.prescribed_medicines[0];
        assert_eq!(row.dispensed_qty, 0);
        assert_eq!(row.status, PrescriptionStatus::Pending);
        assert!(row.drawn_from.is_empty());
        assert_eq!(row.valid_batches[0].quantity, 100);
    }
    assert_eq!(
        core.get_medicine(medicine_id).unwrap().unwrap().batches[0].quantity,
        100
    );

    // Committing draws stock and records the ledger
    let report = core.prescriptions_for_patient(&patient_id, true).unwrap();
    let row = &report.prescribed_medicines[0];
    assert_eq!(row.drawn_from.len(), 1);
    assert_eq!(row.drawn_from[0].batch_no, "B1");
    assert_eq!(row.drawn_from[0].quantity, 10);
    assert_eq!(row.status, PrescriptionStatus::Dispensed);
}

#[test]
fn test_report_resolves_medicine_details() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(
        &core,
        "Amoxicillin 500mg",
        vec![batch("B1", 100, (2099, 1, 1))],
    );
    let (patient_id, prescription_id, entry_ids) =
        seed_workflow(&core, vec![entry(medicine_id, 10)]);

    let report = core.prescriptions_for_patient(&patient_id, false).unwrap();

    assert_eq!(report.patient.name, "Asha Rao");
    let row = &report.prescribed_medicines[0];
    assert_eq!(row.prescription_id, prescription_id);
    assert_eq!(row.entry_id, entry_ids[0]);
    assert_eq!(row.medicine_name, "Amoxicillin 500mg");
    assert_eq!(row.dosage_form, "tablet");
    assert_eq!(row.manufacturer, "Acme");
    assert!(row.available);
    assert_eq!(row.dosage, "500mg");
    assert_eq!(row.frequency, "1-0-1");
    assert_eq!(row.duration, "5 days");
    assert_eq!(row.valid_batches[0].unit_price, 3.5);
    assert_eq!(row.valid_batches[0].supplier, "Acme Pharma");
}

#[test]
fn test_expired_batches_are_never_dispensed() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(
        &core,
        "Amoxicillin 500mg",
        vec![
            batch("EXPIRED", 50, (2020, 1, 1)),
            batch("FRESH", 20, (2099, 1, 1)),
        ],
    );
    let (patient_id, _, _) = seed_workflow(&core, vec![entry(medicine_id, 10)]);

    let report = core.prescriptions_for_patient(&patient_id, true).unwrap();

    let row = &report.prescribed_medicines[0];
    assert_eq!(row.drawn_from.len(), 1);
    assert_eq!(row.drawn_from[0].batch_no, "FRESH");
    // The expired batch is neither drawn from nor listed as valid
    assert!(row.valid_batches.iter().all(|b| b.batch_no != "EXPIRED"));

    let stored = core.get_medicine(medicine_id).unwrap().unwrap();
    assert_eq!(stored.batches[0].quantity, 50);
    assert_eq!(stored.batches[1].quantity, 10);
}

#[test]
fn test_multi_entry_prescription_partial_status() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let in_stock = seed_medicine(&core, "Amoxicillin", vec![batch("B1", 100, (2099, 1, 1))]);
    let out_of_stock = seed_medicine(&core, "Insulin", vec![batch("B1", 0, (2099, 1, 1))]);
    let (patient_id, prescription_id, _) = seed_workflow(
        &core,
        vec![entry(in_stock, 10), entry(out_of_stock, 5)],
    );

    let report = core.prescriptions_for_patient(&patient_id, true).unwrap();

    assert_eq!(report.prescribed_medicines.len(), 2);
    // One entry fulfilled, one untouched: the whole prescription is partial
    for row in &report.prescribed_medicines {
        assert_eq!(row.status, PrescriptionStatus::PartiallyDispensed);
    }
    let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(stored.status, PrescriptionStatus::PartiallyDispensed);
    assert_eq!(stored.entries[0].dispensed_qty, 10);
    assert_eq!(stored.entries[1].dispensed_qty, 0);
}

#[test]
fn test_update_dispensed_qty_workflow() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(&core, "Amoxicillin", vec![batch("B1", 20, (2099, 1, 1))]);
    let (_, prescription_id, entry_ids) = seed_workflow(&core, vec![entry(medicine_id, 10)]);

    // Increase draws the delta from stock
    core.update_dispensed_qty(&prescription_id, &entry_ids[0], 6)
        .unwrap();
    assert_eq!(
        core.get_medicine(medicine_id).unwrap().unwrap().batches[0].quantity,
        14
    );
    let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(stored.entries[0].dispensed_qty, 6);
    assert_eq!(stored.status, PrescriptionStatus::PartiallyDispensed);

    // Raising to the full prescribed quantity completes the prescription
    core.update_dispensed_qty(&prescription_id, &entry_ids[0], 10)
        .unwrap();
    let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(stored.status, PrescriptionStatus::Dispensed);
    assert_eq!(
        core.get_medicine(medicine_id).unwrap().unwrap().batches[0].quantity,
        10
    );
}

#[test]
fn test_update_rejections_map_to_400() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(&core, "Amoxicillin", vec![batch("B1", 3, (2099, 1, 1))]);
    let (_, prescription_id, entry_ids) = seed_workflow(&core, vec![entry(medicine_id, 10)]);

    // Exceeding the prescribed quantity
    let err = core
        .update_dispensed_qty(&prescription_id, &entry_ids[0], 11)
        .unwrap_err();
    assert!(matches!(err, DispensaryError::Validation(_)));
    assert_eq!(err.http_status(), 400);

    // Asking for more than the valid stock can cover
    let err = core
        .update_dispensed_qty(&prescription_id, &entry_ids[0], 5)
        .unwrap_err();
    assert!(matches!(err, DispensaryError::InsufficientStock(_)));
    assert_eq!(err.http_status(), 400);

    // Neither rejection mutated anything
    assert_eq!(
        core.get_medicine(medicine_id).unwrap().unwrap().batches[0].quantity,
        3
    );
    let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(stored.entries[0].dispensed_qty, 0);
}

#[test]
fn test_not_found_taxonomy() {
    let core = DispensaryCore::open_in_memory().unwrap();

    // Unknown patient
    let err = core
        .prescriptions_for_patient("no-such-patient", false)
        .unwrap_err();
    assert!(matches!(err, DispensaryError::NotFound(_)));
    assert_eq!(err.http_status(), 404);

    // Patient with no consultation
    let patient = core.create_patient("Asha Rao".into()).unwrap();
    let err = core
        .prescriptions_for_patient(&patient.patient_id, false)
        .unwrap_err();
    assert_eq!(err.http_status(), 404);

    // Consultation with no prescriptions
    core.record_consultation(&patient.patient_id).unwrap();
    let err = core
        .prescriptions_for_patient(&patient.patient_id, false)
        .unwrap_err();
    assert_eq!(err.http_status(), 404);

    // Unknown prescription/entry on the update path
    let err = core
        .update_dispensed_qty("no-such-prescription", "x", 1)
        .unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[test]
fn test_blank_patient_id_maps_to_400() {
    let core = DispensaryCore::open_in_memory().unwrap();
    let err = core.prescriptions_for_patient("  ", false).unwrap_err();
    assert!(matches!(err, DispensaryError::Validation(_)));
    assert_eq!(err.http_status(), 400);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dispensary.db");
    let path = path.to_str().unwrap();

    let (medicine_id, prescription_id);
    {
        let core = DispensaryCore::open(path).unwrap();
        medicine_id = seed_medicine(&core, "Amoxicillin", vec![batch("B1", 100, (2099, 1, 1))]);
        let (patient_id, pid, _) = seed_workflow(&core, vec![entry(medicine_id, 10)]);
        prescription_id = pid;
        core.prescriptions_for_patient(&patient_id, true).unwrap();
    }

    let core = DispensaryCore::open(path).unwrap();
    let medicine = core.get_medicine(medicine_id).unwrap().unwrap();
    assert_eq!(medicine.batches[0].quantity, 90);
    let prescription = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(prescription.status, PrescriptionStatus::Dispensed);
}

#[test]
fn test_dispensed_quantity_never_exceeds_prescribed() {
    // Repeated dispense calls against ample stock must stop at prescribed
    let core = DispensaryCore::open_in_memory().unwrap();
    let medicine_id = seed_medicine(&core, "Amoxicillin", vec![batch("B1", 1000, (2099, 1, 1))]);
    let (patient_id, prescription_id, _) = seed_workflow(&core, vec![entry(medicine_id, 10)]);

    for _ in 0..4 {
        core.prescriptions_for_patient(&patient_id, true).unwrap();
    }

    let stored = core.get_prescription(&prescription_id).unwrap().unwrap();
    assert_eq!(stored.entries[0].dispensed_qty, 10);
    assert_eq!(
        core.get_medicine(medicine_id).unwrap().unwrap().batches[0].quantity,
        990
    );
}
