//! Pure stock selection and drawing over batch collections.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::StockBatch;

/// One line of the dispensing ledger: how much was taken from which batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDraw {
    /// Batch the units were taken from
    pub batch_no: String,
    /// Units taken
    pub quantity: u32,
}

/// Batches that can be dispensed from on the given day, in stored order.
pub fn valid_batches(batches: &[StockBatch], today: NaiveDate) -> Vec<&StockBatch> {
    batches.iter().filter(|b| b.is_valid(today)).collect()
}

/// Sum of quantities across valid batches.
pub fn total_valid_stock(batches: &[StockBatch], today: NaiveDate) -> u32 {
    batches
        .iter()
        .filter(|b| b.is_valid(today))
        .map(|b| b.quantity)
        .sum()
}

/// Greedily draw up to `required` units from valid batches in stored order.
///
/// For each valid batch, takes `min(required, batch.quantity)` and decrements
/// the batch, stopping once the requirement is met. Returns the ledger of
/// draws; the total drawn is at most `required` and may be less when stock
/// runs out. Selection is deterministic for a given stock state.
pub fn draw_from_batches(
    batches: &mut [StockBatch],
    required: u32,
    today: NaiveDate,
) -> Vec<BatchDraw> {
    let mut remaining = required;
    let mut ledger = Vec::new();

    for batch in batches.iter_mut() {
        if remaining == 0 {
            break;
        }
        if !batch.is_valid(today) {
            continue;
        }

        let take = remaining.min(batch.quantity);
        batch.quantity -= take;
        remaining -= take;
        ledger.push(BatchDraw {
            batch_no: batch.batch_no.clone(),
            quantity: take,
        });
    }

    ledger
}

/// Total units recorded in a ledger.
pub fn drawn_total(ledger: &[BatchDraw]) -> u32 {
    ledger.iter().map(|d| d.quantity).sum()
}
