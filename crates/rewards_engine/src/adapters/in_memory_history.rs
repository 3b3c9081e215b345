// Rust guideline compliant 2026-08-27

//! In-memory adapter for the `TransactionHistory` port.
//!
//! Intended for proof-of-concept runs and unit tests only. Aggregates are
//! computed on every read by scanning the recorded rows; there is no
//! running counter to drift out of sync.
//!
//! `RefCell` interior mutability is safe here: the demo binary runs on a
//! current-thread runtime and every borrow is dropped before any await.

use chrono::NaiveDate;
use domain::{StoreError, TransactionHistory};
use std::cell::RefCell;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SpendRow {
    instrument_id: Uuid,
    date: NaiveDate,
    amount: f64,
}

#[derive(Debug, Clone)]
struct BonusRow {
    cap_group: String,
    date: NaiveDate,
    points: f64,
}

/// `TransactionHistory` adapter backed by in-memory row vectors.
// #[allow] not #[expect]: dead_code fires in the rewards_engine_sqlite binary
// but NOT in the rewards_engine binary, so #[expect] would generate an
// unfulfilled-expectation warning in one of the two binaries.
#[allow(dead_code, reason = "used by rewards_engine binary; dead in rewards_engine_sqlite")]
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    spend: RefCell<Vec<SpendRow>>,
    bonus: RefCell<Vec<BonusRow>>,
}

impl InMemoryHistory {
    /// Create an empty history.
    // See struct-level allow(dead_code) comment above.
    #[allow(dead_code, reason = "used by rewards_engine binary; dead in rewards_engine_sqlite")]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed transaction against an instrument.
    #[allow(dead_code, reason = "used by rewards_engine binary; dead in rewards_engine_sqlite")]
    pub fn record_spend(&self, instrument_id: Uuid, date: NaiveDate, amount: f64) {
        self.spend.borrow_mut().push(SpendRow { instrument_id, date, amount });
    }

    /// Record bonus points awarded to a cap group.
    #[allow(dead_code, reason = "used by rewards_engine binary; dead in rewards_engine_sqlite")]
    pub fn record_bonus(&self, cap_group: &str, date: NaiveDate, points: f64) {
        self.bonus.borrow_mut().push(BonusRow {
            cap_group: cap_group.to_owned(),
            date,
            points,
        });
    }
}

impl TransactionHistory for InMemoryHistory {
    async fn sum_amount(
        &self,
        instrument_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError> {
        Ok(self
            .spend
            .borrow()
            .iter()
            .filter(|row| {
                row.instrument_id == instrument_id && row.date >= start && row.date <= end
            })
            .map(|row| row.amount)
            .sum())
    }

    async fn sum_bonus_points(
        &self,
        cap_group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError> {
        Ok(self
            .bonus
            .borrow()
            .iter()
            .filter(|row| row.cap_group == cap_group && row.date >= start && row.date <= end)
            .map(|row| row.points)
            .sum())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
