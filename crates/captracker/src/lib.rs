// Rust guideline compliant 2026-08-27

//! Monthly spend and cap tracker -- computes an instrument's period aggregates
//! by querying the external transaction history on every call.
//!
//! Entry points: [`period_bounds`], [`period_spend`], [`cap_group_earned`],
//! [`cap_state`]. Aggregates are a view over committed transactions, never a
//! counter: nothing is cached here, so cap and tier decisions always reflect
//! the latest history at the cost of recomputation per call. A failed read
//! fails open to `0.0` and flags the reading as degraded -- a missing history
//! must never block a calculation.

use chrono::{Datelike, Days, NaiveDate};
use domain::{CapState, PeriodType, StoreError, TransactionHistory};
use uuid::Uuid;

/// One aggregate read from the history store.
///
/// `degraded` is `true` when the store could not be read and `value` fell
/// open to `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateReading {
    pub value: f64,
    pub degraded: bool,
}

/// Inclusive `[start, end]` date bounds of the period containing `as_of`.
///
/// `Calendar` periods run over calendar months; `anchor_day` is ignored.
/// `Statement` periods start on the instrument's statement day and run to the
/// day before the next statement day, so one period may span two calendar
/// months. Anchor days 29-31 clamp to the last day of shorter months;
/// out-of-range anchors are clamped into `[1, 31]`.
#[must_use]
pub fn period_bounds(period: PeriodType, as_of: NaiveDate, anchor_day: u32) -> (NaiveDate, NaiveDate) {
    match period {
        PeriodType::Calendar => {
            let start = clamped_date(as_of.year(), as_of.month(), 1);
            let end = last_day_of_month(as_of.year(), as_of.month());
            (start, end)
        }
        PeriodType::Statement => {
            let anchor = anchor_day.clamp(1, 31);
            let this_month = clamped_date(as_of.year(), as_of.month(), anchor);
            let start = if as_of >= this_month {
                this_month
            } else {
                let (y, m) = prev_month(as_of.year(), as_of.month());
                clamped_date(y, m, anchor)
            };
            let (ny, nm) = next_month(start.year(), start.month());
            let next_start = clamped_date(ny, nm, anchor);
            // Statement periods are always at least one day long, so the
            // predecessor of the next start exists.
            let end = next_start
                .checked_sub_days(Days::new(1))
                .unwrap_or(start);
            (start, end)
        }
    }
}

/// Amount already spent on `instrument_id` in the period containing `as_of`.
///
/// Fails open: a [`StoreError`] becomes `value = 0.0, degraded = true` and a
/// `warn` log, never an error.
pub async fn period_spend<H: TransactionHistory>(
    history: &H,
    instrument_id: Uuid,
    period: PeriodType,
    as_of: NaiveDate,
    anchor_day: u32,
) -> AggregateReading {
    let (start, end) = period_bounds(period, as_of, anchor_day);
    match history.sum_amount(instrument_id, start, end).await {
        Ok(value) => AggregateReading { value, degraded: false },
        Err(e) => fail_open("period_spend", &e),
    }
}

/// Bonus points already earned by `cap_group` in the period containing `as_of`.
///
/// Fails open on read failure, like [`period_spend`].
pub async fn cap_group_earned<H: TransactionHistory>(
    history: &H,
    cap_group: &str,
    period: PeriodType,
    as_of: NaiveDate,
    anchor_day: u32,
) -> AggregateReading {
    let (start, end) = period_bounds(period, as_of, anchor_day);
    match history.sum_bonus_points(cap_group, start, end).await {
        Ok(value) => AggregateReading { value, degraded: false },
        Err(e) => fail_open("cap_group_earned", &e),
    }
}

/// Fetch the full [`CapState`] snapshot the calculator needs: period spend
/// for the instrument plus, when the winning rule is capped, the cap group's
/// earned bonus points.
///
/// `cap_group = None` skips the second read and leaves `cap_group_earned`
/// at `0.0`.
pub async fn cap_state<H: TransactionHistory>(
    history: &H,
    instrument_id: Uuid,
    cap_group: Option<&str>,
    period: PeriodType,
    as_of: NaiveDate,
    anchor_day: u32,
) -> CapState {
    let spend = period_spend(history, instrument_id, period, as_of, anchor_day).await;
    let earned = match cap_group {
        Some(group) => cap_group_earned(history, group, period, as_of, anchor_day).await,
        None => AggregateReading { value: 0.0, degraded: false },
    };
    CapState {
        period_spend: spend.value,
        cap_group_earned: earned.value,
        degraded: spend.degraded || earned.degraded,
    }
}

fn fail_open(what: &str, e: &StoreError) -> AggregateReading {
    tracing::warn!("captracker.{what}: history read failed, assuming 0: {e}");
    AggregateReading { value: 0.0, degraded: true }
}

/// `day` clamped to the length of the month. Month arithmetic here only ever
/// produces valid (year, month) pairs.
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let last = last_day_of_month(year, month);
    let day = day.min(last.day());
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(last)
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (ny, nm) = next_month(year, month);
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        // Unreachable for valid (year, month); keeps the function total.
        .unwrap_or(NaiveDate::MIN)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
