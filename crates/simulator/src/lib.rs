// Rust guideline compliant 2026-08-27

//! Multi-instrument simulator -- fans the reward calculation out across every
//! active instrument a user holds, converts each payout into a target miles
//! currency, and ranks the results.
//!
//! Entry points: [`Simulator::simulate_all`], [`rank`].
//!
//! Each instrument is one independent unit of work; all units are dispatched
//! concurrently and joined all-or-best-effort (never fail-fast). A unit's
//! failure is captured at the unit boundary and surfaced as a zero-point
//! [`CardResult`] with `error` set -- it never aborts the other units. Units
//! share no mutable state: each reads independently through the store ports.

use calculator::Calculator;
use conversion::{ConversionGraph, RateCache};
use domain::{
    CalcError, CalculationInput, CapState, CardResult, PaymentInstrument, RateStore, RuleStore,
    TransactionHistory,
};
use futures::future::join_all;
use std::cmp::Ordering;

/// Fans one calculation out per instrument and ranks the payouts.
#[derive(Debug)]
pub struct Simulator {
    calculator: Calculator,
    graph: ConversionGraph,
}

impl Simulator {
    /// Create a new simulator from its two computation components.
    #[must_use]
    pub fn new(calculator: Calculator, graph: ConversionGraph) -> Self {
        Self { calculator, graph }
    }

    /// Simulate `input` against every active instrument and rank the results
    /// by converted value in `target_currency`.
    ///
    /// Inactive instruments are excluded. The returned vector always covers
    /// every active instrument: failed units carry `error` and no points,
    /// unconvertible payouts rank after all converted ones.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidInput`] when `input` is structurally
    /// invalid; this is the only way the whole simulation fails.
    #[expect(clippy::too_many_arguments, reason = "one parameter per store port plus the shared cache")]
    pub async fn simulate_all<R, H, S>(
        &self,
        input: &CalculationInput,
        instruments: &[PaymentInstrument],
        target_currency: &str,
        rules: &R,
        history: &H,
        rates: &S,
        cache: &RateCache,
    ) -> Result<Vec<CardResult>, CalcError>
    where
        R: RuleStore,
        H: TransactionHistory,
        S: RateStore,
    {
        input.validate()?;

        let units = instruments
            .iter()
            .filter(|instr| instr.active)
            .map(|instr| self.simulate_one(input, instr, target_currency, rules, history, rates, cache));
        let results = join_all(units).await;
        tracing::debug!("simulator: {} unit(s) completed", results.len());
        Ok(rank(results))
    }

    /// One unit of work: rules -> aggregates -> calculation -> conversion.
    ///
    /// Infallible by construction: every failure inside the unit is captured
    /// into the returned `CardResult`.
    #[expect(clippy::too_many_arguments, reason = "one parameter per store port plus the shared cache")]
    async fn simulate_one<R, H, S>(
        &self,
        input: &CalculationInput,
        instr: &PaymentInstrument,
        target_currency: &str,
        rules: &R,
        history: &H,
        rates: &S,
        cache: &RateCache,
    ) -> CardResult
    where
        R: RuleStore,
        H: TransactionHistory,
        S: RateStore,
    {
        let catalog = match rules.list_rules(&instr.card_type_id).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("simulator: rule store failed for {}: {e}", instr.name);
                return failed_unit(instr, e.to_string());
            }
        };

        // Peek the winning rule first: its period type and cap group decide
        // which aggregates to pre-fetch.
        let caps = match calculator::select_rule(input, &catalog) {
            Some(winner) => {
                let cap_group = winner.cap_group_key();
                captracker::cap_state(
                    history,
                    instr.id,
                    cap_group.as_deref(),
                    winner.reward.period,
                    input.date,
                    instr.statement_day,
                )
                .await
            }
            // The implicit base rule needs no aggregates.
            None => CapState::default(),
        };

        let mut calculation = match self.calculator.calculate(input, &catalog, &caps) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("simulator: calculation failed for {}: {e}", instr.name);
                return failed_unit(instr, e.to_string());
            }
        };
        // Rules without an explicit points currency earn into the
        // instrument's reward program.
        if calculation.points_currency.is_empty() {
            calculation.points_currency = instr.reward_currency.clone();
        }

        let conversion = self
            .graph
            .convert(
                rates,
                cache,
                calculation.total_points,
                &calculation.points_currency,
                target_currency,
            )
            .await;

        CardResult {
            instrument_id: instr.id,
            instrument_name: instr.name.clone(),
            calculation: Some(calculation),
            miles: conversion.miles,
            rate: conversion.rate,
            error: None,
            rank: 0,
        }
    }
}

/// Zero-point result for a unit that failed; still ranked (last) so the
/// caller sees every instrument.
fn failed_unit(instr: &PaymentInstrument, error: String) -> CardResult {
    CardResult {
        instrument_id: instr.id,
        instrument_name: instr.name.clone(),
        calculation: None,
        miles: None,
        rate: None,
        error: Some(error),
        rank: 0,
    }
}

/// Deterministic ranking: converted value descending, ties by instrument
/// name ascending; unrankable results (no conversion) appended after all
/// ranked ones, by name ascending. Ranks are assigned 1..N over the
/// concatenated sequence.
#[must_use]
pub fn rank(mut results: Vec<CardResult>) -> Vec<CardResult> {
    results.sort_by(|a, b| match (a.miles, b.miles) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.instrument_name.cmp(&b.instrument_name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.instrument_name.cmp(&b.instrument_name),
    });
    for (index, result) in results.iter_mut().enumerate() {
        // Ranks fit u32 for any realistic instrument count.
        result.rank = u32::try_from(index + 1).unwrap_or(u32::MAX);
    }
    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
