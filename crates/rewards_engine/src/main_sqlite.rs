// Rust guideline compliant 2026-08-27

//! Reward-engine entry point, SQLite edition.
//!
//! Identical wiring to the `rewards_engine` binary except the
//! `TransactionHistory` port is backed by a SQLite file instead of memory.
//! Committed winners persist across runs, so caps keep filling up from one
//! invocation to the next; delete `rewards_demo.db` to reset.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin rewards_engine_sqlite
//! ```

mod adapters;
mod demo_data;

use adapters::in_memory_catalog::InMemoryCatalog;
use adapters::in_memory_rates::InMemoryRates;
use adapters::in_memory_rules::InMemoryRules;
use adapters::sqlite_history::SqliteHistory;
use anyhow::Context as _;
use calculator::{Calculator, CalculatorConfig};
use conversion::{ConversionGraph, GraphConfig, RateCache};
use domain::{CalculationInput, CardResult, InstrumentCatalog as _, PaymentInstrument, RuleStore as _};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use simulator::Simulator;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let calculator_config = CalculatorConfig::builder()
        .build()
        .context("failed to build calculator config")?;
    let graph_config = GraphConfig::builder(demo_data::BASE_CURRENCY)
        .build()
        .context("failed to build conversion graph config")?;
    let simulator =
        Simulator::new(Calculator::new(calculator_config), ConversionGraph::new(graph_config));

    let rules = demo_data::rule_store();
    let rates = InMemoryRates::new(demo_data::rates());
    let catalog = InMemoryCatalog::new(demo_data::instruments());
    let history = SqliteHistory::new("sqlite:rewards_demo.db")
        .await
        .context("failed to open rewards_demo.db")?;
    // 5 min TTL: rates are near-static, one fetch per program covers the run.
    let cache = RateCache::new(Duration::from_secs(300));

    let instruments = catalog
        .list_instruments()
        .await
        .context("failed to list instruments")?;

    // Race the demo run against CTRL+C so a long run exits cleanly.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received");
        }
        result = run_demo(&simulator, &instruments, &rules, &history, &rates, &cache) => {
            result?;
        }
    }

    Ok(())
}

/// Simulate 20 random transactions, committing each winner to SQLite.
async fn run_demo(
    simulator: &Simulator,
    instruments: &[PaymentInstrument],
    rules: &InMemoryRules,
    history: &SqliteHistory,
    rates: &InMemoryRates,
    cache: &RateCache,
) -> anyhow::Result<()> {
    // Fixed seed keeps demo runs reproducible.
    let mut rng = StdRng::seed_from_u64(7);
    for n in 1..=20 {
        let input = demo_data::random_input(&mut rng);
        tracing::info!(
            "txn {n}: {:.2} {} mcc={} online={} contactless={}",
            input.amount,
            input.currency,
            input.mcc.as_deref().unwrap_or("-"),
            input.is_online,
            input.is_contactless,
        );

        let results = simulator
            .simulate_all(
                &input,
                instruments,
                demo_data::TARGET_CURRENCY,
                rules,
                history,
                rates,
                cache,
            )
            .await
            .context("simulation failed")?;
        log_results(&results);

        commit_winner(&results, instruments, rules, history, &input).await?;

        // 500 ms between transactions keeps logs readable in real time.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Ok(())
}

/// Log the ranked results of one simulation.
fn log_results(results: &[CardResult]) {
    for result in results {
        if let Some(error) = &result.error {
            tracing::warn!("  #{} {}: failed: {error}", result.rank, result.instrument_name);
            continue;
        }
        let points = result
            .calculation
            .as_ref()
            .map_or_else(String::new, |calc| {
                format!("{:.0} {} ({})", calc.total_points, calc.points_currency,
                    calc.rule_name.as_deref().unwrap_or("base rate"))
            });
        match result.miles {
            Some(miles) => tracing::info!(
                "  #{} {}: {points} -> {miles:.1} {}",
                result.rank,
                result.instrument_name,
                demo_data::TARGET_CURRENCY,
            ),
            None => tracing::info!(
                "  #{} {}: {points} -> no conversion path",
                result.rank,
                result.instrument_name,
            ),
        }
        if let Some(calc) = &result.calculation {
            for message in &calc.messages {
                tracing::info!("     note: {message}");
            }
        }
    }
}

/// Commit the top-ranked card's transaction to SQLite so monthly aggregates
/// accrue across demo runs.
async fn commit_winner(
    results: &[CardResult],
    instruments: &[PaymentInstrument],
    rules: &InMemoryRules,
    history: &SqliteHistory,
    input: &CalculationInput,
) -> anyhow::Result<()> {
    let Some(winner) = results.iter().find(|r| r.calculation.is_some()) else {
        return Ok(());
    };
    history
        .record_spend(winner.instrument_id, input.date, input.spend_amount())
        .await
        .context("failed to persist winning transaction")?;

    // Bonus points draw down the winning rule's cap pool.
    let Some(calc) = &winner.calculation else { return Ok(()) };
    if calc.bonus_points <= 0.0 {
        return Ok(());
    }
    let Some(rule_id) = calc.rule_id else { return Ok(()) };
    let Some(instrument) = instruments.iter().find(|i| i.id == winner.instrument_id) else {
        return Ok(());
    };
    let catalog = rules
        .list_rules(&instrument.card_type_id)
        .await
        .context("failed to reload winner's rule catalog")?;
    if let Some(cap_group) = catalog
        .iter()
        .find(|rule| rule.id == rule_id)
        .and_then(domain::RewardRule::cap_group_key)
    {
        history
            .record_bonus(&cap_group, input.date, calc.bonus_points)
            .await
            .context("failed to persist bonus award")?;
    }
    Ok(())
}
