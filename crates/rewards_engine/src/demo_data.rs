// Rust guideline compliant 2026-08-27

//! DEMO data set: a small Singapore-style card portfolio.
//!
//! Three active card products plus one cancelled card, rule catalogs with
//! capped 10x bonuses, per-block earning and a minimum-spend gate, and a
//! conversion table where one program only reaches the target miles
//! currency through the configured base currency.

use chrono::{NaiveDate, Utc};
use domain::{
    AmountRounding, CalculationInput, Channel, ConversionRate, PaymentInstrument, RewardRule,
    RewardSpec, RuleCondition, SetOp,
};
use rand::Rng;
use uuid::Uuid;

use crate::adapters::in_memory_rules::InMemoryRules;

/// Miles currency every simulation converts into.
pub const TARGET_CURRENCY: &str = "krisflyer";

/// Base currency for cross-rate derivation.
pub const BASE_CURRENCY: &str = "asia-miles";

/// The demo user's portfolio: three active cards and one cancelled card.
///
/// Instrument ids are fixed so the SQLite binary's persisted history keeps
/// matching the portfolio across runs.
#[must_use]
pub fn instruments() -> Vec<PaymentInstrument> {
    let card = |id, name: &str, card_type_id: &str, reward_currency: &str, active, statement_day| {
        PaymentInstrument {
            id: Uuid::from_u128(id),
            name: name.to_owned(),
            card_type_id: card_type_id.to_owned(),
            currency: "SGD".to_owned(),
            reward_currency: reward_currency.to_owned(),
            active,
            statement_day,
        }
    };
    vec![
        card(1, "Citi Rewards", "citi-rewards", "citi-points", true, 1),
        card(2, "DBS Altitude", "dbs-altitude", "dbs-points", true, 1),
        card(3, "UOB Preferred", "uob-preferred", "uob-points", true, 15),
        card(4, "Old Cancelled Card", "citi-rewards", "citi-points", false, 1),
    ]
}

/// Rule catalogs for every demo card product.
///
/// Catalog highlights: the two Citi 10x rules share one 9,000-point cap
/// pool; the UOB rule earns per $5 block behind a $500 monthly minimum.
#[must_use]
pub fn rule_store() -> InMemoryRules {
    InMemoryRules::new()
        .with_catalog(
            "citi-rewards",
            vec![
                rule(
                    "citi-rewards",
                    "10x fashion",
                    20,
                    vec![RuleCondition::Mcc {
                        op: SetOp::Include,
                        values: ["5621", "5631", "5651"].map(str::to_owned).to_vec(),
                    }],
                    citi_10x_reward(),
                ),
                rule(
                    "citi-rewards",
                    "10x online",
                    10,
                    vec![
                        RuleCondition::TransactionType { values: vec![Channel::Online] },
                        RuleCondition::Mcc {
                            op: SetOp::Exclude,
                            values: ["3000", "3001", "4511"].map(str::to_owned).to_vec(),
                        },
                    ],
                    citi_10x_reward(),
                ),
                rule("citi-rewards", "base 1x", 1, vec![], base_reward("citi-points")),
            ],
        )
        .with_catalog(
            "dbs-altitude",
            vec![
                rule(
                    "dbs-altitude",
                    "3x online",
                    10,
                    vec![RuleCondition::TransactionType { values: vec![Channel::Online] }],
                    RewardSpec {
                        bonus_multiplier: 2.0,
                        monthly_cap: Some(5_000.0),
                        points_currency: "dbs-points".to_owned(),
                        ..RewardSpec::default()
                    },
                ),
                rule("dbs-altitude", "base 1x", 1, vec![], base_reward("dbs-points")),
            ],
        )
        .with_catalog(
            "uob-preferred",
            vec![
                rule(
                    "uob-preferred",
                    "4x contactless per $5",
                    10,
                    vec![RuleCondition::TransactionType { values: vec![Channel::Contactless] }],
                    RewardSpec {
                        base_multiplier: 1.0,
                        bonus_multiplier: 3.0,
                        amount_rounding: AmountRounding::Floor5,
                        block_size: 5.0,
                        monthly_cap: Some(2_000.0),
                        monthly_min_spend: Some(500.0),
                        points_currency: "uob-points".to_owned(),
                        ..RewardSpec::default()
                    },
                ),
                rule("uob-preferred", "base 1x", 1, vec![], base_reward("uob-points")),
            ],
        )
}

/// Directed conversion edges.
///
/// `uob-points` has no direct edge to the target; it converts through
/// [`BASE_CURRENCY`].
#[must_use]
pub fn rates() -> Vec<ConversionRate> {
    let edge = |source: &str, target: &str, rate| ConversionRate {
        source: source.to_owned(),
        target: target.to_owned(),
        rate,
        updated_at: Utc::now(),
    };
    vec![
        edge("citi-points", TARGET_CURRENCY, 0.4),
        edge("dbs-points", TARGET_CURRENCY, 0.5),
        edge("uob-points", BASE_CURRENCY, 1.0),
        edge(BASE_CURRENCY, TARGET_CURRENCY, 0.8),
    ]
}

/// One random DEMO transaction dated today.
pub fn random_input<R: Rng>(rng: &mut R) -> CalculationInput {
    const MCCS: [&str; 6] = ["5621", "5631", "5651", "5812", "4511", "7399"];
    const MERCHANTS: [&str; 6] =
        ["ZARA SG", "UNIQLO", "COTTON ON", "DIN TAI FUNG", "SQ AIRLINES", "ACME SERVICES"];
    let pick = rng.random_range(0..MCCS.len());
    let is_online = rng.random_bool(0.5);
    CalculationInput {
        amount: f64::from(rng.random_range(500..50_000)) / 100.0,
        currency: "SGD".to_owned(),
        converted_amount: None,
        converted_currency: None,
        mcc: Some(MCCS[pick].to_owned()),
        merchant_name: Some(MERCHANTS[pick].to_owned()),
        category: None,
        is_online,
        // Card-present taps only.
        is_contactless: !is_online && rng.random_bool(0.7),
        date: today(),
    }
}

/// Today's date in UTC; every demo aggregate window is anchored on it.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn rule(
    card_type_id: &str,
    name: &str,
    priority: i32,
    conditions: Vec<RuleCondition>,
    reward: RewardSpec,
) -> RewardRule {
    RewardRule {
        id: Uuid::new_v4(),
        card_type_id: card_type_id.to_owned(),
        name: name.to_owned(),
        enabled: true,
        priority,
        conditions,
        reward,
    }
}

fn citi_10x_reward() -> RewardSpec {
    RewardSpec {
        bonus_multiplier: 9.0,
        monthly_cap: Some(9_000.0),
        points_currency: "citi-points".to_owned(),
        cap_group: Some("citi-10x".to_owned()),
        ..RewardSpec::default()
    }
}

fn base_reward(points_currency: &str) -> RewardSpec {
    RewardSpec { points_currency: points_currency.to_owned(), ..RewardSpec::default() }
}
