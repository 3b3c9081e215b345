// Rust guideline compliant 2026-08-27

//! Shared domain types for the reward calculation engine.
//!
//! Defines the rule catalog model (`RewardRule`, `RuleCondition`,
//! `BonusTier`), calculation inputs and results, conversion-rate types,
//! the error taxonomy, and the hexagonal port traits for every external
//! collaborator: `RuleStore`, `TransactionHistory`, `RateStore`, and
//! `InstrumentCatalog`. All engine crates depend on this crate; no other
//! workspace crate is imported here.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Tolerance for tier, cap, and minimum-spend boundary comparisons.
///
/// Monetary amounts and point totals are `f64`; comparing them exactly at a
/// tier or cap boundary flickers with accumulated float error. Every boundary
/// check in the engine goes through this epsilon.
pub const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Transaction facts
// ---------------------------------------------------------------------------

/// Derived transaction channel tag, computed from the online/contactless flags.
///
/// `Online` wins when a transaction is both online and contactless (an online
/// wallet payment is still an online transaction for rule purposes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Card-not-present / e-commerce.
    Online,
    /// In-person tap payment.
    Contactless,
    /// In-person chip, swipe, or unknown.
    InStore,
}

/// Point-in-time transaction facts handed to the calculator.
///
/// `converted_amount` / `converted_currency` carry the transaction amount
/// converted into the instrument's billing currency, when the transaction was
/// made in a foreign currency. The calculator spends `converted_amount` when
/// present, `amount` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationInput {
    /// Transaction amount in the transaction currency. Must be finite and positive.
    pub amount: f64,
    /// ISO-style transaction currency code. Must be non-empty.
    pub currency: String,
    /// Amount converted into the instrument currency, if conversion applied.
    pub converted_amount: Option<f64>,
    /// Currency of `converted_amount`.
    pub converted_currency: Option<String>,
    /// Merchant category code, when known.
    pub mcc: Option<String>,
    /// Raw merchant descriptor, when known.
    pub merchant_name: Option<String>,
    /// User- or importer-assigned spending category, when known.
    pub category: Option<String>,
    /// Card-not-present flag.
    pub is_online: bool,
    /// Tap-payment flag.
    pub is_contactless: bool,
    /// Transaction date, used for period scoping.
    pub date: NaiveDate,
}

impl CalculationInput {
    /// The amount the calculator treats as spend: the converted amount when
    /// present, the raw transaction amount otherwise.
    #[must_use]
    pub fn spend_amount(&self) -> f64 {
        self.converted_amount.unwrap_or(self.amount)
    }

    /// Structural validation: finite positive amount, non-empty currency.
    ///
    /// This is the only fatal check in the engine; everything downstream
    /// degrades instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidInput`] when the amount is not a finite
    /// positive number or the currency code is empty.
    pub fn validate(&self) -> Result<(), CalcError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CalcError::InvalidInput {
                reason: format!("amount must be a finite positive number, got {}", self.amount),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(CalcError::InvalidInput { reason: "currency must be non-empty".to_owned() });
        }
        if let Some(converted) = self.converted_amount
            && (!converted.is_finite() || converted <= 0.0)
        {
            return Err(CalcError::InvalidInput {
                reason: format!("converted amount must be a finite positive number, got {converted}"),
            });
        }
        Ok(())
    }
}

/// Pre-fetched monthly aggregates for the winning rule's cap group.
///
/// Produced by the cap tracker, consumed by the calculator. A `degraded`
/// reading means the history store could not be queried and both aggregates
/// were failed open to `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapState {
    /// Amount already spent on the instrument in the current period,
    /// excluding this transaction.
    pub period_spend: f64,
    /// Bonus points already earned by the cap group in the current period.
    pub cap_group_earned: f64,
    /// `true` when either aggregate fell back to `0.0` on a read failure.
    pub degraded: bool,
}

// ---------------------------------------------------------------------------
// Rule conditions
// ---------------------------------------------------------------------------

/// Membership direction for value-set conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// Match when the input value is a member of the condition's values.
    Include,
    /// Match when the input value is NOT a member of the condition's values.
    Exclude,
}

/// Combinator for compound conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// At least one sub-condition must match (short-circuits on first true).
    Any,
    /// Every sub-condition must match (short-circuits on first false).
    All,
}

/// Comparison applied by an amount condition against the transaction amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountOp {
    GreaterThan(f64),
    LessThan(f64),
    Equals(f64),
    /// Inclusive range `[min, max]`. An inverted range never matches.
    Range { min: f64, max: f64 },
}

/// One predicate in a rule's condition list.
///
/// Conditions within one rule are implicitly AND-ed; `Compound` nests
/// `Any`/`All` groups for everything else. A closed enum replaces the
/// source's any-shaped condition trees: unknown condition kinds cannot be
/// represented, and malformed payloads (empty value lists, inverted ranges,
/// non-finite bounds) evaluate to non-matching rather than panicking.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    /// Merchant category code membership.
    Mcc { op: SetOp, values: Vec<String> },
    /// Merchant descriptor membership (case-insensitive substring match).
    Merchant { op: SetOp, values: Vec<String> },
    /// Transaction currency membership.
    Currency { op: SetOp, values: Vec<String> },
    /// Spending-category membership.
    Category { op: SetOp, values: Vec<String> },
    /// Derived channel tag membership (online / contactless / in-store).
    TransactionType { values: Vec<Channel> },
    /// Numeric comparison against the transaction amount.
    Amount(AmountOp),
    /// Nested condition group combined with `Any` / `All` semantics.
    Compound { op: BoolOp, sub: Vec<RuleCondition> },
}

// ---------------------------------------------------------------------------
// Reward specification
// ---------------------------------------------------------------------------

/// How a rule turns spend into points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalculationMethod {
    /// `points = quantized_amount * (base + bonus multiplier)`.
    Standard,
    /// Like `Standard`, but the bonus multiplier comes from the matching
    /// [`BonusTier`] instead of the rule's flat bonus multiplier.
    Tiered,
    /// Award `base_multiplier` (+ `bonus_multiplier`) points once per
    /// transaction, ignoring the amount.
    FlatRate,
    /// Award a fixed point value configured on the rule, no amount scaling.
    Direct { points: f64 },
}

/// Rounding applied to the computed point totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsRounding {
    Floor,
    Ceiling,
    Nearest,
}

impl PointsRounding {
    /// Apply this strategy. Idempotent: re-applying to an already-rounded
    /// value is a no-op.
    #[must_use]
    pub fn apply(self, points: f64) -> f64 {
        match self {
            Self::Floor => points.floor(),
            Self::Ceiling => points.ceil(),
            Self::Nearest => points.round(),
        }
    }
}

/// Rounding applied to the spend amount before multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRounding {
    /// Round down to whole currency units.
    Floor,
    /// Round up to whole currency units.
    Ceiling,
    /// Round to the nearest whole currency unit.
    Nearest,
    /// Round down to the nearest multiple of 5.
    Floor5,
    /// Leave the amount unmodified.
    None,
}

impl AmountRounding {
    /// Apply this strategy. Idempotent for every variant.
    #[must_use]
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            Self::Floor => amount.floor(),
            Self::Ceiling => amount.ceil(),
            Self::Nearest => amount.round(),
            Self::Floor5 => (amount / 5.0).floor() * 5.0,
            Self::None => amount,
        }
    }
}

/// Which spend figure a tiered rule ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierBasis {
    /// Post-transaction cumulative monthly spend (period spend + this transaction).
    MonthlySpend,
    /// This transaction's amount alone.
    Amount,
}

/// Period shape for monthly aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
    /// Calendar-month boundaries.
    Calendar,
    /// Rolling window anchored on the instrument's statement start day.
    Statement,
}

/// A spend-range-to-multiplier mapping used by the `Tiered` method.
///
/// `max_spend = None` means unbounded above. When ranges overlap, the tier
/// with the highest `priority` wins.
#[derive(Debug, Clone, PartialEq)]
pub struct BonusTier {
    pub min_spend: f64,
    pub max_spend: Option<f64>,
    /// Bonus multiplier applied in place of the rule's `bonus_multiplier`.
    pub multiplier: f64,
    /// Tie-break among overlapping tiers; higher wins.
    pub priority: i32,
}

impl BonusTier {
    /// Whether `spend` falls inside `[min_spend, max_spend]`, inclusive,
    /// with epsilon slack at both boundaries.
    #[must_use]
    pub fn contains(&self, spend: f64) -> bool {
        if spend < self.min_spend - EPSILON {
            return false;
        }
        match self.max_spend {
            Some(max) => spend <= max + EPSILON,
            None => true,
        }
    }
}

/// The reward half of a rule: calculation method, multipliers, rounding,
/// quantization, tiers, and monthly gating.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardSpec {
    pub method: CalculationMethod,
    /// Points per quantized unit of spend, always awarded.
    pub base_multiplier: f64,
    /// Extra points per quantized unit of spend, subject to the monthly cap.
    pub bonus_multiplier: f64,
    pub points_rounding: PointsRounding,
    pub amount_rounding: AmountRounding,
    /// Quantization unit of spend ("points per $5" has block size 5).
    /// Values `<= 1` mean no quantization.
    pub block_size: f64,
    pub tiers: Vec<BonusTier>,
    pub tier_basis: TierBasis,
    /// Ceiling on bonus points per period for the rule's cap group.
    pub monthly_cap: Option<f64>,
    /// Period spend below this threshold degrades the rule to base-only.
    pub monthly_min_spend: Option<f64>,
    pub period: PeriodType,
    /// Loyalty program the earned points belong to.
    pub points_currency: String,
    /// Explicit cap-group key; `None` groups by `(card_type_id, monthly_cap)`.
    pub cap_group: Option<String>,
}

impl Default for RewardSpec {
    /// A plain 1x base-rate spec: floor the amount, floor the points,
    /// no bonus, no cap, calendar period.
    fn default() -> Self {
        Self {
            method: CalculationMethod::Standard,
            base_multiplier: 1.0,
            bonus_multiplier: 0.0,
            points_rounding: PointsRounding::Floor,
            amount_rounding: AmountRounding::Floor,
            block_size: 1.0,
            tiers: vec![],
            tier_basis: TierBasis::MonthlySpend,
            monthly_cap: None,
            monthly_min_spend: None,
            period: PeriodType::Calendar,
            points_currency: String::new(),
            cap_group: None,
        }
    }
}

/// One reward behavior on one payment instrument type.
///
/// Rules are authored and persisted externally and loaded fresh per
/// calculation; the engine never mutates a rule. Higher `priority` is
/// evaluated first; ties are broken by catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardRule {
    pub id: Uuid,
    /// Card product this rule belongs to.
    pub card_type_id: String,
    pub name: String,
    /// Disabled rules are never matched.
    pub enabled: bool,
    pub priority: i32,
    /// Implicitly AND-ed predicates; an empty list matches everything.
    pub conditions: Vec<RuleCondition>,
    pub reward: RewardSpec,
}

impl RewardRule {
    /// Key of the monthly cap pool this rule draws from, or `None` when the
    /// rule is uncapped.
    ///
    /// Rules sharing a key share one bonus-point ceiling. The explicit
    /// `cap_group` wins; otherwise rules on the same card type with the same
    /// cap value pool together.
    #[must_use]
    pub fn cap_group_key(&self) -> Option<String> {
        let cap = self.reward.monthly_cap?;
        Some(match &self.reward.cap_group {
            Some(group) => group.clone(),
            None => format!("{}:{cap}", self.card_type_id),
        })
    }
}

// ---------------------------------------------------------------------------
// Calculation result
// ---------------------------------------------------------------------------

/// Outcome of one reward calculation.
///
/// `messages` carries human-readable diagnostics for every degradation the
/// calculation went through ("monthly bonus cap reached", ...). `rule_id` /
/// `rule_name` attribute the payout to the winning rule; both are `None`
/// when the implicit base rule applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    pub total_points: f64,
    /// Never capped.
    pub base_points: f64,
    /// Clipped to the cap group's remaining headroom.
    pub bonus_points: f64,
    pub points_currency: String,
    /// `false` when a `monthly_min_spend` gate was not met.
    pub min_spend_met: bool,
    pub messages: Vec<String>,
    pub rule_id: Option<Uuid>,
    pub rule_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion types
// ---------------------------------------------------------------------------

/// A directed conversion edge from a reward currency to a miles currency.
///
/// Edges are not symmetric or transitive by construction; a reverse edge
/// exists only if explicitly present in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRate {
    /// Source reward currency (loyalty program).
    pub source: String,
    /// Target miles currency.
    pub target: String,
    /// Miles per point.
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

/// Result of a points-to-miles conversion.
///
/// `miles = None` means no conversion path exists; callers must treat the
/// result as unrankable, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Conversion {
    pub miles: Option<f64>,
    /// Effective rate used, including derived cross-rates.
    pub rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Instruments and simulation results
// ---------------------------------------------------------------------------

/// One payment instrument a user holds, as supplied by the instrument catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInstrument {
    pub id: Uuid,
    pub name: String,
    /// Card product; selects the rule catalog.
    pub card_type_id: String,
    /// Billing currency.
    pub currency: String,
    /// Loyalty program the instrument earns into.
    pub reward_currency: String,
    /// Inactive instruments are excluded from simulation.
    pub active: bool,
    /// Statement-cycle start day (1-31), clamped to shorter months.
    pub statement_day: u32,
}

/// Per-instrument outcome of a simulation, after ranking.
///
/// A failed unit carries `error`, zero points, and no conversion; it still
/// appears in the result set so the caller always sees every instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct CardResult {
    pub instrument_id: Uuid,
    pub instrument_name: String,
    pub calculation: Option<CalculationResult>,
    /// Converted value in the simulation's target miles currency.
    pub miles: Option<f64>,
    pub rate: Option<f64>,
    pub error: Option<String>,
    /// 1-based position after ranking.
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the external store ports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or queried.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
    /// The store returned data the engine cannot interpret.
    #[error("store returned corrupt data: {reason}")]
    Corrupt {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the reward calculator.
///
/// Only structural input problems are fatal; every data-quality problem
/// degrades into a result message instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// The calculation input is structurally invalid.
    #[error("invalid calculation input: {reason}")]
    InvalidInput {
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Hexagonal ports
// ---------------------------------------------------------------------------

/// Hexagonal port: the external rule catalog.
///
/// An empty result means base-rate fallback, never an error. Implementations
/// live outside the engine crates; the calculator and simulator depend
/// exclusively on this trait.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait RuleStore {
    /// List all rules configured for `card_type_id`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the catalog cannot be read.
    async fn list_rules(&self, card_type_id: &str) -> Result<Vec<RewardRule>, StoreError>;
}

/// Hexagonal port: the external transaction history store.
///
/// The cap tracker derives every aggregate from this port on every call;
/// aggregates are a view over committed transactions, never a counter.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait TransactionHistory {
    /// Sum of transaction amounts for `instrument_id` with dates in
    /// `[start, end]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be read.
    async fn sum_amount(
        &self,
        instrument_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError>;

    /// Sum of bonus points earned by `cap_group` with dates in
    /// `[start, end]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be read.
    async fn sum_bonus_points(
        &self,
        cap_group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError>;
}

/// Hexagonal port: the external conversion-rate store.
///
/// Rates are near-static; the conversion graph layers a TTL cache on top of
/// this port and tolerates read failures by serving stale entries.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait RateStore {
    /// List all outgoing conversion edges for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the rate store cannot be read.
    async fn list_rates(&self, source: &str) -> Result<Vec<ConversionRate>, StoreError>;
}

/// Hexagonal port: the catalog of payment instruments a user holds.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait InstrumentCatalog {
    /// List every instrument, active or not; the simulator filters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the catalog cannot be read.
    async fn list_instruments(&self) -> Result<Vec<PaymentInstrument>, StoreError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
