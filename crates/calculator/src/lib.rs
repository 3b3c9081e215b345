// Rust guideline compliant 2026-08-27

//! Reward calculator -- selects the winning rule for a transaction, applies
//! its calculation method, rounding, and quantization, and enforces the
//! monthly bonus cap.
//!
//! Entry point: [`Calculator::calculate`]. Configuration via
//! [`CalculatorConfig::builder`]. Pure and synchronous: the monthly
//! aggregates arrive pre-fetched as a `CapState` snapshot, so the calculator
//! itself never touches an external store.

use domain::{
    BonusTier, CalcError, CalculationInput, CalculationMethod, CalculationResult, CapState,
    RewardRule, RewardSpec, TierBasis,
};

// ---------------------------------------------------------------------------
// CalculatorError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`Calculator`].
#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    /// The supplied configuration is invalid.
    #[error("invalid calculator configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// CalculatorConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Calculator`].
///
/// Construct via [`CalculatorConfig::builder`].
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Tolerance for cap, tier, and minimum-spend boundary comparisons.
    pub epsilon: f64,
    /// Points currency stamped onto results produced by the implicit base
    /// rule, which has no currency of its own. Typically the instrument's
    /// reward currency. Empty when unset.
    pub fallback_points_currency: String,
}

/// Builder for [`CalculatorConfig`].
///
/// Obtain via [`CalculatorConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct CalculatorConfigBuilder {
    epsilon: f64,
    fallback_points_currency: String,
}

impl CalculatorConfig {
    /// Create a builder with defaults: `epsilon = domain::EPSILON`, no
    /// fallback points currency.
    #[must_use]
    pub fn builder() -> CalculatorConfigBuilder {
        CalculatorConfigBuilder {
            epsilon: domain::EPSILON,
            fallback_points_currency: String::new(),
        }
    }
}

impl CalculatorConfigBuilder {
    /// Override the boundary-comparison tolerance.
    #[must_use]
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Points currency for implicit base-rule results.
    #[must_use]
    pub fn fallback_points_currency(mut self, currency: impl Into<String>) -> Self {
        self.fallback_points_currency = currency.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CalculatorError::InvalidConfig`] when `epsilon` is not a
    /// finite positive number.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<CalculatorConfig, CalculatorError> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(CalculatorError::InvalidConfig {
                reason: format!("epsilon must be a finite positive number, got {}", self.epsilon),
            });
        }
        Ok(CalculatorConfig {
            epsilon: self.epsilon,
            fallback_points_currency: self.fallback_points_currency,
        })
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Selects the winning rule for a transaction and turns spend into points.
///
/// First-match-wins: matching rules are ordered by priority descending and
/// only the top rule is applied, so a specific merchant or category rule
/// pre-empts broader "online" or "base" catch-alls. When nothing matches,
/// an implicit 1x base rule applies -- calculation never fails for lack of
/// a rule.
#[derive(Debug, Clone)]
pub struct Calculator {
    config: CalculatorConfig,
}

impl Calculator {
    /// Create a new calculator from `config`.
    #[must_use]
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    /// Calculate the points `input` earns under `rules`, given the cap
    /// group's pre-fetched `caps` snapshot.
    ///
    /// Every data-quality problem (no matching rule, unmet minimum spend,
    /// cap exhausted, degraded aggregates) produces a degraded result with a
    /// diagnostic message, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidInput`] only when `input` is structurally
    /// invalid (non-positive or non-finite amount, empty currency).
    pub fn calculate(
        &self,
        input: &CalculationInput,
        rules: &[RewardRule],
        caps: &CapState,
    ) -> Result<CalculationResult, CalcError> {
        input.validate()?;

        let mut messages: Vec<String> = vec![];
        if caps.degraded {
            messages.push("monthly spend unavailable; assuming 0".to_owned());
        }

        match select_rule(input, rules) {
            Some(rule) => {
                tracing::debug!(
                    rule = %rule.name,
                    priority = rule.priority,
                    "calculator: rule selected"
                );
                Ok(self.apply(rule, input, caps, messages))
            }
            None => {
                tracing::debug!("calculator: no matching rule, applying base rate");
                messages.push("no matching rule; base rate applied".to_owned());
                Ok(self.base_fallback(input, messages))
            }
        }
    }

    /// Apply the winning rule's reward spec.
    fn apply(
        &self,
        rule: &RewardRule,
        input: &CalculationInput,
        caps: &CapState,
        mut messages: Vec<String>,
    ) -> CalculationResult {
        let spec = &rule.reward;
        let eps = self.config.epsilon;

        // Minimum-spend gate: the rule still pays its base rate, but the
        // bonus is withheld until the threshold is met.
        let min_spend_met = match spec.monthly_min_spend {
            Some(min) => caps.period_spend >= min - eps,
            None => true,
        };
        if !min_spend_met {
            messages.push("monthly minimum spend not met; base rate applied".to_owned());
        }

        let spend = input.spend_amount();
        let rounded = spec.amount_rounding.apply(spend);
        // Block quantization: integer-divide, discard remainder. The
        // multipliers are per block ("4 points per $5").
        let quantized = if spec.block_size > 1.0 {
            (rounded / spec.block_size).trunc()
        } else {
            rounded
        };

        let (raw_base, raw_bonus) = match spec.method {
            CalculationMethod::Standard => {
                (quantized * spec.base_multiplier, quantized * spec.bonus_multiplier)
            }
            CalculationMethod::Tiered => {
                let basis = match spec.tier_basis {
                    TierBasis::MonthlySpend => caps.period_spend + spend,
                    TierBasis::Amount => spend,
                };
                let multiplier = select_tier(&spec.tiers, basis).map_or(0.0, |t| t.multiplier);
                (quantized * spec.base_multiplier, quantized * multiplier)
            }
            CalculationMethod::FlatRate => (spec.base_multiplier, spec.bonus_multiplier),
            CalculationMethod::Direct { points } => (points, 0.0),
        };

        let base_points = spec.points_rounding.apply(raw_base);
        let mut bonus_points =
            if min_spend_met { spec.points_rounding.apply(raw_bonus) } else { 0.0 };

        // Cap enforcement: clip the bonus to the cap group's remaining
        // headroom. Base points are never capped.
        if let Some(cap) = spec.monthly_cap {
            let headroom = (cap - caps.cap_group_earned).max(0.0);
            if bonus_points > headroom + eps {
                tracing::debug!(
                    rule = %rule.name,
                    bonus = bonus_points,
                    headroom,
                    "calculator: bonus clipped by monthly cap"
                );
                bonus_points = headroom;
                messages.push("monthly bonus cap reached; bonus clipped".to_owned());
            }
        }

        CalculationResult {
            total_points: base_points + bonus_points,
            base_points,
            bonus_points,
            points_currency: spec.points_currency.clone(),
            min_spend_met,
            messages,
            rule_id: Some(rule.id),
            rule_name: Some(rule.name.clone()),
        }
    }

    /// Implicit 1x base rule: floor the amount, no bonus, no cap.
    fn base_fallback(&self, input: &CalculationInput, messages: Vec<String>) -> CalculationResult {
        let spec = RewardSpec::default();
        let base_points = spec.points_rounding.apply(
            spec.amount_rounding.apply(input.spend_amount()) * spec.base_multiplier,
        );
        CalculationResult {
            total_points: base_points,
            base_points,
            bonus_points: 0.0,
            points_currency: self.config.fallback_points_currency.clone(),
            min_spend_met: true,
            messages,
            rule_id: None,
            rule_name: None,
        }
    }
}

/// Highest-priority enabled rule whose conditions all match `input`.
///
/// The sort is stable, so equal priorities resolve to catalog order. Exposed
/// so callers that pre-fetch monthly aggregates (the simulator) can learn the
/// winning rule's period type and cap group before calculating.
#[must_use]
pub fn select_rule<'a>(
    input: &CalculationInput,
    rules: &'a [RewardRule],
) -> Option<&'a RewardRule> {
    let mut matching: Vec<&RewardRule> = rules
        .iter()
        .filter(|rule| matcher::rule_matches(rule, input))
        .collect();
    matching.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
    matching.first().copied()
}

/// The tier containing `basis`, with the highest `priority` among overlaps.
fn select_tier(tiers: &[BonusTier], basis: f64) -> Option<&BonusTier> {
    tiers
        .iter()
        .filter(|tier| tier.contains(basis))
        .max_by_key(|tier| tier.priority)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
