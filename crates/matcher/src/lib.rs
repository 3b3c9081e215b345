// Rust guideline compliant 2026-08-27

//! Condition evaluator -- pure predicate matching of a rule's condition tree
//! against a transaction's fact set.
//!
//! Entry points: [`matches`], [`rule_matches`], [`channel`]. All functions are
//! total and side-effect free: a malformed condition (empty value list,
//! inverted range, non-finite bound) evaluates to non-matching, never panics.

use domain::{
    AmountOp, BoolOp, CalculationInput, Channel, RuleCondition, RewardRule, SetOp, EPSILON,
};

/// Derive the channel tag from the transaction flags.
///
/// Online wins when both flags are set: an online wallet payment is still an
/// online transaction for rule purposes.
#[must_use]
pub fn channel(input: &CalculationInput) -> Channel {
    if input.is_online {
        Channel::Online
    } else if input.is_contactless {
        Channel::Contactless
    } else {
        Channel::InStore
    }
}

/// Evaluate one condition against the input. Pure and total.
#[must_use]
pub fn matches(condition: &RuleCondition, input: &CalculationInput) -> bool {
    match condition {
        RuleCondition::Mcc { op, values } => set_match(*op, values, input.mcc.as_deref(), exact_member),
        RuleCondition::Merchant { op, values } => {
            set_match(*op, values, input.merchant_name.as_deref(), substring_member)
        }
        RuleCondition::Currency { op, values } => {
            set_match(*op, values, Some(input.currency.as_str()), exact_member)
        }
        RuleCondition::Category { op, values } => {
            set_match(*op, values, input.category.as_deref(), exact_member)
        }
        RuleCondition::TransactionType { values } => {
            // Empty channel list is malformed -- fail closed.
            !values.is_empty() && values.contains(&channel(input))
        }
        RuleCondition::Amount(op) => amount_match(*op, input.amount),
        RuleCondition::Compound { op, sub } => compound_match(*op, sub, input),
    }
}

/// Whether every condition of `rule` matches `input`.
///
/// Conditions are implicitly AND-ed; an empty condition list matches
/// everything (catch-all rules). Disabled rules never match.
#[must_use]
pub fn rule_matches(rule: &RewardRule, input: &CalculationInput) -> bool {
    if !rule.enabled {
        return false;
    }
    rule.conditions.iter().all(|c| matches(c, input))
}

/// Case-insensitive exact membership.
fn exact_member(values: &[String], field: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(field.trim()))
}

/// Case-insensitive substring membership (merchant descriptors are noisy:
/// "ZARA SINGAPORE SG" must match a "zara" rule value).
fn substring_member(values: &[String], field: &str) -> bool {
    let haystack = field.to_lowercase();
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .any(|v| haystack.contains(&v.trim().to_lowercase()))
}

/// Shared include/exclude logic for value-set conditions.
///
/// An empty value list is malformed and fails closed for both directions;
/// a missing input field is simply not a member.
fn set_match(
    op: SetOp,
    values: &[String],
    field: Option<&str>,
    member: fn(&[String], &str) -> bool,
) -> bool {
    if values.is_empty() {
        tracing::debug!("matcher: empty value list, failing closed");
        return false;
    }
    let is_member = field.is_some_and(|f| member(values, f));
    match op {
        SetOp::Include => is_member,
        SetOp::Exclude => !is_member,
    }
}

fn amount_match(op: AmountOp, amount: f64) -> bool {
    match op {
        AmountOp::GreaterThan(v) => v.is_finite() && amount > v,
        AmountOp::LessThan(v) => v.is_finite() && amount < v,
        AmountOp::Equals(v) => v.is_finite() && (amount - v).abs() <= EPSILON,
        AmountOp::Range { min, max } => {
            // Inverted or non-finite ranges are malformed -- fail closed.
            min.is_finite()
                && max.is_finite()
                && min <= max
                && amount >= min - EPSILON
                && amount <= max + EPSILON
        }
    }
}

fn compound_match(op: BoolOp, sub: &[RuleCondition], input: &CalculationInput) -> bool {
    // An empty group is malformed -- fail closed for both combinators.
    if sub.is_empty() {
        tracing::debug!("matcher: empty compound group, failing closed");
        return false;
    }
    match op {
        BoolOp::Any => sub.iter().any(|c| matches(c, input)),
        BoolOp::All => sub.iter().all(|c| matches(c, input)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::RewardSpec;
    use uuid::Uuid;

    fn make_input() -> CalculationInput {
        CalculationInput {
            amount: 50.75,
            currency: "SGD".to_owned(),
            converted_amount: None,
            converted_currency: None,
            mcc: Some("5621".to_owned()),
            merchant_name: Some("ZARA SINGAPORE SG".to_owned()),
            category: Some("Fashion".to_owned()),
            is_online: true,
            is_contactless: false,
            date: NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    // ------------------------------------------------------------------
    // Channel derivation
    // ------------------------------------------------------------------

    #[test]
    fn channel_online() {
        let input = make_input();
        assert_eq!(channel(&input), Channel::Online);
    }

    #[test]
    fn channel_online_wins_over_contactless() {
        let mut input = make_input();
        input.is_contactless = true;
        assert_eq!(channel(&input), Channel::Online);
    }

    #[test]
    fn channel_contactless() {
        let mut input = make_input();
        input.is_online = false;
        input.is_contactless = true;
        assert_eq!(channel(&input), Channel::Contactless);
    }

    #[test]
    fn channel_in_store() {
        let mut input = make_input();
        input.is_online = false;
        assert_eq!(channel(&input), Channel::InStore);
    }

    // ------------------------------------------------------------------
    // Value-set conditions
    // ------------------------------------------------------------------

    #[test]
    fn mcc_include_member() {
        let cond = RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621", "5631"]) };
        assert!(matches(&cond, &make_input()));
    }

    #[test]
    fn mcc_include_non_member() {
        let cond = RuleCondition::Mcc { op: SetOp::Include, values: strings(&["3000"]) };
        assert!(!matches(&cond, &make_input()));
    }

    #[test]
    fn mcc_exclude_is_negation() {
        let member = RuleCondition::Mcc { op: SetOp::Exclude, values: strings(&["5621"]) };
        let non_member = RuleCondition::Mcc { op: SetOp::Exclude, values: strings(&["3000"]) };
        assert!(!matches(&member, &make_input()));
        assert!(matches(&non_member, &make_input()));
    }

    #[test]
    fn mcc_missing_field_not_a_member() {
        let mut input = make_input();
        input.mcc = None;
        let include = RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) };
        let exclude = RuleCondition::Mcc { op: SetOp::Exclude, values: strings(&["5621"]) };
        assert!(!matches(&include, &input));
        assert!(matches(&exclude, &input));
    }

    #[test]
    fn empty_values_fail_closed_for_both_ops() {
        let include = RuleCondition::Mcc { op: SetOp::Include, values: vec![] };
        let exclude = RuleCondition::Mcc { op: SetOp::Exclude, values: vec![] };
        assert!(!matches(&include, &make_input()));
        assert!(!matches(&exclude, &make_input()));
    }

    #[test]
    fn merchant_substring_case_insensitive() {
        let cond = RuleCondition::Merchant { op: SetOp::Include, values: strings(&["zara"]) };
        assert!(matches(&cond, &make_input()));
    }

    #[test]
    fn merchant_substring_no_match() {
        let cond = RuleCondition::Merchant { op: SetOp::Include, values: strings(&["uniqlo"]) };
        assert!(!matches(&cond, &make_input()));
    }

    #[test]
    fn merchant_blank_values_are_skipped() {
        // A blank pattern must not match every merchant.
        let cond = RuleCondition::Merchant { op: SetOp::Include, values: strings(&["  "]) };
        assert!(!matches(&cond, &make_input()));
    }

    #[test]
    fn currency_case_insensitive_equality() {
        let cond = RuleCondition::Currency { op: SetOp::Include, values: strings(&["sgd"]) };
        assert!(matches(&cond, &make_input()));
    }

    #[test]
    fn category_exact_match() {
        let cond = RuleCondition::Category { op: SetOp::Include, values: strings(&["fashion"]) };
        assert!(matches(&cond, &make_input()));
    }

    // ------------------------------------------------------------------
    // Transaction type
    // ------------------------------------------------------------------

    #[test]
    fn transaction_type_membership() {
        let cond = RuleCondition::TransactionType { values: vec![Channel::Online] };
        assert!(matches(&cond, &make_input()));
        let cond = RuleCondition::TransactionType { values: vec![Channel::Contactless] };
        assert!(!matches(&cond, &make_input()));
    }

    #[test]
    fn transaction_type_empty_fails_closed() {
        let cond = RuleCondition::TransactionType { values: vec![] };
        assert!(!matches(&cond, &make_input()));
    }

    // ------------------------------------------------------------------
    // Amount conditions
    // ------------------------------------------------------------------

    #[test]
    fn amount_greater_and_less_than() {
        let input = make_input(); // 50.75
        assert!(matches(&RuleCondition::Amount(AmountOp::GreaterThan(50.0)), &input));
        assert!(!matches(&RuleCondition::Amount(AmountOp::GreaterThan(50.75)), &input));
        assert!(matches(&RuleCondition::Amount(AmountOp::LessThan(51.0)), &input));
        assert!(!matches(&RuleCondition::Amount(AmountOp::LessThan(50.0)), &input));
    }

    #[test]
    fn amount_equals_within_epsilon() {
        let input = make_input();
        assert!(matches(&RuleCondition::Amount(AmountOp::Equals(50.75)), &input));
        assert!(!matches(&RuleCondition::Amount(AmountOp::Equals(50.74)), &input));
    }

    #[test]
    fn amount_range_inclusive() {
        let input = make_input();
        assert!(matches(&RuleCondition::Amount(AmountOp::Range { min: 50.75, max: 100.0 }), &input));
        assert!(matches(&RuleCondition::Amount(AmountOp::Range { min: 10.0, max: 50.75 }), &input));
        assert!(!matches(&RuleCondition::Amount(AmountOp::Range { min: 51.0, max: 100.0 }), &input));
    }

    #[test]
    fn amount_inverted_range_fails_closed() {
        let cond = RuleCondition::Amount(AmountOp::Range { min: 100.0, max: 10.0 });
        assert!(!matches(&cond, &make_input()));
    }

    #[test]
    fn amount_non_finite_bound_fails_closed() {
        assert!(!matches(&RuleCondition::Amount(AmountOp::GreaterThan(f64::NAN)), &make_input()));
        assert!(!matches(
            &RuleCondition::Amount(AmountOp::Range { min: f64::NEG_INFINITY, max: 100.0 }),
            &make_input()
        ));
    }

    // ------------------------------------------------------------------
    // Compound conditions
    // ------------------------------------------------------------------

    #[test]
    fn compound_any_short_circuits_on_first_true() {
        let cond = RuleCondition::Compound {
            op: BoolOp::Any,
            sub: vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["9999"]) },
            ],
        };
        assert!(matches(&cond, &make_input()));
    }

    #[test]
    fn compound_all_requires_every_branch() {
        let both = RuleCondition::Compound {
            op: BoolOp::All,
            sub: vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::TransactionType { values: vec![Channel::Online] },
            ],
        };
        let one_fails = RuleCondition::Compound {
            op: BoolOp::All,
            sub: vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::TransactionType { values: vec![Channel::Contactless] },
            ],
        };
        assert!(matches(&both, &make_input()));
        assert!(!matches(&one_fails, &make_input()));
    }

    #[test]
    fn compound_nesting() {
        // (mcc in {5621} AND (online OR contactless))
        let cond = RuleCondition::Compound {
            op: BoolOp::All,
            sub: vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::Compound {
                    op: BoolOp::Any,
                    sub: vec![
                        RuleCondition::TransactionType { values: vec![Channel::Online] },
                        RuleCondition::TransactionType { values: vec![Channel::Contactless] },
                    ],
                },
            ],
        };
        assert!(matches(&cond, &make_input()));
    }

    #[test]
    fn compound_empty_group_fails_closed() {
        let any = RuleCondition::Compound { op: BoolOp::Any, sub: vec![] };
        let all = RuleCondition::Compound { op: BoolOp::All, sub: vec![] };
        assert!(!matches(&any, &make_input()));
        assert!(!matches(&all, &make_input()));
    }

    // ------------------------------------------------------------------
    // Whole-rule matching
    // ------------------------------------------------------------------

    fn make_rule(enabled: bool, conditions: Vec<RuleCondition>) -> RewardRule {
        RewardRule {
            id: Uuid::new_v4(),
            card_type_id: "citi-rewards".to_owned(),
            name: "test".to_owned(),
            enabled,
            priority: 10,
            conditions,
            reward: RewardSpec::default(),
        }
    }

    #[test]
    fn rule_conditions_are_anded() {
        let rule = make_rule(
            true,
            vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::TransactionType { values: vec![Channel::Online] },
            ],
        );
        assert!(rule_matches(&rule, &make_input()));

        let rule = make_rule(
            true,
            vec![
                RuleCondition::Mcc { op: SetOp::Include, values: strings(&["5621"]) },
                RuleCondition::TransactionType { values: vec![Channel::InStore] },
            ],
        );
        assert!(!rule_matches(&rule, &make_input()));
    }

    #[test]
    fn empty_condition_list_matches_everything() {
        let rule = make_rule(true, vec![]);
        assert!(rule_matches(&rule, &make_input()));
    }

    #[test]
    fn disabled_rule_never_matches() {
        let rule = make_rule(false, vec![]);
        assert!(!rule_matches(&rule, &make_input()));
    }
}
