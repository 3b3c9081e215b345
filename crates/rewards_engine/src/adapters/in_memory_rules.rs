// Rust guideline compliant 2026-08-27

//! In-memory adapter for the `RuleStore` port.
//!
//! Holds rule catalogs keyed by card product. Catalogs are immutable after
//! construction; rules are loaded fresh per calculation by design, so the
//! adapter clones on every read.

use domain::{RewardRule, RuleStore, StoreError};
use std::collections::HashMap;

/// `RuleStore` adapter backed by a `HashMap` of catalogs.
///
/// A card product with no entry yields an empty catalog, which the
/// calculator treats as base-rate fallback, never an error.
#[derive(Debug, Default)]
pub struct InMemoryRules {
    catalogs: HashMap<String, Vec<RewardRule>>,
}

impl InMemoryRules {
    /// Create an empty rule store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the full catalog for one card product, replacing any
    /// previous catalog. Vector order is catalog order and breaks
    /// priority ties.
    #[must_use]
    pub fn with_catalog(mut self, card_type_id: &str, rules: Vec<RewardRule>) -> Self {
        self.catalogs.insert(card_type_id.to_owned(), rules);
        self
    }
}

impl RuleStore for InMemoryRules {
    async fn list_rules(&self, card_type_id: &str) -> Result<Vec<RewardRule>, StoreError> {
        Ok(self.catalogs.get(card_type_id).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::InMemoryRules;
    use domain::{RewardRule, RewardSpec, RuleStore as _};
    use uuid::Uuid;

    fn make_rule(card_type_id: &str, name: &str) -> RewardRule {
        RewardRule {
            id: Uuid::new_v4(),
            card_type_id: card_type_id.to_owned(),
            name: name.to_owned(),
            enabled: true,
            priority: 1,
            conditions: vec![],
            reward: RewardSpec::default(),
        }
    }

    #[tokio::test]
    async fn returns_registered_catalog_in_order() {
        let store = InMemoryRules::new().with_catalog(
            "citi-rewards",
            vec![make_rule("citi-rewards", "first"), make_rule("citi-rewards", "second")],
        );
        let rules = store.list_rules("citi-rewards").await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "first");
        assert_eq!(rules[1].name, "second");
    }

    #[tokio::test]
    async fn unknown_product_yields_empty_catalog() {
        let store = InMemoryRules::new();
        let rules = store.list_rules("nonexistent").await.unwrap();
        assert!(rules.is_empty());
    }
}
