// Rust guideline compliant 2026-08-27

//! In-memory adapter for the `RateStore` port.
//!
//! Holds the directed conversion edges as a flat vector. Edges are
//! directed: registering `citi-points -> krisflyer` never implies the
//! reverse direction.

use domain::{ConversionRate, RateStore, StoreError};

/// `RateStore` adapter backed by a vector of directed edges.
#[derive(Debug, Default)]
pub struct InMemoryRates {
    edges: Vec<ConversionRate>,
}

impl InMemoryRates {
    /// Create a rate store from its full edge list.
    #[must_use]
    pub fn new(edges: Vec<ConversionRate>) -> Self {
        Self { edges }
    }
}

impl RateStore for InMemoryRates {
    async fn list_rates(&self, source: &str) -> Result<Vec<ConversionRate>, StoreError> {
        Ok(self
            .edges
            .iter()
            .filter(|edge| edge.source.eq_ignore_ascii_case(source))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
