// Rust guideline compliant 2026-08-27

//! In-memory adapter for the `InstrumentCatalog` port.

use domain::{InstrumentCatalog, PaymentInstrument, StoreError};

/// `InstrumentCatalog` adapter backed by a vector of instruments.
///
/// Lists every instrument, active or not; filtering on `active` is the
/// simulator's job.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    instruments: Vec<PaymentInstrument>,
}

impl InMemoryCatalog {
    /// Create a catalog from the user's full instrument list.
    #[must_use]
    pub fn new(instruments: Vec<PaymentInstrument>) -> Self {
        Self { instruments }
    }
}

impl InstrumentCatalog for InMemoryCatalog {
    async fn list_instruments(&self) -> Result<Vec<PaymentInstrument>, StoreError> {
        Ok(self.instruments.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
