// Rust guideline compliant 2026-08-27

//! SQLite adapter for the `TransactionHistory` port (demo).
//!
//! Persists committed transactions and bonus awards to a SQLite file via
//! `sqlx` and computes the monthly aggregates with `SUM` queries. Proves
//! that the hexagonal `TransactionHistory` port is truly swappable without
//! touching the engine crates.
//!
//! # Dependency note
//!
//! `sqlx` is a hard dependency (no feature flag). This is intentional for
//! a proof-of-concept binary where build-complexity trade-offs favour
//! simplicity over optional compilation.
//!
//! # Date encoding
//!
//! Dates are stored as ISO `YYYY-MM-DD` TEXT, so lexicographic `BETWEEN`
//! comparisons coincide with chronological order.

use chrono::NaiveDate;
use domain::{StoreError, TransactionHistory};
use uuid::Uuid;

/// `TransactionHistory` adapter backed by a SQLite database via `sqlx`.
///
/// Connects to (or creates) a SQLite file and ensures the `transactions`
/// and `bonus_awards` tables exist.
// #[allow] not #[expect]: dead_code fires in the rewards_engine binary but
// NOT in the rewards_engine_sqlite binary, so #[expect] would generate an
// unfulfilled-expectation warning in one of the two binaries.
#[allow(dead_code, reason = "used by rewards_engine_sqlite binary; dead in rewards_engine")]
#[derive(Debug, Clone)]
pub struct SqliteHistory {
    pool: sqlx::SqlitePool,
}

impl SqliteHistory {
    /// Open or create a SQLite database and initialize the schema.
    ///
    /// Passes `create_if_missing(true)` so the database file is created on
    /// first run without manual setup. Both tables are created via
    /// `CREATE TABLE IF NOT EXISTS`, making repeated calls safe.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails.
    #[allow(dead_code, reason = "used by rewards_engine_sqlite binary; dead in rewards_engine")]
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        // create_if_missing: sqlx 0.8 defaults to false for file databases;
        // enable explicitly so the demo works out of the box on first run.
        let opts = db_url
            .parse::<sqlx::sqlite::SqliteConnectOptions>()?
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(opts).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transactions (
                id            TEXT PRIMARY KEY,
                instrument_id TEXT NOT NULL,
                amount        REAL NOT NULL,
                date          TEXT NOT NULL   -- ISO YYYY-MM-DD
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bonus_awards (
                id        TEXT PRIMARY KEY,
                cap_group TEXT NOT NULL,
                points    REAL NOT NULL,
                date      TEXT NOT NULL   -- ISO YYYY-MM-DD
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Persist one committed transaction.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the insert fails.
    #[allow(dead_code, reason = "used by rewards_engine_sqlite binary; dead in rewards_engine")]
    pub async fn record_spend(
        &self,
        instrument_id: Uuid,
        date: NaiveDate,
        amount: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO transactions (id, instrument_id, amount, date) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(instrument_id.to_string())
            .bind(amount)
            .bind(date.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist one bonus award against a cap group.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the insert fails.
    #[allow(dead_code, reason = "used by rewards_engine_sqlite binary; dead in rewards_engine")]
    pub async fn record_bonus(
        &self,
        cap_group: &str,
        date: NaiveDate,
        points: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO bonus_awards (id, cap_group, points, date) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(cap_group)
            .bind(points)
            .bind(date.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl TransactionHistory for SqliteHistory {
    /// Sum of transaction amounts for `instrument_id`, bounds inclusive.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` on any `sqlx` error. The underlying
    /// error is logged at `error` level before mapping.
    async fn sum_amount(
        &self,
        instrument_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions
             WHERE instrument_id = ? AND date BETWEEN ? AND ?",
        )
        .bind(instrument_id.to_string())
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("sqlite.sum_amount: {e}");
            StoreError::Unavailable { reason: e.to_string() }
        })
    }

    /// Sum of bonus points for `cap_group`, bounds inclusive.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` on any `sqlx` error. The underlying
    /// error is logged at `error` level before mapping.
    async fn sum_bonus_points(
        &self,
        cap_group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StoreError> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0.0) FROM bonus_awards
             WHERE cap_group = ? AND date BETWEEN ? AND ?",
        )
        .bind(cap_group)
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("sqlite.sum_bonus_points: {e}");
            StoreError::Unavailable { reason: e.to_string() }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SqliteHistory;
    use chrono::NaiveDate;
    use domain::TransactionHistory as _;
    use uuid::Uuid;

    // Each test opens a fresh SqlitePool backed by an in-memory SQLite
    // database, so tests are fully isolated with no on-disk side-effects.
    async fn make_history() -> SqliteHistory {
        SqliteHistory::new("sqlite::memory:")
            .await
            .expect("in-memory SQLite should open")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[tokio::test]
    async fn empty_tables_sum_to_zero() {
        let history = make_history().await;
        let sum = history.sum_amount(Uuid::new_v4(), day(1), day(31)).await.unwrap();
        assert!(sum.abs() < f64::EPSILON);
        let sum = history.sum_bonus_points("citi-10x", day(1), day(31)).await.unwrap();
        assert!(sum.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sum_amount_filters_instrument_and_range() {
        let history = make_history().await;
        let card = Uuid::new_v4();
        let other = Uuid::new_v4();
        history.record_spend(card, day(1), 100.0).await.unwrap();
        history.record_spend(card, day(15), 50.5).await.unwrap();
        history.record_spend(card, day(31), 25.0).await.unwrap();
        history.record_spend(other, day(15), 999.0).await.unwrap();

        let sum = history.sum_amount(card, day(1), day(20)).await.unwrap();
        assert!((sum - 150.5).abs() < 1e-9, "expected 150.5, got {sum}");
    }

    #[tokio::test]
    async fn sum_amount_bounds_are_inclusive() {
        let history = make_history().await;
        let card = Uuid::new_v4();
        history.record_spend(card, day(1), 10.0).await.unwrap();
        history.record_spend(card, day(31), 20.0).await.unwrap();

        let sum = history.sum_amount(card, day(1), day(31)).await.unwrap();
        assert!((sum - 30.0).abs() < 1e-9, "expected 30.0, got {sum}");
    }

    #[tokio::test]
    async fn sum_bonus_points_pools_by_cap_group() {
        let history = make_history().await;
        history.record_bonus("citi-10x", day(2), 400.0).await.unwrap();
        history.record_bonus("citi-10x", day(9), 250.0).await.unwrap();
        history.record_bonus("dbs-4x", day(9), 999.0).await.unwrap();

        let sum = history.sum_bonus_points("citi-10x", day(1), day(31)).await.unwrap();
        assert!((sum - 650.0).abs() < 1e-9, "expected 650.0, got {sum}");
    }

    #[tokio::test]
    async fn month_boundary_excludes_neighbouring_months() {
        let history = make_history().await;
        let card = Uuid::new_v4();
        history
            .record_spend(card, NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(), 100.0)
            .await
            .unwrap();
        history.record_spend(card, day(15), 50.0).await.unwrap();
        history
            .record_spend(card, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(), 100.0)
            .await
            .unwrap();

        let sum = history.sum_amount(card, day(1), day(31)).await.unwrap();
        assert!((sum - 50.0).abs() < 1e-9, "expected 50.0, got {sum}");
    }
}
