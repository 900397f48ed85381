//! P&L report caching using Moka.
//!
//! Reports are cached per `(company, period key)` pair. Any ledger write
//! for a tenant evicts every entry belonging to that tenant, so a read
//! after a write never serves a report computed from the pre-write state.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{debug, warn};

use super::pnl::PnLReport;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cache entries (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

type CacheKey = (i64, String);

/// Cache of computed P&L reports.
///
/// Thread-safe and cheap to clone; suitable for concurrent access from
/// many request handlers.
#[derive(Clone)]
pub struct ReportCache {
    cache: Cache<CacheKey, Arc<PnLReport>>,
}

impl ReportCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build();

        Self { cache }
    }

    /// Looks up a cached report for a tenant and period key.
    #[must_use]
    pub fn get(&self, company_id: i64, period: &str) -> Option<Arc<PnLReport>> {
        self.cache.get(&(company_id, period.to_string()))
    }

    /// Stores a computed report.
    pub fn insert(&self, company_id: i64, period: &str, report: Arc<PnLReport>) {
        self.cache.insert((company_id, period.to_string()), report);
    }

    /// Evicts every cached report for one tenant.
    pub fn evict_company(&self, company_id: i64) {
        match self
            .cache
            .invalidate_entries_if(move |key, _| key.0 == company_id)
        {
            Ok(_) => debug!(company_id, "evicted report cache for tenant"),
            Err(e) => warn!(company_id, error = %e, "report cache eviction failed"),
        }
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance tasks. Used by tests to make
    /// invalidation observable immediately.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::period::PeriodRange;
    use crate::reports::pnl::build_report;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_report(income: rust_decimal::Decimal) -> Arc<PnLReport> {
        let range = PeriodRange {
            start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
        };
        Arc::new(build_report("month", range, income, dec!(0), vec![]))
    }

    #[test]
    fn miss_then_hit() {
        let cache = ReportCache::new();
        assert!(cache.get(7, "month").is_none());

        cache.insert(7, "month", sample_report(dec!(100)));
        let hit = cache.get(7, "month").unwrap();
        assert_eq!(hit.total_income, dec!(100));
    }

    #[test]
    fn eviction_is_per_tenant() {
        let cache = ReportCache::new();
        cache.insert(7, "month", sample_report(dec!(100)));
        cache.insert(7, "quarter", sample_report(dec!(200)));
        cache.insert(9, "month", sample_report(dec!(300)));

        cache.evict_company(7);
        cache.run_pending_tasks();

        assert!(cache.get(7, "month").is_none());
        assert!(cache.get(7, "quarter").is_none());
        // The other tenant's entry survives.
        assert!(cache.get(9, "month").is_some());
    }

    #[test]
    fn distinct_periods_are_distinct_entries() {
        let cache = ReportCache::new();
        cache.insert(7, "month", sample_report(dec!(100)));
        cache.insert(7, "2026-01", sample_report(dec!(50)));

        assert_eq!(cache.get(7, "month").unwrap().total_income, dec!(100));
        assert_eq!(cache.get(7, "2026-01").unwrap().total_income, dec!(50));
    }
}
