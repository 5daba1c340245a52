use crate::datasets::{self, Retention, TimeSeries};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use vantage::ports::KeyValueStore;
use vantage::{CacheRecord, DerivedEnvelope, KeyedCache, Lookup, Namespace, PayloadCache, WriteOutcome};

pub type SalesCache = PayloadCache<TimeSeries>;
pub type RetentionCache = KeyedCache<DerivedEnvelope<Retention, Value>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarmupReport {
    pub hits: usize,
    pub misses: usize,
    pub stored: usize,
    pub dropped: usize,
}

impl WarmupReport {
    fn merge(&mut self, other: WarmupReport) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.stored += other.stored;
        self.dropped += other.dropped;
    }
}

/// Read `key`; on a miss build the payload and write it back
pub fn warm<R, S>(
    cache: &KeyedCache<R, S>,
    key: &str,
    build: impl FnOnce() -> R::Payload,
) -> WarmupReport
where
    R: CacheRecord,
    S: KeyValueStore + ?Sized,
{
    let mut report = WarmupReport::default();

    match cache.read(key) {
        Lookup::Hit(entry) => {
            debug!("Reusing cached '{}'", entry.storage_key);
            report.hits += 1;
            return report;
        }
        Lookup::Miss | Lookup::Unreadable(_) => report.misses += 1,
    }

    match cache.write(key, build()) {
        WriteOutcome::Stored => report.stored += 1,
        WriteOutcome::Dropped(_) => report.dropped += 1,
    }
    report
}

/// Warm every dataset the dashboard pages read on load
pub fn warm_dashboard(store: Arc<dyn KeyValueStore>, start: NaiveDate) -> WarmupReport {
    let sales: SalesCache = KeyedCache::new(Namespace::TIMESERIES, Arc::clone(&store));
    let retention: RetentionCache = KeyedCache::new(Namespace::RETENTION, store);

    let mut report = WarmupReport::default();

    for region in datasets::REGIONS {
        report.merge(warm(&sales, region, || datasets::sales_series(region, start)));
    }

    for period in datasets::PERIODS {
        report.merge(warm(&retention, period, || datasets::retention(period)));
    }

    info!(
        "Dashboard cache warm-up: {} hit(s), {} miss(es), {} stored, {} dropped",
        report.hits, report.misses, report.stored, report.dropped
    );
    report
}
