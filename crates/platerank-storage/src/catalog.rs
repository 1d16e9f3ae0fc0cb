use crate::errors::Result;
use crate::traits::RecordSource;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use platerank_core::{
    features, recommend, FeatureBuilder, FeaturedCorpus, QueryParams, RankedResult,
    RestaurantRecord,
};
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::Arc;

static FEATURE_BUILD_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!("feature_build_seconds", "Feature table build latency").unwrap()
});

static CATALOG_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("catalog_records", "Records in the active feature table").unwrap()
});

static CATALOG_REBUILDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("catalog_rebuilds_total", "Catalog rebuilds by result", &["result"])
        .unwrap()
});

/// Owned handle to the active corpus and its feature table.
///
/// Readers take an `Arc` snapshot and never hold the lock while querying.
/// Writers build the new table off-lock and swap it in, so a query sees
/// either the old table or the new one, never a mix.
#[derive(Clone)]
pub struct Catalog {
    active: Arc<RwLock<Arc<FeaturedCorpus>>>,
    // serializes rebuilds so append never loses a concurrent write
    writer: Arc<Mutex<()>>,
}

impl Catalog {
    pub fn new(records: Vec<RestaurantRecord>) -> Result<Self> {
        let built = build(records)?;
        CATALOG_RECORDS.set(built.len() as i64);
        Ok(Self {
            active: Arc::new(RwLock::new(Arc::new(built))),
            writer: Arc::new(Mutex::new(())),
        })
    }

    pub fn from_source(source: &dyn RecordSource) -> Result<Self> {
        let records = source.load()?;
        tracing::info!(source = %source.describe(), records = records.len(), "building catalog");
        Self::new(records)
    }

    pub fn snapshot(&self) -> Arc<FeaturedCorpus> {
        self.active.read().clone()
    }

    /// Rebuilds over `records` and swaps. Returns false when the corpus is unchanged.
    pub fn replace(&self, records: Vec<RestaurantRecord>) -> Result<bool> {
        let _guard = self.writer.lock();
        self.swap_in(records)
    }

    /// Extends the current corpus with `more` and rebuilds.
    pub fn append(&self, more: Vec<RestaurantRecord>) -> Result<bool> {
        let _guard = self.writer.lock();
        let mut records = self.snapshot().records().to_vec();
        records.extend(more);
        self.swap_in(records)
    }

    pub fn reload(&self, source: &dyn RecordSource) -> Result<bool> {
        let records = source.load()?;
        tracing::info!(source = %source.describe(), records = records.len(), "reloading catalog");
        self.replace(records)
    }

    pub fn recommend(&self, params: &QueryParams) -> Result<RankedResult> {
        let corpus = self.snapshot();
        Ok(recommend(&corpus, params)?)
    }

    fn swap_in(&self, records: Vec<RestaurantRecord>) -> Result<bool> {
        if features::fingerprint(&records) == self.snapshot().fingerprint() {
            CATALOG_REBUILDS_TOTAL.with_label_values(&["unchanged"]).inc();
            return Ok(false);
        }
        let built = match build(records) {
            Ok(b) => b,
            Err(e) => {
                CATALOG_REBUILDS_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(error = %e, "catalog rebuild failed, keeping previous table");
                return Err(e);
            }
        };
        CATALOG_RECORDS.set(built.len() as i64);
        tracing::info!(
            records = built.len(),
            fingerprint = %built.fingerprint(),
            "catalog swapped"
        );
        *self.active.write() = Arc::new(built);
        CATALOG_REBUILDS_TOTAL.with_label_values(&["swapped"]).inc();
        Ok(true)
    }
}

fn build(records: Vec<RestaurantRecord>) -> Result<FeaturedCorpus> {
    let _timer = FEATURE_BUILD_SECONDS.start_timer();
    Ok(FeatureBuilder::build(records)?)
}
