use crate::errors::Result;
use crate::ingest;
use platerank_core::RestaurantRecord;
use std::path::PathBuf;

/// Where a catalog gets its records from.
pub trait RecordSource: Send + Sync + 'static {
    fn load(&self) -> Result<Vec<RestaurantRecord>>;

    // human-readable origin for logs
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonlSource {
    fn load(&self) -> Result<Vec<RestaurantRecord>> {
        ingest::load_path(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RestaurantRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticSource {
    fn load(&self) -> Result<Vec<RestaurantRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("static({} records)", self.records.len())
    }
}
