use crate::errors::{Result, StorageError};
use platerank_core::FeaturedCorpus;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

const NAME_COLUMN: &str = "restaurant_name";

/// Writes the feature matrix as JSON Lines: one object per record holding
/// `restaurant_name` plus every feature column.
pub struct FeatureExportWriter {
    out: BufWriter<File>,
    pub path: PathBuf,
}

impl FeatureExportWriter {
    pub fn create(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let out = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            out: BufWriter::new(out),
            path,
        })
    }

    pub fn write_corpus(&mut self, corpus: &FeaturedCorpus) -> Result<usize> {
        let columns = corpus.column_names();
        // a cuisine named like a fixed column would silently overwrite it
        let mut seen: HashSet<&str> = HashSet::from([NAME_COLUMN]);
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(StorageError::ColumnCollision(dup.clone()));
        }
        let mut rows = 0;
        for (record, features) in corpus.iter() {
            let mut obj = Map::new();
            obj.insert(NAME_COLUMN.into(), Value::from(record.name.clone()));
            for (col, v) in columns.iter().zip(features.to_row()) {
                obj.insert(col.clone(), Value::from(v));
            }
            self.write_line(&Value::Object(obj))?;
            rows += 1;
        }
        self.out.flush()?;
        tracing::info!(path = %self.path.display(), rows, "feature matrix exported");
        Ok(rows)
    }

    fn write_line(&mut self, obj: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.out, obj).map_err(std::io::Error::from)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}
