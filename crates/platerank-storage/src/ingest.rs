//! Ingestion boundary: turns cleaned JSON Lines rows into validated records.
//!
//! Each line carries the corpus columns `restaurant_name, rating, num_ratings,
//! avg_cost, online_order, table_booking, cuisines, area`. The cuisine column
//! may be a JSON array or the serialized list form `"['Cafe', 'Thai']"`; it is
//! parsed here once so nothing downstream re-reads encoded lists.

use crate::errors::{Result, StorageError};
use platerank_core::{Cuisines, RestaurantRecord};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Flag {
    fn to_bool(&self, line: usize, column: &str) -> Result<bool> {
        match self {
            Flag::Bool(b) => Ok(*b),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Text(s) if s.eq_ignore_ascii_case("yes") => Ok(true),
            Flag::Text(s) if s.eq_ignore_ascii_case("no") => Ok(false),
            other => Err(StorageError::Row {
                line,
                reason: format!("{} is not a 0/1 or Yes/No flag: {:?}", column, other),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCuisines {
    List(Vec<String>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct RawRow {
    restaurant_name: String,
    rating: f64,
    num_ratings: serde_json::Number,
    avg_cost: f64,
    online_order: Flag,
    table_booking: Flag,
    cuisines: RawCuisines,
    area: String,
}

impl RawRow {
    fn into_record(self, line: usize) -> Result<RestaurantRecord> {
        let n = count_from_number(&self.num_ratings).ok_or_else(|| StorageError::Row {
            line,
            reason: format!("num_ratings {} is not a non-negative integer", self.num_ratings),
        })?;
        let cuisines = match self.cuisines {
            RawCuisines::List(v) => v
                .into_iter()
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty())
                .collect(),
            RawCuisines::Encoded(s) => parse_cuisine_list(&s),
        };
        let record = RestaurantRecord {
            name: self.restaurant_name.trim().to_owned(),
            rating: self.rating,
            num_ratings: n,
            avg_cost: self.avg_cost,
            online_order: self.online_order.to_bool(line, "online_order")?,
            table_booking: self.table_booking.to_bool(line, "table_booking")?,
            cuisines: Cuisines::new(cuisines),
            area: self.area.trim().to_owned(),
        };
        record.validate(line)?;
        Ok(record)
    }
}

// Integral floats such as `12.0` are tolerated; anything outside u64 is not.
fn count_from_number(n: &serde_json::Number) -> Option<u64> {
    if let Some(v) = n.as_u64() {
        return Some(v);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Splits `"['North Indian', 'Chinese']"` (or a bare `North Indian, Chinese`) into names.
pub fn parse_cuisine_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|c| c.trim().trim_matches(|ch| ch == '\'' || ch == '"').trim())
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn parse_row(line: usize, text: &str) -> Result<RestaurantRecord> {
    let raw: RawRow =
        serde_json::from_str(text).map_err(|source| StorageError::Parse { line, source })?;
    raw.into_record(line)
}

/// Reads every row, dropping exact duplicates. Lines are numbered from 1; blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<RestaurantRecord>> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_row(idx + 1, &line)?;
        let key = serde_json::to_string(&record).map_err(|source| StorageError::Parse {
            line: idx + 1,
            source,
        })?;
        if seen.insert(key) {
            out.push(record);
        } else {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        tracing::debug!(duplicates, "dropped duplicate rows");
    }
    Ok(out)
}

/// Loads a corpus file; a `.zst` extension means zstd-compressed JSON Lines.
pub fn load_path(path: &Path) -> Result<Vec<RestaurantRecord>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().and_then(|s| s.to_str()) == Some("zst") {
        Box::new(zstd::Decoder::new(file)?)
    } else {
        Box::new(file)
    };
    let records = read_records(BufReader::new(reader))?;
    tracing::info!(path = %path.display(), records = records.len(), "corpus loaded");
    Ok(records)
}
