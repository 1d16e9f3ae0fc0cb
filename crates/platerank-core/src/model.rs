use crate::errors::{RankError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_RATING: f64 = 5.0;

/// Ordered set of distinct cuisine names. Insertion order is kept, repeats are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Cuisines(Vec<String>);

impl Cuisines {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Cuisines(out)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Cuisines {
    fn from(v: Vec<String>) -> Self {
        Cuisines::new(v)
    }
}

impl From<Cuisines> for Vec<String> {
    fn from(c: Cuisines) -> Self {
        c.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    #[serde(rename = "restaurant_name")]
    pub name: String,
    pub rating: f64,
    pub num_ratings: u64,
    // estimate for two people
    pub avg_cost: f64,
    pub online_order: bool,
    pub table_booking: bool,
    pub cuisines: Cuisines,
    pub area: String,
}

impl RestaurantRecord {
    pub fn new(
        name: impl Into<String>,
        rating: f64,
        num_ratings: u64,
        avg_cost: f64,
        cuisines: Cuisines,
        area: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rating,
            num_ratings,
            avg_cost,
            online_order: false,
            table_booking: false,
            cuisines,
            area: area.into(),
        }
    }

    pub fn with_online_order(mut self, v: bool) -> Self {
        self.online_order = v;
        self
    }

    pub fn with_table_booking(mut self, v: bool) -> Self {
        self.table_booking = v;
        self
    }

    /// Checks the invariants the feature builder relies on. `row` is only used for reporting.
    pub fn validate(&self, row: usize) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RankError::invalid_record(row, "empty restaurant name"));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(RankError::invalid_record(
                row,
                format!("rating {} outside [0, {}]", self.rating, MAX_RATING),
            ));
        }
        if !self.avg_cost.is_finite() || self.avg_cost < 0.0 {
            return Err(RankError::invalid_record(
                row,
                format!("avg_cost {} is negative or not finite", self.avg_cost),
            ));
        }
        if self.cuisines.is_empty() {
            return Err(RankError::invalid_record(row, "no cuisines"));
        }
        if self.cuisines.iter().any(|c| c.trim().is_empty()) {
            return Err(RankError::invalid_record(row, "blank cuisine name"));
        }
        if self.area.trim().is_empty() {
            return Err(RankError::invalid_record(row, "empty area"));
        }
        Ok(())
    }
}
