use crate::errors::{RankError, Result};
use crate::features::{FeatureSet, FeaturedCorpus};
use crate::model::RestaurantRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const DEFAULT_TOP_N: usize = 5;
pub const ANY_AREA: &str = "any";

/// Area preference. `Any` disables the area priority stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AreaFilter {
    #[default]
    Any,
    Area(String),
}

impl AreaFilter {
    pub fn matches(&self, area: &str) -> bool {
        match self {
            AreaFilter::Any => false,
            AreaFilter::Area(a) => a == area,
        }
    }
}

impl From<&str> for AreaFilter {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case(ANY_AREA) {
            AreaFilter::Any
        } else {
            AreaFilter::Area(s.to_owned())
        }
    }
}

impl From<String> for AreaFilter {
    fn from(s: String) -> Self {
        AreaFilter::from(s.as_str())
    }
}

impl From<AreaFilter> for String {
    fn from(a: AreaFilter) -> Self {
        match a {
            AreaFilter::Any => ANY_AREA.to_owned(),
            AreaFilter::Area(s) => s,
        }
    }
}

/// Inclusive `[min, max]` bound on `avg_cost`. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

impl CostRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn contains(&self, cost: f64) -> bool {
        cost >= self.min && cost <= self.max
    }
}

impl From<(f64, f64)> for CostRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

impl From<CostRange> for (f64, f64) {
    fn from(r: CostRange) -> Self {
        (r.min, r.max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Empty means no cuisine filter.
    pub selected_cuisines: BTreeSet<String>,
    pub cost_range: CostRange,
    pub selected_area: AreaFilter,
    pub top_n: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            selected_cuisines: BTreeSet::new(),
            cost_range: CostRange::unbounded(),
            selected_area: AreaFilter::Any,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cuisines<I, S>(mut self, cuisines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_cuisines = cuisines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cost_range(mut self, min: f64, max: f64) -> Self {
        self.cost_range = CostRange::new(min, max);
        self
    }

    pub fn with_area(mut self, area: impl Into<AreaFilter>) -> Self {
        self.selected_area = area.into();
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(RankError::InvalidParameter("top_n must be positive".into()));
        }
        let CostRange { min, max } = self.cost_range;
        if min.is_nan() || max.is_nan() {
            return Err(RankError::InvalidParameter("cost range bound is NaN".into()));
        }
        if min > max {
            return Err(RankError::InvalidParameter(format!(
                "cost range min {} exceeds max {}",
                min, max
            )));
        }
        Ok(())
    }

    // OR across the selection: any shared cuisine keeps the record.
    fn cuisine_matches(&self, record: &RestaurantRecord) -> bool {
        self.selected_cuisines.is_empty()
            || record.cuisines.iter().any(|c| self.selected_cuisines.contains(c))
    }
}

/// A record as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    #[serde(flatten)]
    pub record: RestaurantRecord,
    pub weighted_rating: f64,
    pub cost_norm: f64,
    /// True when the record sits in the preferred-area partition.
    pub area_match: bool,
}

pub type RankedResult = Vec<RankedRestaurant>;

/// Filter by cuisine and cost, rank by weighted rating, float the preferred
/// area to the front, truncate to `top_n`. Never touches `corpus`.
pub fn recommend(corpus: &FeaturedCorpus, params: &QueryParams) -> Result<RankedResult> {
    params.validate()?;

    let mut hits: Vec<(&RestaurantRecord, &FeatureSet)> = corpus
        .iter()
        .filter(|(r, _)| params.cuisine_matches(r))
        .filter(|(r, _)| params.cost_range.contains(r.avg_cost))
        .collect();

    // sort_by is stable: equal scores (0.0 and -0.0 included) keep corpus order
    hits.sort_by(|a, b| {
        b.1.weighted_rating
            .partial_cmp(&a.1.weighted_rating)
            .unwrap_or(Ordering::Equal)
    });

    if let AreaFilter::Area(area) = &params.selected_area {
        let (mut matching, others): (Vec<_>, Vec<_>) =
            hits.into_iter().partition(|(r, _)| r.area == *area);
        matching.extend(others);
        hits = matching;
    }

    Ok(hits
        .into_iter()
        .take(params.top_n)
        .map(|(r, f)| RankedRestaurant {
            record: r.clone(),
            weighted_rating: f.weighted_rating,
            cost_norm: f.cost_norm,
            area_match: params.selected_area.matches(&r.area),
        })
        .collect())
}
