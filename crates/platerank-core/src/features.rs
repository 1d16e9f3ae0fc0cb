use crate::errors::{RankError, Result};
use crate::model::RestaurantRecord;
use crate::util::{blake3_hex, mean, median};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sorted, deduplicated universe of cuisine names seen across a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CuisineVocabulary(Vec<String>);

impl CuisineVocabulary {
    pub fn from_records(records: &[RestaurantRecord]) -> Self {
        let set: BTreeSet<&str> = records.iter().flat_map(|r| r.cuisines.iter()).collect();
        CuisineVocabulary(set.into_iter().map(str::to_owned).collect())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.binary_search_by(|c| c.as_str().cmp(name)).ok()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 0/1 presence flag per vocabulary slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineVector(Vec<u8>);

impl CuisineVector {
    fn encode(record: &RestaurantRecord, vocab: &CuisineVocabulary) -> Self {
        CuisineVector(
            vocab
                .names()
                .iter()
                .map(|c| u8::from(record.cuisines.contains(c)))
                .collect(),
        )
    }

    /// Presence of `name`; cuisines outside the vocabulary read as 0.
    pub fn get(&self, vocab: &CuisineVocabulary, name: &str) -> u8 {
        vocab.index_of(name).map(|i| self.0[i]).unwrap_or(0)
    }

    pub fn to_map(&self, vocab: &CuisineVocabulary) -> BTreeMap<String, u8> {
        vocab.names().iter().cloned().zip(self.0.iter().copied()).collect()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub cuisine_vector: CuisineVector,
    pub cost_norm: f64,
    pub weighted_rating: f64,
    pub online_order: u8,
    pub table_booking: u8,
}

impl FeatureSet {
    /// Dense row laid out as `[cuisines.., cost_norm, weighted_rating, online_order, table_booking]`.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row: Vec<f64> = self.cuisine_vector.as_slice().iter().map(|&v| v as f64).collect();
        row.push(self.cost_norm);
        row.push(self.weighted_rating);
        row.push(self.online_order as f64);
        row.push(self.table_booking as f64);
        row
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub record_count: usize,
    /// `C` in the smoothing formula.
    pub mean_num_ratings: f64,
    /// Reported for inspection only; the smoothing formula does not read it.
    pub median_num_ratings: f64,
    pub global_avg_rating: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl CorpusStats {
    fn compute(records: &[RestaurantRecord]) -> Self {
        let counts: Vec<f64> = records.iter().map(|r| r.num_ratings as f64).collect();
        let ratings: Vec<f64> = records.iter().map(|r| r.rating).collect();
        let (min_cost, max_cost) = records.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.avg_cost), hi.max(r.avg_cost))
        });
        Self {
            record_count: records.len(),
            mean_num_ratings: mean(&counts),
            median_num_ratings: median(&counts),
            global_avg_rating: mean(&ratings),
            min_cost,
            max_cost,
        }
    }

    pub fn normalize_cost(&self, cost: f64) -> f64 {
        let span = self.max_cost - self.min_cost;
        if span == 0.0 {
            return 0.0;
        }
        (cost - self.min_cost) / span
    }

    pub fn weighted_rating(&self, rating: f64, num_ratings: u64) -> f64 {
        smoothed_rating(rating, num_ratings, self.mean_num_ratings, self.global_avg_rating)
    }
}

/// `(rating * n + c * global) / (n + c)`. Falls back to `rating` when `n + c == 0`.
pub fn smoothed_rating(rating: f64, num_ratings: u64, c: f64, global_avg_rating: f64) -> f64 {
    let n = num_ratings as f64;
    let denom = n + c;
    if denom == 0.0 {
        return rating;
    }
    (rating * n + c * global_avg_rating) / denom
}

/// Canonical digest of a record list; equal corpora yield equal fingerprints.
pub fn fingerprint(records: &[RestaurantRecord]) -> String {
    let bytes = serde_json::to_vec(records).unwrap_or_default();
    blake3_hex(&bytes)
}

/// Records plus their derived features. Read-only once built.
#[derive(Debug, Clone)]
pub struct FeaturedCorpus {
    records: Vec<RestaurantRecord>,
    features: Vec<FeatureSet>,
    vocabulary: CuisineVocabulary,
    stats: CorpusStats,
    fingerprint: String,
}

impl FeaturedCorpus {
    pub fn records(&self) -> &[RestaurantRecord] {
        &self.records
    }

    pub fn features(&self) -> &[FeatureSet] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RestaurantRecord, &FeatureSet)> {
        self.records.iter().zip(self.features.iter())
    }

    pub fn vocabulary(&self) -> &CuisineVocabulary {
        &self.vocabulary
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cuisines(&self) -> &[String] {
        self.vocabulary.names()
    }

    pub fn areas(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.area.as_str()).collect();
        set.into_iter().map(str::to_owned).collect()
    }

    pub fn cost_bounds(&self) -> (f64, f64) {
        (self.stats.min_cost, self.stats.max_cost)
    }

    /// Headers matching `FeatureSet::to_row`.
    pub fn column_names(&self) -> Vec<String> {
        let mut cols = self.vocabulary.names().to_vec();
        cols.extend(
            ["cost_norm", "weighted_rating", "online_order", "table_booking"]
                .iter()
                .map(|s| s.to_string()),
        );
        cols
    }

    pub fn into_records(self) -> Vec<RestaurantRecord> {
        self.records
    }
}

pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn build(records: Vec<RestaurantRecord>) -> Result<FeaturedCorpus> {
        if records.is_empty() {
            return Err(RankError::EmptyCorpus);
        }
        for (row, r) in records.iter().enumerate() {
            r.validate(row)?;
        }

        let vocabulary = CuisineVocabulary::from_records(&records);
        let stats = CorpusStats::compute(&records);
        let features = records
            .iter()
            .map(|r| FeatureSet {
                cuisine_vector: CuisineVector::encode(r, &vocabulary),
                cost_norm: stats.normalize_cost(r.avg_cost),
                weighted_rating: stats.weighted_rating(r.rating, r.num_ratings),
                online_order: u8::from(r.online_order),
                table_booking: u8::from(r.table_booking),
            })
            .collect();
        let fingerprint = fingerprint(&records);

        tracing::debug!(
            records = records.len(),
            cuisines = vocabulary.len(),
            c = stats.mean_num_ratings,
            global_avg = stats.global_avg_rating,
            "features built"
        );
        Ok(FeaturedCorpus {
            records,
            features,
            vocabulary,
            stats,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cuisines;

    fn rec(name: &str, rating: f64, n: u64, cost: f64, cuisines: &[&str], area: &str) -> RestaurantRecord {
        RestaurantRecord::new(name, rating, n, cost, Cuisines::new(cuisines.iter().copied()), area)
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert_eq!(FeatureBuilder::build(vec![]).unwrap_err(), RankError::EmptyCorpus);
    }

    #[test]
    fn invalid_row_fails_fast_with_index() {
        let err = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 300.0, &["Thai"], "X"),
            rec("B", 6.0, 10, 300.0, &["Thai"], "X"),
        ])
        .unwrap_err();
        assert!(matches!(err, RankError::InvalidRecord { row: 1, .. }));
    }

    #[test]
    fn cuisine_vectors_follow_sorted_vocabulary() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 300.0, &["Thai", "Chinese"], "X"),
            rec("B", 3.0, 5, 600.0, &["Italian"], "Y"),
        ])
        .unwrap();
        assert_eq!(corpus.cuisines(), &["Chinese", "Italian", "Thai"]);
        assert_eq!(corpus.features()[0].cuisine_vector.as_slice(), &[1, 0, 1]);
        assert_eq!(corpus.features()[1].cuisine_vector.as_slice(), &[0, 1, 0]);
        let v = &corpus.features()[1].cuisine_vector;
        assert_eq!(v.get(corpus.vocabulary(), "Italian"), 1);
        assert_eq!(v.get(corpus.vocabulary(), "Mexican"), 0);
        assert_eq!(v.to_map(corpus.vocabulary()).get("Thai"), Some(&0));
    }

    #[test]
    fn cost_is_min_max_normalized() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 200.0, &["Thai"], "X"),
            rec("B", 4.0, 10, 400.0, &["Thai"], "X"),
            rec("C", 4.0, 10, 600.0, &["Thai"], "X"),
        ])
        .unwrap();
        let norms: Vec<f64> = corpus.features().iter().map(|f| f.cost_norm).collect();
        assert_eq!(norms, vec![0.0, 0.5, 1.0]);
        assert_eq!(corpus.cost_bounds(), (200.0, 600.0));
    }

    #[test]
    fn equal_costs_normalize_to_zero() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 500.0, &["Thai"], "X"),
            rec("B", 3.0, 20, 500.0, &["Thai"], "Y"),
        ])
        .unwrap();
        assert!(corpus.features().iter().all(|f| f.cost_norm == 0.0));
    }

    #[test]
    fn weighted_rating_matches_formula() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 100, 500.0, &["Italian"], "X"),
            rec("B", 4.5, 10, 500.0, &["Italian"], "Y"),
        ])
        .unwrap();
        let stats = corpus.stats();
        assert_eq!(stats.mean_num_ratings, 55.0);
        assert_eq!(stats.median_num_ratings, 55.0);
        assert_eq!(stats.global_avg_rating, 4.25);
        let a = (4.0 * 100.0 + 55.0 * 4.25) / 155.0;
        let b = (4.5 * 10.0 + 55.0 * 4.25) / 65.0;
        assert!((corpus.features()[0].weighted_rating - a).abs() < 1e-12);
        assert!((corpus.features()[1].weighted_rating - b).abs() < 1e-12);
    }

    #[test]
    fn zero_rating_counts_keep_raw_rating() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 0, 500.0, &["Thai"], "X"),
            rec("B", 2.5, 0, 300.0, &["Thai"], "X"),
        ])
        .unwrap();
        assert_eq!(corpus.features()[0].weighted_rating, 4.0);
        assert_eq!(corpus.features()[1].weighted_rating, 2.5);
    }

    #[test]
    fn dense_row_lines_up_with_columns() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 200.0, &["Thai"], "X").with_online_order(true),
            rec("B", 4.0, 10, 400.0, &["Cafe"], "X").with_table_booking(true),
        ])
        .unwrap();
        let cols = corpus.column_names();
        assert_eq!(
            cols,
            vec!["Cafe", "Thai", "cost_norm", "weighted_rating", "online_order", "table_booking"]
        );
        let row = corpus.features()[0].to_row();
        assert_eq!(row.len(), cols.len());
        assert_eq!(&row[..3], &[0.0, 1.0, 0.0]);
        assert_eq!(&row[4..], &[1.0, 0.0]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = vec![rec("A", 4.0, 10, 200.0, &["Thai"], "X")];
        let mut b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        b[0].num_ratings = 11;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn areas_are_sorted_and_distinct() {
        let corpus = FeatureBuilder::build(vec![
            rec("A", 4.0, 10, 200.0, &["Thai"], "Whitefield"),
            rec("B", 4.0, 10, 200.0, &["Thai"], "Indiranagar"),
            rec("C", 4.0, 10, 200.0, &["Thai"], "Whitefield"),
        ])
        .unwrap();
        assert_eq!(corpus.areas(), vec!["Indiranagar", "Whitefield"]);
    }
}
