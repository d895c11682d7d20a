//! k-Nearest-Neighbour over the emotion coordinates.
//!
//! Training is example retention. Prediction ranks the stored examples by
//! squared Euclidean distance over the first `dims` emotion dimensions,
//! keeps the `k` closest (distance ties broken by insertion order) and
//! returns the majority category, first encountered winning on a tie.

use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use ndarray::Array1;

const DEFAULT_K: usize = 1;
const DEFAULT_DIMS: usize = 3;

/// Instance-based classifier on valence/activation/control coordinates.
#[derive(Debug, Clone)]
pub struct KNearestNeighbour {
    k: usize,
    dims: usize,
    examples: TrainingSet,
    points: Vec<Array1<f64>>,
    labels: Vec<String>,
    trained: bool,
}

impl KNearestNeighbour {
    pub fn new() -> Self {
        Self {
            k: DEFAULT_K,
            dims: DEFAULT_DIMS,
            examples: TrainingSet::new(),
            points: Vec::new(),
            labels: Vec::new(),
            trained: false,
        }
    }

    /// Number of neighbours to vote. Must be at least one.
    pub fn with_k(mut self, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(AffectError::Config("k must be at least 1".into()));
        }
        self.k = k;
        Ok(self)
    }

    /// Number of emotion dimensions used for the distance, 1 to 3.
    pub fn with_dims(mut self, dims: usize) -> Result<Self> {
        if !(1..=3).contains(&dims) {
            return Err(AffectError::Config(format!(
                "dimensionality must be between 1 and 3, got {dims}"
            )));
        }
        self.dims = dims;
        Ok(self)
    }

    fn point(&self, features: &FeatureBox) -> Result<Array1<f64>> {
        // An undeclared dimension count means no dimension is meaningful.
        let count = features.dimension_count().unwrap_or(0);
        if count < self.dims {
            return Err(AffectError::Config(format!(
                "the input carries {count} emotion dimensions, {} required",
                self.dims
            )));
        }
        let mut coords = Vec::with_capacity(self.dims);
        for d in 0..self.dims {
            coords.push(features.dimension(d).ok_or_else(|| {
                AffectError::Config(format!("emotion dimension {d} is unavailable"))
            })?);
        }
        Ok(Array1::from(coords))
    }
}

impl Default for KNearestNeighbour {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for KNearestNeighbour {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, kNN stays untrained");
            return Ok(());
        }
        if self.k > self.examples.len() {
            return Err(AffectError::Config(format!(
                "k = {} exceeds the {} stored examples",
                self.k,
                self.examples.len()
            )));
        }
        let mut points = Vec::with_capacity(self.examples.len());
        let mut labels = Vec::with_capacity(self.examples.len());
        for (features, category) in self.examples.iter() {
            points.push(self.point(features)?);
            labels.push(category.to_owned());
        }
        self.points = points;
        self.labels = labels;
        self.trained = true;
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        if !self.trained {
            return Err(AffectError::Precondition(
                "the classifier has not been trained".into(),
            ));
        }
        let query = self.point(features)?;
        let mut ranked: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let diff = p - &query;
                (diff.dot(&diff), i)
            })
            .collect();
        // Stable sort keeps insertion order among equidistant examples.
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // Majority vote among the k closest, first encountered wins ties.
        let mut vote_order: Vec<&str> = Vec::new();
        let mut votes: Vec<usize> = Vec::new();
        for &(_, i) in ranked.iter().take(self.k) {
            let label = self.labels[i].as_str();
            match vote_order.iter().position(|&l| l == label) {
                Some(slot) => votes[slot] += 1,
                None => {
                    vote_order.push(label);
                    votes.push(1);
                }
            }
        }
        let mut best = 0;
        for (slot, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = slot;
            }
        }
        Ok(vote_order[best].to_owned())
    }

    fn reset_examples(&mut self) {
        self.examples.clear();
        self.points.clear();
        self.labels.clear();
        self.trained = false;
    }
}
