//! The classifier family and the contract they all share.
//!
//! Every classifier accumulates labelled [`FeatureBox`] examples in a
//! pending buffer, builds an immutable model on [`Classifier::train`], and
//! answers [`Classifier::get_category`] from that model without mutating
//! it. `reset_examples` discards both the buffer and the model, returning
//! the classifier to its empty state.

pub mod arn_reduced;
pub mod hierarchical;
pub mod knn;
pub mod logistic;
pub mod lsa;
pub mod naive_bayes;
pub mod risk;
pub mod svm;

use crate::error::Result;
use crate::features::FeatureBox;
use std::collections::HashMap;

/// The behaviour every affective classifier provides.
///
/// Training on an empty buffer is a logged warning, not an error, and
/// leaves the classifier untrained. Predicting before training fails with
/// a precondition error. A failed prediction never corrupts the model.
pub trait Classifier {
    /// Buffers one labelled training example.
    fn input_training_example(&mut self, features: FeatureBox, category: &str);

    /// Builds the model from the buffered examples.
    fn train(&mut self) -> Result<()>;

    /// Predicts the affective category of the given features.
    fn get_category(&self, features: &FeatureBox) -> Result<String>;

    /// Drops the buffered examples and any trained model.
    fn reset_examples(&mut self);
}

/// The pending buffer of labelled examples shared by all classifiers.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    features: Vec<FeatureBox>,
    categories: Vec<String>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, features: FeatureBox, category: &str) {
        self.features.push(features);
        self.categories.push(category.to_owned());
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.categories.clear();
    }

    pub fn features(&self) -> &[FeatureBox] {
        &self.features
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureBox, &str)> {
        self.features
            .iter()
            .zip(self.categories.iter().map(String::as_str))
    }
}

/// The closed set of category labels, discovered from the training stream
/// in first-seen order and frozen after training.
///
/// Each label gets a dense integer index; the index is what the vector
/// classifiers key their parameters on.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from a label stream, keeping first-seen order.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut idx = Self::new();
        for label in labels {
            idx.insert(label);
        }
        idx
    }

    /// Registers a label, returning its dense index.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(&i) = self.index.get(label) {
            return i;
        }
        let i = self.labels.len();
        self.labels.push(label.to_owned());
        self.index.insert(label.to_owned(), i);
        i
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_index_keeps_first_seen_order() {
        let idx = CategoryIndex::from_labels(["neg", "neu", "pos", "neg", "neu"]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.labels(), ["neg", "neu", "pos"]);
        assert_eq!(idx.get("pos"), Some(2));
        assert_eq!(idx.label(0), Some("neg"));
        assert_eq!(idx.get("surprise"), None);
    }

    #[test]
    fn training_set_buffers_pairs() {
        let mut set = TrainingSet::new();
        set.push(FeatureBox::with_text("so happy"), "pos");
        set.push(FeatureBox::with_text("so sad"), "neg");
        assert_eq!(set.len(), 2);
        let cats: Vec<_> = set.iter().map(|(_, c)| c).collect();
        assert_eq!(cats, ["pos", "neg"]);
        set.clear();
        assert!(set.is_empty());
    }
}
