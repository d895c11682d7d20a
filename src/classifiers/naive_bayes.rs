//! Gaussian naive Bayes over the emotion coordinates.
//!
//! Each class keeps one univariate Gaussian per emotion dimension plus a
//! relative-frequency prior. The dimensions are treated as conditionally
//! independent given the class, so the class likelihood is the product of
//! the per-dimension densities.

use crate::classifiers::{CategoryIndex, Classifier, TrainingSet};
use crate::density::GaussianDensity;
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;

const DEFAULT_DIMS: usize = 3;

#[derive(Debug, Clone)]
struct ClassModel {
    prior: f64,
    densities: Vec<GaussianDensity>,
}

/// Gaussian naive Bayes on valence/activation/control coordinates.
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    dims: usize,
    examples: TrainingSet,
    categories: CategoryIndex,
    classes: Vec<ClassModel>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self {
            dims: DEFAULT_DIMS,
            examples: TrainingSet::new(),
            categories: CategoryIndex::new(),
            classes: Vec::new(),
        }
    }

    /// Number of emotion dimensions modelled, 1 to 3.
    pub fn with_dims(mut self, dims: usize) -> Result<Self> {
        if !(1..=3).contains(&dims) {
            return Err(AffectError::Config(format!(
                "dimensionality must be between 1 and 3, got {dims}"
            )));
        }
        self.dims = dims;
        Ok(self)
    }

    /// The frozen category set, available after training.
    pub fn categories(&self) -> Result<&CategoryIndex> {
        if self.classes.is_empty() {
            return Err(AffectError::Precondition(
                "the classifier has not been trained".into(),
            ));
        }
        Ok(&self.categories)
    }

    /// Fitted mean vector of one class over the modelled dimensions.
    pub fn class_means(&self, class: usize) -> Result<Vec<f64>> {
        self.check_trained()?;
        let model = self.classes.get(class).ok_or_else(|| {
            AffectError::Config(format!("class index {class} out of range"))
        })?;
        Ok(model.densities.iter().map(GaussianDensity::mean).collect())
    }

    /// Unnormalised joint likelihood of a point under one class.
    pub fn class_likelihood(&self, class: usize, features: &FeatureBox) -> Result<f64> {
        self.check_trained()?;
        let model = self.classes.get(class).ok_or_else(|| {
            AffectError::Config(format!("class index {class} out of range"))
        })?;
        self.check_dimensions(features)?;
        let mut likelihood = model.prior;
        for d in 0..self.dims {
            let x = features.dimension(d).ok_or_else(|| {
                AffectError::Config(format!("emotion dimension {d} is unavailable"))
            })?;
            likelihood *= model.densities[d].likelihood(x);
        }
        Ok(likelihood)
    }

    /// Rejects inputs that declare fewer emotion dimensions than modelled.
    /// An undeclared count means no dimension is meaningful.
    fn check_dimensions(&self, features: &FeatureBox) -> Result<()> {
        let count = features.dimension_count().unwrap_or(0);
        if count < self.dims {
            return Err(AffectError::Config(format!(
                "the input carries {count} emotion dimensions, {} required",
                self.dims
            )));
        }
        Ok(())
    }

    /// Posterior P(class | features), normalised over the known classes.
    pub fn posterior_probability(&self, class: usize, features: &FeatureBox) -> Result<f64> {
        let joints = self.joint_likelihoods(features)?;
        let total: f64 = joints.iter().sum();
        let joint = *joints.get(class).ok_or_else(|| {
            AffectError::Config(format!("class index {class} out of range"))
        })?;
        if total <= 0.0 {
            // Every class is equally (im)plausible this far from the data.
            return Ok(1.0 / joints.len() as f64);
        }
        Ok(joint / total)
    }

    /// Normalised posteriors for every class, in category-index order.
    pub fn posteriors(&self, features: &FeatureBox) -> Result<Vec<f64>> {
        let joints = self.joint_likelihoods(features)?;
        let total: f64 = joints.iter().sum();
        if total <= 0.0 {
            let uniform = 1.0 / joints.len() as f64;
            return Ok(vec![uniform; joints.len()]);
        }
        Ok(joints.into_iter().map(|j| j / total).collect())
    }

    fn joint_likelihoods(&self, features: &FeatureBox) -> Result<Vec<f64>> {
        self.check_trained()?;
        (0..self.classes.len())
            .map(|c| self.class_likelihood(c, features))
            .collect()
    }

    fn check_trained(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(AffectError::Precondition(
                "the classifier has not been trained".into(),
            ));
        }
        Ok(())
    }
}

impl Default for NaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for NaiveBayes {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, naive Bayes stays untrained");
            return Ok(());
        }
        let mut categories = CategoryIndex::new();
        for category in self.examples.categories() {
            categories.insert(category);
        }
        let total = self.examples.len() as f64;
        let mut classes = Vec::with_capacity(categories.len());
        for class in 0..categories.len() {
            let label = categories.label(class).unwrap_or_default().to_owned();
            let members: Vec<&FeatureBox> = self
                .examples
                .iter()
                .filter(|(_, c)| *c == label)
                .map(|(f, _)| f)
                .collect();
            let mut densities = Vec::with_capacity(self.dims);
            for d in 0..self.dims {
                let mut samples = Vec::with_capacity(members.len());
                for features in &members {
                    self.check_dimensions(features)?;
                    samples.push(features.dimension(d).ok_or_else(|| {
                        AffectError::Config(format!("emotion dimension {d} is unavailable"))
                    })?);
                }
                densities.push(GaussianDensity::fit(&samples)?);
            }
            classes.push(ClassModel {
                prior: members.len() as f64 / total,
                densities,
            });
        }
        self.categories = categories;
        self.classes = classes;
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let posteriors = self.posteriors(features)?;
        let mut best = 0;
        for (class, &p) in posteriors.iter().enumerate() {
            if p > posteriors[best] {
                best = class;
            }
        }
        self.categories
            .label(best)
            .map(str::to_owned)
            .ok_or_else(|| AffectError::Data("the trained model has no categories".into()))
    }

    fn reset_examples(&mut self) {
        self.examples.clear();
        self.categories = CategoryIndex::new();
        self.classes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(v: f64, a: f64, c: f64) -> FeatureBox {
        let mut fbox = FeatureBox::new();
        fbox.set_dimension_count(3);
        fbox.set_valence(v).unwrap();
        fbox.set_activation(a).unwrap();
        fbox.set_control(c).unwrap();
        fbox
    }

    fn trained() -> NaiveBayes {
        let mut nb = NaiveBayes::new();
        nb.input_training_example(coords(2.0, 8.0, 5.0), "negative");
        nb.input_training_example(coords(1.0, 9.0, 5.0), "negative");
        nb.input_training_example(coords(8.0, 2.0, 5.0), "positive");
        nb.input_training_example(coords(9.0, 1.0, 5.0), "positive");
        nb.input_training_example(coords(5.0, 5.0, 5.0), "neutral");
        nb.input_training_example(coords(5.5, 4.5, 5.0), "neutral");
        nb.train().unwrap();
        nb
    }

    #[test]
    fn classifies_by_highest_posterior() {
        let nb = trained();
        assert_eq!(nb.get_category(&coords(1.5, 8.5, 5.0)).unwrap(), "negative");
        assert_eq!(nb.get_category(&coords(8.5, 1.5, 5.0)).unwrap(), "positive");
        assert_eq!(nb.get_category(&coords(5.2, 4.8, 5.0)).unwrap(), "neutral");
    }

    #[test]
    fn posteriors_sum_to_one() {
        let nb = trained();
        let posteriors = nb.posteriors(&coords(3.0, 6.0, 5.0)).unwrap();
        let total: f64 = posteriors.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(posteriors.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn class_means_recover_the_centroids() {
        let nb = trained();
        let neg = nb.class_means(0).unwrap();
        assert!((neg[0] - 1.5).abs() < 1e-12);
        assert!((neg[1] - 8.5).abs() < 1e-12);
    }

    #[test]
    fn untrained_prediction_is_a_precondition_error() {
        let nb = NaiveBayes::new();
        assert!(matches!(
            nb.get_category(&coords(5.0, 5.0, 5.0)),
            Err(AffectError::Precondition(_))
        ));
    }

    #[test]
    fn undeclared_dimensions_are_rejected() {
        let nb = trained();
        assert!(matches!(
            nb.get_category(&FeatureBox::new()),
            Err(AffectError::Config(_))
        ));
        // Declaring fewer dimensions than modelled is rejected too.
        let mut short = FeatureBox::new();
        short.set_dimension_count(1);
        short.set_valence(4.0).unwrap();
        assert!(matches!(
            nb.posteriors(&short),
            Err(AffectError::Config(_))
        ));
        // Training with an undeclared example fails the same way.
        let mut bad = NaiveBayes::new();
        bad.input_training_example(coords(2.0, 8.0, 5.0), "negative");
        bad.input_training_example(FeatureBox::new(), "positive");
        assert!(matches!(bad.train(), Err(AffectError::Config(_))));
    }

    #[test]
    fn single_member_class_has_floored_variance() {
        let mut nb = NaiveBayes::new();
        nb.input_training_example(coords(2.0, 8.0, 5.0), "negative");
        nb.input_training_example(coords(8.0, 2.0, 5.0), "positive");
        nb.train().unwrap();
        assert!(nb.class_likelihood(0, &coords(2.0, 8.0, 5.0)).unwrap().is_finite());
        assert_eq!(nb.get_category(&coords(2.1, 7.9, 5.0)).unwrap(), "negative");
    }
}
