//! Multinomial logistic regression over ARN-R weighted vectors.
//!
//! One coefficient vector per class, zero-initialised, fitted by
//! stochastic gradient descent on the corpus negative log-likelihood.
//! Training stops early when the relative improvement of the epoch error
//! falls under the threshold.

use crate::arn::{ArnConfig, ArnModel, VectorLayout};
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use ndarray::{Array1, Array2};

const LEARNING_RATE: f64 = 0.001;
const MIN_IMPROVEMENT: f64 = 0.001;
const MAX_EPOCHS: usize = 10_000;

/// Relative difference used for the early-stop test.
fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs() + b.abs();
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Numerically stable softmax of a score vector.
fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps = scores.mapv(|s| (s - max).exp());
    let total = exps.sum();
    exps / total
}

/// Discriminative text classifier on the lexical channel.
#[derive(Debug, Clone, Default)]
pub struct Logistic {
    arn_config: ArnConfig,
    layout: VectorLayout,
    examples: TrainingSet,
    model: Option<LogisticModel>,
}

#[derive(Debug, Clone)]
struct LogisticModel {
    arn: ArnModel,
    betas: Array2<f64>,
    /// Corpus negative log-likelihood per epoch, up to the early stop.
    errors: Vec<f64>,
}

impl Logistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arn_config(mut self, config: ArnConfig) -> Self {
        self.arn_config = config;
        self
    }

    pub fn with_layout(mut self, layout: VectorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The per-epoch training error, recorded up to the early stop.
    pub fn training_errors(&self) -> Result<&[f64]> {
        let model = self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })?;
        Ok(&model.errors)
    }

    /// Class posterior probabilities in category-index order.
    pub fn posteriors(&self, features: &FeatureBox) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })?;
        Ok(self.scores(model, features)?.to_vec())
    }

    /// Softmax posteriors under the current coefficients.
    fn scores(&self, model: &LogisticModel, features: &FeatureBox) -> Result<Array1<f64>> {
        let n = model.arn.categories().len();
        let mut raw = Array1::zeros(n);
        for class in 0..n {
            let vector = self.vector(&model.arn, features, class)?;
            raw[class] = model.betas.row(class).dot(&vector);
        }
        Ok(softmax(&raw))
    }

    /// The class-weighted feature vector, layout extras included.
    fn vector(&self, arn: &ArnModel, features: &FeatureBox, class: usize) -> Result<Array1<f64>> {
        let lexical = arn.weighted_vector(features, class)?;
        Ok(Array1::from(self.layout.assemble(lexical, features)))
    }

    fn vector_len(&self, arn: &ArnModel) -> usize {
        let extras = usize::from(self.layout.intercept)
            + if self.layout.emotion_dims { 3 } else { 0 }
            + usize::from(self.layout.negation);
        arn.vector_len() + extras
    }
}

impl Classifier for Logistic {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, logistic regression stays untrained");
            return Ok(());
        }
        let arn = ArnModel::fit(&self.examples, &self.arn_config)?;
        let n_classes = arn.categories().len();
        if n_classes < 2 {
            return Err(AffectError::Data(
                "logistic regression requires at least two categories".into(),
            ));
        }

        // Per-example, per-class weighted vectors are fixed for the whole
        // optimisation, so they are materialised once.
        let mut vectors: Vec<Vec<Array1<f64>>> = Vec::with_capacity(self.examples.len());
        let mut truths: Vec<usize> = Vec::with_capacity(self.examples.len());
        for (features, category) in self.examples.iter() {
            let per_class = (0..n_classes)
                .map(|c| self.vector(&arn, features, c))
                .collect::<Result<Vec<_>>>()?;
            vectors.push(per_class);
            truths.push(arn.categories().get(category).ok_or_else(|| {
                AffectError::Data(format!("category `{category}` missing from the index"))
            })?);
        }

        let n_features = self.vector_len(&arn);
        let mut betas: Array2<f64> = Array2::zeros((n_classes, n_features));
        let mut previous_error = f64::INFINITY;
        let mut errors = Vec::new();
        for epoch in 0..MAX_EPOCHS {
            let mut epoch_error = 0.0;
            for (per_class, &truth) in vectors.iter().zip(&truths) {
                let mut raw = Array1::zeros(n_classes);
                for class in 0..n_classes {
                    raw[class] = betas.row(class).dot(&per_class[class]);
                }
                let posteriors = softmax(&raw);
                epoch_error -= posteriors[truth].max(f64::MIN_POSITIVE).ln();
                for class in 0..n_classes {
                    let indicator = if class == truth { 1.0 } else { 0.0 };
                    let gradient = indicator - posteriors[class];
                    let mut row = betas.row_mut(class);
                    row.scaled_add(LEARNING_RATE * gradient, &per_class[class]);
                }
            }
            errors.push(epoch_error);
            if previous_error.is_finite()
                && relative_difference(previous_error, epoch_error) < MIN_IMPROVEMENT
            {
                log::debug!("converged after {epoch} epochs, error {epoch_error:.6}");
                break;
            }
            previous_error = epoch_error;
        }

        self.model = Some(LogisticModel { arn, betas, errors });
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let model = self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })?;
        let posteriors = self.scores(model, features)?;
        let mut best = 0;
        for (class, &p) in posteriors.iter().enumerate() {
            if p > posteriors[best] {
                best = class;
            }
        }
        model
            .arn
            .categories()
            .label(best)
            .map(str::to_owned)
            .ok_or_else(|| AffectError::Data("the trained model has no categories".into()))
    }

    fn reset_examples(&mut self) {
        self.examples.clear();
        self.model = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(words: &str) -> FeatureBox {
        let mut fbox = FeatureBox::new();
        fbox.set_words(words);
        fbox
    }

    fn trained() -> Logistic {
        let mut logistic = Logistic::new();
        logistic.input_training_example(example("I hate going to the dentist ."), "NEG");
        logistic.input_training_example(example("I swim a lot ."), "NEU");
        logistic.input_training_example(example("I love reading books ."), "POS");
        logistic.train().unwrap();
        logistic
    }

    #[test]
    fn separates_the_sentiment_corpus() {
        let logistic = trained();
        assert_eq!(logistic.get_category(&example("I like my dentist .")).unwrap(), "NEG");
        assert_eq!(logistic.get_category(&example("You love .")).unwrap(), "POS");
    }

    #[test]
    fn posteriors_are_a_distribution() {
        let logistic = trained();
        let posteriors = logistic.posteriors(&example("I swim .")).unwrap();
        assert_eq!(posteriors.len(), 3);
        let total: f64 = posteriors.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn epoch_error_never_rises_before_the_stop() {
        let logistic = trained();
        let errors = logistic.training_errors().unwrap();
        assert!(errors.len() >= 2);
        for pair in errors[..errors.len() - 1].windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-9,
                "epoch error rose from {} to {}",
                pair[0],
                pair[1]
            );
        }
        // The final epoch either kept improving or tripped the stop test.
        let last = errors[errors.len() - 1];
        let before_last = errors[errors.len() - 2];
        assert!(
            last <= before_last + 1e-9
                || relative_difference(before_last, last) < MIN_IMPROVEMENT
        );
    }

    #[test]
    fn single_category_corpus_is_a_data_error() {
        let mut logistic = Logistic::new();
        logistic.input_training_example(example("all the same"), "NEU");
        logistic.input_training_example(example("still the same"), "NEU");
        assert!(matches!(logistic.train(), Err(AffectError::Data(_))));
    }

    #[test]
    fn untrained_prediction_is_a_precondition_error() {
        let logistic = Logistic::new();
        assert!(matches!(
            logistic.get_category(&example("anything")),
            Err(AffectError::Precondition(_))
        ));
    }

    #[test]
    fn reset_then_retrain_starts_clean() {
        let mut logistic = trained();
        logistic.reset_examples();
        assert!(logistic.get_category(&example("I swim .")).is_err());
        logistic.input_training_example(example("up up up"), "POS");
        logistic.input_training_example(example("down down down"), "NEG");
        logistic.train().unwrap();
        assert_eq!(logistic.get_category(&example("up")).unwrap(), "POS");
    }
}
