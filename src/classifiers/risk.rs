//! Risk-weighted naive Bayes.
//!
//! Wraps the Gaussian naive Bayes and decides by minimum expected loss
//! instead of maximum posterior: c* = arg min_c Σ_{c'} Λ[c][c'] · P(c'|x)
//! with a zero diagonal. The loss matrix Λ comes from one of three
//! strategies selected at construction.

use crate::classifiers::naive_bayes::NaiveBayes;
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// Label the sentiment strategies treat as the low-stakes middle class.
const NEUTRAL_LABEL: &str = "neutral";

const MOMENTUM: f64 = 0.1;
const IMPROVEMENT_THRESHOLD: f64 = 1e-6;
const BASE_STEP: f64 = 0.5;
const REPETITIONS: usize = 10;
const MAX_EPOCHS: usize = 10_000;
const DEFAULT_SEED: u64 = 7;

/// How the loss matrix Λ is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossStrategy {
    /// Fixed three-sentiment matrix: confusing positive with negative
    /// costs 1, any confusion involving neutral costs 0.5.
    ThreeSentimentHeuristic,
    /// Estimates Λ by stochastic gradient descent against per-example
    /// target risks, averaged over shuffled repetitions.
    GradientDescent,
    /// Λ[c][c'] is the Euclidean distance between the fitted class mean
    /// vectors, normalised into [0, 1].
    #[default]
    NormalizedCentroidDistance,
}

impl std::str::FromStr for LossStrategy {
    type Err = AffectError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "three_sentiment_heuristic" => Ok(LossStrategy::ThreeSentimentHeuristic),
            "gradient_descent" => Ok(LossStrategy::GradientDescent),
            "normalized_euclidean_emotion_distance" => {
                Ok(LossStrategy::NormalizedCentroidDistance)
            }
            other => Err(AffectError::Config(format!(
                "unknown loss strategy `{other}`"
            ))),
        }
    }
}

/// Minimum-expected-risk classifier on top of [`NaiveBayes`].
#[derive(Debug, Clone)]
pub struct RiskWeightedNaiveBayes {
    strategy: LossStrategy,
    seed: u64,
    bayes: NaiveBayes,
    examples: TrainingSet,
    loss: Vec<Vec<f64>>,
}

impl RiskWeightedNaiveBayes {
    pub fn new() -> Self {
        Self {
            strategy: LossStrategy::default(),
            seed: DEFAULT_SEED,
            bayes: NaiveBayes::new(),
            examples: TrainingSet::new(),
            loss: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: LossStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Seed for the gradient-descent shuffles and initialisation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of emotion dimensions modelled, 1 to 3.
    pub fn with_dims(mut self, dims: usize) -> Result<Self> {
        self.bayes = self.bayes.with_dims(dims)?;
        Ok(self)
    }

    /// The estimated loss matrix, available after training.
    pub fn loss_matrix(&self) -> Result<&[Vec<f64>]> {
        if self.loss.is_empty() {
            return Err(AffectError::Precondition(
                "the classifier has not been trained".into(),
            ));
        }
        Ok(&self.loss)
    }

    /// Expected risk of deciding each class, in category-index order.
    pub fn expected_risks(&self, features: &FeatureBox) -> Result<Vec<f64>> {
        if self.loss.is_empty() {
            return Err(AffectError::Precondition(
                "the classifier has not been trained".into(),
            ));
        }
        let posteriors = self.bayes.posteriors(features)?;
        Ok(self
            .loss
            .iter()
            .map(|row| row.iter().zip(&posteriors).map(|(l, p)| l * p).sum())
            .collect())
    }

    fn heuristic_matrix(&self) -> Result<Vec<Vec<f64>>> {
        let categories = self.bayes.categories()?;
        let n = categories.len();
        let mut loss = vec![vec![0.0; n]; n];
        for c in 0..n {
            for other in 0..n {
                if c == other {
                    continue;
                }
                let involves_neutral = categories.label(c) == Some(NEUTRAL_LABEL)
                    || categories.label(other) == Some(NEUTRAL_LABEL);
                loss[c][other] = if involves_neutral { 0.5 } else { 1.0 };
            }
        }
        Ok(loss)
    }

    fn centroid_matrix(&self) -> Result<Vec<Vec<f64>>> {
        let n = self.bayes.categories()?.len();
        let means: Vec<Vec<f64>> = (0..n)
            .map(|c| self.bayes.class_means(c))
            .collect::<Result<_>>()?;
        let mut loss = vec![vec![0.0; n]; n];
        let mut max = 0.0_f64;
        for c in 0..n {
            for other in 0..n {
                let dist = means[c]
                    .iter()
                    .zip(&means[other])
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                loss[c][other] = dist;
                max = max.max(dist);
            }
        }
        if max > 0.0 {
            for row in &mut loss {
                for entry in row.iter_mut() {
                    *entry /= max;
                }
            }
        }
        Ok(loss)
    }

    /// Fits Λ row by row against per-example target risks, averaging the
    /// matrices of [`REPETITIONS`] shuffled runs.
    fn descend_matrix(&self) -> Result<Vec<Vec<f64>>> {
        let categories = self.bayes.categories()?.clone();
        let n = categories.len();
        let posteriors: Vec<Vec<f64>> = self
            .examples
            .features()
            .iter()
            .map(|f| self.bayes.posteriors(f))
            .collect::<Result<_>>()?;
        let targets: Vec<Vec<f64>> = self
            .examples
            .categories()
            .iter()
            .map(|truth| {
                (0..n)
                    .map(|c| {
                        if categories.label(c) == Some(truth.as_str()) {
                            0.0
                        } else if truth == NEUTRAL_LABEL {
                            0.5
                        } else {
                            1.0
                        }
                    })
                    .collect()
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut accumulated = vec![vec![0.0; n]; n];
        for _ in 0..REPETITIONS {
            let mut order: Vec<usize> = (0..self.examples.len()).collect();
            order.shuffle(&mut rng);
            let run = self.descend_once(&mut rng, &order, &posteriors, &targets, n);
            for (acc, row) in accumulated.iter_mut().zip(run) {
                for (a, v) in acc.iter_mut().zip(row) {
                    *a += v / REPETITIONS as f64;
                }
            }
        }
        for (c, row) in accumulated.iter_mut().enumerate() {
            row[c] = 0.0;
        }
        Ok(accumulated)
    }

    fn descend_once(
        &self,
        rng: &mut StdRng,
        order: &[usize],
        posteriors: &[Vec<f64>],
        targets: &[Vec<f64>],
        n: usize,
    ) -> Vec<Vec<f64>> {
        let mut loss: Vec<Vec<f64>> = (0..n)
            .map(|c| {
                (0..n)
                    .map(|other| if other == c { 0.0 } else { rng.gen_range(0.0..1.0) })
                    .collect()
            })
            .collect();
        let mut velocity = vec![vec![0.0; n]; n];
        let mut previous_error = f64::INFINITY;
        for epoch in 0..MAX_EPOCHS {
            let step = BASE_STEP / (epoch + 1) as f64;
            let mut epoch_error = 0.0;
            for &i in order {
                for c in 0..n {
                    let risk: f64 = loss[c]
                        .iter()
                        .zip(&posteriors[i])
                        .map(|(l, p)| l * p)
                        .sum();
                    let residual = targets[i][c] - risk;
                    epoch_error += residual * residual;
                    for other in 0..n {
                        if other == c {
                            continue;
                        }
                        let delta = step * residual * posteriors[i][other]
                            + MOMENTUM * velocity[c][other];
                        velocity[c][other] = delta;
                        loss[c][other] += delta;
                    }
                }
            }
            let scale = previous_error.abs() + epoch_error.abs();
            if scale > 0.0 && (previous_error - epoch_error).abs() / scale < IMPROVEMENT_THRESHOLD
            {
                log::debug!("loss estimation converged after {epoch} epochs");
                break;
            }
            previous_error = epoch_error;
        }
        loss
    }
}

impl Default for RiskWeightedNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RiskWeightedNaiveBayes {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.bayes.input_training_example(features.clone(), category);
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, risk-weighted naive Bayes stays untrained");
            return Ok(());
        }
        self.bayes.train()?;
        self.loss = match self.strategy {
            LossStrategy::ThreeSentimentHeuristic => self.heuristic_matrix()?,
            LossStrategy::GradientDescent => self.descend_matrix()?,
            LossStrategy::NormalizedCentroidDistance => self.centroid_matrix()?,
        };
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let risks = self.expected_risks(features)?;
        let mut best = 0;
        for (class, &risk) in risks.iter().enumerate() {
            if risk < risks[best] {
                best = class;
            }
        }
        self.bayes
            .categories()?
            .label(best)
            .map(str::to_owned)
            .ok_or_else(|| AffectError::Data("the trained model has no categories".into()))
    }

    fn reset_examples(&mut self) {
        self.bayes.reset_examples();
        self.examples.clear();
        self.loss.clear();
    }
}
