//! Latent Semantic Analysis classifier.
//!
//! Factorises the weighted term-document matrix with a rank-k SVD learned
//! by per-factor stochastic gradient descent, then represents each class
//! as the sum of the reduced term vectors occurring in its class graph.
//! Queries are matched by cosine similarity under the singular-value
//! weighted inner product.

use crate::arn::{ArnConfig, ArnModel};
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use ndarray::{Array1, Array2};

const FACTORS: usize = 2;
const FEATURE_INIT: f64 = 0.01;
const LEARNING_RATE: f64 = 0.005;
const ANNEALING_RATE: f64 = 1000.0;
const MIN_EPOCHS: usize = 10;
const MAX_EPOCHS: usize = 50_000;

/// Reduced-space text classifier.
#[derive(Debug, Clone)]
pub struct Lsa {
    arn_config: ArnConfig,
    factors: usize,
    examples: TrainingSet,
    model: Option<LsaModel>,
}

impl Default for Lsa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct LsaModel {
    arn: ArnModel,
    /// Left singular vectors, one row per vocabulary key.
    term_space: Array2<f64>,
    sigma: Array1<f64>,
    /// Per-class summed term vector in the reduced space.
    class_vectors: Vec<Array1<f64>>,
}

impl Lsa {
    pub fn new() -> Self {
        Self {
            arn_config: ArnConfig::default(),
            factors: FACTORS,
            examples: TrainingSet::new(),
            model: None,
        }
    }

    pub fn with_arn_config(mut self, config: ArnConfig) -> Self {
        self.arn_config = config;
        self
    }

    /// Rank of the factorisation. Must be at least one.
    pub fn with_factors(mut self, factors: usize) -> Result<Self> {
        if factors == 0 {
            return Err(AffectError::Config(
                "the factorisation needs at least one factor".into(),
            ));
        }
        self.factors = factors;
        Ok(self)
    }

    /// Sums the reduced term vectors of the query's known terms.
    fn query_vector(model: &LsaModel, features: &FeatureBox) -> Result<Array1<f64>> {
        let indices = model.arn.doc_vocab_indices(features);
        let mut vector = Array1::zeros(model.sigma.len());
        for i in indices {
            vector += &model.term_space.row(i);
        }
        if vector.iter().all(|&x| x == 0.0) {
            return Err(AffectError::Numeric(
                "the input shares no terms with the training vocabulary".into(),
            ));
        }
        Ok(vector)
    }

    /// Cosine under the singular-value weighted inner product.
    fn sigma_cosine(sigma: &Array1<f64>, x: &Array1<f64>, y: &Array1<f64>) -> Result<f64> {
        let dot: f64 = sigma.iter().zip(x).zip(y).map(|((s, a), b)| s * a * b).sum();
        let nx: f64 = sigma.iter().zip(x).map(|(s, a)| s * a * a).sum::<f64>().sqrt();
        let ny: f64 = sigma.iter().zip(y).map(|(s, b)| s * b * b).sum::<f64>().sqrt();
        if nx == 0.0 || ny == 0.0 {
            return Err(AffectError::Numeric(
                "cannot take the cosine of a zero-norm vector".into(),
            ));
        }
        Ok(dot / (nx * ny))
    }
}

/// Per-factor stochastic gradient SVD of a dense matrix.
///
/// Factors are learned one at a time against the residual of the previous
/// ones, with an annealed learning rate. Each converged factor is split
/// into a singular value and unit left/right vectors.
fn gradient_svd(matrix: &Array2<f64>, factors: usize) -> (Array2<f64>, Array1<f64>) {
    let (rows, cols) = matrix.dim();
    let rank = factors.min(rows).min(cols).max(1);
    let mut residual = matrix.clone();
    let mut left = Array2::zeros((rows, rank));
    let mut sigma = Array1::zeros(rank);
    for f in 0..rank {
        let mut u = Array1::from_elem(rows, FEATURE_INIT);
        let mut v = Array1::from_elem(cols, FEATURE_INIT);
        let mut previous_error = f64::INFINITY;
        for epoch in 0..MAX_EPOCHS {
            let rate = LEARNING_RATE * ANNEALING_RATE / (ANNEALING_RATE + epoch as f64);
            let mut epoch_error = 0.0;
            for t in 0..rows {
                for d in 0..cols {
                    let error = residual[(t, d)] - u[t] * v[d];
                    epoch_error += error * error;
                    let u_t = u[t];
                    u[t] += rate * error * v[d];
                    v[d] += rate * error * u_t;
                }
            }
            if epoch >= MIN_EPOCHS && epoch_error >= previous_error {
                log::debug!("factor {f} converged after {epoch} epochs, error {epoch_error:.6}");
                break;
            }
            previous_error = epoch_error;
        }
        for t in 0..rows {
            for d in 0..cols {
                residual[(t, d)] -= u[t] * v[d];
            }
        }
        let nu = u.dot(&u).sqrt();
        let nv = v.dot(&v).sqrt();
        sigma[f] = nu * nv;
        if nu > 0.0 {
            left.column_mut(f).assign(&(&u / nu));
        }
    }
    (left, sigma)
}

impl Classifier for Lsa {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, LSA stays untrained");
            return Ok(());
        }
        let arn = ArnModel::fit(&self.examples, &self.arn_config)?;
        let n_classes = arn.categories().len();
        if n_classes < 2 {
            return Err(AffectError::Data(
                "LSA classification requires at least two categories".into(),
            ));
        }

        // Term-document matrix, every document weighted under its own class.
        let n_terms = arn.vector_len();
        let n_docs = self.examples.len();
        let mut matrix = Array2::zeros((n_terms, n_docs));
        for (d, (features, category)) in self.examples.iter().enumerate() {
            let class = arn.categories().get(category).ok_or_else(|| {
                AffectError::Data(format!("category `{category}` missing from the index"))
            })?;
            let column = arn.weighted_vector(features, class)?;
            for (t, weight) in column.into_iter().enumerate() {
                matrix[(t, d)] = weight;
            }
        }

        let (term_space, sigma) = gradient_svd(&matrix, self.factors);
        let mut class_vectors = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let mut vector = Array1::zeros(sigma.len());
            for i in arn.class_vocab_indices(class)? {
                vector += &term_space.row(i);
            }
            class_vectors.push(vector);
        }

        self.model = Some(LsaModel {
            arn,
            term_space,
            sigma,
            class_vectors,
        });
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let model = self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })?;
        let query = Self::query_vector(model, features)?;
        let mut best = 0;
        let mut best_cosine = f64::NEG_INFINITY;
        for (class, vector) in model.class_vectors.iter().enumerate() {
            let cosine = Self::sigma_cosine(&model.sigma, &query, vector)?;
            if cosine > best_cosine {
                best_cosine = cosine;
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

    // Two lexically disjoint topics, so a rank-2 space separates them.
    fn trained() -> Lsa {
        let mut lsa = Lsa::new();
        lsa.input_training_example(example("love joy happy"), "POS");
        lsa.input_training_example(example("great love joy"), "POS");
        lsa.input_training_example(example("hate awful bad"), "NEG");
        lsa.input_training_example(example("bad awful gloom"), "NEG");
        lsa.train().unwrap();
        lsa
    }

    #[test]
    fn recovers_the_training_categories() {
        let lsa = trained();
        assert_eq!(lsa.get_category(&example("love joy")).unwrap(), "POS");
        assert_eq!(lsa.get_category(&example("awful bad")).unwrap(), "NEG");
    }

    #[test]
    fn class_vector_is_self_similar() {
        let lsa = trained();
        let model = lsa.model.as_ref().unwrap();
        for vector in &model.class_vectors {
            let cosine = Lsa::sigma_cosine(&model.sigma, vector, vector).unwrap();
            assert!((cosine - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_only_input_is_a_numeric_error() {
        let lsa = trained();
        assert!(matches!(
            lsa.get_category(&example("zebra quagga")),
            Err(AffectError::Numeric(_))
        ));
    }

    #[test]
    fn single_category_corpus_is_a_data_error() {
        let mut lsa = Lsa::new();
        lsa.input_training_example(example("all the same"), "NEU");
        assert!(matches!(lsa.train(), Err(AffectError::Data(_))));
    }

    #[test]
    fn zero_factors_is_a_config_error() {
        assert!(Lsa::new().with_factors(0).is_err());
    }

    #[test]
    fn rank_is_capped_by_the_matrix_shape() {
        let mut lsa = Lsa::new().with_factors(10).unwrap();
        lsa.input_training_example(example("good day"), "POS");
        lsa.input_training_example(example("bad day"), "NEG");
        lsa.train().unwrap();
        assert!(lsa.get_category(&example("good")).is_ok());
    }

    #[test]
    fn untrained_prediction_is_a_precondition_error() {
        let lsa = Lsa::new();
        assert!(matches!(
            lsa.get_category(&example("anything")),
            Err(AffectError::Precondition(_))
        ));
    }
}
