//! Support vector machine over ARN-R weighted vectors.
//!
//! Multi-class decisions come from one binary SVM per unordered pair of
//! categories, each trained by sequential minimal optimisation, with the
//! pair winners voting and ties resolved by category order. Kernels are
//! polynomial (optionally with lower-order terms), normalised polynomial
//! and radial basis function.

use crate::arn::{ArnConfig, ArnModel, VectorLayout};
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use ndarray::Array1;

const DEFAULT_COMPLEXITY: f64 = 1.0;
const TOLERANCE: f64 = 1e-3;
const ALPHA_EPSILON: f64 = 1e-5;
const MAX_PASSES: usize = 10;
const MAX_ITERATIONS: usize = 10_000;

/// Kernel function selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelKind {
    /// (x·y + c)^p with c = 1 when lower-order terms are on, else 0.
    Polynomial { exponent: f64, lower_order: bool },
    /// The polynomial kernel normalised by K(x,x) and K(y,y).
    NormalizedPolynomial { exponent: f64, lower_order: bool },
    /// exp(−γ·‖x−y‖²).
    Rbf { gamma: f64 },
}

impl Default for KernelKind {
    fn default() -> Self {
        KernelKind::Polynomial {
            exponent: 1.0,
            lower_order: false,
        }
    }
}

impl std::str::FromStr for KernelKind {
    type Err = AffectError;

    /// Parses a kernel name with its default parameters; exponent and γ
    /// are adjusted afterwards by rebuilding the variant.
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "poly" => Ok(KernelKind::Polynomial {
                exponent: 1.0,
                lower_order: false,
            }),
            "normalized_poly" => Ok(KernelKind::NormalizedPolynomial {
                exponent: 1.0,
                lower_order: false,
            }),
            "rbf" => Ok(KernelKind::Rbf { gamma: 0.01 }),
            other => Err(AffectError::Config(format!("unknown kernel `{other}`"))),
        }
    }
}

impl KernelKind {
    fn raw_polynomial(x: &Array1<f64>, y: &Array1<f64>, exponent: f64, lower_order: bool) -> f64 {
        let dot = x.dot(y) + if lower_order { 1.0 } else { 0.0 };
        if exponent == 1.0 {
            dot
        } else {
            dot.powf(exponent)
        }
    }

    pub fn evaluate(&self, x: &Array1<f64>, y: &Array1<f64>) -> f64 {
        match *self {
            KernelKind::Polynomial {
                exponent,
                lower_order,
            } => Self::raw_polynomial(x, y, exponent, lower_order),
            KernelKind::NormalizedPolynomial {
                exponent,
                lower_order,
            } => {
                let kxy = Self::raw_polynomial(x, y, exponent, lower_order);
                let kxx = Self::raw_polynomial(x, x, exponent, lower_order);
                let kyy = Self::raw_polynomial(y, y, exponent, lower_order);
                let norm = (kxx * kyy).sqrt();
                if norm == 0.0 {
                    0.0
                } else {
                    kxy / norm
                }
            }
            KernelKind::Rbf { gamma } => {
                let diff = x - y;
                (-gamma * diff.dot(&diff)).exp()
            }
        }
    }
}

/// One trained binary machine for a pair of classes.
#[derive(Debug, Clone)]
struct PairMachine {
    /// Class index voted on a non-negative decision value.
    first: usize,
    /// Class index voted on a negative decision value.
    second: usize,
    support_vectors: Vec<Array1<f64>>,
    /// Per support vector, α·y.
    coefficients: Vec<f64>,
    bias: f64,
}

impl PairMachine {
    fn decision(&self, kernel: &KernelKind, x: &Array1<f64>) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.coefficients)
            .map(|(sv, coeff)| coeff * kernel.evaluate(sv, x))
            .sum::<f64>()
            + self.bias
    }
}

#[derive(Debug, Clone)]
struct SvmModel {
    arn: ArnModel,
    machines: Vec<PairMachine>,
}

/// Pairwise kernel classifier on the lexical channel.
#[derive(Debug, Clone)]
pub struct Svm {
    arn_config: ArnConfig,
    layout: VectorLayout,
    kernel: KernelKind,
    complexity: f64,
    examples: TrainingSet,
    model: Option<SvmModel>,
}

impl Default for Svm {
    fn default() -> Self {
        Self::new()
    }
}

impl Svm {
    pub fn new() -> Self {
        Self {
            arn_config: ArnConfig::default(),
            layout: VectorLayout {
                intercept: false,
                emotion_dims: false,
                negation: false,
            },
            kernel: KernelKind::default(),
            complexity: DEFAULT_COMPLEXITY,
            examples: TrainingSet::new(),
            model: None,
        }
    }

    pub fn with_arn_config(mut self, config: ArnConfig) -> Self {
        self.arn_config = config;
        self
    }

    pub fn with_layout(mut self, layout: VectorLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.kernel = kernel;
        self
    }

    /// The soft-margin complexity constant C. Must be positive.
    pub fn with_complexity(mut self, complexity: f64) -> Result<Self> {
        if complexity <= 0.0 || !complexity.is_finite() {
            return Err(AffectError::Config(format!(
                "the complexity constant must be positive and finite, got {complexity}"
            )));
        }
        self.complexity = complexity;
        Ok(self)
    }

    /// Weighted vector in the frozen layout. Every vector, training and
    /// inference alike, is weighted against the first class so the kernel
    /// space stays consistent across examples.
    fn vector(&self, arn: &ArnModel, features: &FeatureBox) -> Result<Array1<f64>> {
        let lexical = arn.weighted_vector(features, 0)?;
        Ok(Array1::from(self.layout.assemble(lexical, features)))
    }

    /// Sequential minimal optimisation on one class pair.
    fn optimise_pair(
        &self,
        vectors: &[Array1<f64>],
        targets: &[f64],
        first: usize,
        second: usize,
    ) -> PairMachine {
        let n = vectors.len();
        let c = self.complexity;
        let mut alphas = vec![0.0; n];
        let mut bias = 0.0;
        let decision = |alphas: &[f64], bias: f64, x: &Array1<f64>| -> f64 {
            let mut sum = bias;
            for k in 0..n {
                if alphas[k] != 0.0 {
                    sum += alphas[k] * targets[k] * self.kernel.evaluate(&vectors[k], x);
                }
            }
            sum
        };

        let mut passes = 0;
        let mut iterations = 0;
        while passes < MAX_PASSES && iterations < MAX_ITERATIONS {
            iterations += 1;
            let mut changed = 0;
            for i in 0..n {
                let error_i = decision(&alphas, bias, &vectors[i]) - targets[i];
                let violates = (targets[i] * error_i < -TOLERANCE && alphas[i] < c)
                    || (targets[i] * error_i > TOLERANCE && alphas[i] > 0.0);
                if !violates {
                    continue;
                }
                // Second choice: the example with the largest error gap.
                let mut j = usize::MAX;
                let mut best_gap = -1.0;
                for candidate in 0..n {
                    if candidate == i {
                        continue;
                    }
                    let gap =
                        (error_i - (decision(&alphas, bias, &vectors[candidate]) - targets[candidate]))
                            .abs();
                    if gap > best_gap {
                        best_gap = gap;
                        j = candidate;
                    }
                }
                if j == usize::MAX {
                    continue;
                }
                let error_j = decision(&alphas, bias, &vectors[j]) - targets[j];

                let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);
                let (low, high) = if targets[i] != targets[j] {
                    (
                        (alphas[j] - alphas[i]).max(0.0),
                        (c + alphas[j] - alphas[i]).min(c),
                    )
                } else {
                    (
                        (alphas[i] + alphas[j] - c).max(0.0),
                        (alphas[i] + alphas[j]).min(c),
                    )
                };
                if low >= high {
                    continue;
                }
                let k_ii = self.kernel.evaluate(&vectors[i], &vectors[i]);
                let k_jj = self.kernel.evaluate(&vectors[j], &vectors[j]);
                let k_ij = self.kernel.evaluate(&vectors[i], &vectors[j]);
                let eta = 2.0 * k_ij - k_ii - k_jj;
                if eta >= 0.0 {
                    continue;
                }
                let mut alpha_j = alpha_j_old - targets[j] * (error_i - error_j) / eta;
                alpha_j = alpha_j.clamp(low, high);
                if (alpha_j - alpha_j_old).abs() < ALPHA_EPSILON {
                    continue;
                }
                let alpha_i = alpha_i_old + targets[i] * targets[j] * (alpha_j_old - alpha_j);
                alphas[i] = alpha_i;
                alphas[j] = alpha_j;

                let b1 = bias
                    - error_i
                    - targets[i] * (alpha_i - alpha_i_old) * k_ii
                    - targets[j] * (alpha_j - alpha_j_old) * k_ij;
                let b2 = bias
                    - error_j
                    - targets[i] * (alpha_i - alpha_i_old) * k_ij
                    - targets[j] * (alpha_j - alpha_j_old) * k_jj;
                bias = if 0.0 < alpha_i && alpha_i < c {
                    b1
                } else if 0.0 < alpha_j && alpha_j < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };
                changed += 1;
            }
            if changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let mut support_vectors = Vec::new();
        let mut coefficients = Vec::new();
        for k in 0..n {
            if alphas[k] > 0.0 {
                support_vectors.push(vectors[k].clone());
                coefficients.push(alphas[k] * targets[k]);
            }
        }
        PairMachine {
            first,
            second,
            support_vectors,
            coefficients,
            bias,
        }
    }
}

impl Classifier for Svm {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, the SVM stays untrained");
            return Ok(());
        }
        let arn = ArnModel::fit(&self.examples, &self.arn_config)?;
        let n_classes = arn.categories().len();
        let mut vectors = Vec::with_capacity(self.examples.len());
        let mut classes = Vec::with_capacity(self.examples.len());
        for (features, category) in self.examples.iter() {
            vectors.push(self.vector(&arn, features)?);
            classes.push(arn.categories().get(category).ok_or_else(|| {
                AffectError::Data(format!("category `{category}` missing from the index"))
            })?);
        }

        let mut machines = Vec::new();
        for first in 0..n_classes {
            for second in (first + 1)..n_classes {
                let mut pair_vectors = Vec::new();
                let mut targets = Vec::new();
                for (vector, &class) in vectors.iter().zip(&classes) {
                    if class == first {
                        pair_vectors.push(vector.clone());
                        targets.push(1.0);
                    } else if class == second {
                        pair_vectors.push(vector.clone());
                        targets.push(-1.0);
                    }
                }
                machines.push(self.optimise_pair(&pair_vectors, &targets, first, second));
            }
        }

        self.model = Some(SvmModel { arn, machines });
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let model = self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })?;
        let n_classes = model.arn.categories().len();
        let label = |class: usize| {
            model
                .arn
                .categories()
                .label(class)
                .map(str::to_owned)
                .ok_or_else(|| AffectError::Data("the trained model has no categories".into()))
        };
        // A single training class has no pairs to vote; return it.
        if n_classes == 1 {
            return label(0);
        }
        let x = self.vector(&model.arn, features)?;
        let mut votes = vec![0usize; n_classes];
        for machine in &model.machines {
            if machine.decision(&self.kernel, &x) >= 0.0 {
                votes[machine.first] += 1;
            } else {
                votes[machine.second] += 1;
            }
        }
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        label(best)
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

    fn trained(kernel: KernelKind) -> Svm {
        let mut svm = Svm::new().with_kernel(kernel);
        svm.input_training_example(example("I hate going to the dentist ."), "NEG");
        svm.input_training_example(example("I swim a lot ."), "NEU");
        svm.input_training_example(example("I love reading books ."), "POS");
        svm.train().unwrap();
        svm
    }

    #[test]
    fn linear_kernel_separates_the_corpus() {
        let svm = trained(KernelKind::default());
        assert_eq!(svm.get_category(&example("I like my dentist .")).unwrap(), "NEG");
        assert_eq!(svm.get_category(&example("You love .")).unwrap(), "POS");
    }

    #[test]
    fn other_kernels_agree_on_clear_cases() {
        for kernel in [
            KernelKind::Polynomial {
                exponent: 2.0,
                lower_order: true,
            },
            KernelKind::NormalizedPolynomial {
                exponent: 2.0,
                lower_order: false,
            },
            KernelKind::Rbf { gamma: 0.5 },
        ] {
            let svm = trained(kernel);
            assert_eq!(
                svm.get_category(&example("hate going to the dentist")).unwrap(),
                "NEG"
            );
        }
    }

    #[test]
    fn single_class_training_returns_that_class() {
        let mut svm = Svm::new();
        svm.input_training_example(example("all the same"), "NEU");
        svm.input_training_example(example("still the same"), "NEU");
        svm.train().unwrap();
        assert_eq!(svm.get_category(&example("whatever")).unwrap(), "NEU");
    }

    #[test]
    fn untrained_prediction_is_a_precondition_error() {
        let svm = Svm::new();
        assert!(matches!(
            svm.get_category(&example("anything")),
            Err(AffectError::Precondition(_))
        ));
    }

    #[test]
    fn kernel_names_parse_to_defaults() {
        assert_eq!("poly".parse::<KernelKind>().unwrap(), KernelKind::default());
        assert!(matches!(
            "rbf".parse::<KernelKind>().unwrap(),
            KernelKind::Rbf { .. }
        ));
        assert!("sigmoid".parse::<KernelKind>().is_err());
    }

    #[test]
    fn non_positive_complexity_is_rejected() {
        assert!(Svm::new().with_complexity(0.0).is_err());
        assert!(Svm::new().with_complexity(-1.0).is_err());
    }

    #[test]
    fn rbf_kernel_is_one_at_zero_distance() {
        let kernel = KernelKind::Rbf { gamma: 1.0 };
        let x = Array1::from(vec![1.0, 2.0]);
        assert!((kernel.evaluate(&x, &x) - 1.0).abs() < 1e-12);
        let y = Array1::from(vec![3.0, 2.0]);
        assert!(kernel.evaluate(&x, &y) < 1.0);
    }

    #[test]
    fn normalised_kernel_is_bounded() {
        let kernel = KernelKind::NormalizedPolynomial {
            exponent: 2.0,
            lower_order: true,
        };
        let x = Array1::from(vec![1.0, 0.0, 1.0]);
        let y = Array1::from(vec![0.0, 1.0, 1.0]);
        let k = kernel.evaluate(&x, &y);
        assert!(k <= 1.0 + 1e-12);
        assert!((kernel.evaluate(&x, &x) - 1.0).abs() < 1e-12);
    }
}
