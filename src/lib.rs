//! Affective text classification engine.
//!
//! The crate takes feature boxes produced by an external linguistic
//! pipeline (tokens, POS tags, stems, synonyms, negation, emotion
//! coordinates) and assigns affective categories to them. Two channels
//! feed the classifiers: the lexical channel, vectorised by the reduced
//! Associative Relational Network with selectable term-weighting schemes,
//! and the emotion-coordinate channel (valence, activation, control).
//!
//! Classifiers all implement the [`classifiers::Classifier`] contract:
//! buffer labelled examples, `train`, answer `get_category`, and
//! `reset_examples` back to the empty state.
//!
//! ```
//! use affect_engine::classifiers::knn::KNearestNeighbour;
//! use affect_engine::classifiers::Classifier;
//! use affect_engine::features::FeatureBox;
//!
//! # fn main() -> affect_engine::error::Result<()> {
//! let coords = |v: f64, a: f64| -> affect_engine::error::Result<FeatureBox> {
//!     let mut fbox = FeatureBox::new();
//!     fbox.set_dimension_count(2);
//!     fbox.set_valence(v)?;
//!     fbox.set_activation(a)?;
//!     Ok(fbox)
//! };
//!
//! let mut knn = KNearestNeighbour::new().with_dims(2)?;
//! knn.input_training_example(coords(1.0, 9.0)?, "negative");
//! knn.input_training_example(coords(9.0, 1.0)?, "positive");
//! knn.train()?;
//! assert_eq!(knn.get_category(&coords(8.5, 1.5)?)?, "positive");
//! # Ok(())
//! # }
//! ```

pub mod arn;
pub mod classifiers;
pub mod density;
pub mod error;
pub mod features;
pub mod pipeline;

pub use classifiers::Classifier;
pub use error::{AffectError, Result};
pub use features::FeatureBox;
