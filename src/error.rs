//! Error taxonomy shared by the whole engine.
//!
//! Errors are surfaced to the caller; the engine never logs-and-exits.
//! A failed prediction leaves the model trained and usable.

use thiserror::Error;

/// Errors raised by the classification engine.
#[derive(Error, Debug)]
pub enum AffectError {
    /// Inconsistent or missing configuration: dimensionality out of range,
    /// unknown scheme or kernel name, `k` larger than the training set,
    /// feature selection asked to keep zero terms.
    #[error("configuration error: {0}")]
    Config(String),

    /// API misuse: predicting before training, or writing an emotion
    /// dimension into a `FeatureBox` before its dimension count is set.
    #[error("precondition error: {0}")]
    Precondition(String),

    /// Degenerate maths: singular Gaussian, zero-norm cosine operand,
    /// a singular SVD step.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// Training data that cannot support the requested model, e.g. a
    /// single-class corpus fed to a multiclass trainer.
    #[error("data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, AffectError>;
