//! Term-weighting schemes.
//!
//! Each scheme maps the occurrence statistics of a term (or bigram) to one
//! component of the weighted vector. Scheme names coming from external
//! configuration are parsed into the enum up front, so an unknown name is
//! rejected at configuration time rather than at first use.

use crate::error::AffectError;
use std::str::FromStr;

/// Per-key statistics a scheme may draw on.
///
/// `doc_count` is the key's count inside the document being vectorised;
/// `global_count` and `total_occurrences` come from the full graph;
/// the document frequencies come from the class graphs.
#[derive(Debug, Clone, Copy)]
pub struct KeyStats {
    /// Count of the key in the document being weighted.
    pub doc_count: u32,
    /// Count of the key over the whole training corpus.
    pub global_count: u32,
    /// Total key occurrences (of the same kind) in the training corpus.
    pub total_occurrences: u64,
    /// Documents of the target class containing the key.
    pub class_doc_freq: u32,
    /// Documents of all other classes containing the key.
    pub other_doc_freq: u32,
}

/// The available term-weighting schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightingScheme {
    /// 1 if the key appears in the document, 0 otherwise.
    #[default]
    Binary,
    /// Raw count of the key in the document.
    TermFrequency,
    /// tf · log(S / N(t)) with S the total key occurrences in the corpus.
    InverseTermFrequency,
    /// log(1 + tf) · log(2 + D_c(t) / max(1, Σ_{c'≠c} D_{c'}(t))).
    LogTfRelevanceFrequency,
}

impl WeightingScheme {
    /// Weight of one key under this scheme.
    pub fn weight(self, stats: KeyStats) -> f64 {
        let tf = f64::from(stats.doc_count);
        match self {
            WeightingScheme::Binary => {
                if stats.doc_count > 0 {
                    1.0
                } else {
                    0.0
                }
            }
            WeightingScheme::TermFrequency => tf,
            WeightingScheme::InverseTermFrequency => {
                if stats.doc_count == 0 || stats.global_count == 0 {
                    0.0
                } else {
                    tf * (stats.total_occurrences as f64 / f64::from(stats.global_count)).ln()
                }
            }
            WeightingScheme::LogTfRelevanceFrequency => {
                let rf = f64::from(stats.class_doc_freq)
                    / f64::from(stats.other_doc_freq.max(1));
                (1.0 + tf).ln() * (2.0 + rf).ln()
            }
        }
    }
}

impl FromStr for WeightingScheme {
    type Err = AffectError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "binary" => Ok(WeightingScheme::Binary),
            "tf" => Ok(WeightingScheme::TermFrequency),
            "itf" => Ok(WeightingScheme::InverseTermFrequency),
            "ltfrf" => Ok(WeightingScheme::LogTfRelevanceFrequency),
            other => Err(AffectError::Config(format!(
                "unknown term weighting scheme `{other}`"
            ))),
        }
    }
}
