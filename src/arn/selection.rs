//! Feature selection over the training vocabulary.
//!
//! At most one criterion is active: top-N keys by corpus term frequency,
//! by chi-square against the class labels, or by mutual information
//! between key presence and the class. Ties break on the term string, so
//! the kept set does not depend on insertion order. The kept set is fixed
//! after training; unseen terms at inference are simply dropped.

use crate::error::{AffectError, Result};
use std::collections::HashSet;
use std::str::FromStr;

/// The selection criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Keep the N most frequent keys in the corpus.
    TermFrequency,
    /// Keep the N keys with the highest chi-square statistic against the
    /// class labels (presence/absence contingency over documents).
    ChiSquare,
    /// Keep the N keys with the highest mutual information I(t;C).
    MutualInformation,
}

impl FromStr for SelectionMode {
    type Err = AffectError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "tf" => Ok(SelectionMode::TermFrequency),
            "chi2" => Ok(SelectionMode::ChiSquare),
            "mi" => Ok(SelectionMode::MutualInformation),
            other => Err(AffectError::Config(format!(
                "unknown feature selection mode `{other}`"
            ))),
        }
    }
}

/// A configured selection: criterion plus how many keys to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSelection {
    pub mode: SelectionMode,
    pub keep: usize,
}

impl FeatureSelection {
    pub fn new(mode: SelectionMode, keep: usize) -> Result<Self> {
        if keep == 0 {
            return Err(AffectError::Config(
                "feature selection must keep at least one term".into(),
            ));
        }
        Ok(Self { mode, keep })
    }
}

/// Selection statistics for one vocabulary key.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub key: String,
    /// Corpus-wide occurrence count.
    pub global_count: u32,
    /// Per-class count of training documents containing the key.
    pub class_doc_freq: Vec<u32>,
}

/// Scores every candidate and returns the kept key set.
///
/// `class_doc_counts[c]` is the number of training documents of class `c`.
pub(crate) fn select(
    selection: FeatureSelection,
    candidates: &[Candidate],
    class_doc_counts: &[u32],
) -> Result<HashSet<String>> {
    let total_docs: u32 = class_doc_counts.iter().sum();
    if total_docs == 0 {
        return Err(AffectError::Data(
            "feature selection requires a non-empty training corpus".into(),
        ));
    }
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|cand| {
            let score = match selection.mode {
                SelectionMode::TermFrequency => f64::from(cand.global_count),
                SelectionMode::ChiSquare => chi_square(cand, class_doc_counts, total_docs),
                SelectionMode::MutualInformation => {
                    mutual_information(cand, class_doc_counts, total_docs)
                }
            };
            (score, cand.key.as_str())
        })
        .collect();
    // Descending score, ascending term string on ties.
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    Ok(scored
        .into_iter()
        .take(selection.keep)
        .map(|(_, key)| key.to_owned())
        .collect())
}

/// Chi-square of the |C| x {present, absent} document contingency table.
fn chi_square(cand: &Candidate, class_doc_counts: &[u32], total_docs: u32) -> f64 {
    let present_total: u32 = cand.class_doc_freq.iter().sum();
    let n = f64::from(total_docs);
    let p_present = f64::from(present_total) / n;
    let mut chi2 = 0.0;
    for (c, &n_c) in class_doc_counts.iter().enumerate() {
        let observed_present = f64::from(cand.class_doc_freq[c]);
        let observed_absent = f64::from(n_c) - observed_present;
        let expected_present = f64::from(n_c) * p_present;
        let expected_absent = f64::from(n_c) * (1.0 - p_present);
        if expected_present > 0.0 {
            chi2 += (observed_present - expected_present).powi(2) / expected_present;
        }
        if expected_absent > 0.0 {
            chi2 += (observed_absent - expected_absent).powi(2) / expected_absent;
        }
    }
    chi2
}

/// Mutual information between key presence and the class label.
fn mutual_information(cand: &Candidate, class_doc_counts: &[u32], total_docs: u32) -> f64 {
    let n = f64::from(total_docs);
    let present_total: u32 = cand.class_doc_freq.iter().sum();
    let p_present = f64::from(present_total) / n;
    let mut mi = 0.0;
    for (c, &n_c) in class_doc_counts.iter().enumerate() {
        let p_class = f64::from(n_c) / n;
        let joint = [
            (f64::from(cand.class_doc_freq[c]) / n, p_present),
            (
                (f64::from(n_c) - f64::from(cand.class_doc_freq[c])) / n,
                1.0 - p_present,
            ),
        ];
        for (p_joint, p_key) in joint {
            if p_joint > 0.0 && p_key > 0.0 && p_class > 0.0 {
                mi += p_joint * (p_joint / (p_key * p_class)).ln();
            }
        }
    }
    mi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(key: &str, global: u32, dfs: &[u32]) -> Candidate {
        Candidate {
            key: key.to_owned(),
            global_count: global,
            class_doc_freq: dfs.to_vec(),
        }
    }

    #[test]
    fn keep_zero_is_rejected() {
        assert!(FeatureSelection::new(SelectionMode::TermFrequency, 0).is_err());
    }

    #[test]
    fn top_n_by_frequency_is_order_independent() {
        let sel = FeatureSelection::new(SelectionMode::TermFrequency, 2).unwrap();
        let forward = [cand("a", 3, &[2, 1]), cand("b", 2, &[1, 1]), cand("c", 1, &[1, 0])];
        let backward = [cand("c", 1, &[1, 0]), cand("b", 2, &[1, 1]), cand("a", 3, &[2, 1])];
        let kept_fwd = select(sel, &forward, &[2, 2]).unwrap();
        let kept_bwd = select(sel, &backward, &[2, 2]).unwrap();
        assert_eq!(kept_fwd, kept_bwd);
        assert!(kept_fwd.contains("a") && kept_fwd.contains("b"));
    }

    #[test]
    fn ties_break_on_term_string() {
        let sel = FeatureSelection::new(SelectionMode::TermFrequency, 1).unwrap();
        let kept = select(
            sel,
            &[cand("zebra", 2, &[1, 1]), cand("apple", 2, &[1, 1])],
            &[2, 2],
        )
        .unwrap();
        assert!(kept.contains("apple"));
        assert!(!kept.contains("zebra"));
    }

    #[test]
    fn chi_square_separates_discriminative_terms() {
        // "good" only in class 0 docs, "the" everywhere.
        let discriminative = cand("good", 3, &[3, 0]);
        let ubiquitous = cand("the", 6, &[3, 3]);
        let chi_good = chi_square(&discriminative, &[3, 3], 6);
        let chi_the = chi_square(&ubiquitous, &[3, 3], 6);
        assert!(chi_good > chi_the);
        assert!(chi_the.abs() < 1e-12);
    }

    #[test]
    fn mutual_information_zero_for_independent_terms() {
        let independent = cand("the", 4, &[2, 2]);
        assert!(mutual_information(&independent, &[4, 4], 8).abs() < 1e-12);
        let dependent = cand("good", 2, &[2, 0]);
        assert!(mutual_information(&dependent, &[4, 4], 8) > 0.0);
    }
}
