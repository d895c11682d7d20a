//! Two-level ARN-R ensemble.
//!
//! The outer classifier separates affective text from neutral text; the
//! inner one, trained only on the non-neutral examples with their original
//! labels, resolves which affect it is. Both levels share the same ARN-R
//! variant, selected by [`ArnVariant`].

use crate::arn::weighting::WeightingScheme;
use crate::arn::ArnConfig;
use crate::classifiers::arn_reduced::ArnReduced;
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::Result;
use crate::features::FeatureBox;

/// Outer-level label for any non-neutral example.
const AFFECTIVE_LABEL: &str = "affective";
/// Label treated as neutral at both levels.
const NEUTRAL_LABEL: &str = "neutral";

/// The ARN-R flavours the ensemble can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArnVariant {
    /// Binary weighting over unigrams.
    #[default]
    Plain,
    /// Binary weighting over unigrams and bigrams.
    Bigrams,
    /// Inverse term frequency over unigrams.
    Itf,
    /// Inverse term frequency over unigrams and bigrams.
    ItfBigrams,
    /// Log-tf relevance frequency over unigrams.
    Ltfrf,
    /// Log-tf relevance frequency over unigrams and bigrams.
    LtfrfBigrams,
}

impl std::str::FromStr for ArnVariant {
    type Err = crate::error::AffectError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "ARNR" => Ok(ArnVariant::Plain),
            "ARNRwCOF" => Ok(ArnVariant::Bigrams),
            "ARNRwITF" => Ok(ArnVariant::Itf),
            "ARNRwITFwCOF" => Ok(ArnVariant::ItfBigrams),
            "ARNRwLTFRF" => Ok(ArnVariant::Ltfrf),
            "ARNRwLTFRFwCOF" => Ok(ArnVariant::LtfrfBigrams),
            other => Err(crate::error::AffectError::Config(format!(
                "unknown ARN variant `{other}`"
            ))),
        }
    }
}

impl ArnVariant {
    fn config(self) -> ArnConfig {
        let (scheme, bigrams) = match self {
            ArnVariant::Plain => (WeightingScheme::Binary, false),
            ArnVariant::Bigrams => (WeightingScheme::Binary, true),
            ArnVariant::Itf => (WeightingScheme::InverseTermFrequency, false),
            ArnVariant::ItfBigrams => (WeightingScheme::InverseTermFrequency, true),
            ArnVariant::Ltfrf => (WeightingScheme::LogTfRelevanceFrequency, false),
            ArnVariant::LtfrfBigrams => (WeightingScheme::LogTfRelevanceFrequency, true),
        };
        ArnConfig::new().with_scheme(scheme).with_bigrams(bigrams)
    }
}

/// Hierarchical affective classifier: affective-vs-neutral, then the
/// affective subcategory.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalArnReduced {
    examples: TrainingSet,
    outer: ArnReduced,
    inner: ArnReduced,
    inner_trained: bool,
}

impl HierarchicalArnReduced {
    pub fn new() -> Self {
        Self::with_variant(ArnVariant::default())
    }

    pub fn with_variant(variant: ArnVariant) -> Self {
        Self {
            examples: TrainingSet::new(),
            outer: ArnReduced::with_config(variant.config()),
            inner: ArnReduced::with_config(variant.config()),
            inner_trained: false,
        }
    }
}

impl Classifier for HierarchicalArnReduced {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, the hierarchical ARN-R stays untrained");
            return Ok(());
        }
        self.outer.reset_examples();
        self.inner.reset_examples();
        let mut has_affective = false;
        for (features, category) in self.examples.iter() {
            if category == NEUTRAL_LABEL {
                self.outer
                    .input_training_example(features.clone(), NEUTRAL_LABEL);
            } else {
                self.outer
                    .input_training_example(features.clone(), AFFECTIVE_LABEL);
                self.inner.input_training_example(features.clone(), category);
                has_affective = true;
            }
        }
        self.outer.train()?;
        if has_affective {
            self.inner.train()?;
        }
        self.inner_trained = has_affective;
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let outer = self.outer.get_category(features)?;
        if outer == NEUTRAL_LABEL || !self.inner_trained {
            return Ok(NEUTRAL_LABEL.to_owned());
        }
        self.inner.get_category(features)
    }

    fn reset_examples(&mut self) {
        self.examples.clear();
        self.outer.reset_examples();
        self.inner.reset_examples();
        self.inner_trained = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AffectError;

    fn example(words: &str) -> FeatureBox {
        let mut fbox = FeatureBox::new();
        fbox.set_words(words);
        fbox
    }

    fn feed(classifier: &mut HierarchicalArnReduced) {
        classifier.input_training_example(example("I hate going to the dentist"), "negative");
        classifier.input_training_example(example("this is awful and sad"), "negative");
        classifier.input_training_example(example("we swim on mondays"), "neutral");
        classifier.input_training_example(example("the train leaves at noon"), "neutral");
    }

    #[test]
    fn neutral_stops_at_the_outer_level() {
        let mut classifier = HierarchicalArnReduced::new();
        feed(&mut classifier);
        classifier.train().unwrap();
        assert_eq!(
            classifier.get_category(&example("we swim at noon")).unwrap(),
            "neutral"
        );
    }

    #[test]
    fn affective_falls_through_to_the_inner_level() {
        let mut classifier = HierarchicalArnReduced::new();
        feed(&mut classifier);
        classifier.train().unwrap();
        // Only negative examples trained the inner level, so any affective
        // query resolves to negative.
        assert_eq!(
            classifier.get_category(&example("awful hate sad")).unwrap(),
            "negative"
        );
    }

    #[test]
    fn all_neutral_training_always_answers_neutral() {
        let mut classifier = HierarchicalArnReduced::new();
        classifier.input_training_example(example("we swim on mondays"), "neutral");
        classifier.input_training_example(example("the train leaves at noon"), "neutral");
        classifier.train().unwrap();
        assert_eq!(
            classifier.get_category(&example("anything at all")).unwrap(),
            "neutral"
        );
    }

    #[test]
    fn variants_change_the_weighting_without_breaking_the_cascade() {
        for variant in [
            ArnVariant::Plain,
            ArnVariant::Bigrams,
            ArnVariant::Itf,
            ArnVariant::ItfBigrams,
            ArnVariant::Ltfrf,
            ArnVariant::LtfrfBigrams,
        ] {
            let mut classifier = HierarchicalArnReduced::with_variant(variant);
            feed(&mut classifier);
            classifier.train().unwrap();
            assert_eq!(
                classifier.get_category(&example("hate hate awful")).unwrap(),
                "negative"
            );
        }
    }

    #[test]
    fn variant_names_parse() {
        assert_eq!("ARNR".parse::<ArnVariant>().unwrap(), ArnVariant::Plain);
        assert_eq!(
            "ARNRwLTFRFwCOF".parse::<ArnVariant>().unwrap(),
            ArnVariant::LtfrfBigrams
        );
        assert!("ARNRwTFIDF".parse::<ArnVariant>().is_err());
    }

    #[test]
    fn reset_cascades_to_both_levels() {
        let mut classifier = HierarchicalArnReduced::new();
        feed(&mut classifier);
        classifier.train().unwrap();
        classifier.reset_examples();
        assert!(matches!(
            classifier.get_category(&example("hate")),
            Err(AffectError::Precondition(_))
        ));
    }
}
