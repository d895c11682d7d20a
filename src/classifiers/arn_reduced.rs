//! The ARN-R classifier: term graphs plus term weighting, no separate
//! discriminative model.
//!
//! A query is weighted once per class against that class's graph and the
//! class whose summed weighted components are largest wins. Ties go to the
//! class seen first in the training stream. The fitted [`ArnModel`] is
//! exposed so the vector classifiers can reuse it as their lexical front
//! end.

use crate::arn::{ArnConfig, ArnModel};
use crate::classifiers::{Classifier, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;

/// Associative Relational Network classifier, reduced form.
#[derive(Debug, Clone, Default)]
pub struct ArnReduced {
    config: ArnConfig,
    examples: TrainingSet,
    model: Option<ArnModel>,
}

impl ArnReduced {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ArnConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ArnConfig {
        &self.config
    }

    /// The fitted model, available after a successful [`Classifier::train`].
    pub fn model(&self) -> Result<&ArnModel> {
        self.model.as_ref().ok_or_else(|| {
            AffectError::Precondition("the classifier has not been trained".into())
        })
    }

    /// Per-class affinity in category-index order: the sum of the query's
    /// weighted components restricted to keys present in that class's
    /// graph. The restriction makes even the binary scheme discriminate,
    /// where it degenerates to the size of the vocabulary overlap.
    pub fn class_scores(&self, features: &FeatureBox) -> Result<Vec<f64>> {
        let model = self.model()?;
        (0..model.categories().len())
            .map(|class| {
                let vector = model.weighted_vector(features, class)?;
                let score = model
                    .class_vocab_indices(class)?
                    .into_iter()
                    .map(|i| vector[i])
                    .sum();
                Ok(score)
            })
            .collect()
    }
}

impl Classifier for ArnReduced {
    fn input_training_example(&mut self, features: FeatureBox, category: &str) {
        self.examples.push(features, category);
    }

    fn train(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            log::warn!("no training examples buffered, the ARN-R stays untrained");
            return Ok(());
        }
        self.model = Some(ArnModel::fit(&self.examples, &self.config)?);
        Ok(())
    }

    fn get_category(&self, features: &FeatureBox) -> Result<String> {
        let model = self.model()?;
        let scores = self.class_scores(features)?;
        let mut best = 0;
        for (class, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = class;
            }
        }
        model
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
    use crate::arn::weighting::WeightingScheme;

    fn example(words: &str) -> FeatureBox {
        let mut fbox = FeatureBox::new();
        fbox.set_words(words);
        fbox
    }

    fn trained() -> ArnReduced {
        let mut arn = ArnReduced::new();
        arn.input_training_example(example("I hate going to the dentist ."), "NEG");
        arn.input_training_example(example("I swim a lot ."), "NEU");
        arn.input_training_example(example("I love reading books ."), "POS");
        arn.train().unwrap();
        arn
    }

    #[test]
    fn predict_before_train_is_a_precondition_error() {
        let arn = ArnReduced::new();
        assert!(matches!(
            arn.get_category(&example("anything")),
            Err(AffectError::Precondition(_))
        ));
    }

    #[test]
    fn train_on_empty_buffer_warns_and_stays_untrained() {
        let mut arn = ArnReduced::new();
        assert!(arn.train().is_ok());
        assert!(arn.model().is_err());
    }

    #[test]
    fn class_vocabulary_drives_the_decision() {
        let arn = trained();
        assert_eq!(arn.get_category(&example("I hate dentist visits")).unwrap(), "NEG");
        assert_eq!(arn.get_category(&example("love books")).unwrap(), "POS");
    }

    #[test]
    fn ltfrf_weighting_still_separates_the_classes() {
        let mut arn = ArnReduced::with_config(
            ArnConfig::new().with_scheme(WeightingScheme::LogTfRelevanceFrequency),
        );
        arn.input_training_example(example("I hate going to the dentist ."), "NEG");
        arn.input_training_example(example("I love reading books ."), "POS");
        arn.train().unwrap();
        assert_eq!(arn.get_category(&example("hate hate hate")).unwrap(), "NEG");
    }

    #[test]
    fn reset_then_retrain_forgets_the_old_corpus() {
        let mut arn = trained();
        arn.reset_examples();
        assert!(arn.get_category(&example("hate")).is_err());
        arn.input_training_example(example("joy joy"), "POS");
        arn.train().unwrap();
        assert_eq!(arn.get_category(&example("joy")).unwrap(), "POS");
    }
}
