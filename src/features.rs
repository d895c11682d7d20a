//! Feature container exchanged between the ingest pipeline and the
//! classifiers.
//!
//! A [`FeatureBox`] records every feature extracted for one unit of text
//! (a sentence, a paragraph or a whole document): the raw text, the
//! token/POS/stem/synonym streams produced by the external pipeline, a
//! negation flag and up to three continuous emotion dimensions. It is
//! filled by the pipeline and read-only during classification.

use crate::error::{AffectError, Result};

/// Neutral point of the valence/activation/control scale (range 0-10).
pub const NEUTRAL_DIMENSION: f64 = 5.0;

/// All the features known about one unit of text.
///
/// Token-bearing fields hold whitespace-joined streams aligned with each
/// other (the n-th POS tag describes the n-th word), but not necessarily
/// with the raw text. Emotion dimensions are gated by the dimension count:
/// it must be set before any dimension is written, and once set to `n`
/// only the first `n` of valence/activation/control are meaningful.
#[derive(Debug, Clone, Default)]
pub struct FeatureBox {
    text: String,
    words: String,
    pos_tags: String,
    stems: String,
    synonyms: String,
    stemmed_synonyms: String,
    negation: bool,
    has_synonyms: bool,
    has_dimensions: bool,
    dimension_count: Option<usize>,
    valence: f64,
    activation: f64,
    control: f64,
}

impl FeatureBox {
    /// Creates an empty feature box with no dimensions set.
    pub fn new() -> Self {
        Self {
            valence: NEUTRAL_DIMENSION,
            activation: NEUTRAL_DIMENSION,
            control: NEUTRAL_DIMENSION,
            ..Self::default()
        }
    }

    /// Creates a feature box that already carries raw text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new()
        }
    }

    /// Sets the raw text. Words and punctuation marks are expected to be
    /// space separated.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sets the tokenised words, space joined. This stream is aligned with
    /// the POS tags, stems and synonyms, not with the raw text.
    pub fn set_words(&mut self, words: impl Into<String>) {
        self.words = words.into();
    }

    pub fn words(&self) -> &str {
        &self.words
    }

    /// Sets the POS tags, one per word, space joined.
    pub fn set_pos_tags(&mut self, tags: impl Into<String>) {
        self.pos_tags = tags.into();
    }

    pub fn pos_tags(&self) -> &str {
        &self.pos_tags
    }

    /// Sets the stems, one per word, space joined.
    pub fn set_stems(&mut self, stems: impl Into<String>) {
        self.stems = stems.into();
    }

    pub fn stems(&self) -> &str {
        &self.stems
    }

    /// Sets the synonym-expanded word stream.
    pub fn set_synonyms(&mut self, synonyms: impl Into<String>) {
        self.synonyms = synonyms.into();
        self.has_synonyms = true;
    }

    pub fn synonyms(&self) -> &str {
        &self.synonyms
    }

    /// True if a synonym stream has been provided.
    pub fn contains_synonyms(&self) -> bool {
        self.has_synonyms
    }

    /// Sets the stemmed synonym stream.
    pub fn set_stemmed_synonyms(&mut self, stemmed: impl Into<String>) {
        self.stemmed_synonyms = stemmed.into();
    }

    pub fn stemmed_synonyms(&self) -> &str {
        &self.stemmed_synonyms
    }

    /// Marks whether the unit is under the scope of a negation.
    pub fn set_negation(&mut self, negation: bool) {
        self.negation = negation;
    }

    pub fn negation(&self) -> bool {
        self.negation
    }

    /// True once at least one emotion dimension has been written.
    pub fn contains_emotion_dimensions(&self) -> bool {
        self.has_dimensions
    }

    /// Declares how many of the valence/activation/control dimensions are
    /// meaningful. Must be called before any dimension setter.
    pub fn set_dimension_count(&mut self, count: usize) {
        self.dimension_count = Some(count);
    }

    /// Number of meaningful emotion dimensions, `None` until declared.
    pub fn dimension_count(&self) -> Option<usize> {
        self.dimension_count
    }

    /// Sets the valence, the first emotion dimension.
    pub fn set_valence(&mut self, valence: f64) -> Result<()> {
        self.check_dimensions_declared("valence")?;
        self.valence = valence;
        self.has_dimensions = true;
        Ok(())
    }

    pub fn valence(&self) -> f64 {
        self.valence
    }

    /// Sets the activation, the second emotion dimension.
    pub fn set_activation(&mut self, activation: f64) -> Result<()> {
        self.check_dimensions_declared("activation")?;
        self.activation = activation;
        self.has_dimensions = true;
        Ok(())
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    /// Sets the control, the third emotion dimension.
    pub fn set_control(&mut self, control: f64) -> Result<()> {
        self.check_dimensions_declared("control")?;
        self.control = control;
        self.has_dimensions = true;
        Ok(())
    }

    pub fn control(&self) -> f64 {
        self.control
    }

    /// Emotion dimension by index: 0 valence, 1 activation, 2 control.
    pub fn dimension(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.valence),
            1 => Some(self.activation),
            2 => Some(self.control),
            _ => None,
        }
    }

    fn check_dimensions_declared(&self, which: &str) -> Result<()> {
        if self.dimension_count.is_none() {
            return Err(AffectError::Precondition(format!(
                "cannot set {which}: the number of emotion dimensions has not been declared"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_before_count_is_rejected() {
        let mut fbox = FeatureBox::new();
        assert!(fbox.set_valence(7.0).is_err());
        fbox.set_dimension_count(3);
        assert!(fbox.set_valence(7.0).is_ok());
        assert_eq!(fbox.valence(), 7.0);
        assert!(fbox.contains_emotion_dimensions());
    }

    #[test]
    fn defaults_are_neutral() {
        let fbox = FeatureBox::new();
        assert_eq!(fbox.valence(), NEUTRAL_DIMENSION);
        assert_eq!(fbox.dimension_count(), None);
        assert!(!fbox.contains_emotion_dimensions());
        assert!(!fbox.negation());
    }

    #[test]
    fn synonym_flag_tracks_setter() {
        let mut fbox = FeatureBox::with_text("I love reading books .");
        assert!(!fbox.contains_synonyms());
        fbox.set_synonyms("I adore reading volumes .");
        assert!(fbox.contains_synonyms());
    }
}
