//! Document walk that writes categories back into the text structure.
//!
//! The upstream analysers mark sentences, paragraphs and the document as
//! emotional and attach valence/activation/control coordinates. The hook
//! here visits every level bottom-up, asks a trained classifier for the
//! category of each emotional level, and records the answer in place.
//! Levels without emotion marks are left untouched.

use crate::classifiers::Classifier;
use crate::error::Result;
use crate::features::FeatureBox;

/// Emotion annotation attached to one structural level.
#[derive(Debug, Clone, Default)]
pub struct EmotionMark {
    emotional: bool,
    dimensions: Option<[f64; 3]>,
    category: Option<String>,
}

impl EmotionMark {
    /// Marks the level emotional with its three coordinates.
    pub fn set_dimensions(&mut self, valence: f64, activation: f64, control: f64) {
        self.emotional = true;
        self.dimensions = Some([valence, activation, control]);
    }

    pub fn is_emotional(&self) -> bool {
        self.emotional
    }

    pub fn dimensions(&self) -> Option<[f64; 3]> {
        self.dimensions
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Builds the three-dimension feature box the classifiers consume, or
    /// `None` when the level carries no coordinates.
    fn features(&self) -> Result<Option<FeatureBox>> {
        let Some([valence, activation, control]) = self.dimensions else {
            return Ok(None);
        };
        let mut features = FeatureBox::new();
        features.set_dimension_count(3);
        features.set_valence(valence)?;
        features.set_activation(activation)?;
        features.set_control(control)?;
        Ok(Some(features))
    }

    /// Classifies this level if it is emotional and carries coordinates.
    fn classify(&mut self, classifier: &dyn Classifier) -> Result<()> {
        if !self.emotional {
            return Ok(());
        }
        if let Some(features) = self.features()? {
            self.category = Some(classifier.get_category(&features)?);
        }
        Ok(())
    }
}

/// One sentence with its emotion annotation.
#[derive(Debug, Clone, Default)]
pub struct SentenceData {
    text: String,
    pub mark: EmotionMark,
}

impl SentenceData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mark: EmotionMark::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One paragraph: its sentences plus a paragraph-level annotation.
#[derive(Debug, Clone, Default)]
pub struct ParagraphData {
    pub sentences: Vec<SentenceData>,
    pub mark: EmotionMark,
}

impl ParagraphData {
    pub fn new(sentences: Vec<SentenceData>) -> Self {
        Self {
            sentences,
            mark: EmotionMark::default(),
        }
    }
}

/// The whole document: its paragraphs plus a document-level annotation.
#[derive(Debug, Clone, Default)]
pub struct TextData {
    pub paragraphs: Vec<ParagraphData>,
    pub mark: EmotionMark,
}

impl TextData {
    pub fn new(paragraphs: Vec<ParagraphData>) -> Self {
        Self {
            paragraphs,
            mark: EmotionMark::default(),
        }
    }
}

/// Writes the classifier's category into every emotional level of the
/// document: sentences first, then paragraphs, then the document itself.
pub fn apply_classification(classifier: &dyn Classifier, document: &mut TextData) -> Result<()> {
    for paragraph in &mut document.paragraphs {
        for sentence in &mut paragraph.sentences {
            sentence.mark.classify(classifier)?;
        }
        paragraph.mark.classify(classifier)?;
    }
    document.mark.classify(classifier)
}
