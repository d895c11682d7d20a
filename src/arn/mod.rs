//! The reduced Associative Relational Network: vocabulary building and
//! term weighting for every lexical classifier in the engine.
//!
//! An [`ArnModel`] is fitted once from the training stream. It owns the
//! per-class graphs, the full graph and the frozen vocabulary (kept terms
//! first-seen order, bigram keys after all unigrams). Vector layout is
//! frozen at training time and reused verbatim at inference.

pub mod graph;
pub mod selection;
pub mod weighting;

use crate::classifiers::{CategoryIndex, TrainingSet};
use crate::error::{AffectError, Result};
use crate::features::FeatureBox;
use graph::TermGraph;
use selection::{Candidate, FeatureSelection};
use std::collections::HashMap;
use weighting::{KeyStats, WeightingScheme};

/// Separator between a token and its appended POS tag.
const POS_SEPARATOR: char = '#';

/// Lexical feature configuration shared by the ARN-R and every classifier
/// that embeds one.
#[derive(Debug, Clone, Default)]
pub struct ArnConfig {
    pub scheme: WeightingScheme,
    /// Append ordered co-occurrence (bigram) features after the unigrams.
    pub bigrams: bool,
    /// Append the POS tag to each token.
    pub pos_tags: bool,
    /// Use stems instead of surface words.
    pub stemming: bool,
    /// Use the synonym-expanded stream when one is available.
    pub synonyms: bool,
    /// Optional top-N feature selection, exclusive per criterion.
    pub selection: Option<FeatureSelection>,
}

impl ArnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme(mut self, scheme: WeightingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_bigrams(mut self, bigrams: bool) -> Self {
        self.bigrams = bigrams;
        self
    }

    pub fn with_pos_tags(mut self, pos: bool) -> Self {
        self.pos_tags = pos;
        self
    }

    pub fn with_stemming(mut self, stemming: bool) -> Self {
        self.stemming = stemming;
        self
    }

    pub fn with_synonyms(mut self, synonyms: bool) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn with_selection(mut self, selection: FeatureSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Selects the token stream for one feature box according to the
    /// stemming/synonym flags and appends POS tags when configured.
    pub fn token_stream(&self, features: &FeatureBox) -> Vec<String> {
        let stream = if self.synonyms && features.contains_synonyms() {
            if self.stemming && !features.stemmed_synonyms().is_empty() {
                features.stemmed_synonyms()
            } else {
                features.synonyms()
            }
        } else if self.stemming && !features.stems().is_empty() {
            features.stems()
        } else {
            features.words()
        };
        let mut tokens: Vec<String> = stream.split_whitespace().map(str::to_owned).collect();
        if self.pos_tags {
            let tags: Vec<&str> = features.pos_tags().split_whitespace().collect();
            for (i, token) in tokens.iter_mut().enumerate() {
                if let Some(tag) = tags.get(i) {
                    token.push(POS_SEPARATOR);
                    token.push_str(tag);
                }
            }
        }
        tokens
    }
}

/// One entry of the frozen vocabulary.
#[derive(Debug, Clone)]
struct VocabEntry {
    key: String,
    is_bigram: bool,
}

/// Extra components appended to the lexical vector.
///
/// The layout is `[intercept? | lexical | valence,activation,control? |
/// negation?]`, frozen at training time.
#[derive(Debug, Clone, Copy)]
pub struct VectorLayout {
    pub intercept: bool,
    pub emotion_dims: bool,
    pub negation: bool,
}

impl Default for VectorLayout {
    fn default() -> Self {
        Self {
            intercept: true,
            emotion_dims: false,
            negation: false,
        }
    }
}

impl VectorLayout {
    /// Wraps a lexical vector with the configured extras.
    pub fn assemble(&self, lexical: Vec<f64>, features: &FeatureBox) -> Vec<f64> {
        let extras = usize::from(self.intercept)
            + if self.emotion_dims { 3 } else { 0 }
            + usize::from(self.negation);
        let mut vector = Vec::with_capacity(lexical.len() + extras);
        if self.intercept {
            vector.push(1.0);
        }
        vector.extend(lexical);
        if self.emotion_dims {
            vector.push(features.valence());
            vector.push(features.activation());
            vector.push(features.control());
        }
        if self.negation {
            vector.push(if features.negation() { 1.0 } else { 0.0 });
        }
        vector
    }
}

/// The trained vocabulary and count model behind the ARN-R.
#[derive(Debug, Clone)]
pub struct ArnModel {
    config: ArnConfig,
    categories: CategoryIndex,
    class_graphs: Vec<TermGraph>,
    full: TermGraph,
    vocabulary: Vec<VocabEntry>,
    vocab_index: HashMap<String, usize>,
}

impl ArnModel {
    /// Fits the model: builds per-class and full graphs, then freezes the
    /// vocabulary (optionally reduced by feature selection).
    pub fn fit(examples: &TrainingSet, config: &ArnConfig) -> Result<Self> {
        if examples.is_empty() {
            return Err(AffectError::Data(
                "cannot build a term graph from an empty training set".into(),
            ));
        }
        let mut categories = CategoryIndex::new();
        for category in examples.categories() {
            categories.insert(category);
        }
        let mut class_graphs = vec![TermGraph::new(); categories.len()];
        let mut full = TermGraph::new();
        for (features, category) in examples.iter() {
            let tokens = config.token_stream(features);
            let doc = TermGraph::from_tokens(&tokens, config.bigrams);
            let class = categories.insert(category);
            class_graphs[class].merge(&doc);
            full.merge(&doc);
        }

        let kept = match config.selection {
            Some(selection) => {
                let class_doc_counts: Vec<u32> =
                    class_graphs.iter().map(TermGraph::doc_count).collect();
                let mut candidates = Vec::new();
                for term in full.terms() {
                    candidates.push(Candidate {
                        key: term.clone(),
                        global_count: full.term_count(term),
                        class_doc_freq: class_graphs
                            .iter()
                            .map(|g| g.term_doc_freq(term))
                            .collect(),
                    });
                }
                for key in full.bigram_keys() {
                    candidates.push(Candidate {
                        key: key.clone(),
                        global_count: full.bigram_count(key),
                        class_doc_freq: class_graphs
                            .iter()
                            .map(|g| g.bigram_doc_freq(key))
                            .collect(),
                    });
                }
                Some(selection::select(selection, &candidates, &class_doc_counts)?)
            }
            None => None,
        };
        let keep = |key: &str| kept.as_ref().map_or(true, |set| set.contains(key));

        let mut vocabulary = Vec::new();
        let mut vocab_index = HashMap::new();
        for term in full.terms() {
            if keep(term) {
                vocab_index.insert(term.clone(), vocabulary.len());
                vocabulary.push(VocabEntry {
                    key: term.clone(),
                    is_bigram: false,
                });
            }
        }
        for key in full.bigram_keys() {
            if keep(key) {
                vocab_index.insert(key.clone(), vocabulary.len());
                vocabulary.push(VocabEntry {
                    key: key.clone(),
                    is_bigram: true,
                });
            }
        }

        Ok(Self {
            config: config.clone(),
            categories,
            class_graphs,
            full,
            vocabulary,
            vocab_index,
        })
    }

    /// The frozen category index, first-seen order.
    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    /// The frozen vocabulary keys in vector order.
    pub fn vocabulary(&self) -> Vec<&str> {
        self.vocabulary.iter().map(|e| e.key.as_str()).collect()
    }

    /// Number of lexical vector components.
    pub fn vector_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Graph of one training class.
    pub fn class_graph(&self, class: usize) -> Result<&TermGraph> {
        self.class_graphs.get(class).ok_or_else(|| {
            AffectError::Config(format!("class index {class} out of range"))
        })
    }

    /// Builds the per-document graph of a feature box under this model's
    /// token-stream configuration.
    pub fn doc_graph(&self, features: &FeatureBox) -> TermGraph {
        let tokens = self.config.token_stream(features);
        TermGraph::from_tokens(&tokens, self.config.bigrams)
    }

    /// The document's weighted lexical vector with respect to a class, in
    /// frozen vocabulary order. Terms outside the vocabulary are dropped.
    pub fn weighted_vector(&self, features: &FeatureBox, class: usize) -> Result<Vec<f64>> {
        if class >= self.categories.len() {
            return Err(AffectError::Config(format!(
                "class index {class} out of range for {} categories",
                self.categories.len()
            )));
        }
        let doc = self.doc_graph(features);
        let total_terms = self.full.total_term_occurrences();
        let total_bigrams = self.full.total_bigram_occurrences();
        let vector = self
            .vocabulary
            .iter()
            .map(|entry| {
                let stats = if entry.is_bigram {
                    KeyStats {
                        doc_count: doc.bigram_count(&entry.key),
                        global_count: self.full.bigram_count(&entry.key),
                        total_occurrences: total_bigrams,
                        class_doc_freq: self.class_graphs[class].bigram_doc_freq(&entry.key),
                        other_doc_freq: self.other_bigram_doc_freq(&entry.key, class),
                    }
                } else {
                    KeyStats {
                        doc_count: doc.term_count(&entry.key),
                        global_count: self.full.term_count(&entry.key),
                        total_occurrences: total_terms,
                        class_doc_freq: self.class_graphs[class].term_doc_freq(&entry.key),
                        other_doc_freq: self.other_term_doc_freq(&entry.key, class),
                    }
                };
                self.config.scheme.weight(stats)
            })
            .collect();
        Ok(vector)
    }

    /// Vocabulary indices of the keys present in a document, in frozen
    /// vocabulary order. Unknown keys are dropped.
    pub fn doc_vocab_indices(&self, features: &FeatureBox) -> Vec<usize> {
        let doc = self.doc_graph(features);
        self.vocabulary
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                if entry.is_bigram {
                    doc.contains_bigram(&entry.key)
                } else {
                    doc.contains_term(&entry.key)
                }
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Vocabulary indices of the keys observed in one class's graph.
    pub fn class_vocab_indices(&self, class: usize) -> Result<Vec<usize>> {
        let graph = self.class_graph(class)?;
        Ok(self
            .vocabulary
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                if entry.is_bigram {
                    graph.contains_bigram(&entry.key)
                } else {
                    graph.contains_term(&entry.key)
                }
            })
            .map(|(i, _)| i)
            .collect())
    }

    fn other_term_doc_freq(&self, term: &str, class: usize) -> u32 {
        self.class_graphs
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != class)
            .map(|(_, g)| g.term_doc_freq(term))
            .sum()
    }

    fn other_bigram_doc_freq(&self, key: &str, class: usize) -> u32 {
        self.class_graphs
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != class)
            .map(|(_, g)| g.bigram_doc_freq(key))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureBox;

    fn example(words: &str) -> FeatureBox {
        let mut fbox = FeatureBox::new();
        fbox.set_words(words);
        fbox
    }

    fn tiny_corpus() -> TrainingSet {
        let mut set = TrainingSet::new();
        set.push(example("I hate going to the dentist ."), "NEG");
        set.push(example("I swim a lot ."), "NEU");
        set.push(example("I love reading books ."), "POS");
        set
    }

    #[test]
    fn vocabulary_is_frozen_in_first_seen_order() {
        let model = ArnModel::fit(&tiny_corpus(), &ArnConfig::new()).unwrap();
        let vocab = model.vocabulary();
        assert_eq!(vocab[0], "I");
        assert_eq!(vocab[1], "hate");
        assert_eq!(model.categories().labels(), ["NEG", "NEU", "POS"]);
        // Every training term appears in the full graph.
        assert!(vocab.contains(&"books"));
    }

    #[test]
    fn vector_length_matches_training_at_inference() {
        let model = ArnModel::fit(&tiny_corpus(), &ArnConfig::new()).unwrap();
        let query = example("I like my dentist .");
        let vector = model.weighted_vector(&query, 0).unwrap();
        assert_eq!(vector.len(), model.vector_len());
    }

    #[test]
    fn unseen_terms_are_dropped() {
        let model = ArnModel::fit(&tiny_corpus(), &ArnConfig::new()).unwrap();
        let query = example("zebra crossing");
        assert!(model.doc_vocab_indices(&query).is_empty());
        let vector = model.weighted_vector(&query, 0).unwrap();
        assert!(vector.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn bigrams_are_appended_after_unigrams() {
        let config = ArnConfig::new().with_bigrams(true);
        let model = ArnModel::fit(&tiny_corpus(), &config).unwrap();
        let vocab = model.vocabulary();
        let first_bigram = vocab.iter().position(|k| k.contains(' ')).unwrap();
        assert!(vocab[first_bigram..].iter().all(|k| k.contains(' ')));
        assert!(vocab[..first_bigram].iter().all(|k| !k.contains(' ')));
    }

    #[test]
    fn pos_tags_are_appended_to_tokens() {
        let config = ArnConfig::new().with_pos_tags(true);
        let mut fbox = example("I swim");
        fbox.set_pos_tags("PRP VBP");
        let tokens = config.token_stream(&fbox);
        assert_eq!(tokens, ["I#PRP", "swim#VBP"]);
    }

    #[test]
    fn stems_replace_words_when_enabled() {
        let config = ArnConfig::new().with_stemming(true);
        let mut fbox = example("loving dogs");
        fbox.set_stems("love dog");
        assert_eq!(config.token_stream(&fbox), ["love", "dog"]);
        // Without stems recorded, the words are used as-is.
        let bare = example("loving dogs");
        assert_eq!(config.token_stream(&bare), ["loving", "dogs"]);
    }
}
