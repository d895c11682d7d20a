//! Term graphs: unigram and bigram occurrence counts for one document or
//! for a whole class of documents.
//!
//! A per-document graph is built from the document's ordered token stream
//! (which is retained, so bigrams can always be re-derived). Class graphs
//! and the full graph are unions of document graphs: counts and document
//! frequencies add up, and term order is first-seen order, which keeps
//! every derived vocabulary deterministic for a given training stream.

use std::collections::HashMap;

/// Joins the two members of a bigram into its vocabulary key.
pub fn bigram_key(first: &str, second: &str) -> String {
    format!("{first} {second}")
}

/// Occurrence counts of terms and (optionally) ordered term pairs.
#[derive(Debug, Clone, Default)]
pub struct TermGraph {
    terms: Vec<String>,
    index: HashMap<String, usize>,
    counts: Vec<u32>,
    doc_freq: Vec<u32>,
    bigrams: Vec<String>,
    bigram_index: HashMap<String, usize>,
    bigram_counts: Vec<u32>,
    bigram_doc_freq: Vec<u32>,
    sequence: Vec<String>,
    doc_count: u32,
}

impl TermGraph {
    /// Empty graph, ready to union documents into.
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of a single document given its ordered token stream.
    pub fn from_tokens(tokens: &[String], with_bigrams: bool) -> Self {
        let mut graph = Self::new();
        graph.doc_count = 1;
        graph.sequence = tokens.to_vec();
        for token in tokens {
            graph.bump_term(token, 1);
        }
        if with_bigrams {
            for pair in tokens.windows(2) {
                graph.bump_bigram(&bigram_key(&pair[0], &pair[1]), 1);
            }
        }
        // Document frequency: one per distinct key.
        for f in graph.doc_freq.iter_mut() {
            *f = 1;
        }
        for f in graph.bigram_doc_freq.iter_mut() {
            *f = 1;
        }
        graph
    }

    /// Unions another graph into this one, summing counts and document
    /// frequencies. The retained token sequence only describes a single
    /// document, so it is dropped once graphs are merged.
    pub fn merge(&mut self, other: &TermGraph) {
        for (i, term) in other.terms.iter().enumerate() {
            let idx = self.term_slot(term);
            self.counts[idx] += other.counts[i];
            self.doc_freq[idx] += other.doc_freq[i];
        }
        for (i, key) in other.bigrams.iter().enumerate() {
            let idx = self.bigram_slot(key);
            self.bigram_counts[idx] += other.bigram_counts[i];
            self.bigram_doc_freq[idx] += other.bigram_doc_freq[i];
        }
        self.doc_count += other.doc_count;
        self.sequence.clear();
    }

    fn term_slot(&mut self, term: &str) -> usize {
        if let Some(&idx) = self.index.get(term) {
            return idx;
        }
        let idx = self.terms.len();
        self.terms.push(term.to_owned());
        self.index.insert(term.to_owned(), idx);
        self.counts.push(0);
        self.doc_freq.push(0);
        idx
    }

    fn bump_term(&mut self, term: &str, by: u32) {
        let idx = self.term_slot(term);
        self.counts[idx] += by;
    }

    fn bigram_slot(&mut self, key: &str) -> usize {
        if let Some(&idx) = self.bigram_index.get(key) {
            return idx;
        }
        let idx = self.bigrams.len();
        self.bigrams.push(key.to_owned());
        self.bigram_index.insert(key.to_owned(), idx);
        self.bigram_counts.push(0);
        self.bigram_doc_freq.push(0);
        idx
    }

    fn bump_bigram(&mut self, key: &str, by: u32) {
        let idx = self.bigram_slot(key);
        self.bigram_counts[idx] += by;
    }

    /// Distinct terms in first-seen order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Distinct bigram keys in first-seen order.
    pub fn bigram_keys(&self) -> &[String] {
        &self.bigrams
    }

    /// Occurrence count of a term, zero if unseen.
    pub fn term_count(&self, term: &str) -> u32 {
        self.index.get(term).map_or(0, |&i| self.counts[i])
    }

    /// Occurrence count of a bigram key, zero if unseen.
    pub fn bigram_count(&self, key: &str) -> u32 {
        self.bigram_index.get(key).map_or(0, |&i| self.bigram_counts[i])
    }

    /// Number of documents (in this graph) containing the term.
    pub fn term_doc_freq(&self, term: &str) -> u32 {
        self.index.get(term).map_or(0, |&i| self.doc_freq[i])
    }

    /// Number of documents (in this graph) containing the bigram.
    pub fn bigram_doc_freq(&self, key: &str) -> u32 {
        self.bigram_index.get(key).map_or(0, |&i| self.bigram_doc_freq[i])
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn contains_bigram(&self, key: &str) -> bool {
        self.bigram_index.contains_key(key)
    }

    /// Total unigram occurrences summed over the whole graph.
    pub fn total_term_occurrences(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Total bigram occurrences summed over the whole graph.
    pub fn total_bigram_occurrences(&self) -> u64 {
        self.bigram_counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Number of documents unioned into this graph.
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Ordered token sequence, only present on single-document graphs.
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn unigram_counts_and_order() {
        let g = TermGraph::from_tokens(&toks("a b a c"), false);
        assert_eq!(g.terms(), ["a", "b", "c"]);
        assert_eq!(g.term_count("a"), 2);
        assert_eq!(g.term_count("z"), 0);
        assert_eq!(g.total_term_occurrences(), 4);
        assert!(g.bigram_keys().is_empty());
    }

    #[test]
    fn bigrams_follow_the_sequence() {
        let g = TermGraph::from_tokens(&toks("a b a b"), true);
        assert_eq!(g.bigram_count("a b"), 2);
        assert_eq!(g.bigram_count("b a"), 1);
        assert_eq!(g.sequence(), toks("a b a b").as_slice());
    }

    #[test]
    fn merge_sums_counts_and_doc_freqs() {
        let mut full = TermGraph::new();
        full.merge(&TermGraph::from_tokens(&toks("a b"), false));
        full.merge(&TermGraph::from_tokens(&toks("a c a"), false));
        assert_eq!(full.doc_count(), 2);
        assert_eq!(full.term_count("a"), 3);
        assert_eq!(full.term_doc_freq("a"), 2);
        assert_eq!(full.term_doc_freq("b"), 1);
        // Per-class counts sum to global counts by construction.
        assert_eq!(full.total_term_occurrences(), 5);
        assert!(full.sequence().is_empty());
    }
}
