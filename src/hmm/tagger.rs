use std::collections::HashMap;

use crate::{
    config::{TaggerConfig, Verbosity},
    dataset::{TaggedToken, BOUNDARY},
    quark::StringTable,
};

use super::{
    lattice::Lattice,
    model::{HmmModel, Model},
};

pub trait Tagger {
    /// Frames `words` with boundary observations and computes the state
    /// scores of every item.
    fn set_sentence<S: AsRef<str>>(&mut self, words: &[S]);
    /// Number of items of the framed sentence.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Best label id of every item, as voted by the path probabilities.
    fn viterbi(&mut self) -> Vec<usize>;
    /// Tags `words`; the result has `words.len() + 2` tokens.
    fn tag<S: AsRef<str>>(&mut self, words: &[S]) -> Vec<TaggedToken>;
}

/// Viterbi decoder over a shared, read-only [`HmmModel`].
///
/// Emission lookups for words unseen in training fall back to a per-tagger
/// overlay filled with the configured placeholder; the model itself is never
/// modified, so any number of taggers may share one model.
pub struct HmmTagger<'a> {
    model: &'a HmmModel,
    lattice: Lattice,
    start: usize,
    oov_emission: f64,
    verbosity: Verbosity,
    overlay: HashMap<String, Vec<f64>>,
    unknown: HashMap<String, String>,
    items: Vec<String>,
}

impl<'a> HmmTagger<'a> {
    pub fn new(model: &'a HmmModel, config: &TaggerConfig) -> Self {
        Self {
            model,
            lattice: Lattice::new(model.num_tags(), model.transitions()),
            // every trained or loaded model carries the boundary tag
            start: model.boundary_id().unwrap_or_default(),
            oov_emission: config.oov_emission,
            verbosity: config.verbosity,
            overlay: HashMap::new(),
            unknown: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Tags to emit verbatim for the given words, whatever the decoder votes.
    pub fn with_unknown(mut self, unknown: HashMap<String, String>) -> Self {
        self.unknown = unknown;
        self
    }

    pub fn set_unknown(&mut self, unknown: HashMap<String, String>) {
        self.unknown = unknown;
    }

    /// Number of out-of-vocabulary words cached in the emission overlay.
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// First item of the last sentence at which every path probability was
    /// zero, if any.
    pub fn first_zero_column(&self) -> Option<usize> {
        self.lattice.first_zero_column()
    }
}

impl<'a> Tagger for HmmTagger<'a> {
    fn set_sentence<S: AsRef<str>>(&mut self, words: &[S]) {
        self.items.clear();
        self.items.push(BOUNDARY.to_string());
        self.items.extend(words.iter().map(|w| w.as_ref().to_string()));
        self.items.push(BOUNDARY.to_string());

        let model = self.model;
        let l = model.num_tags();
        self.lattice.set_num_items(self.items.len());
        self.lattice.reset();

        /* Loop over the items in the sentence. */
        for (t, word) in self.items.iter().enumerate() {
            let row = match model.emission_row(word) {
                Some(row) => row,
                None => {
                    if self.verbosity.contains(Verbosity::DECODE) && !self.overlay.contains_key(word) {
                        log::trace!("out-of-vocabulary: {word}");
                    }
                    let oov = self.oov_emission;
                    self.overlay
                        .entry(word.clone())
                        .or_insert_with(|| vec![oov; l])
                        .as_slice()
                }
            };
            self.lattice.state_row_mut(t).copy_from_slice(row);
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn viterbi(&mut self) -> Vec<usize> {
        self.lattice.viterbi(self.start);
        if let Some(t) = self.lattice.first_zero_column() {
            log::debug!("zero path probability from {:?} on", self.items[t]);
        }
        (0..self.items.len()).map(|t| self.lattice.argmax(t)).collect()
    }

    fn tag<S: AsRef<str>>(&mut self, words: &[S]) -> Vec<TaggedToken> {
        self.set_sentence(words);
        let labels = self.viterbi();
        let tags = self.model.labels();
        let tokens: Vec<TaggedToken> = self
            .items
            .iter()
            .zip(labels)
            .map(|(word, label)| {
                let tag = match self.unknown.get(word) {
                    Some(tag) => tag.as_str(),
                    None => tags.to_str(label).unwrap_or_default(),
                };
                TaggedToken::new(word.as_str(), tag)
            })
            .collect();
        if self.verbosity.contains(Verbosity::DECODE) {
            log::debug!(
                "{}",
                tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
            );
        }
        tokens
    }
}
