use std::time::Instant;

use crate::{
    config::{TaggerConfig, Verbosity},
    dataset::{normalize_tag, TaggedToken, BOUNDARY},
    quark::{Quark, StringTable, TextVectorizer},
    Corpus, Error, Result,
};

use super::model::HmmModel;

/// Accumulates corpus statistics and estimates an [`HmmModel`].
///
/// A synthetic `./.` entry precedes the first appended sentence so the very
/// first tag of the corpus has a predecessor state.
#[derive(Debug)]
pub struct HmmTrainer {
    verbosity: Verbosity,
    tags: Quark,
    words: Quark,
    /// Word ids observed with each tag, in corpus order, duplicates kept.
    tag_words: Vec<Vec<usize>>,
    /// Flat tag sequence over the whole corpus.
    tag_seq: Vec<usize>,
    num_items: usize,
}

impl HmmTrainer {
    pub fn new(config: &TaggerConfig) -> Self {
        let mut this = Self {
            verbosity: config.verbosity,
            tags: Quark::default(),
            words: Quark::default(),
            tag_words: Vec::new(),
            tag_seq: Vec::new(),
            num_items: 0,
        };
        this.push(BOUNDARY, BOUNDARY);
        this
    }

    fn push(&mut self, word: &str, tag: &str) {
        let t = self.tags.find_or_insert(normalize_tag(tag));
        let w = self.words.find_or_insert(word);
        if t == self.tag_words.len() {
            self.tag_words.push(Vec::new());
        }
        self.tag_words[t].push(w);
        self.tag_seq.push(t);
        if self.verbosity.contains(Verbosity::TRAIN) {
            log::trace!("item #{}: {word} -> {}", self.tag_seq.len() - 1, normalize_tag(tag));
        }
    }

    pub fn append(&mut self, sentence: &[TaggedToken]) {
        for token in sentence {
            self.push(&token.word, &token.tag);
        }
        self.num_items += sentence.len();
    }

    pub fn append_corpus(&mut self, corpus: &Corpus) {
        for sentence in &corpus.sentences {
            self.append(sentence);
        }
    }

    /// Number of appended items, excluding the synthetic boundary.
    pub fn len(&self) -> usize {
        self.num_items
    }

    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    pub fn labels(&self) -> &Quark {
        &self.tags
    }

    /// Words observed with `tag`, in corpus order.
    pub fn tag_words(&self, tag: &str) -> Option<impl Iterator<Item = &str>> {
        let t = self.tags.to_id(tag)?;
        Some(self.tag_words[t].iter().filter_map(|&w| self.words.to_str(w)))
    }

    /// Frequency of tag #`t`: the length of its word list.
    fn tag_freq(&self, t: usize) -> f64 {
        self.tag_words[t].len() as f64
    }

    pub fn train(self) -> Result<HmmModel> {
        if self.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let begin = Instant::now();
        let l = self.tags.len();
        let v = self.words.len();
        log::info!("estimate hmm (items: {}, tags: {l}, words: {v})", self.num_items);

        let mut transition = count_bigrams(&self.tag_seq, l);
        for i in 0..l {
            let freq = self.tag_freq(i);
            for p in &mut transition[l * i..l * (i + 1)] {
                *p /= freq;
            }
        }

        let mut emission = vec![0.0; v * l];
        for (t, words) in self.tag_words.iter().enumerate() {
            for &w in words {
                emission[l * w + t] += 1.0;
            }
        }
        for w in 0..v {
            for t in 0..l {
                emission[l * w + t] /= self.tag_freq(t);
            }
        }

        if self.verbosity.contains(Verbosity::TRAIN) {
            for (t, tag) in self.tags.iter().enumerate() {
                log::debug!("tag {tag}: freq {}", self.tag_words[t].len());
            }
        }
        log::info!("estimation took: {:?}", begin.elapsed());
        Ok(HmmModel::new(self.tags, self.words, transition, emission))
    }
}

/// Counts consecutive tag pairs into a dense [L][L] matrix.
fn count_bigrams(seq: &[usize], l: usize) -> Vec<f64> {
    let mut counts = vec![0.0; l * l];
    for pair in seq.windows(2) {
        counts[l * pair[0] + pair[1]] += 1.0;
    }
    counts
}
