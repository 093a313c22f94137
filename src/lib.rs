//! Part-of-speech tagging with a bigram hidden Markov model.
//!
//! A [`HmmTrainer`] estimates tag transition and word emission probabilities
//! from a tagged [`Corpus`]; an [`HmmTagger`] decodes sentences with the
//! Viterbi algorithm, and an [`Evaluation`] scores the output against a gold
//! standard.

pub mod config;
pub mod dataset;
mod error;
pub mod evaluation;
pub mod hmm;
pub mod quark;

pub use config::{TaggerConfig, Verbosity};
pub use dataset::{normalize_tag, Corpus, Sentence, TaggedToken, TestSet, BOUNDARY};
pub use error::{Error, Result};
pub use evaluation::{evaluate, ConfusionMatrix, Evaluation};
pub use hmm::{classify, classify_unknown, HmmModel, HmmTagger, HmmTrainer, Model, Tagger};
