use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    config::TaggerConfig,
    dataset::BOUNDARY,
    quark::{Quark, StringTable},
    Error, Result,
};

use super::tagger::HmmTagger;

pub trait Model {
    fn tagger(&self, config: &TaggerConfig) -> HmmTagger<'_>;
    fn labels(&self) -> &Quark;
    fn words(&self) -> &Quark;
    fn dump<W: Write>(&self, w: &mut W) -> Result<()>;
}

/// A trained bigram HMM.
///
/// Both tables are dense row-major matrices:
/// - `transition` is [L][L], element [i][j] is P(tag #j | tag #i);
/// - `emission` is [V][L], element [w][j] is P(word #w | tag #j).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmModel {
    tags: Quark,
    words: Quark,
    transition: Vec<f64>,
    emission: Vec<f64>,
}

impl HmmModel {
    pub(crate) fn new(tags: Quark, words: Quark, transition: Vec<f64>, emission: Vec<f64>) -> Self {
        Self { tags, words, transition, emission }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let model: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| Error::InvalidModel(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_memory(buffer: &[u8]) -> Result<Self> {
        let model: Self =
            serde_json::from_slice(buffer).map_err(|e| Error::InvalidModel(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let l = self.num_tags();
        if self.boundary_id().is_none() {
            return Err(Error::InvalidModel(format!("boundary tag {BOUNDARY:?} is missing")));
        }
        if self.transition.len() != l * l {
            return Err(Error::InvalidModel(format!(
                "transition table has {} cells, expected {}",
                self.transition.len(),
                l * l
            )));
        }
        if self.emission.len() != self.num_words() * l {
            return Err(Error::InvalidModel(format!(
                "emission table has {} cells, expected {}",
                self.emission.len(),
                self.num_words() * l
            )));
        }
        let in_range = |p: &f64| (0.0..=1.0).contains(p);
        if !self.transition.iter().all(in_range) || !self.emission.iter().all(in_range) {
            return Err(Error::InvalidModel("probability outside [0, 1]".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn boundary_id(&self) -> Option<usize> {
        self.tags.to_id(BOUNDARY)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    #[inline]
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transition[self.num_tags() * from + to]
    }

    /// Row of transition probabilities out of tag #`from`.
    pub fn transition_row(&self, from: usize) -> &[f64] {
        let l = self.num_tags();
        &self.transition[l * from..l * (from + 1)]
    }

    pub(crate) fn transitions(&self) -> &[f64] {
        &self.transition
    }

    /// Emission probabilities of `word` under every tag, or `None` for a word
    /// unseen in training.
    pub fn emission_row(&self, word: &str) -> Option<&[f64]> {
        let l = self.num_tags();
        self.words.to_id(word).map(|w| &self.emission[l * w..l * (w + 1)])
    }

    pub fn transition_prob(&self, from: &str, to: &str) -> Option<f64> {
        Some(self.transition(self.tags.to_id(from)?, self.tags.to_id(to)?))
    }

    pub fn emission_prob(&self, word: &str, tag: &str) -> Option<f64> {
        let t = self.tags.to_id(tag)?;
        self.emission_row(word).map(|row| row[t])
    }
}

impl Model for HmmModel {
    fn tagger(&self, config: &TaggerConfig) -> HmmTagger<'_> {
        HmmTagger::new(self, config)
    }

    fn labels(&self) -> &Quark {
        &self.tags
    }

    fn words(&self) -> &Quark {
        &self.words
    }

    fn dump<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, "LABELS = {{")?;
        for (i, tag) in self.tags.iter().enumerate() {
            writeln!(w, "\t{i:5}: {tag}")?;
        }
        writeln!(w, "}}\n")?;

        writeln!(w, "TRANSITIONS = {{")?;
        for (i, from) in self.tags.iter().enumerate() {
            for (j, to) in self.tags.iter().enumerate() {
                let p = self.transition(i, j);
                if p > 0.0 {
                    writeln!(w, "\t({from}) --> ({to}): {p:.6}")?;
                }
            }
        }
        writeln!(w, "}}\n")?;

        writeln!(w, "EMISSIONS = {{")?;
        let l = self.num_tags();
        for (k, word) in self.words.iter().enumerate() {
            for (j, tag) in self.tags.iter().enumerate() {
                let p = self.emission[l * k + j];
                if p > 0.0 {
                    writeln!(w, "\t({word}) <-- ({tag}): {p:.6}")?;
                }
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> HmmModel {
        HmmModel::new(
            Quark::new(&[".", "NN"]),
            Quark::new(&[".", "dog"]),
            vec![0.5, 0.5, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
        )
    }

    #[test]
    fn lookups() {
        let model = tiny();
        assert_eq!(model.boundary_id(), Some(0));
        assert_eq!(model.transition_prob("NN", "."), Some(1.0));
        assert_eq!(model.transition_row(0), &[0.5, 0.5]);
        assert_eq!(model.emission_prob("dog", "NN"), Some(1.0));
        assert_eq!(model.emission_prob("cat", "NN"), None);
        assert!(model.emission_row("cat").is_none());
    }

    #[test]
    fn json_round_trip() {
        let model = tiny();
        let buf = serde_json::to_vec(&model).unwrap();
        assert_eq!(HmmModel::from_memory(&buf).unwrap(), model);
    }

    #[test]
    fn reject_bad_dimensions() {
        let mut model = tiny();
        model.emission.pop();
        let buf = serde_json::to_vec(&model).unwrap();
        assert!(matches!(HmmModel::from_memory(&buf), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn reject_missing_boundary() {
        let model = HmmModel::new(Quark::new(&["NN"]), Quark::new(&["dog"]), vec![1.0], vec![1.0]);
        let buf = serde_json::to_vec(&model).unwrap();
        assert!(matches!(HmmModel::from_memory(&buf), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn dump_lists_nonzero_cells() {
        let mut buf = Vec::new();
        tiny().dump(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("(NN) --> (.): 1.000000"));
        assert!(s.contains("(dog) <-- (NN): 1.000000"));
        assert!(!s.contains("(NN) --> (NN)"));
    }
}
