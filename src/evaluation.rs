use std::{collections::HashMap, fmt::Display, io::Write, iter::zip};

use crate::{
    config::{TaggerConfig, Verbosity},
    dataset::{normalize_tag, TaggedToken},
    quark::{Quark, StringTable, TextVectorizer},
    Error, Result,
};

/// Sparse counts of (predicted, gold) tag pairs that disagree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfusionMatrix {
    /// Tags involved in at least one mismatch, in first-seen order.
    tags: Quark,
    /// (predicted, gold) -> number of mismatches.
    counts: HashMap<(usize, usize), usize>,
    /// Total number of mismatches.
    total: usize,
}

impl ConfusionMatrix {
    fn add(&mut self, predicted: &str, gold: &str) {
        let p = self.tags.find_or_insert(predicted);
        let g = self.tags.find_or_insert(gold);
        *self.counts.entry((p, g)).or_default() += 1;
        self.total += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct mismatching pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn tags(&self) -> &Quark {
        &self.tags
    }

    pub fn count(&self, predicted: &str, gold: &str) -> usize {
        match (self.tags.to_id(predicted), self.tags.to_id(gold)) {
            (Some(p), Some(g)) => self.counts.get(&(p, g)).copied().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Share of all mismatches, in percent, taken by the pair; `None` when the
    /// pair never occurred.
    pub fn percentage(&self, predicted: &str, gold: &str) -> Option<f64> {
        match self.count(predicted, gold) {
            0 => None,
            n => Some(n as f64 / self.total as f64 * 100.0),
        }
    }

    /// Mismatching pairs ordered by (predicted, gold) first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        let mut keys: Vec<_> = self.counts.iter().collect();
        keys.sort_unstable_by_key(|(k, _)| **k);
        keys.into_iter().filter_map(|(&(p, g), &n)| Some((self.tags.to_str(p)?, self.tags.to_str(g)?, n)))
    }

    /// Display grid: a header row of predicted tags, then one row per gold
    /// tag. Empty cells hold `-`.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(self.tags.len() + 1);
        let mut header = vec![" ".to_string()];
        header.extend(self.tags.iter().map(str::to_string));
        rows.push(header);
        for gold in self.tags.iter() {
            let mut row = vec![gold.to_string()];
            for predicted in self.tags.iter() {
                row.push(match self.percentage(predicted, gold) {
                    Some(p) => format!("{p:.4}"),
                    None => "-".to_string(),
                });
            }
            rows.push(row);
        }
        rows
    }

    pub fn write_csv<W: Write>(&self, w: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(w);
        for row in self.rows() {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = self.rows();
        let width = rows.iter().flatten().map(String::len).max().unwrap_or_default();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{cell:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Token-level accuracy and tag confusion of a tagging run.
#[derive(Debug, Default)]
pub struct Evaluation {
    verbosity: Verbosity,
    /** Total number of items. */
    item_total_num: usize,
    /** Number of items whose tag differs from the gold standard. */
    item_total_mismatch: usize,
    confusion: ConfusionMatrix,
}

impl Evaluation {
    pub fn new(config: &TaggerConfig) -> Self {
        Self { verbosity: config.verbosity, ..Default::default() }
    }

    /// Compares position-aligned predicted and gold tokens.
    ///
    /// Gold tags are normalized (`TAG1|TAG2` counts as `TAG1`). Nothing is
    /// accumulated when the sequences differ in length.
    pub fn accumulate(&mut self, prediction: &[TaggedToken], reference: &[TaggedToken]) -> Result<()> {
        if prediction.len() != reference.len() {
            let position = zip(prediction, reference)
                .position(|(p, r)| p.word != r.word)
                .unwrap_or_else(|| prediction.len().min(reference.len()));
            if let (Some(p), Some(r)) = (prediction.get(position), reference.get(position)) {
                log::error!("token #{position}: predicted {:?}, gold {:?}", p.word, r.word);
            }
            return Err(Error::Misaligned { predicted: prediction.len(), gold: reference.len(), position });
        }
        for (p, r) in zip(prediction, reference) {
            let gold = normalize_tag(&r.tag);
            if self.verbosity.contains(Verbosity::EVAL) && p.word != r.word {
                log::debug!("word mismatch at item #{}: {} vs {}", self.item_total_num, p.word, r.word);
            }
            if p.tag != gold {
                if self.verbosity.contains(Verbosity::EVAL) {
                    log::debug!("{}: predicted {}, gold {}", p.word, p.tag, gold);
                }
                self.confusion.add(&p.tag, gold);
                self.item_total_mismatch += 1;
            }
            self.item_total_num += 1;
        }
        Ok(())
    }

    /// Item accuracy in percent; 100 when nothing has been evaluated.
    pub fn accuracy(&self) -> f64 {
        if self.item_total_num == 0 {
            return 100.0;
        }
        100.0 * (1.0 - self.item_total_mismatch as f64 / self.item_total_num as f64)
    }

    pub fn mismatches(&self) -> usize {
        self.item_total_mismatch
    }

    pub fn total(&self) -> usize {
        self.item_total_num
    }

    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    pub fn into_confusion(self) -> ConfusionMatrix {
        self.confusion
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}%",
            self.item_total_num - self.item_total_mismatch,
            self.item_total_num,
            self.accuracy()
        )?;
        if self.confusion.is_empty() {
            return writeln!(f, "No mismatches.");
        }
        writeln!(
            f,
            "Confusion matrix (% of {} mismatches, rows: gold, columns: predicted):",
            self.item_total_mismatch
        )?;
        write!(f, "{}", self.confusion)
    }
}

/// One-shot evaluation: accuracy in percent and the confusion matrix.
pub fn evaluate(predicted: &[TaggedToken], gold: &[TaggedToken]) -> Result<(f64, ConfusionMatrix)> {
    let mut evaluation = Evaluation::default();
    evaluation.accumulate(predicted, gold)?;
    Ok((evaluation.accuracy(), evaluation.into_confusion()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<TaggedToken> {
        s.split_whitespace().filter_map(TaggedToken::parse).collect()
    }

    #[test]
    fn identical_sequences() {
        let p = tokens("The/DT dog/NN ./.");
        let (accuracy, confusion) = evaluate(&p, &p).unwrap();
        assert_eq!(accuracy, 100.0);
        assert!(confusion.is_empty());
    }

    #[test]
    fn counts_mismatches() {
        let p = tokens("The/DT dog/VB runs/NN fast/RB ./.");
        let g = tokens("The/DT dog/NN runs/VBZ fast/RB ./.");
        let mut ev = Evaluation::default();
        ev.accumulate(&p, &g).unwrap();
        assert_eq!(ev.mismatches(), 2);
        assert_eq!(ev.total(), 5);
        assert!((ev.accuracy() - 60.0).abs() < 1e-9);
        assert_eq!(ev.confusion().count("VB", "NN"), 1);
        assert_eq!(ev.confusion().count("NN", "VBZ"), 1);
        assert_eq!(ev.confusion().count("NN", "VB"), 0);
        assert_eq!(ev.confusion().percentage("VB", "NN"), Some(50.0));
    }

    #[test]
    fn gold_composite_tags() {
        let p = tokens("fixed/VBN rate/JJ");
        let g = tokens("fixed/VBN|JJ rate/NN|JJ");
        let (accuracy, confusion) = evaluate(&p, &g).unwrap();
        assert_eq!(accuracy, 50.0);
        assert_eq!(confusion.count("JJ", "NN"), 1);
        assert_eq!(confusion.count("JJ", "NN|JJ"), 0);
    }

    #[test]
    fn misaligned() {
        let p = tokens("a/DT");
        let g = tokens("a/DT b/NN");
        let mut ev = Evaluation::default();
        assert!(matches!(
            ev.accumulate(&p, &g),
            Err(Error::Misaligned { predicted: 1, gold: 2, position: 1 })
        ));
        assert_eq!(ev.total(), 0);
    }

    #[test]
    fn misaligned_reports_first_differing_word() {
        let p = tokens("The/DT dog/NN barks/VBZ ./. A/DT cat/NN ./.");
        let g = tokens("The/DT dog/NN barks/VBZ ./. A/DT black/JJ cat/NN ./.");
        let err = evaluate(&p, &g).unwrap_err();
        assert!(matches!(err, Error::Misaligned { predicted: 7, gold: 8, position: 5 }));
        assert!(err.to_string().ends_with("first differing word at token #5"));
    }

    #[test]
    fn empty_is_perfect() {
        let (accuracy, confusion) = evaluate(&[], &[]).unwrap();
        assert_eq!(accuracy, 100.0);
        assert_eq!(confusion.total(), 0);
    }

    #[test]
    fn grid_and_csv() {
        let p = tokens("a/NN b/NN c/VB");
        let g = tokens("a/JJ b/JJ c/NN");
        let (_, confusion) = evaluate(&p, &g).unwrap();
        let rows = confusion.rows();
        assert_eq!(rows[0], [" ", "NN", "JJ", "VB"]);
        // row of gold JJ: predicted NN twice out of three mismatches
        assert_eq!(rows[2], ["JJ", "66.6667", "-", "-"]);
        assert_eq!(rows[1], ["NN", "-", "-", "33.3333"]);
        let mut buf = Vec::new();
        confusion.write_csv(&mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        assert_eq!(csv.lines().next(), Some(" ,NN,JJ,VB"));
        assert_eq!(csv.lines().count(), 4);
        assert_eq!(
            confusion.iter().collect::<Vec<_>>(),
            [("NN", "JJ", 2), ("VB", "NN", 1)]
        );
    }
}
