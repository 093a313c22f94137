//! Rule-based tags for words that never occurred in training.

use std::collections::HashMap;

use crate::quark::{Quark, StringTable};

use super::model::HmmModel;

/// Prepositional and adverbial particles (Quirk et al., 1985).
pub const PARTICLES: &[&str] = &[
    "aboard", "about", "above", "across", "ahead", "alongside", "apart", "around", "aside",
    "astray", "away", "back", "before", "behind", "below", "beneath", "besides", "between",
    "beyond", "by", "close", "down", "east", "west", "south", "north", "eastwards", "westwards",
    "southwards", "northwards", "forward", "forwards", "home", "in", "inside", "instead", "near",
    "off", "on", "opposite", "out", "outside", "over", "overhead", "past", "round", "since",
    "through", "throughout", "together", "under", "underneath", "up", "within", "without",
];

/// Guesses the tag of an out-of-vocabulary word from its shape.
///
/// Rules are tried in order and the first match wins.
pub fn classify(word: &str) -> &'static str {
    if word == "=" {
        return "SYM";
    }
    if PARTICLES.contains(&word) {
        return "RP";
    }
    if word.chars().any(|c| c.is_ascii_digit()) {
        return if word.chars().any(|c| c.is_ascii_alphabetic()) { "JJ" } else { "CD" };
    }
    let lowercase_initial = word.chars().next().is_some_and(char::is_lowercase);
    if lowercase_initial {
        if word.ends_with("ing") {
            return "VBG";
        }
        if word.ends_with("ed") {
            return "VBN";
        }
        if word.ends_with('s') {
            return "NNP";
        }
        if word.ends_with("ly") {
            return "RB";
        }
    } else if word.chars().count() == 1 {
        return if word == "C" { "CC" } else { "DT" };
    } else if word.ends_with('s') {
        return "NNP";
    }
    "NNP"
}

/// Tags every word of `words` that is absent from the training vocabulary.
pub fn classify_unknown(words: &Quark, model: &HmmModel) -> HashMap<String, String> {
    let unknown: HashMap<String, String> = words
        .iter()
        .filter(|w| !model.contains_word(w))
        .map(|w| (w.to_string(), classify(w).to_string()))
        .collect();
    log::info!("unknown words: {} of {}", unknown.len(), words.len());
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(classify("running"), "VBG");
        assert_eq!(classify("called"), "VBN");
        assert_eq!(classify("Goes"), "NNP");
        assert_eq!(classify("3.14"), "CD");
        assert_eq!(classify("a3x"), "JJ");
        assert_eq!(classify("C"), "CC");
        assert_eq!(classify("="), "SYM");
    }

    #[test]
    fn rule_order() {
        // particles precede the suffix rules
        assert_eq!(classify("outside"), "RP");
        assert_eq!(classify("round"), "RP");
        // digits precede case
        assert_eq!(classify("1980s"), "JJ");
        assert_eq!(classify("1,000"), "CD");
        assert_eq!(classify("singing"), "VBG");
        assert_eq!(classify("sings"), "NNP");
        assert_eq!(classify("quickly"), "RB");
        assert_eq!(classify("Running"), "NNP");
    }

    #[test]
    fn single_letters() {
        assert_eq!(classify("A"), "DT");
        assert_eq!(classify("&"), "DT");
        assert_eq!(classify("x"), "NNP");
    }

    #[test]
    fn fall_through() {
        assert_eq!(classify("zebra"), "NNP");
        assert_eq!(classify("Zebra"), "NNP");
        assert_eq!(classify("--"), "NNP");
        assert_eq!(classify(""), "NNP");
    }
}
