use std::{
    convert::TryFrom,
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{quark::{Quark, TextVectorizer}, Result};

/// Tag (and word) marking a sentence boundary. The tag of the sentence-final
/// period doubles as the start state of the next sentence.
pub const BOUNDARY: &str = ".";

/// Collapses an ambiguous `TAG1|TAG2` tag to its first component.
pub fn normalize_tag(tag: &str) -> &str {
    tag.split_once('|').map_or(tag, |(head, _)| head)
}

fn is_bracket(token: &str) -> bool {
    token == "[" || token == "]"
}

fn unescape(word: &str) -> String {
    word.replace("\\/", "/")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new<W: Into<String>, T: Into<String>>(word: W, tag: T) -> Self {
        Self { word: word.into(), tag: tag.into() }
    }

    /// Parses a raw `word/tag` entry, splitting at the last unescaped `/`.
    ///
    /// The word is unescaped (`\/` becomes `/`); the tag is kept verbatim.
    pub fn parse(entry: &str) -> Option<Self> {
        let sep = entry
            .rmatch_indices('/')
            .map(|(i, _)| i)
            .find(|&i| !entry[..i].ends_with('\\'))?;
        let (word, tag) = (&entry[..sep], &entry[sep + 1..]);
        Some(Self { word: unescape(word), tag: tag.to_string() })
    }

    pub fn is_boundary(&self) -> bool {
        self.tag == BOUNDARY
    }
}

impl Display for TaggedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.word.replace('/', "\\/"), self.tag)
    }
}

pub type TaggedSentence = Vec<TaggedToken>;

/// A tagged corpus: training data or a gold standard.
#[derive(Debug, Default)]
pub struct Corpus {
    pub sentences: Vec<TaggedSentence>,
}

impl Corpus {
    pub fn read_file<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let mut sentence = TaggedSentence::new();
        for line in reader.lines() {
            let line = line?;
            for entry in line.split_whitespace().filter(|s| !is_bracket(s)) {
                if let Some(token) = TaggedToken::parse(entry) {
                    let end = token.is_boundary();
                    sentence.push(token);
                    if end {
                        self.sentences.push(std::mem::take(&mut sentence));
                    }
                } else {
                    log::warn!("skipping malformed entry: {entry}");
                }
            }
        }
        if !sentence.is_empty() {
            self.sentences.push(sentence);
        }
        Ok(())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_from(File::open(path)?)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.sentences.iter().map(|x| x.len()).sum()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TaggedToken> {
        self.sentences.iter().flatten()
    }
}

impl TryFrom<File> for Corpus {
    type Error = crate::Error;

    fn try_from(f: File) -> Result<Self> {
        let mut corpus = Self::default();
        corpus.read_file(BufReader::new(f))?;
        Ok(corpus)
    }
}

impl From<&str> for Corpus {
    fn from(s: &str) -> Self {
        let mut corpus = Self::default();
        // reading from a byte slice cannot fail
        let _ = corpus.read_file(s.as_bytes());
        corpus
    }
}

/// A sentence to tag, with its boundary period removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sentence {
    pub words: Vec<String>,
    /// Whether the sentence was closed by a `.` token in the input.
    pub terminated: bool,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Selects the tokens of a decoded sentence that correspond to the input
    /// layout: the leading boundary is dropped, the trailing one is kept only
    /// when the input had a period there.
    pub fn align<'a>(&self, tagged: &'a [TaggedToken]) -> &'a [TaggedToken] {
        let end = if self.terminated { self.len() + 2 } else { self.len() + 1 };
        &tagged[1.min(tagged.len())..end.min(tagged.len())]
    }
}

/// Untagged test data, segmented into sentences at `.` tokens.
#[derive(Debug, Default)]
pub struct TestSet {
    pub sentences: Vec<Sentence>,
}

impl TestSet {
    pub fn read_file<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let mut sentence = Sentence::default();
        for line in reader.lines() {
            let line = line?;
            for word in line.split_whitespace().filter(|s| !is_bracket(s)) {
                if word == BOUNDARY {
                    sentence.terminated = true;
                    self.sentences.push(std::mem::take(&mut sentence));
                } else {
                    sentence.words.push(unescape(word));
                }
            }
        }
        if !sentence.is_empty() {
            self.sentences.push(sentence);
        }
        Ok(())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_from(File::open(path)?)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Distinct words in first-seen order.
    pub fn unique_words(&self) -> Quark {
        let mut words = Quark::default();
        for word in self.sentences.iter().flat_map(|s| &s.words) {
            words.find_or_insert(word);
        }
        words
    }
}

impl TryFrom<File> for TestSet {
    type Error = crate::Error;

    fn try_from(f: File) -> Result<Self> {
        let mut ds = Self::default();
        ds.read_file(BufReader::new(f))?;
        Ok(ds)
    }
}

impl From<&str> for TestSet {
    fn from(s: &str) -> Self {
        let mut ds = Self::default();
        let _ = ds.read_file(s.as_bytes());
        ds
    }
}

/// Writes one sentence per line as space-separated `word/tag` entries.
pub fn write_sentence<W: Write>(w: &mut W, tokens: &[TaggedToken]) -> std::io::Result<()> {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            w.write_all(b" ")?;
        }
        write!(w, "{token}")?;
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quark::StringTable;

    #[test]
    fn split_at_last_slash() {
        let t = TaggedToken::parse("1\\/2/CD").unwrap();
        assert_eq!(t.word, "1/2");
        assert_eq!(t.tag, "CD");
        assert_eq!(t.to_string(), "1\\/2/CD");
        assert!(TaggedToken::parse("nonsense").is_none());
    }

    #[test]
    fn escaped_slash_is_not_a_separator() {
        assert!(TaggedToken::parse("1\\/2").is_none());
        let t = TaggedToken::parse("either\\/or/CC").unwrap();
        assert_eq!(t.word, "either/or");
        assert_eq!(t.tag, "CC");
        let corpus = Corpus::from("1\\/2 ./.");
        assert_eq!(corpus.sentences, vec![vec![TaggedToken::new(".", ".")]]);
    }

    #[test]
    fn composite_tags() {
        assert_eq!(normalize_tag("JJ|VBN"), "JJ");
        assert_eq!(normalize_tag("NN"), "NN");
        assert_eq!(normalize_tag("|"), "");
    }

    #[test]
    fn read_corpus() {
        let corpus = Corpus::from("Pierre/NNP Vinken/NNP\n,/, [ 61/CD years/NNS ]\n./.\nbad The/DT");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sentences[0].len(), 6);
        assert_eq!(corpus.sentences[1], vec![TaggedToken::new("The", "DT")]);
        assert_eq!(corpus.total_items(), 7);
    }

    #[test]
    fn read_test_set() {
        let ds = TestSet::from("No ,\n[ it ]\n[ was n't Black Monday ]\n.\nBut while");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.sentences[0].words, ["No", ",", "it", "was", "n't", "Black", "Monday"]);
        assert!(ds.sentences[0].terminated);
        assert_eq!(ds.sentences[1].words, ["But", "while"]);
        assert!(!ds.sentences[1].terminated);
        assert_eq!(ds.unique_words().len(), 9);
    }

    #[test]
    fn align_drops_leading_boundary() {
        let tagged = vec![
            TaggedToken::new(".", "."),
            TaggedToken::new("Hi", "UH"),
            TaggedToken::new(".", "."),
        ];
        let closed = Sentence { words: vec!["Hi".into()], terminated: true };
        assert_eq!(closed.align(&tagged), &tagged[1..]);
        let open = Sentence { words: vec!["Hi".into()], terminated: false };
        assert_eq!(open.align(&tagged), &tagged[1..2]);
    }

    #[test]
    fn write_line() {
        let mut buf = Vec::new();
        write_sentence(&mut buf, &[TaggedToken::new("and/or", "CC"), TaggedToken::new(".", ".")]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "and\\/or/CC ./.\n");
    }
}
