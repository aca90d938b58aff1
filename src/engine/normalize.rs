//! Text normalization for the pattern index.
//!
//! Queries are case-folded to upper case, ASCII punctuation becomes a word
//! break and whitespace is collapsed. An empty `that`/topic is replaced by a
//! sentinel token. Sentinels contain punctuation, so no user text can ever
//! normalize to one.
//!
//! ```text
//! "Hello Tom Smith, how are you"
//!   tokens: HELLO TOM SMITH HOW ARE YOU
//!   origin:   0    1    2    3   4   5     (index of the source word)
//! ```
//!
//! The `origin` column is what lets wildcard spans be reported in the
//! caller's own spelling, punctuation included ("Tom Smith,").

use crate::Section;

/// Stands in for an empty `that` section.
pub const NO_THAT: &str = "<NO-THAT>";
/// Stands in for an empty topic section.
pub const NO_TOPIC: &str = "<NO-TOPIC>";
/// Pattern token that is replaced by the bot's name at match time.
pub const BOT_NAME_TOKEN: &str = "BOT_NAME";

/// One normalized query section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionText {
    pub(crate) tokens: Vec<String>,
    /// `origin[i]` is the index in `words` that produced `tokens[i]`.
    origin: Vec<usize>,
    /// Whitespace-separated words of the source text, untouched.
    words: Vec<String>,
}

impl SectionText {
    /// Normalize `text`. Empty results are returned as-is (no sentinel).
    pub fn fold(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut origin = Vec::new();
        let mut words = Vec::new();
        for (index, word) in text.split_whitespace().enumerate() {
            let cleaned: String =
                word.to_uppercase().chars().map(|c| if c.is_ascii_punctuation() { ' ' } else { c }).collect();
            for token in cleaned.split_whitespace() {
                tokens.push(token.to_string());
                origin.push(index);
            }
            words.push(word.to_string());
        }
        SectionText { tokens, origin, words }
    }

    /// Normalize `text`, substituting `sentinel` when nothing survives.
    pub fn fold_or(text: &str, sentinel: &str) -> Self {
        let folded = SectionText::fold(text);
        if folded.tokens.is_empty() { SectionText::sentinel(sentinel) } else { folded }
    }

    fn sentinel(token: &str) -> Self {
        SectionText { tokens: vec![token.to_string()], origin: Vec::new(), words: Vec::new() }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_sentinel(&self) -> bool {
        self.words.is_empty() && !self.tokens.is_empty()
    }

    /// Source words covering tokens `start..end`, joined by single spaces.
    pub fn original_span(&self, start: usize, end: usize) -> String {
        if self.is_sentinel() || start >= end || end > self.origin.len() {
            return String::new();
        }
        let first = self.origin[start];
        let last = self.origin[end - 1];
        self.words[first..=last].join(" ")
    }
}

/// A fully normalized `(input, that, topic)` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    sections: [SectionText; 3],
}

impl Query {
    pub fn new(input: &str, that: &str, topic: &str) -> Self {
        Query {
            sections: [SectionText::fold(input), SectionText::fold_or(that, NO_THAT), SectionText::fold_or(topic, NO_TOPIC)],
        }
    }

    pub fn section(&self, section: Section) -> &SectionText {
        &self.sections[section.index()]
    }

    pub(crate) fn tokens(&self, index: usize) -> &[String] {
        &self.sections[index].tokens
    }
}

/// Collapse a (possibly multi-word) bot name to the single token it matches.
pub fn bot_name_token(name: &str) -> String {
    SectionText::fold(name).tokens.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_strips_punctuation_and_case() {
        let folded = SectionText::fold("Hello Tom Smith, how are you?");
        assert_eq!(folded.tokens(), ["HELLO", "TOM", "SMITH", "HOW", "ARE", "YOU"]);
        assert_eq!(folded.original_span(1, 3), "Tom Smith,");
    }

    #[test]
    fn split_words_map_back_to_their_source_word() {
        let folded = SectionText::fold("it's o'clock now");
        assert_eq!(folded.tokens(), ["IT", "S", "O", "CLOCK", "NOW"]);
        assert_eq!(folded.original_span(2, 4), "o'clock");
        assert_eq!(folded.original_span(1, 3), "it's o'clock");
    }

    #[test]
    fn empty_sections_become_sentinels() {
        let query = Query::new("hi", "", "  ?! ");
        assert_eq!(query.section(Section::That).tokens(), [NO_THAT]);
        assert_eq!(query.section(Section::Topic).tokens(), [NO_TOPIC]);
        assert!(query.section(Section::That).is_sentinel());
        assert_eq!(query.section(Section::That).original_span(0, 1), "");
        assert!(SectionText::fold(NO_THAT).tokens().iter().all(|t| t != NO_THAT));
    }

    #[test]
    fn bot_names_collapse_to_one_token() {
        assert_eq!(bot_name_token("Nameless"), "NAMELESS");
        assert_eq!(bot_name_token("  Big   Bot "), "BIGBOT");
    }
}
