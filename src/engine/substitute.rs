//! Whole-word, case-preserving multi-pattern substitution.
//!
//! A [`WordSub`] holds `before -> after` word pairs and rewrites text in a
//! single pass, so a swap table (`he -> she`, `she -> he`) never re-applies
//! its own output.
//!
//! Case handling is by expansion: every inserted pair is stored in three
//! spellings (lower, Capitalized Words, UPPER) and matching is exact against
//! those spellings.
//!
//! ```text
//! insert("I'd", "I would")
//!   "I'D" -> "I WOULD"
//!   "i'd" -> "i would"
//!   "I'd" -> "I Would"
//! ```
//!
//! Before-words must be complete words: `he` rewrites `he'd` (the apostrophe
//! is a word boundary) but never `help`.

use crate::error::{Error, Result};
use crate::text::capwords;
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};

/// One substitution table.
#[derive(Debug, Clone, Default)]
pub struct WordSub {
    map: HashMap<String, String>,
    /// Alternation over every key; rebuilt lazily after an insert.
    matcher: OnceCell<Option<Regex>>,
}

impl WordSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut sub = WordSub::new();
        for (from, to) in pairs {
            sub.insert(from, to);
        }
        sub
    }

    /// Add a pair (in all three spellings).
    pub fn insert(&mut self, from: &str, to: &str) {
        // Capitalized spelling goes last: for one-letter words like "I" it
        // coincides with the upper-case spelling and should win.
        self.map.insert(from.to_uppercase(), to.to_uppercase());
        self.map.insert(from.to_lowercase(), to.to_lowercase());
        self.map.insert(capwords(from), capwords(to));
        self.matcher = OnceCell::new();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Rewrite `text`.
    pub fn sub(&self, text: &str) -> String {
        let Some(re) = self.matcher.get_or_init(|| self.build_matcher()) else {
            return text.to_string();
        };
        re.replace_all(text, |caps: &Captures| {
            let hit = &caps[0];
            self.map.get(hit).cloned().unwrap_or_else(|| hit.to_string())
        })
        .into_owned()
    }

    fn build_matcher(&self) -> Option<Regex> {
        if self.map.is_empty() {
            return None;
        }
        // Longest keys first so "I am" wins over "I" at the same position.
        let mut keys: Vec<&String> = self.map.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys.iter().map(|k| format!(r"\b{}\b", regex::escape(k))).collect::<Vec<_>>().join("|");
        match Regex::new(&alternation) {
            Ok(re) => Some(re),
            Err(err) => {
                log::error!("substitution table does not compile to a matcher: {err}");
                None
            }
        }
    }
}

/// Named substitution tables (`normal`, `gender`, `person`, `person2`, ...).
#[derive(Debug, Clone)]
pub struct Substitutions {
    tables: HashMap<String, WordSub>,
}

impl Default for Substitutions {
    fn default() -> Self {
        let tables = crate::subs::defaults()
            .into_iter()
            .map(|(name, pairs)| (name.to_string(), WordSub::from_pairs(pairs.iter().copied())))
            .collect();
        Substitutions { tables }
    }
}

impl Substitutions {
    /// Apply table `name`; an unknown table leaves the text untouched.
    pub fn apply(&self, name: &str, text: &str) -> String {
        match self.tables.get(name) {
            Some(table) => table.sub(text),
            None => {
                log::warn!("no substitution table named '{name}'");
                text.to_string()
            }
        }
    }

    /// Install (or replace) a whole table.
    pub fn replace(&mut self, name: &str, table: WordSub) {
        self.tables.insert(name.to_string(), table);
    }

    pub fn get(&self, name: &str) -> Option<&WordSub> {
        self.tables.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load tables from TOML text. Every top-level table becomes (and
    /// replaces) one named substitution table:
    ///
    /// ```toml
    /// [gender]
    /// he = "she"
    /// she = "he"
    /// ```
    ///
    /// Returns the names that were installed.
    pub fn load_toml(&mut self, source: &str, origin: &str) -> Result<Vec<String>> {
        let parsed: BTreeMap<String, BTreeMap<String, String>> = toml::from_str(source)
            .map_err(|err| Error::Substitutions { origin: origin.to_string(), message: err.to_string() })?;
        let mut installed = Vec::with_capacity(parsed.len());
        for (name, pairs) in parsed {
            let table = WordSub::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            log::debug!("installed substitution table '{name}' ({} entries) from {origin}", table.len());
            self.replace(&name, table);
            installed.push(name);
        }
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit() -> WordSub {
        WordSub::from_pairs([("apple", "banana"), ("orange", "pear"), ("banana", "apple"), ("he", "she"), ("I'd", "I would")])
    }

    #[test]
    fn substitution_is_case_preserving_and_single_pass() {
        let subber = fruit();
        assert_eq!(
            subber.sub("I'd like one apple, one Orange and one BANANA."),
            "I Would like one banana, one Pear and one APPLE."
        );
    }

    #[test]
    fn only_whole_words_are_replaced() {
        let subber = fruit();
        assert_eq!(subber.sub("He said he'd like to go with me"), "She said she'd like to go with me");
        assert_eq!(subber.sub("help her"), "help her");
    }

    #[test]
    fn empty_table_is_identity() {
        assert_eq!(WordSub::new().sub("anything at all"), "anything at all");
    }

    #[test]
    fn built_in_tables_are_installed() {
        let subs = Substitutions::default();
        assert_eq!(subs.names(), vec!["gender", "normal", "person", "person2"]);
        assert_eq!(subs.apply("normal", "I'm sure you're right"), "I Am sure you are right");
        assert_eq!(subs.apply("gender", "he told her"), "she told him");
        assert_eq!(subs.apply("person2", "I love my dog"), "You love your dog");
        assert_eq!(subs.apply("missing", "unchanged"), "unchanged");
    }

    #[test]
    fn toml_tables_replace_by_name() {
        let mut subs = Substitutions::default();
        let names = subs.load_toml("[gender]\nhe = \"it\"\n\n[shout]\nhi = \"hello\"\n", "inline").unwrap();
        assert_eq!(names, vec!["gender".to_string(), "shout".to_string()]);
        assert_eq!(subs.apply("gender", "he and she"), "it and she");
        assert_eq!(subs.apply("shout", "Hi there"), "Hello there");
    }

    #[test]
    fn bad_toml_is_reported() {
        let mut subs = Substitutions::default();
        let err = subs.load_toml("[gender\nhe = ", "broken.toml").unwrap_err();
        assert!(matches!(err, Error::Substitutions { .. }), "unexpected error: {err:?}");
    }
}
