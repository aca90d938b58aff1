//! The pattern index: a word trie over `(pattern, that, topic)` paths.
//!
//! Every learned rule is one root-to-leaf path. Two separator edges split the
//! path into its three sections; the template lives on the node where the
//! topic section ends.
//!
//! ```text
//! (root) ─ HELLO ─ * ─ HOW ─ ARE ─ YOU ─ <that> ─ * ─ <topic> ─ * ─ [template]
//! ```
//!
//! ## Priority order
//!
//! At every node the matcher tries, in this exact order:
//!
//! 1. the `_` child, consuming 1, 2, ... tokens (shortest first) and recursing
//!    on each remaining suffix;
//! 2. the literal child for the current token;
//! 3. the bot-name child, if the current token is the bot's name;
//! 4. the `*` child, with the same suffix backtracking as `_`.
//!
//! The first branch that reaches a template wins. There is no global scoring,
//! so an `_` early in a shared prefix beats a longer literal continuation.
//! Wildcards never cross a section boundary.
//!
//! Backtracking is exponential in the number of adjacent wildcards; rule sets
//! are expected to stay small enough that this does not matter.

use super::normalize::{BOT_NAME_TOKEN, NO_THAT, NO_TOPIC, Query, bot_name_token};
use super::wildcard::{MatchPath, Step, Wildcard, span_text};
use crate::Section;
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Edge label used while inserting.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Word(String),
    Underscore,
    Star,
    BotName,
    That,
    Topic,
}

impl Key {
    fn from_token(token: &str) -> Key {
        match token {
            "_" => Key::Underscore,
            "*" => Key::Star,
            BOT_NAME_TOKEN => Key::BotName,
            word => Key::Word(word.to_uppercase()),
        }
    }

    fn separator(section: usize) -> Key {
        if section == Section::That.index() { Key::That } else { Key::Topic }
    }
}

/// One trie node. Literal children are keyed by their upper-case word; the
/// special edges get their own slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TrieNode {
    words: HashMap<String, TrieNode>,
    underscore: Option<Box<TrieNode>>,
    star: Option<Box<TrieNode>>,
    bot_name: Option<Box<TrieNode>>,
    that: Option<Box<TrieNode>>,
    topic: Option<Box<TrieNode>>,
    template: Option<Arc<Template>>,
}

impl TrieNode {
    fn child(&self, key: &Key) -> Option<&TrieNode> {
        match key {
            Key::Word(word) => self.words.get(word),
            Key::Underscore => self.underscore.as_deref(),
            Key::Star => self.star.as_deref(),
            Key::BotName => self.bot_name.as_deref(),
            Key::That => self.that.as_deref(),
            Key::Topic => self.topic.as_deref(),
        }
    }

    fn child_or_insert(&mut self, key: Key) -> &mut TrieNode {
        match key {
            Key::Word(word) => self.words.entry(word).or_default(),
            Key::Underscore => self.underscore.get_or_insert_with(Box::default),
            Key::Star => self.star.get_or_insert_with(Box::default),
            Key::BotName => self.bot_name.get_or_insert_with(Box::default),
            Key::That => self.that.get_or_insert_with(Box::default),
            Key::Topic => self.topic.get_or_insert_with(Box::default),
        }
    }

    /// Depth-first listing of every stored path, rendered as text.
    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<String>) {
        if self.template.is_some() {
            out.push(prefix.join(" "));
        }
        let mut words: Vec<&String> = self.words.keys().collect();
        words.sort_unstable();
        let special = [
            ("_", &self.underscore),
            ("*", &self.star),
            (BOT_NAME_TOKEN, &self.bot_name),
            ("<that>", &self.that),
            ("<topic>", &self.topic),
        ];
        for word in words {
            prefix.push(word.clone());
            self.words[word].collect_paths(prefix, out);
            prefix.pop();
        }
        for (label, child) in special {
            if let Some(child) = child {
                prefix.push(label.to_string());
                child.collect_paths(prefix, out);
                prefix.pop();
            }
        }
    }
}

/// A successful match: the template plus enough context to recover wildcard
/// spans later.
#[derive(Debug, Clone)]
pub struct Match {
    pub template: Arc<Template>,
    pub path: MatchPath,
    query: Query,
}

impl Match {
    /// Source text bound to the `ordinal`-th wildcard of `section`.
    pub fn wildcard(&self, section: Section, ordinal: usize) -> Option<String> {
        span_text(&self.query, &self.path, section, ordinal)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// The rule store.
#[derive(Debug, Clone)]
pub struct PatternIndex {
    pub(crate) root: TrieNode,
    pub(crate) rules: usize,
    pub(crate) bot_name: String,
}

impl Default for PatternIndex {
    fn default() -> Self {
        PatternIndex { root: TrieNode::default(), rules: 0, bot_name: bot_name_token("Nameless") }
    }
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct `(pattern, that, topic)` triples stored.
    pub fn num_rules(&self) -> usize {
        self.rules
    }

    /// Set the name that the bot-name placeholder matches. Multi-word names
    /// are collapsed into one token.
    pub fn set_bot_name(&mut self, name: &str) {
        self.bot_name = bot_name_token(name);
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Store `template` under the given triple, replacing any template that
    /// was already there. Empty `that`/`topic` sections only match queries
    /// whose corresponding section is empty too.
    pub fn insert(&mut self, pattern: &str, that: &str, topic: &str, template: Template) {
        let mut keys: Vec<Key> = pattern.split_whitespace().map(Key::from_token).collect();
        keys.push(Key::That);
        keys.extend(section_keys(that, NO_THAT));
        keys.push(Key::Topic);
        keys.extend(section_keys(topic, NO_TOPIC));

        let mut node = &mut self.root;
        for key in keys {
            node = node.child_or_insert(key);
        }
        if node.template.is_none() {
            self.rules += 1;
        }
        node.template = Some(Arc::new(template));
    }

    /// Find the best template for the (un-normalized) triple.
    pub fn match_template(&self, input: &str, that: &str, topic: &str) -> Option<Arc<Template>> {
        self.search(&Query::new(input, that, topic)).map(|m| m.template)
    }

    /// Find the best match together with its path.
    pub fn match_path(&self, input: &str, that: &str, topic: &str) -> Option<Match> {
        self.search(&Query::new(input, that, topic))
    }

    /// Text bound to the `ordinal`-th wildcard of `section` when the triple
    /// is matched. Empty when nothing matches or the wildcard does not exist.
    pub fn wildcard_span(&self, section: Section, input: &str, that: &str, topic: &str, ordinal: usize) -> String {
        self.match_path(input, that, topic).and_then(|m| m.wildcard(section, ordinal)).unwrap_or_default()
    }

    pub(crate) fn search(&self, query: &Query) -> Option<Match> {
        if query.tokens(Section::Input.index()).is_empty() {
            return None;
        }
        let mut steps = Vec::new();
        let template = self.descend(&self.root, query, Section::Input.index(), 0, &mut steps)?;
        Some(Match { template, path: MatchPath::new(steps), query: query.clone() })
    }

    fn descend(
        &self,
        node: &TrieNode,
        query: &Query,
        section: usize,
        pos: usize,
        path: &mut Vec<Step>,
    ) -> Option<Arc<Template>> {
        let words = query.tokens(section);

        if pos == words.len() {
            // Section exhausted: continue into the next one through its
            // separator, or take the template stored here.
            let next = section + 1;
            if next <= Section::Topic.index() && !query.tokens(next).is_empty() {
                if let Some(child) = node.child(&Key::separator(next)) {
                    path.push(if next == Section::That.index() { Step::That } else { Step::Topic });
                    if let Some(template) = self.descend(child, query, next, 0, path) {
                        return Some(template);
                    }
                    path.pop();
                }
            }
            return node.template.clone();
        }

        let first = &words[pos];

        if let Some(child) = node.underscore.as_deref() {
            if let Some(template) = self.consume(child, Wildcard::Underscore, query, section, pos, path) {
                return Some(template);
            }
        }

        if let Some(child) = node.words.get(first) {
            path.push(Step::Word(first.clone()));
            if let Some(template) = self.descend(child, query, section, pos + 1, path) {
                return Some(template);
            }
            path.pop();
        }

        if let Some(child) = node.bot_name.as_deref() {
            if *first == self.bot_name {
                path.push(Step::Word(first.clone()));
                if let Some(template) = self.descend(child, query, section, pos + 1, path) {
                    return Some(template);
                }
                path.pop();
            }
        }

        if let Some(child) = node.star.as_deref() {
            if let Some(template) = self.consume(child, Wildcard::Star, query, section, pos, path) {
                return Some(template);
            }
        }

        None
    }

    /// Let a wildcard swallow 1..=remaining tokens, shortest first.
    fn consume(
        &self,
        child: &TrieNode,
        kind: Wildcard,
        query: &Query,
        section: usize,
        pos: usize,
        path: &mut Vec<Step>,
    ) -> Option<Arc<Template>> {
        let remaining = query.tokens(section).len() - pos;
        for len in 1..=remaining {
            path.push(Step::Wildcard { kind, len });
            if let Some(template) = self.descend(child, query, section, pos + len, path) {
                return Some(template);
            }
            path.pop();
        }
        None
    }

    /// Every stored path as `PATTERN <that> THAT <topic> TOPIC`, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_paths(&mut Vec::new(), &mut out);
        out.sort();
        out
    }
}

fn section_keys(text: &str, sentinel: &str) -> Vec<Key> {
    let keys: Vec<Key> = text.split_whitespace().map(Key::from_token).collect();
    if keys.is_empty() { vec![Key::Word(sentinel.to_string())] } else { keys }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Node;

    fn label(template: &Template) -> String {
        match template.root.children.first() {
            Some(Node::Text(text)) => text.raw().to_string(),
            _ => String::new(),
        }
    }

    fn index(rules: &[(&str, &str, &str, &str)]) -> PatternIndex {
        let mut index = PatternIndex::new();
        for (pattern, that, topic, out) in rules {
            index.insert(pattern, that, topic, Template::text(out));
        }
        index
    }

    fn answer(index: &PatternIndex, input: &str, that: &str, topic: &str) -> Option<String> {
        index.match_template(input, that, topic).map(|t| label(&t))
    }

    #[test]
    fn exact_triples_match_themselves() {
        let rules = [
            ("HELLO", "*", "*", "a"),
            ("HELLO THERE", "*", "*", "b"),
            ("WHAT IS YOUR NAME", "*", "*", "c"),
            ("YES", "DO YOU LIKE CHEESE", "*", "d"),
            ("TELL ME MORE", "*", "FRUIT", "e"),
        ];
        let index = index(&rules);
        for (pattern, that, topic, out) in rules {
            let that = if that == "*" { "anything" } else { that };
            let topic = if topic == "*" { "" } else { topic };
            assert_eq!(answer(&index, pattern, that, topic).as_deref(), Some(out), "pattern {pattern}");
        }
        assert_eq!(index.num_rules(), 5);
    }

    #[test]
    fn reinserting_a_triple_overwrites() {
        let mut index = index(&[("HELLO", "*", "*", "first")]);
        index.insert("hello", "*", "*", Template::text("second"));
        assert_eq!(index.num_rules(), 1);
        assert_eq!(answer(&index, "hello", "", "").as_deref(), Some("second"));
    }

    #[test]
    fn underscore_beats_a_literal_at_the_same_node() {
        let index = index(&[("HELLO _", "*", "*", "underscore"), ("HELLO THERE", "*", "*", "literal")]);
        assert_eq!(answer(&index, "hello there", "", "").as_deref(), Some("underscore"));
    }

    #[test]
    fn literal_beats_star_at_the_same_node() {
        let index = index(&[("HELLO *", "*", "*", "star"), ("HELLO THERE", "*", "*", "literal")]);
        assert_eq!(answer(&index, "hello there", "", "").as_deref(), Some("literal"));
        assert_eq!(answer(&index, "hello you", "", "").as_deref(), Some("star"));
    }

    #[test]
    fn earlier_underscore_wins_over_later_literals() {
        let index = index(&[("_ THERE", "*", "*", "early"), ("HELLO THERE", "*", "*", "specific")]);
        assert_eq!(answer(&index, "hello there", "", "").as_deref(), Some("early"));
    }

    #[test]
    fn wildcards_need_at_least_one_word() {
        let index = index(&[("HELLO *", "*", "*", "star")]);
        assert_eq!(answer(&index, "hello", "", ""), None);
        assert_eq!(answer(&index, "", "", ""), None);
    }

    #[test]
    fn wildcards_backtrack_across_the_remaining_input() {
        let index = index(&[("* A B", "*", "*", "tail")]);
        let m = index.match_path("x a c a b", "", "").unwrap();
        assert_eq!(label(&m.template), "tail");
        assert_eq!(m.wildcard(Section::Input, 1).as_deref(), Some("x a c"));
    }

    #[test]
    fn that_and_topic_gate_matches() {
        let index = index(&[
            ("YES", "DO YOU LIKE *", "*", "likes"),
            ("YES", "*", "*", "plain yes"),
            ("TELL ME MORE", "*", "FRUIT", "fruit"),
        ]);
        assert_eq!(answer(&index, "yes", "Do you like cheese?", "").as_deref(), Some("likes"));
        assert_eq!(answer(&index, "yes", "Nice weather", "").as_deref(), Some("plain yes"));
        assert_eq!(answer(&index, "yes", "", "").as_deref(), Some("plain yes"));
        assert_eq!(answer(&index, "tell me more", "", "fruit").as_deref(), Some("fruit"));
        assert_eq!(answer(&index, "tell me more", "", "cars"), None);
    }

    #[test]
    fn empty_sections_only_match_empty_context() {
        let index = index(&[("HI", "", "", "bare")]);
        assert_eq!(answer(&index, "hi", "", "").as_deref(), Some("bare"));
        assert_eq!(answer(&index, "hi", "something", ""), None);
    }

    #[test]
    fn bot_name_placeholder_matches_the_configured_name() {
        let mut index = index(&[("WHO IS BOT_NAME", "*", "*", "me")]);
        assert_eq!(answer(&index, "who is nameless", "", "").as_deref(), Some("me"));
        index.set_bot_name("Alice");
        assert_eq!(answer(&index, "who is alice", "", "").as_deref(), Some("me"));
        assert_eq!(answer(&index, "who is nameless", "", ""), None);
    }

    #[test]
    fn wildcard_span_preserves_source_punctuation() {
        let index = index(&[("HELLO * HOW ARE YOU", "*", "*", "greet")]);
        let star = index.wildcard_span(Section::Input, "Hello Tom Smith, how are you?", "", "", 1);
        assert_eq!(star, "Tom Smith,");
        assert_eq!(index.wildcard_span(Section::Input, "Hello Tom Smith, how are you?", "", "", 2), "");
        assert_eq!(index.wildcard_span(Section::Input, "goodbye", "", "", 1), "");
    }

    #[test]
    fn that_and_topic_spans() {
        let index = index(&[("YES", "I SAY *", "* HAM *", "x")]);
        let that = "I say beans and franks";
        let topic = "Soylent Ham and Cheese";
        assert_eq!(index.wildcard_span(Section::That, "yes", that, topic, 1), "beans and franks");
        assert_eq!(index.wildcard_span(Section::Topic, "yes", that, topic, 1), "Soylent");
        assert_eq!(index.wildcard_span(Section::Topic, "yes", that, topic, 2), "and Cheese");
    }

    #[test]
    fn multiple_stars_split_shortest_first() {
        let index = index(&[("TEST STAR * MULTIPLE * MAKES ME *", "*", "*", "multi")]);
        let input = "test star having multiple stars in a pattern makes me extremely happy";
        let m = index.match_path(input, "", "").unwrap();
        assert_eq!(m.wildcard(Section::Input, 1).as_deref(), Some("having"));
        assert_eq!(m.wildcard(Section::Input, 2).as_deref(), Some("stars in a pattern"));
        assert_eq!(m.wildcard(Section::Input, 3).as_deref(), Some("extremely happy"));
        assert_eq!(m.path.to_string(), "TEST STAR * MULTIPLE * MAKES ME * <that> * <topic> *");
    }

    #[test]
    fn paths_list_every_rule() {
        let index = index(&[("HI", "*", "*", "a"), ("HI", "", "FRUIT", "b")]);
        assert_eq!(index.paths(), vec!["HI <that> * <topic> *", "HI <that> <NO-THAT> <topic> FRUIT"]);
    }
}
