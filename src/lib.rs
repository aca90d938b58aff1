//! A rule-based conversational engine for AIML 1.0.x documents.
//!
//! Rules (categories) pair a pattern over the user's input, the bot's
//! previous reply and the current topic with a response template. The
//! [`Kernel`] learns documents, answers input sentence by sentence and keeps
//! per-session predicates and histories.
//!
//! ```text
//! learn("bot/*.aiml") ── parse_document ── PatternIndex
//!                                               │
//! respond("Hello. How are you?", "alice") ──────┴── match ── evaluate template ── "Hi! Fine."
//! ```
//!
//! The pattern index is also usable on its own:
//!
//! ```
//! use aimlkit::{PatternIndex, Section, Template};
//!
//! let mut index = PatternIndex::new();
//! index.insert("HELLO *", "*", "*", Template::text("hi"));
//! assert!(index.match_template("hello Tom Smith", "", "").is_some());
//! assert_eq!(index.wildcard_span(Section::Input, "hello Tom Smith", "", "", 1), "Tom Smith");
//! ```

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod subs;
mod template;
mod text;

pub use api::{Kernel, LearnFailure, LearnReport, Options, ResponseDetails, SentenceTrace};
pub use engine::{
    APOLOGY, COMPUTED_PREDICATES, GLOBAL_SESSION, Match, MatchPath, NO_THAT, NO_TOPIC, PatternIndex, ParsedDocument,
    Query, RuleKey, STRICT_VERSION, SectionText, SessionData, Step, Substitutions, Wildcard, WordSub, parse_document,
};
pub use error::{Error, Result};
pub use template::{Element, Node, Tag, TagFlags, TagInfo, Template, Text, Whitespace};
pub use text::sentences;

/// One of the three parts of a match path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The user's sentence.
    Input,
    /// The bot's previous reply.
    That,
    /// The `topic` predicate.
    Topic,
}

impl Section {
    pub(crate) fn index(self) -> usize {
        match self {
            Section::Input => 0,
            Section::That => 1,
            Section::Topic => 2,
        }
    }
}

/// Name and version reported by `<version/>`.
pub fn version() -> String {
    format!("aimlkit {}", env!("CARGO_PKG_VERSION"))
}
