//! Match paths and wildcard span recovery.
//!
//! A successful match records every trie edge it took. Wildcard edges also
//! record how many tokens they consumed, so recovering "what did the second
//! `*` match" is a lock-step walk over the path:
//!
//! ```text
//! path:    HELLO  *(2)  HOW ARE YOU  <that>  *(1)  <topic>  *(1)
//! tokens:  HELLO TOM SMITH HOW ARE YOU
//!                ^^^^^^^^^ star 1 of the input section -> tokens 1..3
//! ```
//!
//! Token ranges are then mapped back onto the source words through
//! [`SectionText::original_span`].

use super::normalize::{Query, SectionText};
use crate::Section;
use std::fmt;
use std::ops::Range;

/// The two wildcard kinds. They match identically and differ only in
/// priority (underscore is tried before literals, star after).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    Underscore,
    Star,
}

/// One edge of a match path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A literal word (bot-name edges are recorded as the word they matched).
    Word(String),
    Wildcard { kind: Wildcard, len: usize },
    That,
    Topic,
}

/// The edges a successful match took, root to template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPath {
    steps: Vec<Step>,
}

impl MatchPath {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        MatchPath { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Token range consumed by the `ordinal`-th (1-based) wildcard of
    /// `section`. Both wildcard kinds count towards the ordinal.
    pub fn wildcard_range(&self, section: Section, ordinal: usize) -> Option<Range<usize>> {
        if ordinal == 0 {
            return None;
        }
        let mut current = Section::Input;
        let mut offset = 0;
        let mut seen = 0;
        for step in &self.steps {
            match step {
                Step::That => {
                    current = Section::That;
                    offset = 0;
                }
                Step::Topic => {
                    current = Section::Topic;
                    offset = 0;
                }
                Step::Word(_) if current == section => offset += 1,
                Step::Wildcard { len, .. } if current == section => {
                    seen += 1;
                    if seen == ordinal {
                        return Some(offset..offset + len);
                    }
                    offset += len;
                }
                _ => {}
            }
        }
        None
    }

    /// Number of wildcards in `section`.
    pub fn wildcard_count(&self, section: Section) -> usize {
        let mut current = Section::Input;
        let mut count = 0;
        for step in &self.steps {
            match step {
                Step::That => current = Section::That,
                Step::Topic => current = Section::Topic,
                Step::Wildcard { .. } if current == section => count += 1,
                _ => {}
            }
        }
        count
    }
}

impl fmt::Display for MatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Word(word) => word.clone(),
                Step::Wildcard { kind: Wildcard::Underscore, .. } => "_".to_string(),
                Step::Wildcard { kind: Wildcard::Star, .. } => "*".to_string(),
                Step::That => "<that>".to_string(),
                Step::Topic => "<topic>".to_string(),
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// Source text bound to a wildcard, or `None` when the ordinal does not exist.
pub(crate) fn span_text(query: &Query, path: &MatchPath, section: Section, ordinal: usize) -> Option<String> {
    let range = path.wildcard_range(section, ordinal)?;
    let text: &SectionText = query.section(section);
    Some(text.original_span(range.start, range.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str) -> Step {
        Step::Word(w.to_string())
    }

    fn star(len: usize) -> Step {
        Step::Wildcard { kind: Wildcard::Star, len }
    }

    #[test]
    fn ranges_are_counted_per_section() {
        let path = MatchPath::new(vec![
            word("HELLO"),
            star(2),
            word("HOW"),
            Step::Wildcard { kind: Wildcard::Underscore, len: 1 },
            Step::That,
            star(3),
            Step::Topic,
            star(1),
        ]);
        assert_eq!(path.wildcard_range(Section::Input, 1), Some(1..3));
        assert_eq!(path.wildcard_range(Section::Input, 2), Some(4..5));
        assert_eq!(path.wildcard_range(Section::Input, 3), None);
        assert_eq!(path.wildcard_range(Section::That, 1), Some(0..3));
        assert_eq!(path.wildcard_range(Section::Topic, 1), Some(0..1));
        assert_eq!(path.wildcard_range(Section::Topic, 0), None);
        assert_eq!(path.wildcard_count(Section::Input), 2);
        assert_eq!(path.to_string(), "HELLO * HOW _ <that> * <topic> *");
    }

    #[test]
    fn spans_come_from_the_source_text() {
        let query = Query::new("Hello Tom Smith, how are you", "", "");
        let path = MatchPath::new(vec![
            word("HELLO"),
            star(2),
            word("HOW"),
            word("ARE"),
            word("YOU"),
            Step::That,
            star(1),
            Step::Topic,
            star(1),
        ]);
        assert_eq!(span_text(&query, &path, Section::Input, 1).as_deref(), Some("Tom Smith,"));
        assert_eq!(span_text(&query, &path, Section::That, 1).as_deref(), Some(""));
        assert_eq!(span_text(&query, &path, Section::Input, 2), None);
    }
}
