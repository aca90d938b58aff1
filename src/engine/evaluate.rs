//! Template evaluation: one exhaustive `match` over [`Tag`].
//!
//! Behaviour by group:
//!
//! | group            | tags                                                               |
//! |------------------|--------------------------------------------------------------------|
//! | concatenation    | `template`, `li`                                                   |
//! | silent           | `think`, `gossip`, `javascript`                                    |
//! | transforms       | `formal`, `sentence`, `uppercase`, `lowercase`, `gender`, `person`, `person2` |
//! | predicates       | `get`, `set`, `bot`, `id`, `size`, `version`, `date`               |
//! | history          | `input`, `that`, `star`, `thatstar`, `topicstar`                   |
//! | control flow     | `condition`, `random`                                              |
//! | re-entry         | `srai`, `sr`, `learn`                                              |
//! | side effects     | `system`                                                           |
//!
//! Nothing in here fails: problems are logged and produce empty text.

use super::interpreter::{Frame, Interpreter};
use super::system;
use crate::Section;
use crate::template::{Element, Node, Tag, TagFlags};
use crate::text::{capitalize_first_word, capwords, sentences};
use chrono::Local;
use rand::seq::SliceRandom;

/// `asctime`-style timestamp for `<date/>`.
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

impl Interpreter {
    pub(crate) fn evaluate(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        match &el.tag {
            Tag::Template | Tag::Li => self.children(el, frame),

            Tag::Think => {
                self.children(el, frame);
                String::new()
            }
            Tag::Gossip => {
                let said = self.children(el, frame);
                log::info!("gossip from '{}': {said}", frame.session);
                String::new()
            }
            Tag::Javascript => {
                self.children(el, frame);
                log::debug!("<javascript> is not executed");
                String::new()
            }

            Tag::Formal => capwords(&self.content(el, frame)),
            Tag::Sentence => capitalize_first_word(&self.content(el, frame)),
            Tag::Uppercase => self.content(el, frame).to_uppercase(),
            Tag::Lowercase => self.content(el, frame).to_lowercase(),
            Tag::Gender | Tag::Person | Tag::Person2 => {
                let content = self.content(el, frame);
                self.subs.apply(el.tag.name(), &content)
            }

            Tag::Get => {
                let name = el.attr("name").unwrap_or_default();
                self.sessions.get(name, frame.session)
            }
            Tag::Set => {
                let value = self.children(el, frame);
                let name = el.attr("name").unwrap_or_default();
                self.sessions.set(name, &value, frame.session);
                value
            }
            Tag::Bot => self.bot_predicate(el.attr("name").unwrap_or_default()),
            Tag::Id => frame.session.to_string(),
            Tag::Size => self.index.num_rules().to_string(),
            Tag::Version => crate::version(),
            Tag::Date => Local::now().format(DATE_FORMAT).to_string(),

            Tag::Input => {
                let index = index_attr(el);
                self.sessions.input(frame.session, index).unwrap_or_else(|| {
                    log::warn!("no input history entry {index} in session '{}'", frame.session);
                    String::new()
                })
            }
            Tag::That => self.that(el, frame),
            Tag::Star => self.wildcard(Section::Input, index_attr(el), frame),
            Tag::Thatstar => self.wildcard(Section::That, index_attr(el), frame),
            Tag::Topicstar => self.wildcard(Section::Topic, index_attr(el), frame),

            Tag::Condition => self.condition(el, frame),
            Tag::Random => self.random(el, frame),

            Tag::Srai => {
                let input = self.children(el, frame);
                self.answer(input.trim(), frame.session).0
            }
            Tag::Sr => {
                let star = self.wildcard(Section::Input, 1, frame);
                self.answer(star.trim(), frame.session).0
            }
            Tag::Learn => {
                let pattern = self.children(el, frame);
                match self.learn(pattern.trim()) {
                    Ok(report) => log::info!("<learn> loaded {} rules from {} documents", report.rules, report.files),
                    Err(err) => log::warn!("<learn> failed: {err}"),
                }
                String::new()
            }
            Tag::System => {
                let command = self.children(el, frame);
                system::run(&command)
            }

            Tag::Other(name) => {
                log::warn!("no handler for <{name}> element");
                String::new()
            }
        }
    }

    fn node(&mut self, node: &Node, frame: &Frame<'_>) -> String {
        match node {
            Node::Text(text) => text.render().to_string(),
            Node::Element(el) => self.evaluate(el, frame),
        }
    }

    fn children(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        let mut out = String::new();
        for child in &el.children {
            out.push_str(&self.node(child, frame));
        }
        out
    }

    /// Children of a transform tag; an empty one stands for `<star/>`.
    fn content(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        let shorthand = el.tag.info().is_some_and(|info| info.flags.contains(TagFlags::STAR_SHORTHAND));
        if shorthand && el.children.is_empty() {
            self.wildcard(Section::Input, 1, frame)
        } else {
            self.children(el, frame)
        }
    }

    fn wildcard(&mut self, section: Section, index: usize, frame: &Frame<'_>) -> String {
        let Some(matched) = frame.matched else {
            log::warn!("wildcard reference outside of a match");
            return String::new();
        };
        matched.wildcard(section, index).unwrap_or_else(|| {
            log::warn!("no wildcard {index} in the {section:?} section of {}", matched.path);
            String::new()
        })
    }

    /// `<that index="x"/>` is the x-th previous response; `"x,y"` narrows it
    /// to its y-th sentence counted from the end.
    fn that(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        let raw = el.attr("index").unwrap_or("1");
        let (response, sentence) = match raw.split_once(',') {
            Some((x, y)) => (parse_index(x), Some(parse_index(y))),
            None => (parse_index(raw), None),
        };
        let Some(output) = self.sessions.output(frame.session, response) else {
            log::warn!("no output history entry {response} in session '{}'", frame.session);
            return String::new();
        };
        let Some(sentence) = sentence else { return output };
        let parts: Vec<String> = sentences(&output).into_iter().filter(|s| !s.is_empty()).collect();
        match sentence.checked_sub(1).and_then(|back| parts.len().checked_sub(back + 1)) {
            Some(at) => parts[at].clone(),
            None => {
                log::warn!("response {response} has no sentence {sentence}");
                String::new()
            }
        }
    }

    fn condition(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        let name = el.attr("name");
        if let (Some(name), Some(value)) = (name, el.attr("value")) {
            return if self.sessions.get(name, frame.session) == value {
                self.children(el, frame)
            } else {
                String::new()
            };
        }

        let mut fallback: Option<&Element> = None;
        for item in el.items() {
            match (item.attr("name").or(name), item.attr("value")) {
                (Some(predicate), Some(value)) => {
                    if self.sessions.get(predicate, frame.session) == value {
                        return self.children(item, frame);
                    }
                }
                _ if item.plain_attrs().next().is_none() => {
                    if fallback.is_none() {
                        fallback = Some(item);
                    } else {
                        log::warn!("ignoring extra default <li> in <condition>");
                    }
                }
                _ => log::warn!("skipping <li> without a usable name/value pair"),
            }
        }
        match fallback {
            Some(item) => self.children(item, frame),
            None => String::new(),
        }
    }

    fn random(&mut self, el: &Element, frame: &Frame<'_>) -> String {
        let items: Vec<&Element> = el.items().collect();
        match items.choose(&mut self.rng).copied() {
            Some(item) => self.children(item, frame),
            None => String::new(),
        }
    }
}

fn parse_index(raw: &str) -> usize {
    raw.trim().parse().unwrap_or(1)
}

fn index_attr(el: &Element) -> usize {
    el.attr("index").map(parse_index).unwrap_or(1)
}
