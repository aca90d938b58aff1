//! Rule document parser.
//!
//! A streaming state machine over `quick-xml` events. Each `<category>`
//! becomes one `(pattern, that, topic) -> Template` entry.
//!
//! ```text
//! OutsideDocument ─<aiml>─> InsideDocument ─<category>─> InsideCategory
//!                              ^  (<topic name> toggles the topic)  │<pattern>
//!                              │                                    v
//!                      </category>                            InsidePattern
//!                              │                                    │</pattern>
//!                        AfterTemplate                              v
//!                              ^                               AfterPattern ─<that>─> InsideThat
//!                              │</template>                         │                    │</that>
//!                        InsideTemplate <──────<template>───────────┴──── AfterThat <────┘
//! ```
//!
//! ## Errors
//!
//! - Malformed markup (bad nesting, broken entities, truncated input) is
//!   fatal for the document and surfaces as [`Error::Malformed`].
//! - Everything else is structural: it is logged with its location, counted,
//!   and, inside a category, the category is dropped by skipping ahead to its
//!   closing tag. The rest of the document still loads.
//!
//! ## Versions
//!
//! Documents declaring `version="1.0.1"` are strict: an element the parser
//! does not know is an error. Any other version is forward-compatible and
//! silently skips unknown elements together with their content.

use super::validate::{TextAction, check_attributes, check_child, check_text};
use crate::error::{Error, Result};
use crate::template::{Element, Node, Tag, Template, Text, Whitespace};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, HashMap};

/// The version string that switches off forward-compatible mode.
pub const STRICT_VERSION: &str = "1.0.1";

/// Identity of a rule: its three pattern sections as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    pub pattern: String,
    pub that: String,
    pub topic: String,
}

/// Everything a document produced.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    /// Later categories with the same key replace earlier ones.
    pub rules: HashMap<RuleKey, Template>,
    /// Number of structural errors (each one dropped a category or an element).
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    OutsideDocument,
    InsideDocument,
    InsideCategory,
    InsidePattern,
    AfterPattern,
    InsideThat,
    AfterThat,
    InsideTemplate,
    AfterTemplate,
}

impl State {
    fn in_category(self) -> bool {
        self >= State::InsideCategory
    }
}

/// An open template element plus its "default `<li>` already seen" flag.
#[derive(Debug)]
struct Frame {
    element: Element,
    default_seen: bool,
}

type Attrs = BTreeMap<String, String>;

struct DocumentParser<'s> {
    source: &'s str,
    origin: &'s str,
    state: State,
    strict: bool,
    /// Byte offset of the event being handled.
    position: usize,
    /// Number of currently open elements.
    depth: usize,
    /// While set, everything is ignored until the element at this depth closes.
    skip_to: Option<usize>,
    /// Whitespace mode per open element (plus the document default at index 0).
    spaces: Vec<Whitespace>,
    topic: Option<String>,
    category_depth: usize,
    pattern: String,
    that: Option<String>,
    frames: Vec<Frame>,
    out: ParsedDocument,
}

/// Parse one document. `origin` is only used in log and error messages.
pub fn parse_document(source: &str, origin: &str) -> Result<ParsedDocument> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    let mut parser = DocumentParser::new(source, origin);

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => return Err(parser.malformed(reader.error_position() as usize, err.to_string())),
        };
        parser.position = reader.buffer_position() as usize;
        match event {
            Event::Start(start) => {
                let (name, attrs) = parser.element_parts(&start)?;
                parser.start(&name, attrs);
            }
            Event::Empty(start) => {
                let (name, attrs) = parser.element_parts(&start)?;
                parser.start(&name, attrs);
                parser.end(&name);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                parser.end(&name);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|err| parser.malformed(parser.position, err.to_string()))?;
                parser.text(&text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                parser.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    parser.finish()
}

impl<'s> DocumentParser<'s> {
    fn new(source: &'s str, origin: &'s str) -> Self {
        DocumentParser {
            source,
            origin,
            state: State::OutsideDocument,
            strict: false,
            position: 0,
            depth: 0,
            skip_to: None,
            spaces: vec![Whitespace::Default],
            topic: None,
            category_depth: 0,
            pattern: String::new(),
            that: None,
            frames: Vec::new(),
            out: ParsedDocument::default(),
        }
    }

    fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let before = self.source.get(..offset).unwrap_or(self.source);
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map(|tail| tail.chars().count()).unwrap_or(0) + 1;
        (line, column)
    }

    fn malformed(&self, offset: usize, message: String) -> Error {
        let (line, column) = self.line_column(offset);
        Error::Malformed { origin: self.origin.to_string(), line, column, message }
    }

    fn element_parts(&self, start: &BytesStart<'_>) -> Result<(String, Attrs)> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Attrs::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| self.malformed(self.position, err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| self.malformed(self.position, err.to_string()))?;
            attrs.insert(key, value.into_owned());
        }
        Ok((name, attrs))
    }

    /// Record a structural error and decide what to skip.
    fn fail(&mut self, message: String) {
        let (line, column) = self.line_column(self.position);
        log::error!("{}:{line}:{column}: {message}", self.origin);
        self.out.errors += 1;
        if self.state.in_category() {
            self.skip_to = Some(self.category_depth);
        } else {
            self.skip_to = Some(self.depth);
        }
    }

    fn start(&mut self, name: &str, attrs: Attrs) {
        self.depth += 1;
        if self.skip_to.is_some() {
            return;
        }
        let inherited = self.spaces.last().copied().unwrap_or(Whitespace::Default);
        let space = match attrs.get("xml:space") {
            None => inherited,
            Some(value) => match Whitespace::from_attr(value) {
                Some(space) => space,
                None => {
                    self.spaces.push(inherited);
                    self.fail(format!("invalid value '{value}' for xml:space attribute"));
                    return;
                }
            },
        };
        self.spaces.push(space);
        if let Err(message) = self.open(name, attrs) {
            self.fail(message);
        }
    }

    fn open(&mut self, name: &str, attrs: Attrs) -> Result<(), String> {
        match (name, self.state) {
            ("aiml", State::OutsideDocument) => {
                let version = match attrs.get("version") {
                    Some(version) => version.clone(),
                    None => {
                        log::warn!("{}: missing 'version' attribute in <aiml>, assuming 1.0", self.origin);
                        "1.0".to_string()
                    }
                };
                self.strict = version == STRICT_VERSION;
                self.state = State::InsideDocument;
                self.topic = None;
                Ok(())
            }
            ("aiml", _) => Err("unexpected <aiml> tag".to_string()),
            (_, State::OutsideDocument) => {
                log::debug!("{}: ignoring <{name}> outside <aiml>", self.origin);
                self.skip_to = Some(self.depth);
                Ok(())
            }
            ("topic", State::InsideDocument) if self.topic.is_none() => match attrs.get("name") {
                Some(topic) => {
                    self.topic = Some(topic.clone());
                    Ok(())
                }
                None => Err("required 'name' attribute missing in <topic> element".to_string()),
            },
            ("topic", _) => Err("unexpected <topic> tag".to_string()),
            ("category", State::InsideDocument) => {
                self.state = State::InsideCategory;
                self.category_depth = self.depth;
                self.pattern.clear();
                self.that = None;
                self.frames.clear();
                Ok(())
            }
            ("category", _) => Err("unexpected <category> tag".to_string()),
            ("pattern", State::InsideCategory) => {
                self.state = State::InsidePattern;
                Ok(())
            }
            ("pattern", _) => Err("unexpected <pattern> tag".to_string()),
            ("that", State::AfterPattern) => {
                self.state = State::InsideThat;
                self.that = Some(String::new());
                Ok(())
            }
            ("that", state) if state != State::InsideTemplate => Err("unexpected <that> tag".to_string()),
            ("template", State::AfterPattern | State::AfterThat) => {
                self.state = State::InsideTemplate;
                let root = Element::new(Tag::Template);
                self.frames.push(Frame { element: root, default_seen: false });
                Ok(())
            }
            ("template", _) => Err("unexpected <template> tag".to_string()),
            (_, State::InsidePattern | State::InsideThat) => {
                if name == "bot" && attrs.get("name").map(String::as_str) == Some("name") {
                    let section = match self.state {
                        State::InsidePattern => &mut self.pattern,
                        _ => self.that.get_or_insert_with(String::new),
                    };
                    section.push_str(" BOT_NAME ");
                    Ok(())
                } else {
                    Err(format!("unexpected tag <{name}> in pattern section"))
                }
            }
            (_, State::InsideTemplate) if Tag::from_name(name).info().is_some() => self.open_template_element(name, attrs),
            _ => {
                if self.strict {
                    Err(format!("unexpected tag <{name}>"))
                } else {
                    log::debug!("{}: skipping unknown element <{name}>", self.origin);
                    self.skip_to = Some(self.depth);
                    Ok(())
                }
            }
        }
    }

    fn open_template_element(&mut self, name: &str, attrs: Attrs) -> Result<(), String> {
        let tag = Tag::from_name(name);
        check_attributes(&tag, &attrs)?;
        let Some(parent) = self.frames.last_mut() else {
            return Err(format!("element <{name}> outside of a template"));
        };
        check_child(&parent.element, &mut parent.default_seen, &tag, &attrs)?;
        let element = Element { tag, attrs, children: Vec::new() };
        self.frames.push(Frame { element, default_seen: false });
        Ok(())
    }

    fn end(&mut self, name: &str) {
        if let Some(level) = self.skip_to {
            if self.depth == level {
                self.skip_to = None;
                self.spaces.truncate(level);
                if self.state.in_category() && level == self.category_depth {
                    self.abandon_category();
                }
            }
            self.depth = self.depth.saturating_sub(1);
            return;
        }
        let result = self.close(name);
        self.spaces.pop();
        if let Err(message) = result {
            self.fail(message);
            // The failing element has already closed.
            if self.skip_to == Some(self.depth) {
                self.skip_to = None;
                if self.state.in_category() {
                    self.abandon_category();
                }
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn abandon_category(&mut self) {
        self.frames.clear();
        self.state = State::InsideDocument;
    }

    fn close(&mut self, name: &str) -> Result<(), String> {
        match (name, self.state) {
            ("aiml", State::InsideDocument) => {
                self.state = State::OutsideDocument;
                Ok(())
            }
            ("topic", State::InsideDocument) if self.topic.is_some() => {
                self.topic = None;
                Ok(())
            }
            ("category", State::AfterTemplate) => {
                self.commit();
                self.state = State::InsideDocument;
                Ok(())
            }
            ("pattern", State::InsidePattern) => {
                self.state = State::AfterPattern;
                Ok(())
            }
            ("that", State::InsideThat) => {
                self.state = State::AfterThat;
                Ok(())
            }
            ("template", State::InsideTemplate) if self.frames.len() == 1 => {
                self.state = State::AfterTemplate;
                Ok(())
            }
            ("bot", State::InsidePattern | State::InsideThat) => Ok(()),
            (_, State::InsideTemplate) if self.frames.len() > 1 => {
                if let Some(frame) = self.frames.pop() {
                    if let Some(parent) = self.frames.last_mut() {
                        parent.element.children.push(Node::Element(frame.element));
                    }
                }
                Ok(())
            }
            _ => Err(format!("unexpected </{name}> tag")),
        }
    }

    fn text(&mut self, text: &str) {
        if self.skip_to.is_some() {
            return;
        }
        match self.state {
            State::InsidePattern => self.pattern.push_str(text),
            State::InsideThat => self.that.get_or_insert_with(String::new).push_str(text),
            State::InsideTemplate => {
                let space = self.spaces.last().copied().unwrap_or(Whitespace::Default);
                let Some(frame) = self.frames.last_mut() else { return };
                match check_text(&frame.element, text) {
                    Ok(TextAction::Discard) => {}
                    Ok(TextAction::Keep) => {
                        let children = &mut frame.element.children;
                        match children.last_mut() {
                            Some(Node::Text(last)) if last.space() == space => last.push_str(text),
                            _ => children.push(Node::Text(Text::new(text, space))),
                        }
                    }
                    Err(message) => self.fail(message),
                }
            }
            _ => {}
        }
    }

    fn commit(&mut self) {
        let Some(frame) = self.frames.pop() else { return };
        self.frames.clear();
        let key = RuleKey {
            pattern: squash(&self.pattern),
            that: self.that.as_deref().map(squash).unwrap_or_else(|| "*".to_string()),
            topic: self.topic.as_deref().map(squash).unwrap_or_else(|| "*".to_string()),
        };
        log::trace!("{}: learned {:?}", self.origin, key);
        self.out.rules.insert(key, Template { root: frame.element });
    }

    fn finish(self) -> Result<ParsedDocument> {
        if self.depth > 0 {
            return Err(self.malformed(self.source.len(), "unexpected end of document".to_string()));
        }
        Ok(self.out)
    }
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
