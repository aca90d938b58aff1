//! Template abstract syntax.
//!
//! A template is a tree of [`Node`]s rooted at a `<template>` [`Element`].
//! Elements carry a closed [`Tag`], their attributes and ordered children;
//! text leaves carry raw character data plus the whitespace mode that was in
//! effect where they appeared in the source.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Whitespace handling for a text leaf (`xml:space`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Whitespace {
    /// Runs of whitespace collapse to one space when rendered.
    Default,
    /// Text is rendered verbatim.
    Preserve,
}

impl Whitespace {
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Whitespace::Default),
            "preserve" => Some(Whitespace::Preserve),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Content model of a template tag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagFlags: u8 {
        /// May hold child elements and text. Atomic tags (`<star/>`) may not.
        const CONTAINER      = 1 << 0;
        /// Only `<li>` children; whitespace between them is discarded.
        const ITEMS_ONLY     = 1 << 1;
        /// An empty instance means "apply to `<star/>`".
        const STAR_SHORTHAND = 1 << 2;
    }
}

/// Validation info for one tag: required attributes, optional attributes and
/// its content model.
#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub flags: TagFlags,
}

impl TagInfo {
    const fn new(required: &'static [&'static str], optional: &'static [&'static str], flags: TagFlags) -> Self {
        TagInfo { required, optional, flags }
    }
}

/// Every element the evaluator knows how to run.
///
/// `Other` only exists for trees built by hand (or restored from an older
/// brain); the document parser never produces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Bot,
    Condition,
    Date,
    Formal,
    Gender,
    Get,
    Gossip,
    Id,
    Input,
    Javascript,
    Learn,
    Li,
    Lowercase,
    Person,
    Person2,
    Random,
    Sentence,
    Set,
    Size,
    Sr,
    Srai,
    Star,
    System,
    Template,
    That,
    Thatstar,
    Think,
    Topicstar,
    Uppercase,
    Version,
    Other(String),
}

impl Tag {
    /// Look up a tag by its element name. Unknown names map to [`Tag::Other`].
    pub fn from_name(name: &str) -> Tag {
        match name {
            "bot" => Tag::Bot,
            "condition" => Tag::Condition,
            "date" => Tag::Date,
            "formal" => Tag::Formal,
            "gender" => Tag::Gender,
            "get" => Tag::Get,
            "gossip" => Tag::Gossip,
            "id" => Tag::Id,
            "input" => Tag::Input,
            "javascript" => Tag::Javascript,
            "learn" => Tag::Learn,
            "li" => Tag::Li,
            "lowercase" => Tag::Lowercase,
            "person" => Tag::Person,
            "person2" => Tag::Person2,
            "random" => Tag::Random,
            "sentence" => Tag::Sentence,
            "set" => Tag::Set,
            "size" => Tag::Size,
            "sr" => Tag::Sr,
            "srai" => Tag::Srai,
            "star" => Tag::Star,
            "system" => Tag::System,
            "template" => Tag::Template,
            "that" => Tag::That,
            "thatstar" => Tag::Thatstar,
            "think" => Tag::Think,
            "topicstar" => Tag::Topicstar,
            "uppercase" => Tag::Uppercase,
            "version" => Tag::Version,
            other => Tag::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Bot => "bot",
            Tag::Condition => "condition",
            Tag::Date => "date",
            Tag::Formal => "formal",
            Tag::Gender => "gender",
            Tag::Get => "get",
            Tag::Gossip => "gossip",
            Tag::Id => "id",
            Tag::Input => "input",
            Tag::Javascript => "javascript",
            Tag::Learn => "learn",
            Tag::Li => "li",
            Tag::Lowercase => "lowercase",
            Tag::Person => "person",
            Tag::Person2 => "person2",
            Tag::Random => "random",
            Tag::Sentence => "sentence",
            Tag::Set => "set",
            Tag::Size => "size",
            Tag::Sr => "sr",
            Tag::Srai => "srai",
            Tag::Star => "star",
            Tag::System => "system",
            Tag::Template => "template",
            Tag::That => "that",
            Tag::Thatstar => "thatstar",
            Tag::Think => "think",
            Tag::Topicstar => "topicstar",
            Tag::Uppercase => "uppercase",
            Tag::Version => "version",
            Tag::Other(name) => name,
        }
    }

    /// Validation table. `None` for [`Tag::Other`].
    pub fn info(&self) -> Option<TagInfo> {
        const NONE: &[&str] = &[];
        const INDEX: &[&str] = &["index"];
        const NAME: &[&str] = &["name"];
        const NAME_VALUE: &[&str] = &["name", "value"];
        let atomic = TagFlags::empty();
        let container = TagFlags::CONTAINER;
        let transform = TagFlags::CONTAINER | TagFlags::STAR_SHORTHAND;

        let info = match self {
            Tag::Bot => TagInfo::new(NAME, NONE, atomic),
            Tag::Condition => TagInfo::new(NONE, NAME_VALUE, container),
            Tag::Date => TagInfo::new(NONE, NONE, atomic),
            Tag::Formal => TagInfo::new(NONE, NONE, transform),
            Tag::Gender => TagInfo::new(NONE, NONE, transform),
            Tag::Get => TagInfo::new(NAME, NONE, atomic),
            Tag::Gossip => TagInfo::new(NONE, NONE, container),
            Tag::Id => TagInfo::new(NONE, NONE, atomic),
            Tag::Input => TagInfo::new(NONE, INDEX, atomic),
            Tag::Javascript => TagInfo::new(NONE, NONE, container),
            Tag::Learn => TagInfo::new(NONE, NONE, container),
            Tag::Li => TagInfo::new(NONE, NAME_VALUE, container),
            Tag::Lowercase => TagInfo::new(NONE, NONE, transform),
            Tag::Person => TagInfo::new(NONE, NONE, transform),
            Tag::Person2 => TagInfo::new(NONE, NONE, transform),
            Tag::Random => TagInfo::new(NONE, NONE, container | TagFlags::ITEMS_ONLY),
            Tag::Sentence => TagInfo::new(NONE, NONE, transform),
            Tag::Set => TagInfo::new(NAME, NONE, container),
            Tag::Size => TagInfo::new(NONE, NONE, atomic),
            Tag::Sr => TagInfo::new(NONE, NONE, atomic),
            Tag::Srai => TagInfo::new(NONE, NONE, container),
            Tag::Star => TagInfo::new(NONE, INDEX, atomic),
            Tag::System => TagInfo::new(NONE, NONE, container),
            Tag::Template => TagInfo::new(NONE, NONE, container),
            Tag::That => TagInfo::new(NONE, INDEX, atomic),
            Tag::Thatstar => TagInfo::new(NONE, INDEX, atomic),
            Tag::Think => TagInfo::new(NONE, NONE, container),
            Tag::Topicstar => TagInfo::new(NONE, INDEX, atomic),
            Tag::Uppercase => TagInfo::new(NONE, NONE, transform),
            Tag::Version => TagInfo::new(NONE, NONE, atomic),
            Tag::Other(_) => return None,
        };
        Some(info)
    }
}

/// A raw text leaf.
///
/// In [`Whitespace::Default`] mode the collapsed form is computed on first
/// render and cached; rendering never changes the stored source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    raw: String,
    space: Whitespace,
    #[serde(skip)]
    collapsed: OnceCell<String>,
}

impl Text {
    pub fn new(raw: impl Into<String>, space: Whitespace) -> Self {
        Text { raw: raw.into(), space, collapsed: OnceCell::new() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn space(&self) -> Whitespace {
        self.space
    }

    pub(crate) fn push_str(&mut self, more: &str) {
        self.raw.push_str(more);
        self.collapsed = OnceCell::new();
    }

    /// The text as the evaluator emits it.
    pub fn render(&self) -> &str {
        match self.space {
            Whitespace::Preserve => &self.raw,
            Whitespace::Default => self.collapsed.get_or_init(|| crate::text::collapse_whitespace(&self.raw)),
        }
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.space == other.space
    }
}

/// A template element: tag, attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: Tag,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Element { tag, attrs: BTreeMap::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Attributes that take part in validation (namespaced ones such as
    /// `xml:space` are ignored).
    pub fn plain_attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().filter(|(k, _)| !k.contains(':')).map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate the `<li>` children, skipping anything else.
    pub fn items(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) if el.tag == Tag::Li => Some(el),
            _ => None,
        })
    }
}

/// A template tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Text(Text),
    Element(Element),
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(Text::new(text, Whitespace::Default))
    }
}

/// The root of one rule's response tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub root: Element,
}

impl Template {
    /// Wrap children in a `<template>` root.
    pub fn new(children: Vec<Node>) -> Self {
        Template { root: Element { tag: Tag::Template, attrs: BTreeMap::new(), children } }
    }

    /// Convenience for a template consisting of one text leaf.
    pub fn text(text: &str) -> Self {
        Template::new(vec![Node::from(text)])
    }

    /// Rewrite literal relative `<learn>` paths so they resolve against `base`
    /// (the directory of the document the template came from).
    pub(crate) fn anchor_learn_paths(&mut self, base: &Path) {
        fn visit(el: &mut Element, base: &Path) {
            if el.tag == Tag::Learn {
                if let [Node::Text(text)] = el.children.as_mut_slice() {
                    let literal = text.raw().trim().to_string();
                    if !literal.is_empty() && Path::new(&literal).is_relative() {
                        let anchored = base.join(&literal).to_string_lossy().into_owned();
                        *text = Text::new(anchored, text.space());
                    }
                }
                return;
            }
            for child in &mut el.children {
                if let Node::Element(inner) = child {
                    visit(inner, base);
                }
            }
        }
        visit(&mut self.root, base);
    }
}
