//! Structural checks applied to template elements while they are parsed.
//!
//! Every check returns `Err(message)`; the document parser turns that into a
//! counted, logged error and discards the enclosing category.

use crate::template::{Element, Tag, TagFlags};
use std::collections::BTreeMap;

/// What to do with a run of character data inside a template element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextAction {
    Keep,
    Discard,
}

fn plain<'a>(attrs: &'a BTreeMap<String, String>) -> impl Iterator<Item = &'a str> {
    attrs.keys().map(String::as_str).filter(|k| !k.contains(':'))
}

/// `<random>` and the list forms of `<condition>` hold nothing but `<li>`.
pub(crate) fn holds_items_only(el: &Element) -> bool {
    match el.tag {
        Tag::Random => true,
        Tag::Condition => !(el.attrs.contains_key("name") && el.attrs.contains_key("value")),
        _ => false,
    }
}

/// Attribute checks for one element, independent of its parent.
pub(crate) fn check_attributes(tag: &Tag, attrs: &BTreeMap<String, String>) -> Result<(), String> {
    let Some(info) = tag.info() else {
        return Err(format!("unknown element <{}>", tag.name()));
    };
    for required in info.required {
        if !attrs.contains_key(*required) {
            return Err(format!("required '{required}' attribute missing in <{}> element", tag.name()));
        }
    }
    for name in plain(attrs) {
        if !info.required.contains(&name) && !info.optional.contains(&name) {
            return Err(format!("unexpected '{name}' attribute in <{}> element", tag.name()));
        }
    }

    if let Some(index) = attrs.get("index") {
        match tag {
            Tag::That => check_that_index(index)?,
            _ => {
                check_positive(index)?;
            }
        }
    }

    if *tag == Tag::Condition && attrs.contains_key("value") && !attrs.contains_key("name") {
        return Err("<condition> has a 'value' attribute but no 'name'".to_string());
    }
    Ok(())
}

fn check_positive(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err(format!("index must be a positive integer, found '{value}'")),
        Err(_) => Err(format!("bad type for index attribute (expected integer, found '{value}')")),
    }
}

/// `<that index="x"/>` or `<that index="x,y"/>`.
fn check_that_index(value: &str) -> Result<(), String> {
    match value.split_once(',') {
        Some((response, sentence)) => {
            check_positive(response)?;
            check_positive(sentence)?;
        }
        None => {
            check_positive(value)?;
        }
    }
    Ok(())
}

/// Checks that depend on the containing element. `default_seen` is the
/// per-container "already has a default `<li>`" flag and is updated here.
pub(crate) fn check_child(
    parent: &Element,
    default_seen: &mut bool,
    child: &Tag,
    attrs: &BTreeMap<String, String>,
) -> Result<(), String> {
    let flags = parent.tag.info().map(|info| info.flags).unwrap_or(TagFlags::empty());
    if !flags.contains(TagFlags::CONTAINER) {
        return Err(format!("<{}> elements cannot have any contents", parent.tag.name()));
    }

    let items_only = holds_items_only(parent);
    if items_only && *child != Tag::Li {
        return Err(format!("<{}> elements can only contain <li> subelements", parent.tag.name()));
    }
    if *child != Tag::Li {
        return Ok(());
    }
    if !items_only {
        return Err(format!("unexpected <li> element contained by <{}> element", parent.tag.name()));
    }

    let names: Vec<&str> = plain(attrs).collect();
    match parent.tag {
        Tag::Random if names.is_empty() => Ok(()),
        Tag::Random => Err("<li> inside <random> cannot have attributes".to_string()),
        _ if names.is_empty() => {
            if *default_seen {
                return Err("unexpected second default <li> element inside <condition>".to_string());
            }
            *default_seen = true;
            Ok(())
        }
        _ if parent.attrs.contains_key("name") => {
            if names == ["value"] { Ok(()) } else { Err("invalid <li> inside single-predicate <condition>".to_string()) }
        }
        _ => {
            // BTreeMap keys come out sorted.
            if names == ["name", "value"] {
                Ok(())
            } else {
                Err("invalid <li> inside multi-predicate <condition>".to_string())
            }
        }
    }
}

/// Character data inside `parent`.
pub(crate) fn check_text(parent: &Element, text: &str) -> Result<TextAction, String> {
    let blank = text.trim().is_empty();
    let flags = parent.tag.info().map(|info| info.flags).unwrap_or(TagFlags::empty());
    if !flags.contains(TagFlags::CONTAINER) || holds_items_only(parent) {
        return if blank {
            Ok(TextAction::Discard)
        } else {
            Err(format!("unexpected text inside <{}> element", parent.tag.name()))
        };
    }
    Ok(TextAction::Keep)
}
