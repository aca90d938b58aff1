//! Per-conversation state.
//!
//! A session holds named predicates, the bounded input and output histories,
//! and the stack of inputs currently being answered (used as the recursion
//! guard). Sessions come into existence the first time anything refers to
//! them and live until [`SessionStore::delete`].

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Session used when the caller does not name one.
pub const GLOBAL_SESSION: &str = "_global";

/// Predicate names that are computed on read instead of stored.
pub const COMPUTED_PREDICATES: &[&str] = &["daypart", "clock"];

/// A defensive copy of one session, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub predicates: BTreeMap<String, String>,
    /// Oldest first.
    pub input_history: Vec<String>,
    /// Oldest first.
    pub output_history: Vec<String>,
    /// Outermost first. Empty between top-level calls.
    pub input_stack: Vec<String>,
}

#[derive(Debug, Default)]
struct Session {
    predicates: HashMap<String, String>,
    inputs: VecDeque<String>,
    outputs: VecDeque<String>,
    stack: Vec<String>,
}

impl Session {
    fn data(&self) -> SessionData {
        SessionData {
            predicates: self.predicates.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            input_history: self.inputs.iter().cloned().collect(),
            output_history: self.outputs.iter().cloned().collect(),
            input_stack: self.stack.clone(),
        }
    }
}

fn push_bounded(queue: &mut VecDeque<String>, item: String, bound: usize) {
    queue.push_back(item);
    while queue.len() > bound {
        queue.pop_front();
    }
}

/// `index` counts back from the newest entry, starting at 1.
fn nth_latest(queue: &VecDeque<String>, index: usize) -> Option<&String> {
    if index == 0 || index > queue.len() {
        return None;
    }
    queue.get(queue.len() - index)
}

#[derive(Debug)]
pub(crate) struct SessionStore {
    sessions: HashMap<String, Session>,
    max_history: usize,
}

impl SessionStore {
    pub(crate) fn new(max_history: usize) -> Self {
        let mut store = SessionStore { sessions: HashMap::new(), max_history };
        store.session(GLOBAL_SESSION);
        store
    }

    fn session(&mut self, id: &str) -> &mut Session {
        if !self.sessions.contains_key(id) {
            log::debug!("creating session '{id}'");
        }
        self.sessions.entry(id.to_string()).or_default()
    }

    /// Predicate value, or `""` when unset.
    pub(crate) fn get(&mut self, name: &str, id: &str) -> String {
        if let Some(value) = computed(name) {
            return value;
        }
        self.session(id).predicates.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn set(&mut self, name: &str, value: &str, id: &str) {
        if COMPUTED_PREDICATES.contains(&name) {
            log::warn!("predicate '{name}' is computed and cannot be set");
            return;
        }
        self.session(id).predicates.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn push_input(&mut self, id: &str, input: &str) {
        let bound = self.max_history;
        push_bounded(&mut self.session(id).inputs, input.to_string(), bound);
    }

    pub(crate) fn push_output(&mut self, id: &str, output: &str) {
        let bound = self.max_history;
        push_bounded(&mut self.session(id).outputs, output.to_string(), bound);
    }

    pub(crate) fn input(&mut self, id: &str, index: usize) -> Option<String> {
        nth_latest(&self.session(id).inputs, index).cloned()
    }

    pub(crate) fn output(&mut self, id: &str, index: usize) -> Option<String> {
        nth_latest(&self.session(id).outputs, index).cloned()
    }

    /// Most recent output, or `""` before the first one.
    pub(crate) fn last_output(&mut self, id: &str) -> String {
        self.output(id, 1).unwrap_or_default()
    }

    /// Push an in-flight input; returns the new stack depth.
    pub(crate) fn enter(&mut self, id: &str, input: &str) -> usize {
        let stack = &mut self.session(id).stack;
        stack.push(input.to_string());
        stack.len()
    }

    pub(crate) fn leave(&mut self, id: &str) {
        if self.session(id).stack.pop().is_none() {
            log::error!("input stack of session '{id}' underflowed");
        }
    }

    pub(crate) fn depth(&mut self, id: &str) -> usize {
        self.session(id).stack.len()
    }

    pub(crate) fn data(&self, id: &str) -> Option<SessionData> {
        self.sessions.get(id).map(Session::data)
    }

    pub(crate) fn all(&self) -> BTreeMap<String, SessionData> {
        self.sessions.iter().map(|(id, session)| (id.clone(), session.data())).collect()
    }

    /// Replace a session wholesale with a snapshot.
    pub(crate) fn restore(&mut self, id: &str, data: SessionData) {
        let bound = self.max_history;
        let mut session = Session {
            predicates: data.predicates.into_iter().collect(),
            inputs: VecDeque::new(),
            outputs: VecDeque::new(),
            stack: Vec::new(),
        };
        for input in data.input_history {
            push_bounded(&mut session.inputs, input, bound);
        }
        for output in data.output_history {
            push_bounded(&mut session.outputs, output, bound);
        }
        self.sessions.insert(id.to_string(), session);
    }

    pub(crate) fn delete(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }
}

fn computed(name: &str) -> Option<String> {
    match name {
        "daypart" => Some(daypart(Local::now().hour()).to_string()),
        "clock" => Some(Local::now().format("%H:%M").to_string()),
        _ => None,
    }
}

fn daypart(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=17 => "afternoon",
        18..=21 => "evening",
        _ => "night",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_created_on_first_reference() {
        let mut store = SessionStore::new(10);
        assert!(store.data("alice").is_none());
        assert_eq!(store.get("name", "alice"), "");
        assert!(store.data("alice").is_some());
        store.set("name", "Alice", "alice");
        assert_eq!(store.get("name", "alice"), "Alice");
        assert_eq!(store.get("name", GLOBAL_SESSION), "");
    }

    #[test]
    fn histories_keep_the_newest_entries() {
        let mut store = SessionStore::new(10);
        for i in 1..=11 {
            store.push_input("s", &format!("input {i}"));
        }
        assert_eq!(store.input("s", 1).as_deref(), Some("input 11"));
        assert_eq!(store.input("s", 10).as_deref(), Some("input 2"));
        assert_eq!(store.input("s", 11), None);
        assert_eq!(store.input("s", 0), None);
        assert_eq!(store.data("s").unwrap().input_history.len(), 10);
    }

    #[test]
    fn stack_depth_tracks_enter_and_leave() {
        let mut store = SessionStore::new(10);
        assert_eq!(store.enter("s", "a"), 1);
        assert_eq!(store.enter("s", "b"), 2);
        store.leave("s");
        assert_eq!(store.depth("s"), 1);
        store.leave("s");
        store.leave("s");
        assert_eq!(store.depth("s"), 0);
    }

    #[test]
    fn computed_predicates_ignore_storage() {
        let mut store = SessionStore::new(10);
        store.set("daypart", "never", "s");
        assert!(["morning", "afternoon", "evening", "night"].contains(&store.get("daypart", "s").as_str()));
        assert_eq!(store.get("clock", "s").len(), 5);
        assert_eq!(daypart(4), "night");
        assert_eq!(daypart(12), "afternoon");
    }

    #[test]
    fn snapshots_restore_and_delete() {
        let mut store = SessionStore::new(2);
        store.set("topic", "fruit", "s");
        store.push_output("s", "one");
        let data = store.data("s").unwrap();
        store.delete("s");
        assert!(store.data("s").is_none());
        store.restore("t", data.clone());
        assert_eq!(store.data("t").unwrap(), data);
        assert!(store.all().contains_key(GLOBAL_SESSION));
    }
}
