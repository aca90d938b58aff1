//! The interpreter: pattern index, sessions, substitution tables and bot
//! predicates behind one `&mut self`.
//!
//! ```text
//! respond(input) ─ sentences ─┬─ push input history
//!                             ├─ answer(sentence) ── enter stack ─ normalize ─ search ─ evaluate ─ leave stack
//!                             │        ^                                                   │
//!                             │        └────────────── <srai> / <sr> ──────────────────────┘
//!                             └─ push output history
//! ```
//!
//! `answer` is the only way into matching and evaluation, so every nested
//! re-entry goes through the recursion guard. The guard is a push before and
//! a pop after with nothing in between that can return early.

use super::graph::{Match, PatternIndex};
use super::metrics::{RespondMetrics, RespondResult, SentenceMetrics};
use super::normalize::Query;
use super::parser::parse_document;
use super::session::SessionStore;
use super::substitute::Substitutions;
use super::wildcard::MatchPath;
use crate::api::{LearnFailure, LearnReport, Options};
use crate::error::{Error, Result};
use crate::template::Template;
use crate::text::sentences;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// What a template is evaluated against.
pub(crate) struct Frame<'a> {
    pub session: &'a str,
    /// `None` for templates evaluated outside of a match.
    pub matched: Option<&'a Match>,
}

pub(crate) struct Interpreter {
    pub(crate) index: PatternIndex,
    pub(crate) sessions: SessionStore,
    pub(crate) subs: Substitutions,
    pub(crate) bot: HashMap<String, String>,
    pub(crate) options: Options,
    pub(crate) rng: StdRng,
}

impl Interpreter {
    pub(crate) fn new(options: Options) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut interpreter = Interpreter {
            index: PatternIndex::new(),
            sessions: SessionStore::new(options.max_history),
            subs: Substitutions::default(),
            bot: HashMap::new(),
            rng,
            options,
        };
        let name = interpreter.options.bot_name.clone();
        interpreter.set_bot_predicate("name", &name);
        interpreter
    }

    pub(crate) fn bot_predicate(&self, name: &str) -> String {
        self.bot.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn set_bot_predicate(&mut self, name: &str, value: &str) {
        self.bot.insert(name.to_string(), value.to_string());
        if name == "name" {
            self.index.set_bot_name(value);
        }
    }

    /// Swap in a restored index, keeping the configured bot name.
    pub(crate) fn replace_index(&mut self, index: PatternIndex) {
        self.index = index;
        let name = self.bot_predicate("name");
        self.index.set_bot_name(&name);
    }

    // --- Learning ---------------------------------------------------------------

    /// Learn every file matching `pattern` (a path or a glob). Relative
    /// patterns resolve against the working directory.
    pub(crate) fn learn(&mut self, pattern: &str) -> Result<LearnReport> {
        let started = Instant::now();
        let absolute = absolutize(Path::new(pattern.trim()));
        let glob_pattern = absolute.to_string_lossy().into_owned();
        let entries = glob::glob(&glob_pattern)
            .map_err(|err| Error::Glob { pattern: pattern.to_string(), message: err.to_string() })?;

        let mut report = LearnReport::default();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    log::warn!("cannot read {}: {}", err.path().display(), err.error());
                    report.failed.push(LearnFailure { path: err.path().to_path_buf(), message: err.error().to_string() });
                    continue;
                }
            };
            match self.learn_file(&path) {
                Ok((rules, errors)) => {
                    report.files += 1;
                    report.rules += rules;
                    report.errors += errors;
                }
                Err(err) => {
                    log::error!("{err}");
                    report.failed.push(LearnFailure { path, message: err.to_string() });
                }
            }
        }
        if report.files == 0 && report.failed.is_empty() {
            log::warn!("no documents match '{pattern}'");
        }
        report.elapsed = started.elapsed();
        log::debug!(
            "learned {} rules from {} documents in {:?} ({} total)",
            report.rules,
            report.files,
            report.elapsed,
            self.index.num_rules()
        );
        Ok(report)
    }

    fn learn_file(&mut self, path: &Path) -> Result<(usize, usize)> {
        log::debug!("loading {}", path.display());
        let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        self.learn_source(&source, &path.display().to_string(), path.parent())
    }

    /// Parse `source` and merge its rules. Relative `<learn>` paths in the
    /// document are anchored at `base`. Returns `(rules, structural errors)`.
    pub(crate) fn learn_source(&mut self, source: &str, origin: &str, base: Option<&Path>) -> Result<(usize, usize)> {
        let parsed = parse_document(source, origin)?;
        let rules = parsed.rules.len();
        for (key, mut template) in parsed.rules {
            if let Some(base) = base {
                template.anchor_learn_paths(base);
            }
            self.index.insert(&key.pattern, &key.that, &key.topic, template);
        }
        if parsed.errors > 0 {
            log::warn!("{origin}: {} categories or elements were dropped", parsed.errors);
        }
        Ok((rules, parsed.errors))
    }

    // --- Responding -------------------------------------------------------------

    /// Answer every sentence of `input` and record the exchange in the
    /// session's histories.
    pub(crate) fn respond(&mut self, input: &str, session: &str) -> RespondResult {
        let started = Instant::now();
        let mut metrics = RespondMetrics::default();
        if input.is_empty() {
            return RespondResult { response: String::new(), metrics };
        }

        for sentence in sentences(input) {
            if sentence.is_empty() {
                continue;
            }
            let begun = Instant::now();
            // History first, so `<input/>` sees the sentence being answered.
            self.sessions.push_input(session, &sentence);
            let (output, path) = self.answer(&sentence, session);
            self.sessions.push_output(session, &output);
            metrics.sentences.push(SentenceMetrics { input: sentence, path, output, duration: begun.elapsed() });
        }

        let response =
            metrics.sentences.iter().map(|s| s.output.as_str()).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
        debug_assert_eq!(self.sessions.depth(session), 0, "input stack not unwound");
        metrics.total = started.elapsed();
        RespondResult { response, metrics }
    }

    /// The guarded entry point shared by top-level sentences and `<srai>`.
    pub(crate) fn answer(&mut self, input: &str, session: &str) -> (String, Option<MatchPath>) {
        if input.is_empty() {
            return (String::new(), None);
        }
        let depth = self.sessions.enter(session, input);
        let result = if depth > self.options.max_recursion_depth {
            log::warn!("maximum recursion depth {} exceeded (input='{input}')", self.options.max_recursion_depth);
            (String::new(), None)
        } else {
            self.answer_unguarded(input, session)
        };
        self.sessions.leave(session);
        result
    }

    fn answer_unguarded(&mut self, input: &str, session: &str) -> (String, Option<MatchPath>) {
        let subbed_input = self.subs.apply("normal", input);
        let that = self.sessions.last_output(session);
        let subbed_that = self.subs.apply("normal", &that);
        let topic = self.sessions.get("topic", session);
        let subbed_topic = self.subs.apply("normal", &topic);

        let query = Query::new(&subbed_input, &subbed_that, &subbed_topic);
        let Some(matched) = self.index.search(&query) else {
            log::warn!("no match found for input: {input}");
            return (String::new(), None);
        };
        log::debug!("'{input}' matched {}", matched.path);

        let template: Arc<Template> = Arc::clone(&matched.template);
        let frame = Frame { session, matched: Some(&matched) };
        let output = self.evaluate(&template.root, &frame).trim().to_string();
        (output, Some(matched.path.clone()))
    }

    /// Evaluate a template with no match context (wildcard tags come out empty).
    pub(crate) fn evaluate_template(&mut self, template: &Template, session: &str) -> String {
        let frame = Frame { session, matched: None };
        self.evaluate(&template.root, &frame).trim().to_string()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(err) => {
            log::warn!("cannot resolve working directory: {err}");
            path.to_path_buf()
        }
    }
}
