use crate::engine::{self, Interpreter, RespondResult};
use crate::error::Result;
use crate::engine::SessionData;
use crate::template::Template;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Kernel configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Initial value of the `name` bot predicate (also what the bot-name
    /// placeholder in patterns matches).
    pub bot_name: String,
    /// Bound on each session's input and output history.
    pub max_history: usize,
    /// Deepest allowed nesting of `<srai>` re-entries per session.
    pub max_recursion_depth: usize,
    /// Seed for `<random>`; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options { bot_name: "Nameless".to_string(), max_history: 10, max_recursion_depth: 100, seed: None }
    }
}

/// A document that could not be loaded during [`Kernel::learn`].
#[derive(Debug, Clone)]
pub struct LearnFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Summary of one [`Kernel::learn`] call.
#[derive(Debug, Clone, Default)]
pub struct LearnReport {
    /// Documents parsed successfully.
    pub files: usize,
    /// Categories read from those documents (re-learned triples included).
    pub rules: usize,
    /// Structural errors; each dropped one category or element.
    pub errors: usize,
    /// Documents rejected as a whole (unreadable or malformed).
    pub failed: Vec<LearnFailure>,
    pub elapsed: Duration,
}

/// Per-sentence trace in [`ResponseDetails`].
#[derive(Debug, Clone)]
pub struct SentenceTrace {
    pub input: String,
    /// The rule path that answered, e.g. `HELLO * <that> * <topic> *`.
    pub matched: Option<String>,
    pub output: String,
    pub duration: Duration,
}

/// Result of [`Kernel::respond_verbose`].
#[derive(Debug, Clone)]
pub struct ResponseDetails {
    pub response: String,
    pub sentences: Vec<SentenceTrace>,
    pub total: Duration,
}

/// The conversational engine.
///
/// All state (rules, sessions, substitution tables, bot predicates) sits
/// behind one lock. Every public method takes it for its whole duration, so
/// top-level calls from any number of threads run one at a time. Nested work
/// triggered by a template (`<srai>`, `<learn>`) runs on the already-locked
/// interpreter and never touches the lock again.
///
/// # Example
/// ```
/// use aimlkit::{GLOBAL_SESSION, Kernel};
///
/// let kernel = Kernel::new();
/// kernel
///     .learn_str(r#"<aiml version="1.0.1"><category><pattern>HELLO *</pattern>
///                   <template>Hi <star/>!</template></category></aiml>"#)
///     .unwrap();
/// assert_eq!(kernel.respond("Hello there", GLOBAL_SESSION), "Hi there!");
/// ```
pub struct Kernel {
    inner: Mutex<Interpreter>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Kernel { inner: Mutex::new(Interpreter::new(options)) }
    }

    /// Load a brain (if given), learn each path pattern, then run each
    /// command through the responder in the global session.
    pub fn bootstrap(&self, brain: Option<&Path>, learn: &[&str], commands: &[&str]) -> Result<()> {
        let started = Instant::now();
        if let Some(brain) = brain {
            self.load_brain(brain)?;
        }
        for pattern in learn {
            self.learn(pattern)?;
        }
        for command in commands {
            let out = self.inner.lock().respond(command, crate::GLOBAL_SESSION).response;
            log::info!("{out}");
        }
        log::debug!("bootstrap completed in {:?}", started.elapsed());
        Ok(())
    }

    /// Learn every document matching `pattern` (a path or glob). Documents
    /// that fail as a whole are listed in the report; only a bad glob is an
    /// error.
    pub fn learn(&self, pattern: &str) -> Result<LearnReport> {
        self.inner.lock().learn(pattern)
    }

    /// Learn a document held in memory. Malformed markup is an error.
    pub fn learn_str(&self, source: &str) -> Result<LearnReport> {
        let started = Instant::now();
        let (rules, errors) = self.inner.lock().learn_source(source, "<string>", None)?;
        Ok(LearnReport { files: 1, rules, errors, failed: Vec::new(), elapsed: started.elapsed() })
    }

    /// Answer `input` in `session`.
    pub fn respond(&self, input: &str, session: &str) -> String {
        self.inner.lock().respond(input, session).response
    }

    /// [`Kernel::respond`] plus the matched path and timing of every sentence.
    pub fn respond_verbose(&self, input: &str, session: &str) -> ResponseDetails {
        let RespondResult { response, metrics } = self.inner.lock().respond(input, session);
        let sentences = metrics
            .sentences
            .into_iter()
            .map(|s| SentenceTrace {
                input: s.input,
                matched: s.path.map(|path| path.to_string()),
                output: s.output,
                duration: s.duration,
            })
            .collect();
        ResponseDetails { response, sentences, total: metrics.total }
    }

    /// Evaluate a template outside of any match, as if it had been matched
    /// in `session`.
    pub fn evaluate(&self, template: &Template, session: &str) -> String {
        self.inner.lock().evaluate_template(template, session)
    }

    pub fn predicate(&self, name: &str, session: &str) -> String {
        self.inner.lock().sessions.get(name, session)
    }

    pub fn set_predicate(&self, name: &str, value: &str, session: &str) {
        self.inner.lock().sessions.set(name, value, session);
    }

    pub fn bot_predicate(&self, name: &str) -> String {
        self.inner.lock().bot_predicate(name)
    }

    /// Setting `name` also changes what the bot-name placeholder matches.
    pub fn set_bot_predicate(&self, name: &str, value: &str) {
        self.inner.lock().set_bot_predicate(name, value);
    }

    pub fn num_rules(&self) -> usize {
        self.inner.lock().index.num_rules()
    }

    /// Every learned path, rendered as `PATTERN <that> THAT <topic> TOPIC`.
    pub fn rule_paths(&self) -> Vec<String> {
        self.inner.lock().index.paths()
    }

    pub fn save_brain(&self, path: impl AsRef<Path>) -> Result<()> {
        engine::brain::save(&self.inner.lock().index, path.as_ref())
    }

    /// Replace every learned rule with the brain at `path`.
    pub fn load_brain(&self, path: impl AsRef<Path>) -> Result<()> {
        let index = engine::brain::load(path.as_ref())?;
        self.inner.lock().replace_index(index);
        Ok(())
    }

    /// The brain as bytes, for callers that store it themselves.
    pub fn brain_snapshot(&self) -> Result<Vec<u8>> {
        engine::brain::encode(&self.inner.lock().index)
    }

    pub fn restore_brain(&self, bytes: &[u8]) -> Result<()> {
        let index = engine::brain::decode(bytes)?;
        self.inner.lock().replace_index(index);
        Ok(())
    }

    /// Install substitution tables from a TOML file; see
    /// [`crate::Substitutions::load_toml`]. Returns the table names.
    pub fn load_substitutions(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| crate::Error::io(path, err))?;
        self.inner.lock().subs.load_toml(&source, &path.display().to_string())
    }

    /// Run `text` through substitution table `table`.
    pub fn substitute(&self, table: &str, text: &str) -> String {
        self.inner.lock().subs.apply(table, text)
    }

    /// A copy of one session, or `None` if it was never referenced.
    pub fn session_data(&self, session: &str) -> Option<SessionData> {
        self.inner.lock().sessions.data(session)
    }

    /// Copies of every session, by id.
    pub fn sessions(&self) -> BTreeMap<String, SessionData> {
        self.inner.lock().sessions.all()
    }

    pub fn restore_session(&self, session: &str, data: SessionData) {
        self.inner.lock().sessions.restore(session, data);
    }

    pub fn delete_session(&self, session: &str) -> bool {
        self.inner.lock().sessions.delete(session)
    }

    pub fn version(&self) -> String {
        crate::version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GLOBAL_SESSION;
    use std::fs;
    use std::sync::Arc;

    const GREETINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="1.0.1">
  <category><pattern>HELLO</pattern><template>Hi there.</template></category>
  <category><pattern>MY NAME IS *</pattern><template><think><set name="name"><formal><star/></formal></set></think>Nice to meet you, <get name="name"/>.</template></category>
</aiml>"#;

    #[test]
    fn learn_str_and_respond() {
        let kernel = Kernel::new();
        let report = kernel.learn_str(GREETINGS).unwrap();
        assert_eq!((report.files, report.rules, report.errors), (1, 2, 0));
        assert_eq!(kernel.num_rules(), 2);
        assert_eq!(kernel.respond("hello", GLOBAL_SESSION), "Hi there.");
        assert_eq!(kernel.respond("my name is ada lovelace", "ada"), "Nice to meet you, Ada Lovelace.");
        assert_eq!(kernel.predicate("name", "ada"), "Ada Lovelace");
        assert_eq!(kernel.predicate("name", GLOBAL_SESSION), "");
    }

    #[test]
    fn learn_reads_globs_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.aiml"), GREETINGS).unwrap();
        fs::write(dir.path().join("b.aiml"), "<aiml><category>").unwrap();
        let kernel = Kernel::new();
        let pattern = dir.path().join("*.aiml");
        let report = kernel.learn(&pattern.to_string_lossy()).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].path.ends_with("b.aiml"));
        assert_eq!(kernel.num_rules(), 2);

        let none = kernel.learn(&dir.path().join("*.missing").to_string_lossy()).unwrap();
        assert_eq!(none.files, 0);
        assert!(kernel.learn("[").is_err());
    }

    #[test]
    fn verbose_responses_carry_paths() {
        let kernel = Kernel::new();
        kernel.learn_str(GREETINGS).unwrap();
        let details = kernel.respond_verbose("Hello. Goodbye.", GLOBAL_SESSION);
        assert_eq!(details.response, "Hi there.");
        assert_eq!(details.sentences.len(), 2);
        assert_eq!(details.sentences[0].matched.as_deref(), Some("HELLO <that> * <topic> *"));
        assert_eq!(details.sentences[1].matched, None);
        assert!(details.total >= details.sentences[0].duration);
    }

    #[test]
    fn brain_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.brn");
        let kernel = Kernel::new();
        kernel.learn_str(GREETINGS).unwrap();
        kernel.save_brain(&path).unwrap();

        let restored = Kernel::new();
        restored.load_brain(&path).unwrap();
        assert_eq!(restored.num_rules(), 2);
        assert_eq!(restored.rule_paths(), kernel.rule_paths());
        assert_eq!(restored.respond("my name is bob", "s"), "Nice to meet you, Bob.");
    }

    #[test]
    fn substitutions_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.toml");
        fs::write(&path, "[gender]\nhe = \"they\"\n").unwrap();
        let kernel = Kernel::new();
        assert_eq!(kernel.load_substitutions(&path).unwrap(), vec!["gender".to_string()]);
        assert_eq!(kernel.substitute("gender", "he said"), "they said");
        assert!(kernel.load_substitutions(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn sessions_are_inspectable() {
        let kernel = Kernel::new();
        kernel.learn_str(GREETINGS).unwrap();
        kernel.respond("hello", "s1");
        let data = kernel.session_data("s1").unwrap();
        assert_eq!(data.input_history, vec!["hello"]);
        assert_eq!(data.output_history, vec!["Hi there."]);
        assert!(data.input_stack.is_empty());
        assert!(kernel.sessions().contains_key(GLOBAL_SESSION));
        assert!(kernel.delete_session("s1"));
        assert!(kernel.session_data("s1").is_none());
    }

    #[test]
    fn concurrent_callers_are_serialized() {
        let kernel = Arc::new(Kernel::new());
        kernel.learn_str(GREETINGS).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let kernel = Arc::clone(&kernel);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        assert_eq!(kernel.respond("hello", &format!("t{i}")), "Hi there.");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(kernel.session_data(&format!("t{i}")).unwrap().input_history.len(), 10);
        }
    }
}
