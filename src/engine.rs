//! Matching and evaluation engine.
//!
//! The engine is split into focused submodules under `src/engine/`; this file
//! wires them together and re-exports the pieces that make up the public
//! surface.
//!
//! ## How the parts work together
//!
//! ```text
//! *.aiml ── parse_document (parser.rs, validate.rs)
//!                 │  RuleKey { pattern, that, topic } -> Template
//!                 v
//!           PatternIndex::insert (graph.rs) <──── brain::load (brain.rs)
//!                 │
//! input ── sentences ── Substitutions "normal" (substitute.rs)
//!                 │
//!                 v
//!           Query::new (normalize.rs) ── PatternIndex::search ── Match + MatchPath (wildcard.rs)
//!                 │
//!                 v
//!           Interpreter::evaluate (evaluate.rs)
//!             - predicates / histories (session.rs)
//!             - <srai> re-enters Interpreter::answer (interpreter.rs)
//!             - <system> (system.rs)
//!                 │
//!                 v
//!           RespondResult (metrics.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `parser.rs`: event-driven document parser; one state machine per
//!   document, structural errors drop a single category.
//! - `validate.rs`: attribute and content-model checks for template tags.
//! - `graph.rs`: the wildcard trie and its backtracking search.
//! - `normalize.rs`: case folding and tokenization of the three sections.
//! - `wildcard.rs`: the recorded match path and wildcard spans.
//! - `interpreter.rs`: learning, the respond loop and the recursion guard.
//! - `evaluate.rs`: one arm per template tag.
//! - `session.rs`: predicates, bounded histories and the per-session input
//!   stack.
//! - `substitute.rs`: whole-word substitution tables.
//! - `brain.rs`: binary snapshots of the pattern index.
//! - `metrics.rs`: timings for verbose responses.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=aimlkit=debug` to see every learned document, every
//! match path and every recursion guard trip.

#[path = "engine/brain.rs"]
pub(crate) mod brain;
#[path = "engine/evaluate.rs"]
mod evaluate;
#[path = "engine/graph.rs"]
mod graph;
#[path = "engine/interpreter.rs"]
mod interpreter;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/normalize.rs"]
mod normalize;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/session.rs"]
mod session;
#[path = "engine/substitute.rs"]
mod substitute;
#[path = "engine/system.rs"]
mod system;
#[path = "engine/validate.rs"]
mod validate;
#[path = "engine/wildcard.rs"]
mod wildcard;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use graph::{Match, PatternIndex};
pub(crate) use interpreter::Interpreter;
pub(crate) use metrics::RespondResult;
pub use normalize::{NO_THAT, NO_TOPIC, Query, SectionText};
pub use parser::{ParsedDocument, RuleKey, STRICT_VERSION, parse_document};
pub use session::{COMPUTED_PREDICATES, GLOBAL_SESSION, SessionData};
pub use substitute::{Substitutions, WordSub};
pub use system::APOLOGY;
pub use wildcard::{MatchPath, Step, Wildcard};
