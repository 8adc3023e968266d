//! Weighted finite-state transducer engine.
//!
//! Automata are built from single labels, character ranges or right-linear
//! grammars (lexicons), and strings are run through them with a lazy
//! best-first search that yields results in non-decreasing cost order.
//!
//! # Architecture
//!
//! - [`state`] -- states, transitions and the lazy per-state symbol indices
//! - [`fst`] -- the automaton aggregate and its graph operations
//! - [`symbols`] -- alphabet tokenization and lexicon-side tokenization
//! - [`lexicon`] -- right-linear grammar compiler
//! - [`flags`] -- flag diacritic parsing and consistency checking
//! - [`config`] -- apply options and direction
//! - [`apply`] -- best-first generation and analysis
//! - [`words`] -- breadth-first enumeration of the accepted language
//! - [`format`] -- AT&T text, JSON and JavaScript exports

pub mod apply;
pub mod config;
pub mod flags;
pub mod format;
pub mod fst;
pub mod lexicon;
pub mod state;
pub mod symbols;
pub mod words;

pub use apply::{Applied, Apply, Output};
pub use config::{ApplyOptions, Direction};
pub use format::{AttText, FstDict};
pub use fst::Fst;
pub use lexfst_core::{EPSILON, FINAL_LEXICON, Grammar, Label, LexiconDocument, Rule, WILDCARD, Weight};
pub use state::{State, StateId, StateSet, Transition};
pub use words::{Word, Words};

/// Error type for automaton construction.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("start rule-set {start:?} is not declared in the grammar")]
    UndefinedStart { start: String },
    #[error("rule #{rule} of rule-set {lexicon:?} continues to undeclared rule-set {target:?}")]
    UndefinedLexicon {
        lexicon: String,
        rule: usize,
        target: String,
    },
    #[error("invalid flag diacritic: {0}")]
    InvalidFlagDiacritic(String),
}
