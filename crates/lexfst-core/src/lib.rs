//! Shared types for the lexfst transducer engine.
//!
//! - [`label`] -- transition labels and the reserved symbols
//! - [`grammar`] -- right-linear grammar (lexicon) data model

pub mod grammar;
pub mod label;

pub use grammar::{FINAL_LEXICON, Grammar, LexiconDocument, Rule};
pub use label::{EPSILON, Label, LabelError, WILDCARD};

/// Additive cost carried by transitions and final states. Lower is better.
pub type Weight = f64;
