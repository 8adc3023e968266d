// Transition labels: a single identity symbol or an input/output pair.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The empty symbol. Consumes or produces nothing on its side of a label.
pub const EPSILON: &str = "";

/// Wildcard symbol. Stands for any input token outside the alphabet.
pub const WILDCARD: &str = ".";

/// Error building a label from a raw symbol list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("a label holds one or two symbols, got {0}")]
    Arity(usize),
}

/// Label of a single transition.
///
/// `Identity(x)` is the acceptor arc `(x,)` with input = output = `x`.
/// `Pair([i, o])` is a transducer arc reading `i` and writing `o`.
/// Labels order like tuples of strings, so `(a,) < (a, b) < (b,)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub enum Label {
    Identity(String),
    Pair([String; 2]),
}

impl Label {
    /// Acceptor label `(symbol,)`.
    pub fn identity(symbol: impl Into<String>) -> Self {
        Label::Identity(symbol.into())
    }

    /// Transducer label `(input, output)`, kept as a pair even when both
    /// sides are equal.
    pub fn pair(input: impl Into<String>, output: impl Into<String>) -> Self {
        Label::Pair([input.into(), output.into()])
    }

    /// Label for `input:output`, collapsing to an identity label when both
    /// sides are the same symbol.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        let input = input.into();
        let output = output.into();
        if input == output {
            Label::Identity(input)
        } else {
            Label::Pair([input, output])
        }
    }

    /// The epsilon acceptor label `("",)`.
    pub fn epsilon() -> Self {
        Label::Identity(String::new())
    }

    /// The symbols of the label in tuple order.
    pub fn symbols(&self) -> &[String] {
        match self {
            Label::Identity(symbol) => std::slice::from_ref(symbol),
            Label::Pair(pair) => pair,
        }
    }

    /// First symbol of the tuple.
    pub fn input(&self) -> &str {
        &self.symbols()[0]
    }

    /// Last symbol of the tuple.
    pub fn output(&self) -> &str {
        match self {
            Label::Identity(symbol) => symbol,
            Label::Pair([_, output]) => output,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Label::Identity(_))
    }

    /// True when every symbol of the label is epsilon.
    pub fn is_epsilon(&self) -> bool {
        self.symbols().iter().all(String::is_empty)
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbols().cmp(other.symbols())
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<Vec<String>> for Label {
    type Error = LabelError;

    fn try_from(mut symbols: Vec<String>) -> Result<Self, Self::Error> {
        match symbols.len() {
            1 => Ok(Label::Identity(symbols.remove(0))),
            2 => {
                let output = symbols.remove(1);
                let input = symbols.remove(0);
                Ok(Label::Pair([input, output]))
            }
            n => Err(LabelError::Arity(n)),
        }
    }
}

impl From<Label> for Vec<String> {
    fn from(label: Label) -> Self {
        match label {
            Label::Identity(symbol) => vec![symbol],
            Label::Pair(pair) => pair.into(),
        }
    }
}

impl From<&str> for Label {
    fn from(symbol: &str) -> Self {
        Label::identity(symbol)
    }
}

/// Renders `a` or `a:b`, writing epsilon as `ϵ`.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.symbols().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            f.write_str(if symbol.is_empty() { "ϵ" } else { symbol })?;
        }
        Ok(())
    }
}
