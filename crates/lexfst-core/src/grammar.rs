// Right-linear grammar (lexicon) data model.
//
// A grammar maps rule-set names to ordered rules. Each rule reads an input
// string (optionally writing a different output string), continues in
// another rule-set and carries an optional weight. The rule-set named
// `FINAL_LEXICON` is the terminal one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the terminal rule-set. Paths ending here are accepted.
pub const FINAL_LEXICON: &str = "#";

/// One lexicon rule: `input[:output] target [weight]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleRepr", into = "RuleRepr")]
pub struct Rule {
    pub input: String,
    /// Output string, `None` when it equals the input.
    pub output: Option<String>,
    /// Continuation rule-set.
    pub target: String,
    pub weight: f64,
}

impl Rule {
    /// Identity rule: `input` maps to itself, continuing at `target`.
    pub fn new(input: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: None,
            target: target.into(),
            weight: 0.0,
        }
    }

    /// Transducing rule `input:output`.
    pub fn pair(
        input: impl Into<String>,
        output: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            output: Some(output.into()),
            target: target.into(),
            weight: 0.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// The output side, falling back to the input for identity rules.
    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

// JSON shape of a rule: `[side, target]` or `[side, target, weight]` where
// side is a string or an `[input, output]` pair.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Weighted(SideRepr, String, f64),
    Plain(SideRepr, String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SideRepr {
    Same(String),
    Pair(String, String),
}

impl From<RuleRepr> for Rule {
    fn from(repr: RuleRepr) -> Self {
        let (side, target, weight) = match repr {
            RuleRepr::Weighted(side, target, weight) => (side, target, weight),
            RuleRepr::Plain(side, target) => (side, target, 0.0),
        };
        let (input, output) = match side {
            SideRepr::Same(input) => (input, None),
            SideRepr::Pair(input, output) => (input, Some(output)),
        };
        Rule {
            input,
            output,
            target,
            weight,
        }
    }
}

impl From<Rule> for RuleRepr {
    fn from(rule: Rule) -> Self {
        let side = match rule.output {
            None => SideRepr::Same(rule.input),
            Some(output) => SideRepr::Pair(rule.input, output),
        };
        if rule.weight == 0.0 {
            RuleRepr::Plain(side, rule.target)
        } else {
            RuleRepr::Weighted(side, rule.target, rule.weight)
        }
    }
}

/// Rule-sets by name. Iteration order is the name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grammar {
    lexicons: BTreeMap<String, Vec<Rule>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the named rule-set, declaring it if needed.
    pub fn add_rule(&mut self, lexicon: impl Into<String>, rule: Rule) {
        self.lexicons.entry(lexicon.into()).or_default().push(rule);
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    pub fn with_rule(mut self, lexicon: impl Into<String>, rule: Rule) -> Self {
        self.add_rule(lexicon, rule);
        self
    }

    /// Declare a rule-set without adding rules to it.
    pub fn declare(&mut self, lexicon: impl Into<String>) {
        self.lexicons.entry(lexicon.into()).or_default();
    }

    pub fn contains(&self, lexicon: &str) -> bool {
        self.lexicons.contains_key(lexicon)
    }

    pub fn rules(&self, lexicon: &str) -> Option<&[Rule]> {
        self.lexicons.get(lexicon).map(Vec::as_slice)
    }

    /// All rule-sets with their rules.
    pub fn lexicons(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.lexicons
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lexicons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicons.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<Rule>)> for Grammar {
    fn from_iter<I: IntoIterator<Item = (N, Vec<Rule>)>>(iter: I) -> Self {
        let mut grammar = Grammar::new();
        for (name, rules) in iter {
            let name = name.into();
            grammar.declare(name.clone());
            for rule in rules {
                grammar.add_rule(name.clone(), rule);
            }
        }
        grammar
    }
}

/// A complete lexicon description as stored in a lexicon file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconDocument {
    /// Rule-set where compilation starts.
    pub start: String,
    /// Symbols longer than one character that need no quoting.
    #[serde(default)]
    pub multichar_symbols: Vec<String>,
    pub lexicons: Grammar,
}
