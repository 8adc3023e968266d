// Apply configuration: result shape, flag handling and direction.

use lexfst_core::Label;
use serde::{Deserialize, Serialize};

/// Options for [`Fst::apply`](crate::Fst::apply).
///
/// Every option toggles independently. Deserializing fills missing fields
/// from the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Attach the path cost to each result.
    pub weights: bool,
    /// Keep outputs as symbol sequences instead of joined text.
    pub tokenize_outputs: bool,
    /// Drop paths whose flag diacritics are inconsistent.
    pub obey_flags: bool,
    /// Keep flag diacritic symbols in the output.
    pub print_flags: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            weights: false,
            tokenize_outputs: false,
            obey_flags: true,
            print_flags: false,
        }
    }
}

impl ApplyOptions {
    pub fn with_weights(mut self, weights: bool) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_tokenized_outputs(mut self, tokenize_outputs: bool) -> Self {
        self.tokenize_outputs = tokenize_outputs;
        self
    }

    pub fn with_obey_flags(mut self, obey_flags: bool) -> Self {
        self.obey_flags = obey_flags;
        self
    }

    pub fn with_print_flags(mut self, print_flags: bool) -> Self {
        self.print_flags = print_flags;
        self
    }
}

/// Which side of each label is matched against the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Input side consumed, output side produced.
    #[default]
    Generate,
    /// Output side consumed, input side produced.
    Analyze,
}

impl Direction {
    /// The symbol matched against the input.
    #[inline]
    pub fn consumed(self, label: &Label) -> &str {
        match self {
            Direction::Generate => label.input(),
            Direction::Analyze => label.output(),
        }
    }

    /// The symbol written to the output.
    #[inline]
    pub fn produced(self, label: &Label) -> &str {
        match self {
            Direction::Generate => label.output(),
            Direction::Analyze => label.input(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_obey_flags_only() {
        let options = ApplyOptions::default();
        assert!(!options.weights);
        assert!(!options.tokenize_outputs);
        assert!(options.obey_flags);
        assert!(!options.print_flags);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options: ApplyOptions = serde_json::from_str(r#"{"weights": true}"#).unwrap();
        assert_eq!(options, ApplyOptions::default().with_weights(true));
    }

    #[test]
    fn direction_swaps_sides() {
        let label = Label::pair("in", "out");
        assert_eq!(Direction::Generate.consumed(&label), "in");
        assert_eq!(Direction::Generate.produced(&label), "out");
        assert_eq!(Direction::Analyze.consumed(&label), "out");
        assert_eq!(Direction::Analyze.produced(&label), "in");

        let same = Label::identity("a");
        assert_eq!(Direction::Analyze.consumed(&same), "a");
    }
}
