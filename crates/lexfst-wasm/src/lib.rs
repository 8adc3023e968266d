// WASM bindings for lexfst.
//
// Provides a `WasmLexicon` class exported via wasm-bindgen that compiles a
// lexicon file and applies it. Results are serialized to JavaScript values
// using serde-wasm-bindgen.
//
// Usage from JavaScript:
//
//   const lex = new WasmLexicon(lexiconJson);
//   lex.generate("cat+N+Pl", { weights: true }, 5); // => [{ output: "cats", cost: 1 }, ...]
//   lex.analyze("cats", {}, 5);                     // => [{ output: "cat+N+Pl" }]
//   lex.words(10);                                // => [{ input: "cat+N+Sg", output: "cat", cost: 0 }, ...]
//   lex.toAtt(false);                             // => "0\t1\tc\tc\t0.0\n..."
//   lex.toJs("myNet");                            // => "var myNet = {...} ;"

use serde::Serialize;
use wasm_bindgen::prelude::*;

use lexfst::{Applied, ApplyOptions, Direction, Fst, LexiconDocument};

// ============================================================================
// Serde-serializable DTO types for JS interop
// ============================================================================

/// Serializable representation of one apply result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsApplied {
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
}

/// Serializable representation of one accepted path.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsWord {
    input: String,
    output: String,
    cost: f64,
}

// ============================================================================
// Conversion helpers
// ============================================================================

fn to_js_applied(result: Applied) -> JsApplied {
    let output = result.output.text();
    let tokens = match result.output {
        lexfst::Output::Tokens(tokens) => Some(tokens),
        lexfst::Output::Text(_) => None,
    };
    JsApplied {
        output,
        tokens,
        cost: result.cost,
    }
}

fn parse_options(options: JsValue) -> Result<ApplyOptions, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(ApplyOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsError::new(&e.to_string()))
}

// ============================================================================
// WasmLexicon
// ============================================================================

/// A compiled lexicon for WebAssembly.
#[wasm_bindgen]
#[derive(Debug)]
pub struct WasmLexicon {
    fst: Fst,
}

impl WasmLexicon {
    /// Compile a lexicon from its JSON text. Shared by the constructor and
    /// native callers.
    pub fn from_json(lexicon_json: &str) -> Result<WasmLexicon, String> {
        let document: LexiconDocument =
            serde_json::from_str(lexicon_json).map_err(|e| format!("invalid lexicon: {e}"))?;
        let fst = Fst::from_lexicon(&document).map_err(|e| e.to_string())?;
        Ok(WasmLexicon { fst })
    }

    /// At most `limit` results, cheapest first.
    fn apply(
        &self,
        word: &str,
        direction: Direction,
        options: ApplyOptions,
        limit: usize,
    ) -> Vec<JsApplied> {
        self.fst
            .apply(word, direction, options)
            .take(limit)
            .map(to_js_applied)
            .collect()
    }
}

#[wasm_bindgen]
impl WasmLexicon {
    /// Compile a lexicon file's JSON text
    /// (`{ start, multichar_symbols, lexicons }`).
    #[wasm_bindgen(constructor)]
    pub fn new(lexicon_json: &str) -> Result<WasmLexicon, JsError> {
        WasmLexicon::from_json(lexicon_json).map_err(|e| JsError::new(&e))
    }

    /// Generate at most `limit` surface forms, cheapest first. Cyclic
    /// lexicons have unbounded results, so the limit is required.
    ///
    /// `options` is an optional object with `weights`, `tokenize_outputs`,
    /// `obey_flags` and `print_flags` booleans.
    pub fn generate(&self, word: &str, options: JsValue, limit: usize) -> Result<JsValue, JsError> {
        let results = self.apply(word, Direction::Generate, parse_options(options)?, limit);
        serde_wasm_bindgen::to_value(&results).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Analyze a surface form, cheapest first. Takes the same options and
    /// limit as `generate`.
    pub fn analyze(&self, word: &str, options: JsValue, limit: usize) -> Result<JsValue, JsError> {
        let results = self.apply(word, Direction::Analyze, parse_options(options)?, limit);
        serde_wasm_bindgen::to_value(&results).map_err(|e| JsError::new(&e.to_string()))
    }

    /// The first `limit` accepted paths in breadth-first order.
    pub fn words(&self, limit: usize) -> Result<JsValue, JsError> {
        let words: Vec<JsWord> = self
            .fst
            .words()
            .take(limit)
            .map(|w| JsWord {
                input: w.input(),
                output: w.output(),
                cost: w.cost,
            })
            .collect();
        serde_wasm_bindgen::to_value(&words).map_err(|e| JsError::new(&e.to_string()))
    }

    /// AT&T transition table with `@0@` for epsilon.
    #[wasm_bindgen(js_name = "toAtt")]
    pub fn to_att(&self, state_symbols: bool) -> String {
        self.fst.to_att(lexfst::format::ATT_EPSILON, state_symbols).transitions
    }

    /// JavaScript source `var NAME = {...} ;` for browser runtimes.
    #[wasm_bindgen(js_name = "toJs")]
    pub fn to_js(&self, name: &str) -> String {
        self.fst.to_js(name)
    }

    /// Transition dictionary as a JavaScript object.
    #[wasm_bindgen(js_name = "toDict")]
    pub fn to_dict(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.fst.to_dict()).map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "numStates")]
    pub fn num_states(&self) -> usize {
        self.fst.num_states()
    }

    /// Release resources held by this instance.
    pub fn terminate(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEXICON: &str = r##"{
        "start": "Root",
        "multichar_symbols": ["+Pl"],
        "lexicons": {
            "Root": [["cat", "Noun"]],
            "Noun": [["", "#"], [["+Pl", "s"], "#", 1.0]]
        }
    }"##;

    const CYCLIC: &str = r##"{
        "start": "Root",
        "lexicons": {
            "Root": [[["", "a"], "Root"], ["", "#"]]
        }
    }"##;

    #[test]
    fn compiles_and_applies_natively() {
        let lex = WasmLexicon::from_json(LEXICON).unwrap();
        let weighted = ApplyOptions::default().with_weights(true);
        let results = lex.apply("cat+Pl", Direction::Generate, weighted, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].output, "cats");
        assert_eq!(results[0].cost, Some(1.0));
        assert!(results[0].tokens.is_none());

        let analyses = lex.apply("cats", Direction::Analyze, ApplyOptions::default(), 10);
        assert_eq!(analyses[0].output, "cat+Pl");
        assert_eq!(analyses[0].cost, None);
    }

    #[test]
    fn tokenized_outputs_keep_symbols() {
        let lex = WasmLexicon::from_json(LEXICON).unwrap();
        let options = ApplyOptions::default().with_tokenized_outputs(true);
        let analyses = lex.apply("cats", Direction::Analyze, options, 10);
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].output, "cat+Pl");
        let tokens: Vec<&str> = analyses[0]
            .tokens
            .as_deref()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tokens, vec!["c", "a", "t", "+Pl"]);
    }

    #[test]
    fn limit_bounds_cyclic_results() {
        let lex = WasmLexicon::from_json(CYCLIC).unwrap();
        let results = lex.apply("", Direction::Generate, ApplyOptions::default(), 3);
        let outputs: Vec<&str> = results.iter().map(|r| r.output.as_str()).collect();
        assert_eq!(outputs, vec!["", "a", "aa"]);
        assert!(lex.apply("", Direction::Generate, ApplyOptions::default(), 0).is_empty());
    }

    #[test]
    fn invalid_lexicon_is_an_error() {
        assert!(WasmLexicon::from_json("{}").is_err());
        let undeclared = r##"{"start": "Root", "lexicons": {"Root": [["a", "Missing"]]}}"##;
        assert!(WasmLexicon::from_json(undeclared).unwrap_err().contains("Missing"));
    }
}
