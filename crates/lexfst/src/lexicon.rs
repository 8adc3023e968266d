// Right-linear grammar (lexicon) compiler.

use std::collections::{BTreeMap, BTreeSet};

use lexfst_core::{FINAL_LEXICON, Grammar, Label, LexiconDocument, Rule};
use tracing::debug;

use crate::FstError;
use crate::fst::Fst;
use crate::state::StateId;
use crate::symbols::SideTokenizer;

/// Name of the single rule-set used by [`Fst::from_strings`].
pub const STRINGS_LEXICON: &str = "Start";

impl Fst {
    /// Compile a weighted right-linear grammar, lexc style.
    ///
    /// Each rule-set becomes a named state and `#` the final state. A rule's
    /// symbols are chained through fresh states; its last transition enters
    /// the continuation state and carries the rule weight. Rules listed under
    /// `#` are ignored.
    ///
    /// All continuations are checked before anything is built, so an error
    /// names the first offending rule in rule-set order.
    pub fn rlg<S: AsRef<str>>(
        grammar: &Grammar,
        start: &str,
        multichar_symbols: &[S],
    ) -> Result<Fst, FstError> {
        validate(grammar, start)?;
        let tokenizer = SideTokenizer::new(multichar_symbols.iter().map(|s| s.as_ref()));

        let mut fst = Fst::new();
        let mut states: BTreeMap<&str, StateId> = BTreeMap::new();
        let initial = fst.initial_state();
        fst.set_state_name(initial, Some(start.to_string()));
        states.insert(start, initial);
        let names = grammar
            .lexicons()
            .map(|(name, _)| name)
            .chain(std::iter::once(FINAL_LEXICON));
        for name in names {
            if !states.contains_key(name) {
                states.insert(name, fst.add_named_state(name));
            }
        }
        fst.set_final(states[FINAL_LEXICON], 0.0);

        let mut rules = 0usize;
        for (lexicon, rule_list) in grammar.lexicons() {
            if lexicon == FINAL_LEXICON {
                continue;
            }
            for rule in rule_list {
                let (from, to) = (states[lexicon], states[rule.target.as_str()]);
                compile_rule(&mut fst, &tokenizer, from, to, rule);
                rules += 1;
            }
        }

        debug!(
            lexicons = grammar.len(),
            rules,
            states = fst.num_states(),
            transitions = fst.num_transitions(),
            alphabet = fst.alphabet().len(),
            "compiled lexicon"
        );
        fst.debug_check_invariants();
        Ok(fst)
    }

    /// Compile a lexicon document loaded from JSON.
    pub fn from_lexicon(document: &LexiconDocument) -> Result<Fst, FstError> {
        Fst::rlg(&document.lexicons, &document.start, &document.multichar_symbols)
    }

    /// Automaton accepting exactly `strings`, each at cost 0 and on a
    /// single path, with states numbered in canonical breadth-first order.
    ///
    /// Strings use the lexicon side syntax: quotes group symbols, a
    /// backslash escapes, and an unescaped space is epsilon. Strings that
    /// spell the same symbol sequence are compiled once.
    pub fn from_strings<I, S, M>(strings: I, multichar_symbols: &[M]) -> Result<Fst, FstError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        M: AsRef<str>,
    {
        let tokenizer = SideTokenizer::new(multichar_symbols.iter().map(|s| s.as_ref()));
        let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
        let mut rules: Vec<Rule> = Vec::new();
        for string in strings {
            let string: String = string.into();
            let symbols: Vec<String> = tokenizer
                .tokenize(&string)
                .into_iter()
                .filter(|symbol| !symbol.is_empty())
                .collect();
            if seen.insert(symbols) {
                rules.push(Rule::new(string, FINAL_LEXICON));
            }
        }
        let grammar: Grammar = [(STRINGS_LEXICON, rules)].into_iter().collect();
        Ok(Fst::rlg(&grammar, STRINGS_LEXICON, multichar_symbols)?.label_states_topology())
    }
}

fn validate(grammar: &Grammar, start: &str) -> Result<(), FstError> {
    let declared = |name: &str| name == FINAL_LEXICON || grammar.contains(name);
    if !declared(start) {
        return Err(FstError::UndefinedStart {
            start: start.to_string(),
        });
    }
    for (lexicon, rules) in grammar.lexicons() {
        if lexicon == FINAL_LEXICON {
            continue;
        }
        let undeclared = rules
            .iter()
            .enumerate()
            .find(|(_, r)| !declared(r.target.as_str()));
        if let Some((rule, bad)) = undeclared {
            return Err(FstError::UndefinedLexicon {
                lexicon: lexicon.to_string(),
                rule,
                target: bad.target.clone(),
            });
        }
    }
    Ok(())
}

fn compile_rule(fst: &mut Fst, tokenizer: &SideTokenizer, from: StateId, to: StateId, rule: &Rule) {
    let input = tokenizer.tokenize(&rule.input);
    let output = match &rule.output {
        Some(output) => tokenizer.tokenize(output),
        None => input.clone(),
    };
    fst.extend_alphabet(input.iter().chain(&output).filter(|s| !s.is_empty()).cloned());

    let len = input.len().max(output.len());
    let mut current = from;
    for position in 0..len {
        let i = input.get(position).map_or("", String::as_str);
        let o = output.get(position).map_or("", String::as_str);
        let label = Label::new(i, o);
        if position + 1 == len {
            fst.add_transition(current, to, label, rule.weight);
        } else {
            let next = fst.add_state();
            fst.add_transition(current, next, label, 0.0);
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(json: &str) -> Grammar {
        serde_json::from_str(json).unwrap()
    }

    const NO_MULTICHAR: &[&str] = &[];

    #[test]
    fn one_state_per_rule_set_plus_final() {
        let g = grammar(r##"{"Root": [["ab", "Suffix"]], "Suffix": [["", "#"]]}"##);
        let fst = Fst::rlg(&g, "Root", NO_MULTICHAR).unwrap();
        // Root, Suffix, #, and one intermediate state for "ab".
        assert_eq!(fst.num_states(), 4);
        assert_eq!(fst.state(fst.initial_state()).name(), Some("Root"));
        assert_eq!(fst.finals().len(), 1);
        assert_eq!(fst.sorted_alphabet(), vec!["a", "b"]);
    }

    #[test]
    fn weight_sits_on_last_transition() {
        let g = grammar(r##"{"Root": [["abc", "#", 2.5]]}"##);
        let fst = Fst::rlg(&g, "Root", NO_MULTICHAR).unwrap();
        let weights: Vec<f64> = fst
            .all_transitions(fst.state_ids())
            .map(|(_, t)| t.weight)
            .filter(|&w| w != 0.0)
            .collect();
        assert_eq!(weights, vec![2.5]);
        let final_state = *fst.finals().iter().next().unwrap();
        let into_final: Vec<_> = fst
            .all_transitions(fst.state_ids())
            .filter(|(_, t)| t.target == final_state)
            .map(|(_, t)| (t.label.clone(), t.weight))
            .collect();
        assert_eq!(into_final, vec![(Label::identity("c"), 2.5)]);
    }

    #[test]
    fn shorter_side_is_padded_with_epsilon() {
        let g = grammar(r##"{"Root": [[["ab", "x"], "#"]]}"##);
        let fst = Fst::rlg(&g, "Root", NO_MULTICHAR).unwrap();
        let labels: Vec<Label> = fst
            .all_transitions(fst.state_ids())
            .map(|(_, t)| t.label.clone())
            .collect();
        assert!(labels.contains(&Label::pair("a", "x")));
        assert!(labels.contains(&Label::pair("b", "")));
    }

    #[test]
    fn multichar_symbols_become_single_arcs() {
        let g = grammar(r##"{"Root": [[["dog+N", "dog"], "#"]]}"##);
        let fst = Fst::rlg(&g, "Root", &["+N"]).unwrap();
        assert!(fst.alphabet().contains("+N"));
        assert!(!fst.alphabet().contains("+"));
    }

    #[test]
    fn undefined_continuation_fails_fast() {
        let g = grammar(r##"{"Root": [["a", "#"], ["b", "Missing"]]}"##);
        let err = Fst::rlg(&g, "Root", NO_MULTICHAR).unwrap_err();
        match err {
            FstError::UndefinedLexicon { lexicon, rule, target } => {
                assert_eq!(lexicon, "Root");
                assert_eq!(rule, 1);
                assert_eq!(target, "Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undefined_start_fails() {
        let g = grammar(r##"{"Root": [["a", "#"]]}"##);
        assert!(matches!(
            Fst::rlg(&g, "Nope", NO_MULTICHAR),
            Err(FstError::UndefinedStart { .. })
        ));
    }

    #[test]
    fn rules_under_final_lexicon_are_ignored() {
        let g = grammar(r##"{"Root": [["a", "#"]], "#": [["zzz", "Root"]]}"##);
        let fst = Fst::rlg(&g, "Root", NO_MULTICHAR).unwrap();
        assert_eq!(fst.num_transitions(), 1);
    }

    #[test]
    fn from_strings_accepts_each_string_once() {
        let fst = Fst::from_strings(["ab", "ab", "a b", "'a'b", "c"], NO_MULTICHAR).unwrap();
        let mut words: Vec<String> = fst.words().map(|w| w.input()).collect();
        words.sort();
        assert_eq!(words, vec!["ab", "c"]);

        let generated: Vec<String> = fst
            .generate("ab", crate::ApplyOptions::default())
            .map(|r| r.output.text())
            .collect();
        assert_eq!(generated, vec!["ab"]);
    }

    #[test]
    fn from_strings_is_canonically_numbered() {
        let fst = Fst::from_strings(["ab", "b"], NO_MULTICHAR).unwrap();
        assert_eq!(fst.state(fst.initial_state()).name(), Some("0"));
        assert!(fst.states().all(|(id, state)| state.name() == Some(&id.to_string()[..])));
    }

    #[test]
    fn from_lexicon_document() {
        let doc: LexiconDocument = serde_json::from_str(
            r##"{"start": "Root", "multichar_symbols": ["+Pl"], "lexicons": {"Root": [[["cat+Pl", "cats"], "#"]]}}"##,
        )
        .unwrap();
        let fst = Fst::from_lexicon(&doc).unwrap();
        assert!(fst.alphabet().contains("+Pl"));
    }
}
