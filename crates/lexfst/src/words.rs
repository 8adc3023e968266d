// Breadth-first enumeration of the accepted language.

use std::collections::VecDeque;

use lexfst_core::{Label, Weight};

use crate::fst::Fst;
use crate::state::StateId;

/// One accepted path: its labels and total cost, final weight included.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub cost: Weight,
    pub labels: Vec<Label>,
}

impl Word {
    /// Concatenated input side.
    pub fn input(&self) -> String {
        self.labels.iter().map(Label::input).collect()
    }

    /// Concatenated output side.
    pub fn output(&self) -> String {
        self.labels.iter().map(Label::output).collect()
    }
}

/// Breadth-first walk yielding every path that ends in a final state, in
/// discovery order. Infinite for cyclic automata.
pub struct Words<'a> {
    fst: &'a Fst,
    queue: VecDeque<(StateId, Weight, Vec<Label>)>,
}

impl Iterator for Words<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        while let Some((id, cost, labels)) = self.queue.pop_front() {
            let state = self.fst.state(id);
            for t in state.all_transitions() {
                let mut next = labels.clone();
                next.push(t.label.clone());
                self.queue.push_back((t.target, cost + t.weight, next));
            }
            if state.is_final() {
                return Some(Word {
                    cost: cost + state.final_weight(),
                    labels,
                });
            }
        }
        None
    }
}

impl Fst {
    /// Every accepted path with its cost. Each call starts a fresh walk.
    pub fn words(&self) -> Words<'_> {
        Words {
            fst: self,
            queue: VecDeque::from([(self.initial_state(), 0.0, Vec::new())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_finite_language() {
        let fst = Fst::from_strings(["cat", "dog", "do"], &[] as &[&str]).unwrap();
        let mut words: Vec<String> = fst.words().map(|w| w.input()).collect();
        words.sort();
        assert_eq!(words, vec!["cat", "do", "dog"]);
        assert!(fst.words().all(|w| w.cost == 0.0));
    }

    #[test]
    fn shorter_paths_come_first() {
        let fst = Fst::from_strings(["abc", "a"], &[] as &[&str]).unwrap();
        let words: Vec<String> = fst.words().map(|w| w.input()).collect();
        assert_eq!(words, vec!["a", "abc"]);
    }

    #[test]
    fn costs_include_transition_and_final_weights() {
        let mut fst = Fst::from_label(Label::pair("a", "b"), 0.5);
        let q0 = fst.initial_state();
        let end = *fst.finals().iter().next().unwrap();
        fst.add_transition(q0, end, Label::identity("c"), 2.0);

        let mut words: Vec<(String, String, Weight)> =
            fst.words().map(|w| (w.input(), w.output(), w.cost)).collect();
        words.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            words,
            vec![
                ("a".to_string(), "b".to_string(), 0.5),
                ("c".to_string(), "c".to_string(), 2.5),
            ]
        );
    }

    #[test]
    fn cyclic_language_is_unbounded_but_lazy() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        fst.set_final(q0, 0.0);
        fst.add_transition(q0, q0, Label::identity("a"), 0.0);
        let words: Vec<String> = fst.words().take(3).map(|w| w.input()).collect();
        assert_eq!(words, vec!["", "a", "aa"]);
    }
}
