// Best-first apply: generation and analysis in non-decreasing cost order.
//
// Partial paths sit in a min-heap keyed by (cost, discovery sequence). A
// path reaching a final state competes with its own continuations through a
// finished copy that carries the final weight and no state.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use lexfst_core::{WILDCARD, Weight};
use tracing::{debug, trace};

use crate::config::{ApplyOptions, Direction};
use crate::flags::{FlagStringFilter, filter_flags, is_flag};
use crate::fst::Fst;
use crate::state::StateId;

/// Output of one accepted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Tokens(Vec<String>),
}

impl Output {
    /// The output as a single string.
    pub fn text(&self) -> String {
        match self {
            Output::Text(text) => text.clone(),
            Output::Tokens(tokens) => tokens.concat(),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Text(text) => f.write_str(text),
            Output::Tokens(tokens) => tokens.iter().try_for_each(|t| f.write_str(t)),
        }
    }
}

/// One result of [`Fst::apply`]. `cost` is set when weights were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub output: Output,
    pub cost: Option<Weight>,
}

/// One input token and whether the alphabet knows it. Unknown tokens match
/// only the wildcard.
#[derive(Debug)]
struct InputToken {
    text: String,
    known: bool,
}

#[derive(Debug)]
struct Path {
    cost: Weight,
    seq: u64,
    position: usize,
    output: Vec<String>,
    /// `None` once the path has stopped at a final state.
    state: Option<StateId>,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Path {}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Lazy best-first search over one input string.
///
/// Results come out in non-decreasing cost; equal costs in discovery order.
/// There is no cycle detection: an automaton with zero-cost epsilon cycles
/// can keep the search busy forever, so bound consumption with
/// [`Iterator::take`] when that matters.
pub struct Apply<'a> {
    fst: &'a Fst,
    direction: Direction,
    options: ApplyOptions,
    tokens: Vec<InputToken>,
    queue: BinaryHeap<Reverse<Path>>,
    counter: u64,
    flag_filter: Option<FlagStringFilter>,
}

impl<'a> Apply<'a> {
    fn new(fst: &'a Fst, word: &str, direction: Direction, options: ApplyOptions) -> Self {
        let tokens: Vec<InputToken> = fst
            .tokenize_against_alphabet(word)
            .into_iter()
            .map(|text| InputToken {
                known: fst.alphabet().contains(&text),
                text,
            })
            .collect();
        debug!(?direction, tokens = tokens.len(), states = fst.num_states(), "apply");

        let mut apply = Self {
            fst,
            direction,
            options,
            tokens,
            queue: BinaryHeap::new(),
            counter: 0,
            flag_filter: options.obey_flags.then(|| FlagStringFilter::new(fst.alphabet())),
        };
        apply.push(0.0, 0, Vec::new(), Some(fst.initial_state()));
        apply
    }

    fn push(&mut self, cost: Weight, position: usize, output: Vec<String>, state: Option<StateId>) {
        let seq = self.counter;
        self.counter += 1;
        self.queue.push(Reverse(Path {
            cost,
            seq,
            position,
            output,
            state,
        }));
    }

    fn accepts(&mut self, path: &Path) -> bool {
        path.position == self.tokens.len()
            && self
                .flag_filter
                .as_mut()
                .is_none_or(|filter| filter.accepts(&path.output))
    }

    fn finish(&self, path: Path) -> Applied {
        let symbols = if self.options.print_flags {
            path.output
        } else {
            filter_flags(path.output)
        };
        let output = if self.options.tokenize_outputs {
            Output::Tokens(symbols)
        } else {
            Output::Text(symbols.concat())
        };
        let cost = self.options.weights.then_some(path.cost);
        trace!(cost = path.cost, output = %output, "apply result");
        Applied { output, cost }
    }

    fn expand(&mut self, path: Path, state_id: StateId) {
        let fst = self.fst;
        let state = fst.state(state_id);
        if state.is_final() {
            let finished = path.output.clone();
            self.push(path.cost + state.final_weight(), path.position, finished, None);
        }

        for t in state.all_transitions() {
            let consumed = self.direction.consumed(&t.label);
            let produced = self.direction.produced(&t.label);
            let cost = path.cost + t.weight;
            if consumed.is_empty() || is_flag(consumed) {
                let output = extended(&path.output, produced);
                self.push(cost, path.position, output, Some(t.target));
                continue;
            }
            let Some(token) = self.tokens.get(path.position) else {
                continue;
            };
            let symbol = if token.known { token.text.as_str() } else { WILDCARD };
            if symbol != consumed {
                continue;
            }
            let appended = if !token.known && produced == WILDCARD {
                token.text.as_str()
            } else {
                produced
            };
            let output = extended(&path.output, appended);
            self.push(cost, path.position + 1, output, Some(t.target));
        }
    }
}

fn extended(output: &[String], symbol: &str) -> Vec<String> {
    let mut next = Vec::with_capacity(output.len() + 1);
    next.extend_from_slice(output);
    next.push(symbol.to_string());
    next
}

impl Iterator for Apply<'_> {
    type Item = Applied;

    fn next(&mut self) -> Option<Applied> {
        while let Some(Reverse(path)) = self.queue.pop() {
            match path.state {
                Some(state) => self.expand(path, state),
                None => {
                    if self.accepts(&path) {
                        return Some(self.finish(path));
                    }
                }
            }
        }
        None
    }
}

impl Fst {
    /// Run `word` through the automaton in `direction`.
    pub fn apply(&self, word: &str, direction: Direction, options: ApplyOptions) -> Apply<'_> {
        Apply::new(self, word, direction, options)
    }

    /// Map `word` from the input side to the output side.
    pub fn generate(&self, word: &str, options: ApplyOptions) -> Apply<'_> {
        self.apply(word, Direction::Generate, options)
    }

    /// Map `word` from the output side back to the input side.
    pub fn analyze(&self, word: &str, options: ApplyOptions) -> Apply<'_> {
        self.apply(word, Direction::Analyze, options)
    }
}
