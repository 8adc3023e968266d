// The automaton aggregate: alphabet, state arena, initial and final states.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::RangeInclusive;

use hashbrown::HashSet;
use lexfst_core::{Label, WILDCARD, Weight};

use crate::state::{State, StateId, StateSet, Transition};

/// Weighted finite-state automaton or transducer.
///
/// States live in an arena and are addressed by [`StateId`]. Exactly one
/// state is initial; the final set holds every state with a finite final
/// weight. The alphabet is a hint for tokenization and display and need not
/// match the symbols found on transitions.
#[derive(Debug, Clone)]
pub struct Fst {
    alphabet: HashSet<String>,
    initial: StateId,
    states: Vec<State>,
    finals: BTreeSet<StateId>,
}

impl Default for Fst {
    fn default() -> Self {
        Self::new()
    }
}

impl Fst {
    /// A single non-final initial state and an empty alphabet.
    pub fn new() -> Self {
        Self {
            alphabet: HashSet::new(),
            initial: StateId::new(0),
            states: vec![State::new()],
            finals: BTreeSet::new(),
        }
    }

    /// Automaton accepting exactly `label`, with `weight` on the final state.
    ///
    /// The epsilon label builds a one-state automaton whose initial state is
    /// final. Otherwise the result has two states joined by `label` and the
    /// alphabet holds the label's symbols.
    pub fn from_label(label: Label, weight: Weight) -> Self {
        let mut fst = Self::new();
        let initial = fst.initial;
        if label == Label::epsilon() {
            fst.set_final(initial, weight);
            return fst;
        }
        fst.alphabet = label.symbols().iter().cloned().collect();
        let target = fst.add_state();
        fst.set_final(target, weight);
        fst.add_transition(initial, target, label, 0.0);
        fst
    }

    /// Two-state acceptor for a union of character ranges.
    ///
    /// With `complement`, the only transition is the wildcard `.` and the
    /// listed characters go into the alphabet, so that they are excluded from
    /// what the wildcard matches.
    pub fn character_ranges<I>(ranges: I, complement: bool) -> Self
    where
        I: IntoIterator<Item = RangeInclusive<char>>,
    {
        let mut fst = Self::new();
        let initial = fst.initial;
        let target = fst.add_state();
        fst.set_final(target, 0.0);
        for range in ranges {
            for ch in range {
                let symbol = ch.to_string();
                if fst.alphabet.insert(symbol.clone()) && !complement {
                    fst.add_transition(initial, target, Label::Identity(symbol), 0.0);
                }
            }
        }
        if complement {
            fst.add_transition(initial, target, Label::identity(WILDCARD), 0.0);
            fst.alphabet.insert(WILDCARD.to_string());
        }
        fst
    }

    // ------------------------------------------------------------------
    // Alphabet
    // ------------------------------------------------------------------

    pub fn alphabet(&self) -> &HashSet<String> {
        &self.alphabet
    }

    /// Alphabet symbols in sorted order.
    pub fn sorted_alphabet(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.alphabet.iter().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn add_symbol(&mut self, symbol: impl Into<String>) {
        self.alphabet.insert(symbol.into());
    }

    pub fn extend_alphabet<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alphabet.extend(symbols.into_iter().map(Into::into));
    }

    pub fn set_alphabet(&mut self, alphabet: HashSet<String>) {
        self.alphabet = alphabet;
    }

    /// Drop alphabet symbols no longer used by any transition, unless the
    /// wildcard is in use (then the alphabet still defines what it excludes).
    pub fn cleanup_sigma(&mut self) -> &mut Self {
        let seen: HashSet<String> = self
            .states
            .iter()
            .flat_map(State::all_transitions)
            .flat_map(|t| t.label.symbols())
            .cloned()
            .collect();
        if !seen.contains(WILDCARD) {
            self.alphabet.retain(|symbol| seen.contains(symbol));
        }
        self
    }

    // ------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn set_initial(&mut self, state: StateId) {
        debug_assert!(self.contains(state), "initial state {state} is not in the automaton");
        self.initial = state;
    }

    pub fn add_state(&mut self) -> StateId {
        self.push_state(State::new())
    }

    pub fn add_named_state(&mut self, name: impl Into<String>) -> StateId {
        self.push_state(State::named(name))
    }

    fn push_state(&mut self, state: State) -> StateId {
        let id = StateId::new(self.states.len());
        self.states.push(state);
        id
    }

    pub fn contains(&self, state: StateId) -> bool {
        state.index() < self.states.len()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Rename a state. Names take part in display and state numbering only.
    pub fn set_state_name(&mut self, id: StateId, name: Option<String>) {
        self.states[id.index()].set_name(name);
    }

    /// All states with their handles, in arena order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateId::new(i), state))
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + use<> {
        (0..self.states.len()).map(StateId::new)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(State::out_degree).sum()
    }

    pub fn finals(&self) -> &BTreeSet<StateId> {
        &self.finals
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.finals.contains(&state)
    }

    /// Make `state` final with `weight`. A non-finite weight means "not
    /// final", so it unsets the state instead.
    pub fn set_final(&mut self, state: StateId, weight: Weight) {
        if !weight.is_finite() {
            self.unset_final(state);
            return;
        }
        self.states[state.index()].set_final_weight(weight);
        self.finals.insert(state);
    }

    pub fn unset_final(&mut self, state: StateId) {
        self.states[state.index()].set_final_weight(Weight::INFINITY);
        self.finals.remove(&state);
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Add a transition, merging into the group for `label`. Adding the same
    /// (target, label, weight) twice has no effect.
    pub fn add_transition(&mut self, source: StateId, target: StateId, label: Label, weight: Weight) {
        debug_assert!(self.contains(target), "transition target {target} is not in the automaton");
        self.states[source.index()].add_transition(target, label, weight);
    }

    /// Remove every transition from `source` into `targets`. Labels left
    /// without transitions are dropped.
    pub fn remove_transitions_to(&mut self, source: StateId, targets: &StateSet) {
        self.states[source.index()].remove_transitions_to(targets);
    }

    /// Move all of `source`'s transitions labelled `original` to `new`.
    pub fn rename_label(&mut self, source: StateId, original: &Label, new: Label) {
        self.states[source.index()].rename_label(original, new);
    }

    /// Transitions of the given states, each with its source state.
    pub fn all_transitions<I>(&self, states: I) -> impl Iterator<Item = (StateId, &Transition)>
    where
        I: IntoIterator<Item = StateId>,
    {
        states.into_iter().flat_map(move |source| {
            self.state(source)
                .all_transitions()
                .map(move |transition| (source, transition))
        })
    }

    /// For the given source states, each label with the set of states it
    /// reaches from any of them.
    pub fn all_transitions_by_label<I>(&self, states: I) -> BTreeMap<Label, BTreeSet<StateId>>
    where
        I: IntoIterator<Item = StateId>,
    {
        let mut by_label: BTreeMap<Label, BTreeSet<StateId>> = BTreeMap::new();
        for (_, transition) in self.all_transitions(states) {
            by_label
                .entry(transition.label.clone())
                .or_default()
                .insert(transition.target);
        }
        by_label
    }

    // ------------------------------------------------------------------
    // Whole-graph operations
    // ------------------------------------------------------------------

    /// Replace the whole contents of `self` with `other`, returning the
    /// previous contents. In-place algorithms build a fresh automaton and
    /// swap it in with this.
    pub fn replace_with(&mut self, other: Fst) -> Fst {
        std::mem::replace(self, other)
    }

    /// Copy the automaton, rewriting every label and weight.
    ///
    /// State handles and names are preserved.
    pub fn copy_mod<L, W>(&self, mut modlabel: L, mut modweight: W) -> Fst
    where
        L: FnMut(&Label, Weight) -> Label,
        W: FnMut(&Label, Weight) -> Weight,
    {
        let mut copy = self.skeleton();
        for (source, t) in self.all_transitions(self.state_ids()) {
            let label = modlabel(&t.label, t.weight);
            let weight = modweight(&t.label, t.weight);
            copy.add_transition(source, t.target, label, weight);
        }
        copy
    }

    /// Copy the automaton keeping only transitions whose label passes
    /// `keep`. State handles and names are preserved.
    pub fn copy_filtered<F>(&self, mut keep: F) -> Fst
    where
        F: FnMut(&Label) -> bool,
    {
        let mut copy = self.skeleton();
        for (source, t) in self.all_transitions(self.state_ids()) {
            if keep(&t.label) {
                copy.add_transition(source, t.target, t.label.clone(), t.weight);
            }
        }
        copy
    }

    // Same states, names, finality and alphabet; no transitions.
    fn skeleton(&self) -> Fst {
        let states = self
            .states
            .iter()
            .map(|state| {
                let mut copy = State::new();
                copy.set_name(state.name().map(str::to_string));
                copy.set_final_weight(state.final_weight());
                copy
            })
            .collect();
        Fst {
            alphabet: self.alphabet.clone(),
            initial: self.initial,
            states,
            finals: self.finals.clone(),
        }
    }

    /// Display keys for every state: the initial state first, then the rest
    /// in arena order. Unnamed states (all states with `force`) get
    /// sequential numbers; named ones keep their name.
    pub fn number_unnamed_states(&self, force: bool) -> BTreeMap<StateId, String> {
        let mut counter = 0usize;
        let ordered = std::iter::once(self.initial)
            .chain(self.state_ids().filter(|&id| id != self.initial));
        let mut keys = BTreeMap::new();
        for id in ordered {
            let key = match self.state(id).name() {
                Some(name) if !force => name.to_string(),
                _ => {
                    let key = counter.to_string();
                    counter += 1;
                    key
                }
            };
            keys.insert(id, key);
        }
        keys
    }

    /// States reachable from the initial state in breadth-first order,
    /// visiting transitions by label then weight. Stable across runs on an
    /// unchanged graph.
    pub fn canonical_order(&self) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial]);
        seen[self.initial.index()] = true;
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for transition in self.state(id).sorted_transitions() {
                let target = transition.target;
                if !seen[target.index()] {
                    seen[target.index()] = true;
                    queue.push_back(target);
                }
            }
        }
        order
    }

    /// Renumber states in [`canonical_order`](Self::canonical_order),
    /// dropping unreachable states and naming every state by its new number.
    pub fn label_states_topology(self) -> Fst {
        let order = self.canonical_order();
        let mut renumber = vec![None; self.states.len()];
        for (new, old) in order.iter().enumerate() {
            renumber[old.index()] = Some(StateId::new(new));
        }

        let mut relabeled = Fst {
            alphabet: self.alphabet.clone(),
            initial: StateId::new(0),
            states: (0..order.len()).map(|n| State::named(n.to_string())).collect(),
            finals: BTreeSet::new(),
        };
        for (new, old) in order.iter().enumerate() {
            let source = StateId::new(new);
            let state = self.state(*old);
            if state.is_final() {
                relabeled.set_final(source, state.final_weight());
            }
            for t in state.all_transitions() {
                // Targets of reachable states are reachable.
                if let Some(target) = renumber[t.target.index()] {
                    relabeled.add_transition(source, target, t.label.clone(), t.weight);
                }
            }
        }
        relabeled
    }

    /// Assert the structural invariants in debug builds.
    pub fn debug_check_invariants(&self) {
        debug_assert!(self.contains(self.initial), "initial state outside the arena");
        debug_assert!(
            self.finals.iter().all(|&id| self.contains(id) && self.state(id).is_final()),
            "final set holds a missing or non-final state"
        );
        debug_assert!(
            self.states()
                .all(|(id, state)| state.is_final() == self.finals.contains(&id)),
            "state with finite final weight missing from the final set"
        );
        debug_assert!(
            self.states.iter().all(|state| state.is_well_formed(self.states.len())),
            "malformed transition table"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_single_non_final_state() {
        let fst = Fst::new();
        assert_eq!(fst.num_states(), 1);
        assert!(fst.finals().is_empty());
        assert!(fst.alphabet().is_empty());
        fst.debug_check_invariants();
    }

    #[test]
    fn from_label_builds_two_states() {
        let fst = Fst::from_label(Label::pair("a", "b"), 1.5);
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.num_transitions(), 1);
        assert_eq!(fst.sorted_alphabet(), vec!["a", "b"]);
        let target = *fst.finals().iter().next().unwrap();
        assert_eq!(fst.state(target).final_weight(), 1.5);
        fst.debug_check_invariants();
    }

    #[test]
    fn epsilon_label_makes_initial_final() {
        let fst = Fst::from_label(Label::epsilon(), 0.0);
        assert_eq!(fst.num_states(), 1);
        assert!(fst.is_final(fst.initial_state()));
        assert_eq!(fst.num_transitions(), 0);
    }

    #[test]
    fn character_ranges_one_arc_per_char() {
        let fst = Fst::character_ranges(['a'..='c', 'b'..='d'], false);
        assert_eq!(fst.num_transitions(), 4);
        assert_eq!(fst.sorted_alphabet(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn complemented_ranges_use_wildcard() {
        let fst = Fst::character_ranges(['a'..='b'], true);
        assert_eq!(fst.num_transitions(), 1);
        let initial = fst.state(fst.initial_state());
        assert!(initial.transitions().contains_key(&Label::identity(".")));
        assert_eq!(fst.sorted_alphabet(), vec![".", "a", "b"]);
    }

    #[test]
    fn final_set_tracks_final_weight() {
        let mut fst = Fst::new();
        let s = fst.add_state();
        fst.set_final(s, 2.0);
        assert!(fst.is_final(s));
        fst.unset_final(s);
        assert!(!fst.is_final(s));
        assert!(!fst.state(s).is_final());
        fst.debug_check_invariants();
    }

    #[test]
    fn infinite_final_weight_unsets_the_state() {
        let mut fst = Fst::new();
        let s = fst.add_state();
        fst.set_final(s, 1.0);
        fst.set_final(s, Weight::INFINITY);
        assert!(!fst.is_final(s));
        assert!(!fst.state(s).is_final());
        assert!(fst.finals().is_empty());
        fst.debug_check_invariants();
    }

    #[test]
    fn remove_transitions_leaves_no_empty_label() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        let q1 = fst.add_state();
        fst.add_transition(q0, q1, Label::identity("a"), 0.0);
        fst.remove_transitions_to(q0, &[q1].into_iter().collect());
        assert!(fst.state(q0).transitions().is_empty());
        fst.debug_check_invariants();
    }

    #[test]
    fn transitions_by_label_collects_targets() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        let q1 = fst.add_state();
        let q2 = fst.add_state();
        fst.add_transition(q0, q1, Label::identity("a"), 0.0);
        fst.add_transition(q1, q2, Label::identity("a"), 0.0);
        fst.add_transition(q1, q2, Label::identity("b"), 0.0);

        let grouped = fst.all_transitions_by_label([q0, q1]);
        assert_eq!(grouped[&Label::identity("a")], BTreeSet::from([q1, q2]));
        assert_eq!(grouped[&Label::identity("b")], BTreeSet::from([q2]));
        assert_eq!(fst.all_transitions([q1]).count(), 2);
    }

    #[test]
    fn replace_with_swaps_everything() {
        let mut fst = Fst::new();
        let other = Fst::from_label(Label::identity("z"), 0.0);
        let old = fst.replace_with(other);
        assert_eq!(old.num_states(), 1);
        assert_eq!(fst.num_states(), 2);
        assert!(fst.alphabet().contains("z"));
    }

    #[test]
    fn copy_mod_rewrites_labels_and_weights() {
        let fst = Fst::from_label(Label::identity("a"), 0.0);
        let copy = fst.copy_mod(
            |label, _| Label::pair(label.input(), "A"),
            |_, weight| weight + 1.0,
        );
        let t = copy.all_transitions(copy.state_ids()).next().unwrap().1;
        assert_eq!(t.label, Label::pair("a", "A"));
        assert_eq!(t.weight, 1.0);
        assert_eq!(copy.finals(), fst.finals());
    }

    #[test]
    fn copy_filtered_drops_labels() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        let q1 = fst.add_named_state("end");
        fst.add_transition(q0, q1, Label::identity("a"), 0.0);
        fst.add_transition(q0, q1, Label::identity("b"), 0.0);
        let copy = fst.copy_filtered(|label| label.input() != "b");
        assert_eq!(copy.num_transitions(), 1);
        assert_eq!(copy.state(q1).name(), Some("end"));
    }

    #[test]
    fn number_unnamed_states_skips_named() {
        let mut fst = Fst::new();
        let named = fst.add_named_state("Noun");
        let anon = fst.add_state();
        let keys = fst.number_unnamed_states(false);
        assert_eq!(keys[&fst.initial_state()], "0");
        assert_eq!(keys[&named], "Noun");
        assert_eq!(keys[&anon], "1");

        let forced = fst.number_unnamed_states(true);
        assert_eq!(forced[&named], "1");
        assert_eq!(forced[&anon], "2");
    }

    #[test]
    fn canonical_order_is_breadth_first_and_skips_unreachable() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        let unreachable = fst.add_state();
        let b = fst.add_state();
        let a = fst.add_state();
        fst.add_transition(q0, b, Label::identity("b"), 0.0);
        fst.add_transition(q0, a, Label::identity("a"), 0.0);
        assert_eq!(fst.canonical_order(), vec![q0, a, b]);
        assert!(!fst.canonical_order().contains(&unreachable));
    }

    #[test]
    fn label_states_topology_renumbers() {
        let mut fst = Fst::new();
        let q0 = fst.initial_state();
        let _unreachable = fst.add_state();
        let q2 = fst.add_state();
        fst.add_transition(q0, q2, Label::identity("a"), 0.5);
        fst.set_final(q2, 0.0);

        let relabeled = fst.label_states_topology();
        assert_eq!(relabeled.num_states(), 2);
        let end = StateId::new(1);
        assert!(relabeled.is_final(end));
        assert_eq!(relabeled.state(end).name(), Some("1"));
        relabeled.debug_check_invariants();
    }

    #[test]
    fn cleanup_sigma_prunes_unused_symbols() {
        let mut fst = Fst::from_label(Label::identity("a"), 0.0);
        fst.add_symbol("zzz");
        fst.cleanup_sigma();
        assert_eq!(fst.sorted_alphabet(), vec!["a"]);

        let mut wild = Fst::character_ranges(['x'..='y'], true);
        wild.cleanup_sigma();
        assert!(wild.alphabet().contains("x"));

        // Chained use of the returned handle.
        let mut chained = Fst::from_label(Label::pair("a", "b"), 0.0);
        chained.add_symbol("unused");
        assert_eq!(chained.cleanup_sigma().sorted_alphabet(), vec!["a", "b"]);
    }
}
