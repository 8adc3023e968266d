// States, transitions and per-state symbol indices.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use hashbrown::{HashMap, HashSet};
use lexfst_core::{Label, Weight};

/// Stable handle of a state inside its automaton.
///
/// Handles are arena indices assigned by the owning [`Fst`](crate::Fst);
/// they are only meaningful for that automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "state arena overflow");
        StateId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of states, used for bulk transition removal.
pub type StateSet = HashSet<StateId>;

/// Symbol → transitions carrying that symbol on one side of their label.
pub type SymbolIndex = HashMap<String, Vec<Transition>>;

/// A weighted arc to `target`. Owned by its source state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub target: StateId,
    pub label: Label,
    pub weight: Weight,
}

/// A state of the automaton.
///
/// Transitions are grouped by label; a label never maps to an empty group.
/// Groups have set semantics: the same (target, label, weight) triple is
/// stored once. A state is final iff its final weight is finite.
#[derive(Debug, Clone)]
pub struct State {
    transitions: BTreeMap<Label, Vec<Transition>>,
    final_weight: Weight,
    name: Option<String>,
    // Derived views, reset by every transition mutation.
    by_input: OnceLock<SymbolIndex>,
    by_output: OnceLock<SymbolIndex>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        Self {
            transitions: BTreeMap::new(),
            final_weight: Weight::INFINITY,
            name: None,
            by_input: OnceLock::new(),
            by_output: OnceLock::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.name = Some(name.into());
        state
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Extra cost of stopping here; `+inf` when the state is not final.
    pub fn final_weight(&self) -> Weight {
        self.final_weight
    }

    pub fn is_final(&self) -> bool {
        self.final_weight.is_finite()
    }

    pub(crate) fn set_final_weight(&mut self, weight: Weight) {
        self.final_weight = weight;
    }

    /// Transitions grouped by label, in label order.
    pub fn transitions(&self) -> &BTreeMap<Label, Vec<Transition>> {
        &self.transitions
    }

    /// Transitions with exactly this label.
    pub fn transitions_with(&self, label: &Label) -> &[Transition] {
        self.transitions.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every outgoing transition, label by label.
    pub fn all_transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values().flatten()
    }

    /// Every outgoing transition ordered by label, then weight.
    pub fn sorted_transitions(&self) -> Vec<&Transition> {
        let mut sorted = Vec::new();
        for group in self.transitions.values() {
            let start = sorted.len();
            sorted.extend(group);
            sorted[start..].sort_by(|a, b| a.weight.total_cmp(&b.weight));
        }
        sorted
    }

    pub fn out_degree(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    /// Transitions indexed by the first symbol of their label.
    pub fn transitions_in(&self) -> &SymbolIndex {
        self.by_input
            .get_or_init(|| self.build_index(|label| label.input()))
    }

    /// Transitions indexed by the last symbol of their label.
    pub fn transitions_out(&self) -> &SymbolIndex {
        self.by_output
            .get_or_init(|| self.build_index(|label| label.output()))
    }

    fn build_index(&self, key: impl Fn(&Label) -> &str) -> SymbolIndex {
        let mut index = SymbolIndex::new();
        for (label, group) in &self.transitions {
            index
                .entry(key(label).to_string())
                .or_default()
                .extend(group.iter().cloned());
        }
        index
    }

    fn invalidate(&mut self) {
        self.by_input.take();
        self.by_output.take();
    }

    pub(crate) fn add_transition(&mut self, target: StateId, label: Label, weight: Weight) {
        let group = self.transitions.entry(label.clone()).or_default();
        insert_unique(
            group,
            Transition {
                target,
                label,
                weight,
            },
        );
        self.invalidate();
    }

    pub(crate) fn remove_transitions_to(&mut self, targets: &StateSet) {
        self.transitions.retain(|_, group| {
            group.retain(|t| !targets.contains(&t.target));
            !group.is_empty()
        });
        self.invalidate();
    }

    pub(crate) fn rename_label(&mut self, original: &Label, new: Label) {
        let Some(group) = self.transitions.remove(original) else {
            return;
        };
        let merged = self.transitions.entry(new.clone()).or_default();
        for mut transition in group {
            transition.label = new.clone();
            insert_unique(merged, transition);
        }
        self.invalidate();
    }

    /// Targets of all outgoing transitions.
    pub fn all_targets(&self) -> StateSet {
        self.all_transitions().map(|t| t.target).collect()
    }

    /// Each target with the cheapest transition weight leading to it.
    pub fn all_targets_cheapest(&self) -> HashMap<StateId, Weight> {
        cheapest(self.all_transitions())
    }

    /// Like [`all_targets_cheapest`](Self::all_targets_cheapest), restricted
    /// to labels that are epsilon on every side.
    pub fn all_epsilon_targets_cheapest(&self) -> HashMap<StateId, Weight> {
        cheapest(
            self.transitions
                .iter()
                .filter(|(label, _)| label.is_epsilon())
                .flat_map(|(_, group)| group),
        )
    }

    /// Structural checks for debug builds.
    pub(crate) fn is_well_formed(&self, state_count: usize) -> bool {
        self.transitions.iter().all(|(label, group)| {
            !group.is_empty()
                && group
                    .iter()
                    .all(|t| &t.label == label && t.target.index() < state_count)
        }) && (self.final_weight.is_finite() || self.final_weight == Weight::INFINITY)
    }
}

fn insert_unique(group: &mut Vec<Transition>, transition: Transition) {
    let duplicate = group
        .iter()
        .any(|t| t.target == transition.target && t.weight == transition.weight);
    if !duplicate {
        group.push(transition);
    }
}

fn cheapest<'a>(transitions: impl Iterator<Item = &'a Transition>) -> HashMap<StateId, Weight> {
    let mut targets: HashMap<StateId, Weight> = HashMap::new();
    for t in transitions {
        let best = targets.entry(t.target).or_insert(Weight::INFINITY);
        *best = best.min(t.weight);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> StateId {
        StateId::new(n)
    }

    #[test]
    fn new_state_is_not_final() {
        let state = State::new();
        assert!(!state.is_final());
        assert_eq!(state.final_weight(), Weight::INFINITY);
        assert_eq!(state.out_degree(), 0);
    }

    #[test]
    fn duplicate_transitions_are_idempotent() {
        let mut state = State::new();
        state.add_transition(id(1), Label::identity("a"), 0.0);
        state.add_transition(id(1), Label::identity("a"), 0.0);
        assert_eq!(state.out_degree(), 1);

        // Same label, different weight or target: parallel arcs.
        state.add_transition(id(1), Label::identity("a"), 1.0);
        state.add_transition(id(2), Label::identity("a"), 0.0);
        assert_eq!(state.transitions_with(&Label::identity("a")).len(), 3);
    }

    #[test]
    fn removing_all_transitions_drops_the_label() {
        let mut state = State::new();
        state.add_transition(id(1), Label::identity("a"), 0.0);
        state.add_transition(id(2), Label::identity("b"), 0.0);
        state.add_transition(id(1), Label::identity("b"), 0.0);

        state.remove_transitions_to(&[id(1)].into_iter().collect());

        assert!(!state.transitions().contains_key(&Label::identity("a")));
        assert_eq!(state.transitions_with(&Label::identity("b")).len(), 1);
        assert!(state.transitions().values().all(|g| !g.is_empty()));
    }

    #[test]
    fn rename_merges_into_existing_label() {
        let mut state = State::new();
        state.add_transition(id(1), Label::identity("a"), 0.5);
        state.add_transition(id(2), Label::identity("b"), 0.0);

        state.rename_label(&Label::identity("a"), Label::identity("b"));

        assert!(state.transitions_with(&Label::identity("a")).is_empty());
        let merged = state.transitions_with(&Label::identity("b"));
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|t| t.label == Label::identity("b")));
        assert!(merged.iter().any(|t| t.target == id(1) && t.weight == 0.5));
    }

    #[test]
    fn indices_follow_mutations() {
        let mut state = State::new();
        state.add_transition(id(1), Label::pair("a", "x"), 0.0);
        assert_eq!(state.transitions_in()["a"].len(), 1);
        assert_eq!(state.transitions_out()["x"].len(), 1);

        // Mutation after the index was built must be visible.
        state.add_transition(id(2), Label::pair("a", "y"), 0.0);
        assert_eq!(state.transitions_in()["a"].len(), 2);
        assert!(state.transitions_out().contains_key("y"));

        state.rename_label(&Label::pair("a", "y"), Label::pair("b", "y"));
        assert_eq!(state.transitions_in()["a"].len(), 1);
        assert_eq!(state.transitions_in()["b"][0].target, id(2));

        state.remove_transitions_to(&[id(1), id(2)].into_iter().collect());
        assert!(state.transitions_in().is_empty());
        assert!(state.transitions_out().is_empty());
    }

    #[test]
    fn sorted_by_label_then_weight() {
        let mut state = State::new();
        state.add_transition(id(1), Label::identity("b"), 0.0);
        state.add_transition(id(1), Label::identity("a"), 2.0);
        state.add_transition(id(2), Label::identity("a"), 1.0);

        let order: Vec<(&str, Weight)> = state
            .sorted_transitions()
            .into_iter()
            .map(|t| (t.label.input(), t.weight))
            .collect();
        assert_eq!(order, vec![("a", 1.0), ("a", 2.0), ("b", 0.0)]);
    }

    #[test]
    fn cheapest_targets() {
        let mut state = State::new();
        state.add_transition(id(1), Label::identity("a"), 3.0);
        state.add_transition(id(1), Label::identity("b"), 1.0);
        state.add_transition(id(2), Label::epsilon(), 4.0);
        state.add_transition(id(2), Label::epsilon(), 2.0);

        let all = state.all_targets_cheapest();
        assert_eq!(all[&id(1)], 1.0);
        assert_eq!(all[&id(2)], 2.0);

        let eps = state.all_epsilon_targets_cheapest();
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[&id(2)], 2.0);
        assert_eq!(state.all_targets().len(), 2);
    }
}
