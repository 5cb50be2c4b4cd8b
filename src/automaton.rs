use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::btset::BTSet;
use crate::error::{Error, Result};
use crate::state::{State, Uid};
use crate::symbol::{Symbol, EPSILON};
use crate::target::Target;

/// The generic automaton container: `(Q, Σ, δ, I, F)`.
///
/// `T` is the edge-target shape — [`State`] for a deterministic edge,
/// [`BTSet<State>`] for a nondeterministic fan-out. This is the
/// capability distinction the rest of the crate is built around: an
/// [`Nfa`] and a [`Dfa`] share every query and structural mutator defined
/// here, and each only gets the extra inherent methods its shape allows
/// (see the `impl Automaton<BTSet<State>>` and `impl Automaton<State>`
/// blocks).
///
/// `Q` is implicit: it is exactly the key set of `delta`. Every state
/// named anywhere as an edge target is also a key of `delta`, even if it
/// has no outgoing edges of its own — `ensure_state` is the only place
/// that invariant is established.
#[derive(Debug, Clone, PartialEq)]
pub struct Automaton<T: Target> {
    delta: HashMap<State, HashMap<Symbol, T>>,
    initials: BTSet<State>,
    finals: BTSet<State>,
}

/// A nondeterministic automaton, possibly with epsilon edges.
pub type Nfa = Automaton<BTSet<State>>;

/// A deterministic automaton: at most one target per `(state, symbol)`,
/// no epsilon edges.
pub type Dfa = Automaton<State>;

/// A raw edge target, as read from or written to an external form: either
/// a single uid or a set of uids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTarget {
    One(Uid),
    Many(BTreeSet<Uid>),
}

/// The raw transition table: `uid -> (label -> target)`.
pub type RawDelta = HashMap<Uid, HashMap<String, RawTarget>>;

impl<T: Target> Default for Automaton<T> {
    fn default() -> Self {
        Automaton {
            delta: HashMap::new(),
            initials: BTSet::new(),
            finals: BTSet::new(),
        }
    }
}

impl<T: Target> Automaton<T> {
    /// The empty automaton: no states, no symbols, no initial or final
    /// states.
    pub fn new() -> Self {
        Automaton::default()
    }

    /// Build an automaton from its raw parts, restoring the invariant
    /// that every edge target also appears as a key of `delta` (with an
    /// empty out-edge map if it had none already).
    pub fn from_parts(
        delta: HashMap<State, HashMap<Symbol, T>>,
        initials: BTSet<State>,
        finals: BTSet<State>,
    ) -> Self {
        let mut automaton = Automaton {
            delta,
            initials,
            finals,
        };
        let missing: Vec<State> = automaton
            .delta
            .values()
            .flat_map(|edges| edges.values())
            .flat_map(|target| target.as_state_set().into_iter())
            .filter(|state| !automaton.delta.contains_key(state))
            .collect();
        for state in missing {
            automaton.ensure_state(&state);
        }
        automaton
    }

    fn ensure_state(&mut self, state: &State) {
        self.delta.entry(state.clone()).or_insert_with(HashMap::new);
    }

    pub fn has_state(&self, state: &State) -> bool {
        self.delta.contains_key(state)
    }

    pub fn has_all_states(&self, states: &BTSet<State>) -> bool {
        states.iter().all(|s| self.has_state(s))
    }

    pub fn has_any_states(&self, states: &BTSet<State>) -> bool {
        states.iter().any(|s| self.has_state(s))
    }

    pub fn get_states(&self) -> BTSet<State> {
        self.delta.keys().cloned().collect()
    }

    pub fn initials(&self) -> &BTSet<State> {
        &self.initials
    }

    pub fn finals(&self) -> &BTSet<State> {
        &self.finals
    }

    /// The set of symbols used by at least one edge. Never contains the
    /// epsilon symbol unless some edge actually carries it.
    pub fn alphabet(&self) -> BTSet<Symbol> {
        let mut alphabet = BTSet::new();
        for edges in self.delta.values() {
            for symbol in edges.keys() {
                alphabet.insert(symbol.clone());
            }
        }
        alphabet
    }

    /// The out-edges of `state`, if it is a member of `Q`.
    pub fn edges_of(&self, state: &State) -> Option<&HashMap<Symbol, T>> {
        self.delta.get(state)
    }

    pub fn set_initial_state(&mut self, state: State) -> Result<bool> {
        if !self.has_state(&state) {
            return Err(Error::InvariantViolation(format!(
                "cannot mark {state} initial: it is not in Q"
            )));
        }
        Ok(self.initials.insert(state))
    }

    pub fn set_initial_states(&mut self, states: BTSet<State>) -> Result<bool> {
        if !self.has_all_states(&states) {
            return Err(Error::InvariantViolation(
                "initial states must be a subset of Q".into(),
            ));
        }
        let mut changed = false;
        for state in states {
            changed |= self.initials.insert(state);
        }
        Ok(changed)
    }

    pub fn unset_initial_state(&mut self, state: &State) -> bool {
        self.initials.remove(state)
    }

    pub fn unset_initial_states(&mut self, states: &BTSet<State>) -> bool {
        let mut changed = false;
        for state in states.iter() {
            changed |= self.initials.remove(state);
        }
        changed
    }

    pub fn clear_initial_states(&mut self) -> bool {
        if self.initials.is_empty() {
            return false;
        }
        self.initials = BTSet::new();
        true
    }

    pub fn set_final_state(&mut self, state: State) -> Result<bool> {
        if !self.has_state(&state) {
            return Err(Error::InvariantViolation(format!(
                "cannot mark {state} final: it is not in Q"
            )));
        }
        Ok(self.finals.insert(state))
    }

    pub fn set_final_states(&mut self, states: BTSet<State>) -> Result<bool> {
        if !self.has_all_states(&states) {
            return Err(Error::InvariantViolation(
                "final states must be a subset of Q".into(),
            ));
        }
        let mut changed = false;
        for state in states {
            changed |= self.finals.insert(state);
        }
        Ok(changed)
    }

    pub fn unset_final_state(&mut self, state: &State) -> bool {
        self.finals.remove(state)
    }

    pub fn unset_final_states(&mut self, states: &BTSet<State>) -> bool {
        let mut changed = false;
        for state in states.iter() {
            changed |= self.finals.remove(state);
        }
        changed
    }

    pub fn clear_final_states(&mut self) -> bool {
        if self.finals.is_empty() {
            return false;
        }
        self.finals = BTSet::new();
        true
    }

    /// Remove a state and everything that refers to it: its own out-edges
    /// (returned, so a caller can inspect what was lost), any edge
    /// targeting it, and its membership in `I`/`F`.
    pub fn remove_state(&mut self, state: &State) -> Option<HashMap<Symbol, T>> {
        let removed = self.delta.remove(state)?;
        self.initials.remove(state);
        self.finals.remove(state);
        for edges in self.delta.values_mut() {
            edges.retain(|_, target| {
                if !target.contains(state) {
                    return true;
                }
                match target.without(state) {
                    Some(remaining) => {
                        *target = remaining;
                        true
                    }
                    None => false,
                }
            });
        }
        Some(removed)
    }

    pub fn remove_states(&mut self, states: &BTSet<State>) {
        for state in states.iter() {
            self.remove_state(state);
        }
    }

    /// The reversed automaton: every edge `p --a--> q` becomes `q --a-->
    /// p`, and `I`/`F` swap. The result is always nondeterministic, since
    /// several states may now share an edge into the same predecessor.
    pub fn reverse(&self) -> Nfa {
        let mut delta: HashMap<State, HashMap<Symbol, BTSet<State>>> = HashMap::new();
        for state in self.delta.keys() {
            delta.entry(state.clone()).or_insert_with(HashMap::new);
        }
        for (source, edges) in &self.delta {
            for (symbol, target) in edges {
                for destination in target.as_state_set().iter() {
                    delta
                        .entry(destination.clone())
                        .or_insert_with(HashMap::new)
                        .entry(symbol.clone())
                        .or_insert_with(BTSet::new)
                        .insert(source.clone());
                }
            }
        }
        Automaton {
            delta,
            initials: self.finals.clone(),
            finals: self.initials.clone(),
        }
    }

    /// Iterate over every transition as a `(source, symbol, target)`
    /// triple.
    pub fn iter(&self) -> impl Iterator<Item = (&State, &Symbol, &T)> {
        self.delta
            .iter()
            .flat_map(|(state, edges)| edges.iter().map(move |(symbol, target)| (state, symbol, target)))
    }

    pub fn to_raw(&self) -> (RawDelta, BTreeSet<Uid>, BTreeSet<Uid>) {
        let mut raw_delta = RawDelta::new();
        for (state, edges) in &self.delta {
            let mut inner = HashMap::new();
            for (symbol, target) in edges {
                let members = target.as_state_set();
                let raw_target = if members.len() == 1 {
                    RawTarget::One(members.iter().next().unwrap().uid().clone())
                } else {
                    RawTarget::Many(members.iter().map(|s| s.uid().clone()).collect())
                };
                inner.insert(symbol.value().to_string(), raw_target);
            }
            raw_delta.insert(state.uid().clone(), inner);
        }
        let initials = self.initials.iter().map(|s| s.uid().clone()).collect();
        let finals = self.finals.iter().map(|s| s.uid().clone()).collect();
        (raw_delta, initials, finals)
    }
}

fn join_states(states: &BTSet<State>) -> String {
    states.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}

impl<T: Target> fmt::Display for Automaton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {{{}}}", join_states(&self.get_states()))?;
        writeln!(f, "I = {{{}}}", join_states(&self.initials))?;
        write!(f, "F = {{{}}}", join_states(&self.finals))
    }
}

/// Converts a single raw target into `T`. `Ok(None)` means the edge is
/// empty and should be treated as absent.
fn state_target_from_raw(raw: RawTarget) -> Result<Option<State>> {
    match raw {
        RawTarget::One(uid) => Ok(Some(State::from_uid(uid))),
        RawTarget::Many(uids) => {
            if uids.is_empty() {
                Ok(None)
            } else if uids.len() == 1 {
                Ok(Some(State::from_uid(uids.into_iter().next().unwrap())))
            } else {
                Err(Error::InvariantViolation(
                    "a deterministic edge cannot target more than one state".into(),
                ))
            }
        }
    }
}

fn set_target_from_raw(raw: RawTarget) -> Option<BTSet<State>> {
    match raw {
        RawTarget::One(uid) => Some(BTSet::from_iter([State::from_uid(uid)])),
        RawTarget::Many(uids) => {
            if uids.is_empty() {
                None
            } else {
                Some(uids.into_iter().map(State::from_uid).collect())
            }
        }
    }
}

impl Automaton<State> {
    /// Rejects an epsilon symbol and a target that conflicts with an
    /// existing deterministic edge on the same `(state, symbol)` pair.
    pub fn add_transition(&mut self, from: State, symbol: Symbol, to: State) -> Result<bool> {
        if symbol.is_epsilon() {
            return Err(Error::ForbiddenOperation(
                "epsilon transitions are forbidden in a DFA".into(),
            ));
        }
        self.ensure_state(&from);
        self.ensure_state(&to);
        let edges = self.delta.get_mut(&from).unwrap();
        match edges.get(&symbol) {
            Some(existing) if *existing != to => Err(Error::InvariantViolation(format!(
                "conflicting deterministic edge on ({from}, {symbol}): already targets {existing}, cannot also target {to}"
            ))),
            Some(_) => Ok(false),
            None => {
                edges.insert(symbol, to);
                Ok(true)
            }
        }
    }

    /// Sets the `(from, symbol)` edge to `to`. With `replace = false`, an
    /// existing edge on the same pair is left untouched even if it
    /// differs from `to`.
    pub fn set_transition(&mut self, from: State, symbol: Symbol, to: State, replace: bool) -> Result<bool> {
        if symbol.is_epsilon() {
            return Err(Error::ForbiddenOperation(
                "epsilon transitions are forbidden in a DFA".into(),
            ));
        }
        self.ensure_state(&from);
        self.ensure_state(&to);
        let edges = self.delta.get_mut(&from).unwrap();
        if let Some(existing) = edges.get(&symbol) {
            if *existing == to {
                return Ok(false);
            }
            if !replace {
                return Ok(false);
            }
        }
        edges.insert(symbol, to);
        Ok(true)
    }

    pub fn remove_transition(&mut self, from: &State, symbol: &Symbol) -> bool {
        self.delta
            .get_mut(from)
            .map(|edges| edges.remove(symbol).is_some())
            .unwrap_or(false)
    }

    pub fn apply_delta(&self, from: &State, symbol: &Symbol) -> Option<&State> {
        self.delta.get(from)?.get(symbol)
    }

    /// Walks the DFA from its (single) initial state, one symbol at a
    /// time. A DFA with no initial state, or one that hits a missing
    /// transition partway through, rejects every word.
    pub fn accept(&self, word: &str) -> bool {
        let mut current = match self.initials.iter().next() {
            Some(state) => state.clone(),
            None => return false,
        };
        for ch in word.chars() {
            let symbol = Symbol::from(ch);
            match self.apply_delta(&current, &symbol) {
                Some(next) => current = next.clone(),
                None => return false,
            }
        }
        self.finals.contains(&current)
    }

    /// Widen a deterministic edge shape into a nondeterministic one,
    /// wrapping every single target in a singleton set. Used internally
    /// to reuse the NFA machinery (the fictive-state trick in
    /// minimization, the merge-initials trick in Brzozowski reversal) on
    /// top of an already-deterministic automaton.
    pub fn widen(&self) -> Nfa {
        let mut delta = HashMap::new();
        for (state, edges) in &self.delta {
            let mut inner = HashMap::new();
            for (symbol, target) in edges {
                inner.insert(symbol.clone(), target.as_state_set());
            }
            delta.insert(state.clone(), inner);
        }
        Automaton {
            delta,
            initials: self.initials.clone(),
            finals: self.finals.clone(),
        }
    }

    /// Build a DFA from its raw form. A target stored as a multi-member
    /// set is an error (`InvariantViolation`); a target stored as an
    /// empty set is treated as a missing edge. A label equal to `EPSILON`
    /// is rejected (`ForbiddenOperation`), matching `add_transition`/
    /// `set_transition`'s own epsilon guard.
    pub fn from_raw(delta: RawDelta, initials: BTreeSet<Uid>, finals: BTreeSet<Uid>) -> Result<Self> {
        let mut new_delta: HashMap<State, HashMap<Symbol, State>> = HashMap::new();
        for (uid, edges) in delta {
            let state = State::from_uid(uid);
            let mut inner = HashMap::new();
            for (label, raw_target) in edges {
                if label == EPSILON {
                    return Err(Error::ForbiddenOperation(
                        "epsilon transitions are forbidden in a DFA".into(),
                    ));
                }
                if let Some(target) = state_target_from_raw(raw_target)? {
                    inner.insert(Symbol::new(label), target);
                }
            }
            new_delta.insert(state, inner);
        }
        let initials = initials.into_iter().map(State::from_uid).collect();
        let finals = finals.into_iter().map(State::from_uid).collect();
        Ok(Automaton::from_parts(new_delta, initials, finals))
    }
}

impl Automaton<BTSet<State>> {
    pub fn add_transition(&mut self, from: State, symbol: Symbol, to: State) -> bool {
        self.ensure_state(&from);
        self.ensure_state(&to);
        let mut target = BTSet::new();
        target.insert(to);
        self.add_transitions(from, symbol, target)
    }

    pub fn add_transitions(&mut self, from: State, symbol: Symbol, tos: BTSet<State>) -> bool {
        self.ensure_state(&from);
        for to in tos.iter() {
            self.ensure_state(to);
        }
        let edges = self.delta.get_mut(&from).unwrap();
        let entry = edges.entry(symbol).or_insert_with(BTSet::new);
        let mut changed = false;
        for to in tos {
            changed |= entry.insert(to);
        }
        changed
    }

    pub fn set_transition(&mut self, from: State, symbol: Symbol, to: State, replace: bool) -> bool {
        let mut target = BTSet::new();
        target.insert(to);
        self.set_transitions(from, symbol, target, replace)
    }

    /// With `replace = false`, a nonempty existing target set is left
    /// untouched; with `replace = true`, it is overwritten wholesale
    /// (not merged — use [`Automaton::add_transitions`] to merge).
    pub fn set_transitions(&mut self, from: State, symbol: Symbol, tos: BTSet<State>, replace: bool) -> bool {
        self.ensure_state(&from);
        for to in tos.iter() {
            self.ensure_state(to);
        }
        let edges = self.delta.get_mut(&from).unwrap();
        let existing_nonempty = edges.get(&symbol).map(|e| !e.is_empty()).unwrap_or(false);
        if existing_nonempty && !replace {
            return false;
        }
        let changed = edges.get(&symbol) != Some(&tos);
        edges.insert(symbol, tos);
        changed
    }

    pub fn remove_transition(&mut self, from: &State, symbol: &Symbol, to: &State) -> bool {
        let Some(edges) = self.delta.get_mut(from) else {
            return false;
        };
        let Some(targets) = edges.get_mut(symbol) else {
            return false;
        };
        let removed = targets.remove(to);
        if targets.is_empty() {
            edges.remove(symbol);
        }
        removed
    }

    pub fn remove_transitions(&mut self, from: &State, symbol: &Symbol, tos: &BTSet<State>) -> bool {
        let Some(edges) = self.delta.get_mut(from) else {
            return false;
        };
        let Some(targets) = edges.get_mut(symbol) else {
            return false;
        };
        let mut changed = false;
        for to in tos.iter() {
            changed |= targets.remove(to);
        }
        if targets.is_empty() {
            edges.remove(symbol);
        }
        changed
    }

    fn step(&self, states: &BTSet<State>, symbol: &Symbol) -> BTSet<State> {
        let mut result = BTSet::new();
        for state in states.iter() {
            if let Some(target) = self.delta.get(state).and_then(|edges| edges.get(symbol)) {
                result.insert_all(target.clone());
            }
        }
        result
    }

    /// The set of states reachable from `states` using only epsilon
    /// edges, including `states` itself.
    pub fn epsilon_closure(&self, states: &BTSet<State>) -> BTSet<State> {
        let epsilon = Symbol::epsilon();
        let mut closure = states.clone();
        let mut frontier: Vec<State> = closure.iter().cloned().collect();
        while let Some(state) = frontier.pop() {
            if let Some(targets) = self.delta.get(&state).and_then(|edges| edges.get(&epsilon)) {
                for target in targets.iter() {
                    if closure.insert(target.clone()) {
                        frontier.push(target.clone());
                    }
                }
            }
        }
        closure
    }

    /// Walks the NFA (epsilon edges included) from the epsilon-closure
    /// of `I`, taking the closure of every successor set as it goes.
    pub fn accept(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure(&self.initials);
        for ch in word.chars() {
            let symbol = Symbol::from(ch);
            current = self.epsilon_closure(&self.step(&current, &symbol));
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|state| self.finals.contains(state))
    }

    /// Build an NFA from its raw form. Unlike the DFA loader, a
    /// multi-member raw target is perfectly ordinary here.
    pub fn from_raw(delta: RawDelta, initials: BTreeSet<Uid>, finals: BTreeSet<Uid>) -> Self {
        let mut new_delta: HashMap<State, HashMap<Symbol, BTSet<State>>> = HashMap::new();
        for (uid, edges) in delta {
            let state = State::from_uid(uid);
            let mut inner = HashMap::new();
            for (label, raw_target) in edges {
                if let Some(target) = set_target_from_raw(raw_target) {
                    inner.insert(Symbol::new(label), target);
                }
            }
            new_delta.insert(state, inner);
        }
        let initials = initials.into_iter().map(State::from_uid).collect();
        let finals = finals.into_iter().map(State::from_uid).collect();
        Automaton::from_parts(new_delta, initials, finals)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_dfa() -> Dfa {
        let mut dfa: Dfa = Automaton::new();
        dfa.add_transition(State::new("q0"), Symbol::new("a"), State::new("q1"))
            .unwrap();
        dfa.add_transition(State::new("q1"), Symbol::new("a"), State::new("q1"))
            .unwrap();
        dfa.set_initial_state(State::new("q0")).unwrap();
        dfa.set_final_state(State::new("q1")).unwrap();
        dfa
    }

    #[test]
    fn dfa_rejects_epsilon() {
        let mut dfa: Dfa = Automaton::new();
        dfa.add_transition(State::new("q0"), Symbol::new("a"), State::new("q0")).unwrap();
        let result = dfa.add_transition(State::new("q0"), Symbol::epsilon(), State::new("q0"));
        assert!(matches!(result, Err(Error::ForbiddenOperation(_))));
    }

    #[test]
    fn dfa_rejects_conflicting_edge() {
        let mut dfa: Dfa = Automaton::new();
        dfa.add_transition(State::new("q0"), Symbol::new("a"), State::new("q1")).unwrap();
        let result = dfa.add_transition(State::new("q0"), Symbol::new("a"), State::new("q2"));
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn dfa_accept_walks_symbols() {
        let dfa = small_dfa();
        assert!(dfa.accept("a"));
        assert!(dfa.accept("aaa"));
        assert!(!dfa.accept(""));
        assert!(!dfa.accept("b"));
    }

    #[test]
    fn remove_state_prunes_dangling_edges() {
        let mut dfa = small_dfa();
        dfa.remove_state(&State::new("q1"));
        assert!(!dfa.has_state(&State::new("q1")));
        assert!(dfa.edges_of(&State::new("q0")).unwrap().is_empty());
        assert!(dfa.finals().is_empty());
    }

    #[test]
    fn reverse_swaps_initial_and_final() {
        let dfa = small_dfa();
        let reversed = dfa.reverse();
        assert_eq!(reversed.initials(), dfa.finals());
        assert_eq!(reversed.finals(), dfa.initials());
        assert!(reversed.apply_delta_exists(&State::new("q1"), &Symbol::new("a")));
    }

    impl Automaton<BTSet<State>> {
        fn apply_delta_exists(&self, from: &State, symbol: &Symbol) -> bool {
            self.edges_of(from).and_then(|e| e.get(symbol)).is_some()
        }
    }

    #[test]
    fn nfa_accept_with_fanout() {
        let mut nfa: Nfa = Automaton::new();
        nfa.add_transition(State::new("s"), Symbol::new("a"), State::new("s"));
        nfa.add_transition(State::new("s"), Symbol::new("a"), State::new("t"));
        nfa.add_transition(State::new("t"), Symbol::new("b"), State::new("u"));
        nfa.set_initial_state(State::new("s")).unwrap();
        nfa.set_final_state(State::new("u")).unwrap();
        assert!(nfa.accept("ab"));
        assert!(!nfa.accept("b"));
    }

    #[test]
    fn to_raw_round_trips_through_from_raw() {
        let dfa = small_dfa();
        let (delta, initials, finals) = dfa.to_raw();
        let rebuilt = Automaton::<State>::from_raw(delta, initials, finals).unwrap();
        assert_eq!(dfa, rebuilt);
    }

    #[test]
    fn remove_state_prunes_scalar_edge_without_panicking() {
        // The specific regression: a deterministic (scalar) edge pointing
        // at the removed state must drop the whole entry, not rebuild
        // `State::from_state_set` from an empty set.
        let mut dfa = small_dfa();
        dfa.remove_state(&State::new("q1"));
        assert!(dfa.edges_of(&State::new("q0")).unwrap().is_empty());
    }

    #[test]
    fn dfa_from_raw_rejects_epsilon_label() {
        let mut delta = RawDelta::new();
        let mut edges = HashMap::new();
        edges.insert(crate::symbol::EPSILON.to_string(), RawTarget::One(Uid::from("q1")));
        delta.insert(Uid::from("q0"), edges);
        delta.insert(Uid::from("q1"), HashMap::new());

        let result = Automaton::<State>::from_raw(delta, BTreeSet::new(), BTreeSet::new());
        assert!(matches!(result, Err(Error::ForbiddenOperation(_))));
    }
}
