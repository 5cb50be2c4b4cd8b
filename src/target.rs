use crate::btset::BTSet;
use crate::state::State;

/// Abstracts over "a single destination state" (deterministic edge) vs.
/// "a set of destination states" (nondeterministic fan-out), the one
/// semantic difference between an [`Nfa`](crate::automaton::Nfa) and a
/// [`Dfa`](crate::automaton::Dfa) edge target.
///
/// This is the capability-distinction the container uses instead of a
/// runtime subclass check: `Automaton<State>` and `Automaton<BTSet<State>>`
/// share every generic mutator/query through this trait, and each gets its
/// own inherent `impl` block for the operations only it supports (a DFA
/// rejects fan-out and epsilon; an NFA allows both).
pub trait Target: Clone + PartialEq + Eq {
    /// View the destination(s) as a set of states.
    fn as_state_set(&self) -> BTSet<State>;

    /// Build a target value from a set of states. Callers that know the
    /// set has exactly one member (e.g. a deterministic edge) still go
    /// through this, so `State::from_state_set` is the single place that
    /// decides what "one destination" means for a scalar target.
    fn from_state_set(states: BTSet<State>) -> Self;

    /// Whether `state` is among the destinations.
    fn contains(&self, state: &State) -> bool;

    /// Remove `state` from the destination(s). `None` means the target now
    /// names zero destinations — the caller should drop the whole
    /// `(symbol -> target)` entry rather than store an empty target back.
    fn without(&self, state: &State) -> Option<Self>;
}

impl Target for State {
    fn as_state_set(&self) -> BTSet<State> {
        let mut set = BTSet::new();
        set.insert(self.clone());
        set
    }

    fn from_state_set(states: BTSet<State>) -> Self {
        states
            .into_iter()
            .next()
            .expect("from_state_set called with an empty set for a scalar target")
    }

    fn contains(&self, state: &State) -> bool {
        self == state
    }

    fn without(&self, state: &State) -> Option<Self> {
        if self == state {
            None
        } else {
            Some(self.clone())
        }
    }
}

impl Target for BTSet<State> {
    fn as_state_set(&self) -> BTSet<State> {
        self.clone()
    }

    fn from_state_set(states: BTSet<State>) -> Self {
        states
    }

    fn contains(&self, state: &State) -> bool {
        BTSet::contains(self, state)
    }

    fn without(&self, state: &State) -> Option<Self> {
        let mut remaining = self.clone();
        remaining.remove(state);
        if remaining.is_empty() {
            None
        } else {
            Some(remaining)
        }
    }
}
