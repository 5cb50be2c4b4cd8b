//! Epsilon elimination: rewrite an [`Nfa`] that may carry EPSILON edges
//! into an equivalent one that doesn't.
//!
//! Grounded in `examples/original_source/fsm_lib/fsm.py::eliminate_epsilon_transitions`:
//! build each state's epsilon closure, saturate it to a fixed point, then
//! fold every epsilon-reachable state's non-epsilon edges into the
//! originating state and propagate initial/final membership through the
//! closure.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::automaton::Nfa;
use crate::btset::BTSet;
use crate::state::State;
use crate::symbol::Symbol;

/// Saturate `closures` (seeded with each state's direct epsilon targets
/// plus itself) to a fixed point: a state's closure absorbs the closures
/// of every member until nothing changes. Bounded by `|Q|^2` per spec.md
/// §5.
fn saturate(mut closures: HashMap<State, BTSet<State>>) -> HashMap<State, BTSet<State>> {
    let mut changed = true;
    let mut rounds = 0;
    while changed {
        changed = false;
        rounds += 1;
        let snapshot = closures.clone();
        for (state, closure) in closures.iter_mut() {
            let mut absorbed = closure.clone();
            for member in closure.iter() {
                if member == state {
                    continue;
                }
                if let Some(member_closure) = snapshot.get(member) {
                    absorbed.insert_all(member_closure.clone());
                }
            }
            if absorbed.len() != closure.len() {
                *closure = absorbed;
                changed = true;
            }
        }
        trace!(rounds, "epsilon closure saturation round");
    }
    closures
}

/// Rewrites `nfa` into an equivalent automaton with no EPSILON symbol in
/// its alphabet.
pub fn eliminate_epsilon_transitions(nfa: &Nfa) -> Nfa {
    if nfa.get_states().is_empty() || nfa.initials().is_empty() {
        debug!("eliminate_epsilon_transitions: empty input, returning empty automaton");
        return Nfa::new();
    }

    let epsilon = Symbol::epsilon();
    let mut closures: HashMap<State, BTSet<State>> = HashMap::new();
    for state in nfa.get_states().iter() {
        let mut closure = BTSet::new();
        closure.insert(state.clone());
        if let Some(edges) = nfa.edges_of(state) {
            if let Some(targets) = edges.get(&epsilon) {
                closure.insert_all(targets.clone());
            }
        }
        closures.insert(state.clone(), closure);
    }
    let closures = saturate(closures);

    let mut delta: HashMap<State, HashMap<Symbol, BTSet<State>>> = HashMap::new();
    for state in nfa.get_states().iter() {
        delta.insert(state.clone(), HashMap::new());
    }
    for state in nfa.get_states().iter() {
        let closure = &closures[state];
        for member in closure.iter() {
            let Some(edges) = nfa.edges_of(member) else {
                continue;
            };
            for (symbol, targets) in edges {
                if symbol.is_epsilon() {
                    continue;
                }
                delta
                    .get_mut(state)
                    .unwrap()
                    .entry(symbol.clone())
                    .or_insert_with(BTSet::new)
                    .insert_all(targets.clone());
            }
        }
    }

    let mut initials = BTSet::new();
    for state in nfa.initials().iter() {
        initials.insert_all(closures[state].clone());
    }

    let mut finals = BTSet::new();
    for state in nfa.get_states().iter() {
        if !closures[state].is_disjoint(nfa.finals()) {
            finals.insert(state.clone());
        }
    }

    debug!(
        states = delta.len(),
        initials = initials.len(),
        finals = finals.len(),
        "eliminate_epsilon_transitions done"
    );
    Nfa::from_parts(delta, initials, finals)
}

#[cfg(test)]
mod test {
    use super::*;

    fn s(name: &str) -> State {
        State::new(name)
    }

    /// spec.md §8 scenario 4.
    #[test]
    fn folds_epsilon_reachable_edges() {
        let mut nfa = Nfa::new();
        nfa.add_transition(s("1"), Symbol::new("b"), s("2"));
        nfa.add_transition(s("2"), Symbol::new("b"), s("4"));
        nfa.add_transition(s("2"), Symbol::epsilon(), s("3"));
        nfa.add_transition(s("3"), Symbol::new("c"), s("5"));
        nfa.add_transition(s("3"), Symbol::epsilon(), s("1"));
        nfa.add_transition(s("4"), Symbol::new("a"), s("2"));
        nfa.add_transition(s("4"), Symbol::new("c"), s("5"));
        nfa.add_transition(s("5"), Symbol::new("b"), s("4"));
        nfa.add_transition(s("5"), Symbol::epsilon(), s("3"));
        nfa.set_initial_state(s("1")).unwrap();
        nfa.set_final_state(s("4")).unwrap();

        let result = eliminate_epsilon_transitions(&nfa);

        assert!(!result.alphabet().iter().any(|sym| sym.is_epsilon()));
        // state 2 acquires c->5 via its epsilon-reachable state 3
        let edges_2 = result.edges_of(&s("2")).unwrap();
        assert!(edges_2.get(&Symbol::new("c")).unwrap().contains(&s("5")));
        // state 5 acquires c->5 via its epsilon-reachable state 3
        let edges_5 = result.edges_of(&s("5")).unwrap();
        assert!(edges_5.get(&Symbol::new("c")).unwrap().contains(&s("5")));
        // 1's epsilon closure is just {1}, so no new initials appear
        assert_eq!(result.initials().len(), 1);
        assert!(result.initials().contains(&s("1")));
    }

    #[test]
    fn empty_automaton_is_a_no_op() {
        let nfa = Nfa::new();
        let result = eliminate_epsilon_transitions(&nfa);
        assert!(result.get_states().is_empty());
    }

    #[test]
    fn propagates_final_through_closure() {
        let mut nfa = Nfa::new();
        nfa.add_transition(s("0"), Symbol::epsilon(), s("1"));
        nfa.set_initial_state(s("0")).unwrap();
        nfa.set_final_state(s("1")).unwrap();
        let result = eliminate_epsilon_transitions(&nfa);
        assert!(result.finals().contains(&s("0")));
        assert!(result.initials().contains(&s("1")));
    }
}
