//! The acceptance-check oracle of `spec.md` §6: "an engine for
//! `accepts(string, δ, i₀, F)` that walks the DFA one symbol at a time."
//!
//! `Nfa`/`Dfa` each already carry an inherent `accept` method (used by
//! most tests and call sites); this module exists as the free-function,
//! raw-form-shaped oracle the spec calls out separately, for test code
//! that wants to check a raw `(delta, initial, finals)` triple without
//! constructing an `Automaton` first.

use crate::automaton::RawDelta;
use crate::state::Uid;
use crate::symbol::Symbol;

/// Walks a deterministic raw transition table one symbol at a time,
/// starting from `initial`. Returns `true` iff every step found a
/// defined transition and the final state reached is in `finals`.
pub fn accepts(word: &str, delta: &RawDelta, initial: &Uid, finals: &[Uid]) -> bool {
    use crate::automaton::RawTarget;

    let mut current = initial.clone();
    for ch in word.chars() {
        let symbol = Symbol::from(ch);
        let Some(edges) = delta.get(&current) else {
            return false;
        };
        let Some(target) = edges.get(symbol.value()) else {
            return false;
        };
        current = match target {
            RawTarget::One(uid) => uid.clone(),
            RawTarget::Many(uids) if uids.len() == 1 => uids.iter().next().unwrap().clone(),
            RawTarget::Many(_) => return false,
        };
    }
    finals.contains(&current)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::automaton::RawTarget;
    use std::collections::HashMap;

    /// spec.md §8 scenario 1: startswith "00" over alphabet "01".
    #[test]
    fn startswith_00() {
        let mut delta: RawDelta = HashMap::new();
        let mut edges_1 = HashMap::new();
        edges_1.insert("0".to_string(), RawTarget::One(Uid::from("2")));
        delta.insert(Uid::from("1"), edges_1);

        let mut edges_2 = HashMap::new();
        edges_2.insert("0".to_string(), RawTarget::One(Uid::from("3")));
        delta.insert(Uid::from("2"), edges_2);

        let mut edges_3 = HashMap::new();
        edges_3.insert("0".to_string(), RawTarget::One(Uid::from("3")));
        edges_3.insert("1".to_string(), RawTarget::One(Uid::from("3")));
        delta.insert(Uid::from("3"), edges_3);

        let initial = Uid::from("1");
        let finals = [Uid::from("3")];

        assert!(accepts("00", &delta, &initial, &finals));
        assert!(accepts("001", &delta, &initial, &finals));
        assert!(!accepts("0", &delta, &initial, &finals));
        assert!(!accepts("10", &delta, &initial, &finals));
    }
}
