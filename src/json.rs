//! JSON convenience constructors, kept from the teacher crate as
//! fixture-loading sugar over the raw-form conversions `spec.md` §6
//! actually specifies (`from_raw`/`to_raw`). Not part of the wire-format
//! contract — "No wire format, no CLI" (spec.md §6) still governs the
//! core; this is test/demo tooling only, grounded in the teacher's
//! `fsm.rs`/`dfa.rs`/`nfa.rs`/`nfae.rs` `from_json`/`from_json_file`
//! pairs, retargeted to build `Nfa`/`Dfa` values instead of the
//! teacher's separate `FSM`/`DFA`/`NFA`/`NFAE` structs.
//!
//! Expected shape, matching the teacher's doc comments:
//! ```json
//! {
//!   "states": ["q_0", "q_1"],
//!   "alphabet": ["a", "b"],
//!   "ends": ["q_1"],
//!   "start": "q_0",
//!   "delta": [
//!     {"state": "q_0", "symbol": "a", "image": "q_1"}
//!   ]
//! }
//! ```
//! An NFA/NFAE fixture has `"starts"` (plural) instead of `"start"`, and
//! `"images"` (a JSON array) instead of `"image"`.

use std::collections::{BTreeSet, HashMap};
use std::fs;

use serde_json::Value;

use crate::automaton::{Dfa, Nfa, RawDelta, RawTarget};
use crate::error::{Error, Result};
use crate::state::Uid;

fn read_file(path: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::TypeMismatch(format!("could not read {path}: {e}")))
}

fn parse(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| Error::TypeMismatch(format!("invalid JSON: {e}")))
}

fn as_str_array(value: &Value, field: &str) -> Result<Vec<String>> {
    value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::TypeMismatch(format!("missing array field {field:?}")))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::TypeMismatch(format!("{field:?} entries must be strings")))
        })
        .collect()
}

/// Parses the common `"delta"` array shape into a [`RawDelta`], reading
/// either a single `"image"` string (DFA fixtures) or an `"images"` array
/// (NFA/NFAE fixtures) per entry.
fn parse_delta(content_json: &Value) -> Result<RawDelta> {
    let entries = content_json
        .get("delta")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::TypeMismatch("missing array field \"delta\"".into()))?;

    let mut delta: RawDelta = HashMap::new();
    for entry in entries {
        let state = entry
            .get("state")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::TypeMismatch("delta entry missing \"state\"".into()))?;
        let symbol = entry
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::TypeMismatch("delta entry missing \"symbol\"".into()))?;

        let target = if let Some(image) = entry.get("image").and_then(Value::as_str) {
            RawTarget::One(Uid::from(image))
        } else if let Some(images) = entry.get("images").and_then(Value::as_array) {
            let uids: BTreeSet<Uid> = images
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(Uid::from)
                        .ok_or_else(|| Error::TypeMismatch("\"images\" entries must be strings".into()))
                })
                .collect::<Result<_>>()?;
            RawTarget::Many(uids)
        } else {
            return Err(Error::TypeMismatch(
                "delta entry must have \"image\" or \"images\"".into(),
            ));
        };

        delta.entry(Uid::from(state)).or_insert_with(HashMap::new).insert(symbol.to_string(), target);
    }
    Ok(delta)
}

/// Builds a [`Dfa`] from a JSON fixture with a single `"start"` state.
pub fn dfa_from_json(content_json: &Value) -> Result<Dfa> {
    let delta = parse_delta(content_json)?;
    let start = content_json
        .get("start")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::TypeMismatch("missing string field \"start\"".into()))?;
    let ends = as_str_array(content_json, "ends")?;

    let initials: BTreeSet<Uid> = [Uid::from(start)].into_iter().collect();
    let finals: BTreeSet<Uid> = ends.into_iter().map(Uid::from).collect();
    Dfa::from_raw(delta, initials, finals)
}

/// Builds a [`Dfa`] from a JSON fixture file.
pub fn dfa_from_json_file(path: &str) -> Result<Dfa> {
    dfa_from_json(&parse(&read_file(path)?)?)
}

/// Builds an [`Nfa`] from a JSON fixture with a `"starts"` array. A
/// fixture whose alphabet includes the epsilon label produces epsilon
/// edges in the result, exactly as an NFAE fixture would.
pub fn nfa_from_json(content_json: &Value) -> Result<Nfa> {
    let delta = parse_delta(content_json)?;
    let starts = as_str_array(content_json, "starts")?;
    let ends = as_str_array(content_json, "ends")?;

    let initials: BTreeSet<Uid> = starts.into_iter().map(Uid::from).collect();
    let finals: BTreeSet<Uid> = ends.into_iter().map(Uid::from).collect();
    Ok(Nfa::from_raw(delta, initials, finals))
}

/// Builds an [`Nfa`] from a JSON fixture file.
pub fn nfa_from_json_file(path: &str) -> Result<Nfa> {
    nfa_from_json(&parse(&read_file(path)?)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::symbol::Symbol;
    use serde_json::json;

    #[test]
    fn dfa_from_json_matches_fixture() {
        let content = json!({
            "states": ["q_0", "q_1"],
            "alphabet": ["a", "b"],
            "ends": ["q_0"],
            "start": "q_0",
            "delta": [
                {"state": "q_0", "symbol": "a", "image": "q_1"},
                {"state": "q_1", "symbol": "b", "image": "q_0"}
            ]
        });
        let dfa = dfa_from_json(&content).unwrap();
        assert!(dfa.accept("ab"));
        assert!(dfa.accept("abab"));
        assert!(!dfa.accept("a"));
    }

    #[test]
    fn nfa_from_json_handles_fanout() {
        let content = json!({
            "states": ["s", "t", "u"],
            "alphabet": ["a", "b"],
            "ends": ["u"],
            "starts": ["s"],
            "delta": [
                {"state": "s", "symbol": "a", "images": ["s", "t"]},
                {"state": "t", "symbol": "b", "images": ["u"]}
            ]
        });
        let nfa = nfa_from_json(&content).unwrap();
        assert!(nfa.accept("ab"));
        assert!(!nfa.accept("b"));
    }

    #[test]
    fn nfae_from_json_elides_epsilon() {
        let content = json!({
            "states": ["q_0", "q_1", "q_2"],
            "alphabet": ["0", "1", "ε"],
            "ends": [],
            "starts": ["q_0"],
            "delta": [
                {"state": "q_0", "symbol": "ε", "images": ["q_1"]},
                {"state": "q_1", "symbol": "0", "images": ["q_2"]}
            ]
        });
        let nfae = nfa_from_json(&content).unwrap();
        assert!(nfae.alphabet().iter().any(|s| s.is_epsilon()));
        let reduced = crate::epsilon::eliminate_epsilon_transitions(&nfae);
        assert!(!reduced.alphabet().iter().any(|s| s.is_epsilon()));
        let _ = Symbol::epsilon();
    }

    #[test]
    fn missing_delta_is_a_type_mismatch() {
        let content = json!({"states": [], "alphabet": [], "ends": [], "start": "q_0"});
        assert!(matches!(dfa_from_json(&content), Err(Error::TypeMismatch(_))));
    }
}
