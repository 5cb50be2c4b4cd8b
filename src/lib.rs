//! A finite-state-automaton engine: epsilon-closure elimination,
//! subset-construction determinization, and two independently
//! implemented minimizers (Hopcroft partition refinement, Brzozowski
//! double-reversal) that are required to agree on every input.
//!
//! ```
//! use automaters::*;
//!
//! let mut nfa: Nfa = Automaton::new();
//! nfa.add_transition(State::new("s"), Symbol::new("a"), State::new("s"));
//! nfa.add_transition(State::new("s"), Symbol::new("a"), State::new("t"));
//! nfa.add_transition(State::new("t"), Symbol::new("b"), State::new("u"));
//! nfa.set_initial_state(State::new("s")).unwrap();
//! nfa.set_final_state(State::new("u")).unwrap();
//!
//! let dfa = determinize(&nfa, None);
//! let minimal = minimize_hopcroft(&dfa, None);
//! assert!(minimal.accept("ab"));
//! assert!(!minimal.accept("a"));
//! ```

pub mod accept;
pub mod automaton;
pub mod btset;
pub mod determinize;
pub mod epsilon;
pub mod error;
pub mod json;
pub mod minimize;
pub mod state;
pub mod symbol;
pub mod target;

pub use accept::accepts;
pub use automaton::{Automaton, Dfa, Nfa, RawDelta, RawTarget};
pub use btset::BTSet;
pub use determinize::{determinize, NameGenerator};
pub use epsilon::eliminate_epsilon_transitions;
pub use error::{Error, Result};
pub use json::{dfa_from_json, dfa_from_json_file, nfa_from_json, nfa_from_json_file};
pub use minimize::{isomorphic_on_reachable, minimize_brzozowski, minimize_hopcroft};
pub use state::{State, Uid};
pub use symbol::{Symbol, EPSILON};
pub use target::Target;
