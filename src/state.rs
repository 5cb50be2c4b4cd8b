use std::collections::BTreeSet;
use std::fmt;

/// The identity carried by a [`State`].
///
/// A plain state wraps a caller-supplied name. A state produced by subset
/// construction wraps the (ordered, content-hashed) set of uids it was
/// built from — this is the "subset-of-subset uids" shape: the set is
/// never descended into for equality beyond its own derived
/// `Eq`/`Hash`/`Ord`, so it behaves as a single opaque key no matter how
/// deep the nesting goes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Uid {
    Name(String),
    Set(BTreeSet<Uid>),
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uid::Name(name) => write!(f, "{name}"),
            Uid::Set(members) => {
                write!(f, "{{")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Uid::Name(value.to_string())
    }
}

impl From<String> for Uid {
    fn from(value: String) -> Self {
        Uid::Name(value)
    }
}

/// A node identity in an automaton.
///
/// States are equal iff their [`Uid`]s are equal. A state's uid may itself
/// be a set of other uids (the shape subset construction produces); the
/// container never needs to know which case it is in to use a `State` as a
/// map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State {
    uid: Uid,
}

impl State {
    /// Create a leaf state from a name.
    pub fn new(name: impl Into<String>) -> Self {
        State {
            uid: Uid::Name(name.into()),
        }
    }

    pub fn from_uid(uid: Uid) -> Self {
        State { uid }
    }

    /// Create a state whose identity is the set of uids of `members`. A
    /// singleton collapses to its single member — this is the "unwrap
    /// singleton sets" structural invariant the determinizer requires
    /// (spec.md §4.3). Member uids are collected as-is, never descended
    /// into: a member that is itself a `Uid::Set` stays nested rather than
    /// being merged into the outer set, so the outer set's own derived
    /// `Eq`/`Hash`/`Ord` is the only thing that compares it — exactly the
    /// "never descending into it" requirement of spec.md §3/§9.
    pub fn from_set<'a>(members: impl IntoIterator<Item = &'a State>) -> Self {
        let set: BTreeSet<Uid> = members.into_iter().map(|m| m.uid.clone()).collect();
        if set.len() == 1 {
            State {
                uid: set.into_iter().next().unwrap(),
            }
        } else {
            State { uid: Uid::Set(set) }
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid)
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        State::new(value)
    }
}

impl From<String> for State {
    fn from(value: String) -> Self {
        State::new(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equality_is_by_uid() {
        let a = State::new("q0");
        let b = State::new("q0");
        let c = State::new("q1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn from_set_unwraps_singletons() {
        let q0 = State::new("q0");
        let singleton = State::from_set([&q0]);
        assert_eq!(singleton, q0);
    }

    #[test]
    fn from_set_is_order_independent() {
        let q0 = State::new("q0");
        let q1 = State::new("q1");
        let a = State::from_set([&q0, &q1]);
        let b = State::from_set([&q1, &q0]);
        assert_eq!(a, b);
    }

    #[test]
    fn from_set_does_not_descend_into_nested_subsets() {
        // A member that is itself a subset state stays nested rather than
        // being merged into the outer set: {inner, q2} != {q0, q1, q2}.
        let q0 = State::new("q0");
        let q1 = State::new("q1");
        let q2 = State::new("q2");
        let inner = State::from_set([&q0, &q1]);
        let direct = State::from_set([&q0, &q1, &q2]);
        let nested = State::from_set([&inner, &q2]);
        assert_ne!(nested, direct);
    }

    #[test]
    fn from_set_distinguishes_non_injective_leaf_unions() {
        // {Set{1,2}, Set{3}} and {Set{1,2,3}} share the same flattened leaf
        // union but must not collapse to the same uid.
        let q1 = State::new("1");
        let q2 = State::new("2");
        let q3 = State::new("3");
        let a = State::from_set([&State::from_set([&q1, &q2]), &State::from_set([&q3])]);
        let b = State::from_set([&State::from_set([&q1, &q2, &q3])]);
        assert_ne!(a, b);
    }
}
