use std::{collections::{BTreeSet, btree_set::Difference}, hash::Hash};

/// An ordered-set abstraction built on [`BTreeSet`], used everywhere this
/// crate needs `Q`, `I`, `F` or `Σ`.
#[derive(Debug, Clone, Hash ,Eq,PartialEq, Ord, PartialOrd)]
pub struct BTSet<T : Clone+ Eq +PartialEq+ Ord+ PartialOrd> {
    set: BTreeSet<T>,
}

impl<T : Clone+ Eq +PartialEq+ Ord+ PartialOrd + Hash> Default for BTSet<T> {
    fn default() -> Self {
        BTSet::new()
    }
}

impl<T : Clone+ Eq +PartialEq+ Ord+ PartialOrd + Hash> FromIterator<T> for BTSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        BTSet {
            set: iter.into_iter().collect(),
        }
    }
}

impl<T : Clone+ Eq +PartialEq+ Ord+ PartialOrd + Hash> IntoIterator for BTSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.set.into_iter()
    }
}

impl<T : Clone+ Eq +PartialEq+ Ord+ PartialOrd + Hash> BTSet<T> {
    pub fn new() -> Self{
        let _set : BTreeSet<T> = BTreeSet::new();
        BTSet{
            set : _set
        }
    }

    pub fn from_vect(&self, v: Vec<T>) -> BTSet<T> {
        let mut btset :BTSet<T>= BTSet::new();
        // recopie de l'element
        for elem in v {
            btset.insert(elem);
        }
        return btset;
    }

    // liaison entre l'interface de BTreeSet et BTSet
    pub fn get(&self) -> &BTreeSet<T>{
        &self.set
    }

    pub fn insert(&mut self, value : T) -> bool{
        self.set.insert(value)
    }

    pub fn remove(&mut self, value: &T) -> bool {
        self.set.remove(value)
    }

    pub fn contains(&self, value : &T) -> bool{
        self.set.contains(value)
    }

    pub fn is_empty(&self) -> bool{
        self.set.is_empty()
    }

    // renvoie la difference entre self et other
    pub fn difference<'a>(&self, other :BTSet<T>) -> BTSet<T>{
        let _other:&BTreeSet<T> = &other.get(); // &other.get().clone();
        let _difference:Difference<T> = self.set.difference(_other);
        let _vect : Vec<T>= _difference.cloned().collect();
        // make new BTSet
        self.from_vect(_vect)
    }

    /// Returns whether `self` and `other` share no elements.
    pub fn is_disjoint(&self, other: &BTSet<T>) -> bool {
        self.set.is_disjoint(&other.set)
    }

    /// Returns the union of `self` and `other`.
    pub fn union(&self, other: &BTSet<T>) -> BTSet<T> {
        self.set.union(&other.set).cloned().collect()
    }

    /// Returns the intersection of `self` and `other`.
    pub fn intersection(&self, other: &BTSet<T>) -> BTSet<T> {
        self.set.intersection(&other.set).cloned().collect()
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, T> {
        self.set.iter()
    }

    pub fn len(&self) -> usize{
        self.set.len()
    }

    // clone tout les elements de new dans self
    pub fn insert_all(&mut self, new: BTSet<T>)-> bool{
        for state in new.get(){
            self.set.insert(state.clone());
        }
        true
    }
}
