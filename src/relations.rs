//! # Social relations
//!
//! Undirected strength scores between two member ids. `(a, b, s)` and `(b, a, s)` are the same
//! fact, so a [`RelationSet`] never stores both.

use std::collections::HashSet;

use derive_more::{Deref, Display};
use log::trace;

#[derive(Clone, Debug, PartialEq, Display)]
#[display(fmt = "({}, {}, {})", a, b, strength)]
pub struct Relation {
    a: String,
    b: String,
    /// Expected in [0, 1], not clamped
    strength: f64,
}

impl Relation {
    pub fn new(a: impl Into<String>, b: impl Into<String>, strength: f64) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            strength,
        }
    }

    pub fn a(&self) -> &str {
        &self.a
    }

    pub fn b(&self) -> &str {
        &self.b
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn involves(&self, id: &str) -> bool {
        self.a == id || self.b == id
    }

    /// The other endpoint, if `id` is one of the two
    pub fn partner_of(&self, id: &str) -> Option<&str> {
        if self.a == id {
            Some(&self.b)
        } else if self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Same unordered id pair, strength ignored
    pub fn same_pair(&self, other: &Relation) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }

    pub fn into_triple(self) -> (String, String, f64) {
        (self.a, self.b, self.strength)
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B, f64)> for Relation {
    fn from((a, b, strength): (A, B, f64)) -> Self {
        Relation::new(a, b, strength)
    }
}

/// Relations in insertion order, unique per unordered id pair
#[derive(Clone, Debug, Default, PartialEq, Deref)]
pub struct RelationSet(Vec<Relation>);

impl RelationSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds the relation unless its pair is already known; the first strength wins
    pub fn insert(&mut self, relation: Relation) -> bool {
        if self.0.iter().any(|known| known.same_pair(&relation)) {
            trace!("dropping duplicate relation {}", relation);
            return false;
        }
        self.0.push(relation);
        true
    }

    /// Merges redundant reports of the same relations, returns how many were new
    pub fn merge<I>(&mut self, relations: I) -> usize
    where
        I: IntoIterator<Item = Relation>,
    {
        let mut added = 0;
        for relation in relations {
            if self.insert(relation) {
                added += 1;
            }
        }
        added
    }

    /// `(other id, strength)` for every relation touching `id`, in storage order
    pub fn of(&self, id: &str) -> Vec<(&str, f64)> {
        self.0
            .iter()
            .filter_map(|rel| rel.partner_of(id).map(|other| (other, rel.strength)))
            .collect()
    }

    /// Keeps relations whose both endpoints are in `ids`, returns how many were dropped
    pub fn retain_between(&mut self, ids: &HashSet<&str>) -> usize {
        let before = self.0.len();
        self.0.retain(|rel| ids.contains(rel.a.as_str()) && ids.contains(rel.b.as_str()));
        before - self.0.len()
    }

    pub fn triples(&self) -> Vec<(String, String, f64)> {
        self.0.iter().cloned().map(Relation::into_triple).collect()
    }
}

impl FromIterator<Relation> for RelationSet {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        let mut set = RelationSet::new();
        set.merge(iter);
        set
    }
}

impl IntoIterator for RelationSet {
    type Item = Relation;
    type IntoIter = std::vec::IntoIter<Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RelationSet {
    type Item = &'a Relation;
    type IntoIter = std::slice::Iter<'a, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
