// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Deterministically ordered set. Periods keep their project cohort in one of these so that
/// iteration (ranking, leaderboards, read views) never depends on hash ordering.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedSet<T: Ord>(BTreeSet<T>);

impl<T: Ord> OrderedSet<T> {
    pub fn new() -> Self {
        OrderedSet(BTreeSet::new())
    }

    pub fn insert(&mut self, value: T) -> bool {
        self.0.insert(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        OrderedSet(iter.into_iter().collect())
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<T: Ord> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T: Ord> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectId;

    #[test]
    fn iterates_project_ids_in_ascending_order() {
        let mut set = OrderedSet::new();
        assert!(set.insert(ProjectId::new(3)));
        assert!(set.insert(ProjectId::new(1)));
        assert!(!set.insert(ProjectId::new(3)));
        let ids: Vec<u64> = set.iter().map(|p| p.value()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(format!("{:?}", set), "{ProjectId(1), ProjectId(3)}");
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a: OrderedSet<u64> = vec![2, 1].into_iter().collect();
        let b: OrderedSet<u64> = vec![1, 2].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "[1,2]");
    }
}
