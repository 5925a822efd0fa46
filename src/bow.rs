use serde::{Deserialize, Serialize};

use crate::{WordId, WordWeight};

/// Bag-of-Words representation of an image or descriptor set.
///
/// Stored as two parallel vectors: sorted word ids and their accumulated
/// weights, so lookups are binary searches and pairwise scoring is a
/// single merge walk. Built once per frame by repeated insertion, then
/// typically [`normalize`](BowVector::normalize)d and scored read-only.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BowVector {
    /// Sorted word ids, no duplicates.
    word_ids: Vec<WordId>,
    /// Weights, indexes match `word_ids`.
    weights: Vec<WordWeight>,
}

impl BowVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    /// Sorted word ids of this vector.
    pub fn word_ids(&self) -> &[WordId] {
        &self.word_ids
    }

    /// Weights, parallel to [`word_ids`](BowVector::word_ids).
    pub fn weights(&self) -> &[WordWeight] {
        &self.weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordId, WordWeight)> + '_ {
        self.word_ids.iter().copied().zip(self.weights.iter().copied())
    }

    /// Add `weight` to the entry for `id`, accumulating with any weight
    /// already stored; absent ids are inserted at their sorted position.
    pub fn add_weight(&mut self, id: WordId, weight: WordWeight) {
        let i = self.lower_bound(id);
        if self.word_ids.get(i) == Some(&id) {
            self.weights[i] += weight;
        } else {
            self.word_ids.insert(i, id);
            self.weights.insert(i, weight);
        }
    }

    /// Insert `weight` for `id` only if the id is not yet present; an
    /// existing entry is left untouched.
    pub fn add_weight_if_not_exist(&mut self, id: WordId, weight: WordWeight) {
        let i = self.lower_bound(id);
        if self.word_ids.get(i) != Some(&id) {
            self.word_ids.insert(i, id);
            self.weights.insert(i, weight);
        }
    }

    /// L1-normalize the weights in place.
    ///
    /// A zero-norm (empty or all-zero) vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm: WordWeight = self.weights.iter().map(|w| w.abs()).sum();
        if norm > 0. {
            let inv_norm = 1. / norm;
            for w in self.weights.iter_mut() {
                *w *= inv_norm;
            }
        }
    }

    /// Weight stored for `id`, or `None` if the word is not in the
    /// vector. A miss is a normal result, not an error.
    pub fn find(&self, id: WordId) -> Option<WordWeight> {
        let i = self.lower_bound(id);
        if self.word_ids.get(i) == Some(&id) {
            Some(self.weights[i])
        } else {
            None
        }
    }

    /// Index of the first entry with word id >= `id`, or the insertion
    /// point (== `len`) if every entry is smaller.
    pub(crate) fn lower_bound(&self, id: WordId) -> usize {
        let mut low: isize = 0;
        let mut hi: isize = self.word_ids.len() as isize - 1;
        while low <= hi {
            let mid = (low + hi) / 2;
            let stored = self.word_ids[mid as usize];
            if stored < id {
                // value was smaller than the one we want, search higher
                low = mid + 1;
            } else if stored > id {
                // value was higher than the one we want, search lower
                hi = mid - 1;
            } else {
                return mid as usize;
            }
        }
        low as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn insert_keeps_ids_sorted() {
        let mut vec = BowVector::new();

        vec.add_weight(30, 0.6);
        assert_eq!(vec.word_ids(), &[30]);
        assert_eq!(vec.weights(), &[0.6]);

        vec.add_weight(10, 0.4);
        assert_eq!(vec.word_ids(), &[10, 30]);
        assert_eq!(vec.weights(), &[0.4, 0.6]);

        vec.add_weight(20, 0.8);
        assert_eq!(vec.word_ids(), &[10, 20, 30]);
        assert_eq!(vec.weights(), &[0.4, 0.8, 0.6]);

        // accumulates into the existing entry, no new id
        vec.add_weight(10, 0.1);
        assert_eq!(vec.word_ids(), &[10, 20, 30]);

        vec.add_weight_if_not_exist(100, 0.5);
        assert_eq!(vec.word_ids(), &[10, 20, 30, 100]);
        vec.add_weight_if_not_exist(100, 0.2);
        assert_eq!(vec.word_ids(), &[10, 20, 30, 100]);
        assert_eq!(vec.weights(), &[0.5, 0.8, 0.6, 0.5]);

        // 0.5 + 0.8 + 0.6 + 0.5 = 2.4, divide each entry by 2.4
        vec.normalize();
        let want = [0.5 / 2.4, 0.8 / 2.4, 0.6 / 2.4, 0.5 / 2.4];
        for (&got, &want) in vec.weights().iter().zip(want.iter()) {
            assert_relative_eq!(got, want, epsilon = 0.0001);
        }
    }

    #[test]
    fn sorted_invariant_holds_after_every_insert() {
        let inserts: &[(WordId, WordWeight)] = &[
            (50, 1.0),
            (7, 0.5),
            (99, 0.25),
            (7, 0.25),
            (0, 2.0),
            (51, 0.125),
            (98, 0.125),
        ];
        let mut vec = BowVector::new();
        for &(id, w) in inserts {
            vec.add_weight(id, w);
            assert!(vec.word_ids().windows(2).all(|p| p[0] < p[1]));
            assert_eq!(vec.word_ids().len(), vec.weights().len());
        }
        assert_eq!(vec.word_ids(), &[0, 7, 50, 51, 98, 99]);
        assert_eq!(vec.find(7), Some(0.75));
    }

    #[test]
    fn front_and_back_insertion() {
        let mut vec = BowVector::new();
        vec.add_weight(5, 1.0);
        vec.add_weight(1, 1.0); // front
        vec.add_weight(9, 1.0); // back
        assert_eq!(vec.word_ids(), &[1, 5, 9]);
        let entries: Vec<(WordId, WordWeight)> = vec.iter().collect();
        assert_eq!(entries, vec![(1, 1.0), (5, 1.0), (9, 1.0)]);
    }

    #[test]
    fn find_on_empty_and_single() {
        let mut vec = BowVector::new();
        assert!(vec.is_empty());
        assert_eq!(vec.find(3), None);
        assert_eq!(vec.lower_bound(3), 0);

        vec.add_weight(3, 0.5);
        assert_eq!(vec.len(), 1);
        assert_eq!(vec.find(3), Some(0.5));
        assert_eq!(vec.find(2), None);
        assert_eq!(vec.find(4), None);
        assert_eq!(vec.lower_bound(2), 0);
        assert_eq!(vec.lower_bound(4), 1);
    }

    #[test]
    fn lower_bound_is_first_geq() {
        let mut vec = BowVector::new();
        for id in [10, 20, 30, 40] {
            vec.add_weight(id, 1.0);
        }
        assert_eq!(vec.lower_bound(5), 0);
        assert_eq!(vec.lower_bound(10), 0);
        assert_eq!(vec.lower_bound(15), 1);
        assert_eq!(vec.lower_bound(40), 3);
        assert_eq!(vec.lower_bound(45), 4);
    }

    #[test]
    fn normalize_unit_mass_and_ratios() {
        let mut vec = BowVector::new();
        vec.add_weight(1, 3.0);
        vec.add_weight(2, 1.0);
        vec.normalize();
        let sum: WordWeight = vec.weights().iter().map(|w| w.abs()).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
        // relative ratios between entries are preserved
        assert_relative_eq!(vec.weights()[0] / vec.weights()[1], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn normalize_zero_norm_is_noop() {
        let mut vec = BowVector::new();
        vec.normalize();
        assert!(vec.is_empty());

        vec.add_weight(4, 0.0);
        vec.normalize();
        assert_eq!(vec.weights(), &[0.0]);
    }
}
