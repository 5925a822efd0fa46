use crate::{BowVector, WordWeight};

/// Computes the similarity score between two bag-of-words vectors.
///
/// Vectors must be sorted (they are, by construction) and normalized by
/// the caller if a probability-like score is desired.
pub trait Scorer {
    fn score(&self, a: &BowVector, b: &BowVector) -> WordWeight;
}

/// L1 scoring between two vectors (Galvez-Lopez & Tardos, Eq 2).
///
/// Two identical, L1-normalized vectors score exactly 1; vectors with no
/// words in common score 0. Stateless, safe to share across threads
/// scoring independent pairs.
pub struct L1Scorer;

impl Scorer for L1Scorer {
    fn score(&self, a: &BowVector, b: &BowVector) -> WordWeight {
        let (a_ids, a_vals) = (a.word_ids(), a.weights());
        let (b_ids, b_vals) = (b.word_ids(), b.weights());
        let mut score: WordWeight = 0.;
        let (mut i, mut j) = (0, 0);
        while i < a_ids.len() && j < b_ids.len() {
            if a_ids[i] == b_ids[j] {
                score += (a_vals[i] - b_vals[j]).abs() - a_vals[i].abs() - b_vals[j].abs();
                i += 1;
                j += 1;
            } else if a_ids[i] < b_ids[j] {
                // skip over A entries with no matching id in B
                i = a.lower_bound(b_ids[j]);
            } else {
                // skip over B entries with no matching id in A
                j = b.lower_bound(a_ids[i]);
            }
        }
        -score / 2.
    }
}
