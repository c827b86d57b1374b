//! KNN prediction over the similarity matrix.
//!
//! The core routine predicts a log-domain count for one `(user, item)`
//! pair: gather every other user who played the item, keep the `k` most
//! similar, and average their quantized counts weighted by similarity.
//! Everything else (test-set scoring, top-N recommendation) is built on
//! that routine.
//!
//! Neighbor ranking is deterministic: descending similarity, then
//! ascending user index on ties. The target user is never their own
//! neighbor.

use smallvec::SmallVec;
use tracing::debug;

use crate::eval::TestEntry;
use crate::ids::{ItemIdx, UserIdx};
use crate::similarity::SimilarityMatrix;
use crate::store::InteractionStore;

/// Default neighbor count for the weighted average.
pub const DEFAULT_NEIGHBOURS: usize = 20;

/// Test entries between progress reports during batch scoring.
const PROGRESS_EVERY_ENTRIES: usize = 1000;

/// Prediction engine borrowing the session's immutable model state.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    store: &'a InteractionStore,
    sims: &'a SimilarityMatrix,
    neighbours: usize,
}

impl<'a> Predictor<'a> {
    #[must_use]
    pub fn new(store: &'a InteractionStore, sims: &'a SimilarityMatrix, neighbours: usize) -> Self {
        Self {
            store,
            sims,
            neighbours,
        }
    }

    /// Predicted log-domain count for `(user, item)`.
    ///
    /// Pure: repeated calls over the same model state return the same
    /// value. Returns `0.0` when the item has no candidate neighbors or no
    /// neighbor has positive similarity (the zero-confidence output; its
    /// raw decode is `2^-1 = 0.5`).
    #[must_use]
    pub fn predict_log(&self, user: UserIdx, item: ItemIdx) -> f32 {
        let mut candidates: Vec<(u8, UserIdx)> = Vec::new();
        for u in 0..self.store.user_count() as u32 {
            let other = UserIdx(u);
            if other != user && self.store.has_interacted(other, item) {
                candidates.push((self.sims.get(user, other), other));
            }
        }

        // Descending similarity, ascending user index on ties.
        candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let neighbours: SmallVec<[(u8, UserIdx); DEFAULT_NEIGHBOURS]> =
            candidates.into_iter().take(self.neighbours).collect();

        let mut prediction = 0f32;
        let mut similarity_sum = 0f32;
        for (sim, neighbour) in neighbours {
            let weight = f32::from(sim) / 100.0;
            prediction += weight * f32::from(self.store.count(neighbour, item));
            similarity_sum += weight;
        }

        if similarity_sum == 0.0 {
            return 0.0;
        }
        prediction / similarity_sum
    }

    /// Attach a prediction to every test entry, in place.
    pub fn score_test_set(&self, entries: &mut [TestEntry]) {
        let total = entries.len();
        for (done, entry) in entries.iter_mut().enumerate() {
            entry.set_log_prediction(self.predict_log(entry.user, entry.item));
            if (done + 1) % PROGRESS_EVERY_ENTRIES == 0 {
                debug!(scored = done + 1, total, "test entries scored");
            }
        }
    }

    /// Top-`n` unseen items for a user, best first.
    ///
    /// Scores every item the user has not interacted with, so this is an
    /// O(item_count) batch query. Ties break toward the lower item index.
    /// Empty when the user has interacted with every item.
    #[must_use]
    pub fn recommend(&self, user: UserIdx, n: usize) -> Vec<(ItemIdx, f32)> {
        let mut scored: Vec<(ItemIdx, f32)> = (0..self.store.item_count() as u32)
            .map(ItemIdx)
            .filter(|&item| !self.store.has_interacted(user, item))
            .map(|item| (item, self.predict_log(user, item)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(n);
        scored
    }
}
