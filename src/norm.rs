//! Per-user Euclidean norms over quantized counts.
//!
//! A precomputed input to cosine similarity. Pure function of the
//! interaction store; must be recomputed if the store is ever rebuilt.

use crate::ids::UserIdx;
use crate::store::InteractionStore;

/// One L2 norm per user, indexed by [`UserIdx`].
#[derive(Debug, Clone)]
pub struct NormVector {
    norms: Vec<f32>,
}

impl NormVector {
    /// Compute `norm[u] = sqrt(sum of squared quantized counts)` over each
    /// user's nonzero items.
    #[must_use]
    pub fn compute(store: &InteractionStore) -> Self {
        let norms = (0..store.user_count() as u32)
            .map(|u| {
                let user = UserIdx(u);
                let sum: f32 = store
                    .items_of(user)
                    .iter()
                    .map(|&item| {
                        let q = f32::from(store.count(user, item));
                        q * q
                    })
                    .sum();
                sum.sqrt()
            })
            .collect();
        Self { norms }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, user: UserIdx) -> f32 {
        self.norms[user.as_usize()]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }
}
