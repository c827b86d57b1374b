//! Pairwise user similarity over sparse quantized counts.
//!
//! Both metrics walk the two users' sorted nonzero-item lists with a single
//! linear merge-join, so the cost per pair is O(|items(u1)| + |items(u2)|)
//! instead of O(item_count). That is the efficiency choice the whole engine
//! rests on, and why sortedness of the store's sparse rows is a hard
//! invariant.
//!
//! Similarities are byte-quantized to `[0, 100]`:
//!
//! - **Cosine** with an overlap penalty: the raw cosine over quantized
//!   counts is damped by `common / (common + penalty)` so that a thin
//!   overlap (one shared item, say) cannot produce a confident score.
//! - **Pearson**: each user is mean-centered over their own nonzero items,
//!   then correlated over the common items; `[-1, 1]` maps to `[0, 100]`.
//!
//! The whole-matrix build stores each unordered pair once, in a flat
//! lower-triangular byte buffer: row `i` contributes exactly `i` bytes
//! (columns `j < i`), `n(n-1)/2` bytes total. Self-similarity is never
//! stored or queried.

use tracing::debug;

use crate::error::{CoplayError, Result};
use crate::ids::{ItemIdx, UserIdx};
use crate::norm::NormVector;
use crate::store::InteractionStore;

/// Default overlap penalty for [`SimilarityMetric::Cosine`].
pub const DEFAULT_PENALTY: f32 = 5.0;

/// Rows between progress reports during a whole-matrix build.
const PROGRESS_EVERY_ROWS: u32 = 250;

/// Similarity metric, selected once per session.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SimilarityMetric {
    /// Cosine over quantized counts, damped by `common / (common + penalty)`.
    Cosine { penalty: f32 },
    /// Pearson correlation over common items, mean-centered per user.
    Pearson,
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        SimilarityMetric::Cosine {
            penalty: DEFAULT_PENALTY,
        }
    }
}

impl SimilarityMetric {
    /// Byte-quantized similarity in `[0, 100]` for a user pair.
    ///
    /// Returns [`CoplayError::NumericFault`] if the cosine path produces a
    /// value outside `[0, 100]` - that indicates corrupt norms or counts
    /// and is never silently clipped.
    pub fn between(
        self,
        store: &InteractionStore,
        norms: &NormVector,
        u1: UserIdx,
        u2: UserIdx,
    ) -> Result<u8> {
        match self {
            SimilarityMetric::Cosine { penalty } => cosine(store, norms, u1, u2, penalty),
            SimilarityMetric::Pearson => Ok(pearson(store, u1, u2)),
        }
    }
}

/// Linear co-traversal of two ascending index lists; calls `on_match` for
/// every index present in both.
#[inline]
fn merge_join(a: &[ItemIdx], b: &[ItemIdx], mut on_match: impl FnMut(ItemIdx)) {
    let mut ia = 0;
    let mut ib = 0;
    while ia < a.len() && ib < b.len() {
        if a[ia] < b[ib] {
            ia += 1;
        } else if a[ia] > b[ib] {
            ib += 1;
        } else {
            on_match(a[ia]);
            ia += 1;
            ib += 1;
        }
    }
}

fn cosine(
    store: &InteractionStore,
    norms: &NormVector,
    u1: UserIdx,
    u2: UserIdx,
    penalty: f32,
) -> Result<u8> {
    let mut dot = 0f32;
    let mut common = 0u32;

    merge_join(store.items_of(u1), store.items_of(u2), |item| {
        dot += f32::from(store.count(u1, item)) * f32::from(store.count(u2, item));
        common += 1;
    });

    if common == 0 {
        return Ok(0);
    }

    let mut raw = dot / (norms.get(u1) * norms.get(u2));
    raw *= common as f32 / (common as f32 + penalty);

    let scaled = (raw * 100.0).round();
    if !(0.0..=100.0).contains(&scaled) {
        return Err(CoplayError::NumericFault {
            user_a: u1.0,
            user_b: u2.0,
            value: scaled,
        });
    }
    Ok(scaled as u8)
}

fn pearson(store: &InteractionStore, u1: UserIdx, u2: UserIdx) -> u8 {
    let mean = |u: UserIdx| -> f32 {
        let items = store.items_of(u);
        let total: f32 = items.iter().map(|&i| f32::from(store.count(u, i))).sum();
        total / items.len() as f32
    };
    let mean1 = mean(u1);
    let mean2 = mean(u2);

    let mut dot = 0f32;
    let mut ss1 = 0f32;
    let mut ss2 = 0f32;

    merge_join(store.items_of(u1), store.items_of(u2), |item| {
        let c1 = f32::from(store.count(u1, item)) - mean1;
        let c2 = f32::from(store.count(u2, item)) - mean2;
        dot += c1 * c2;
        ss1 += c1 * c1;
        ss2 += c2 * c2;
    });

    if ss1 == 0.0 || ss2 == 0.0 {
        return 0;
    }

    // All three sums run over the same matched set, so Cauchy-Schwarz keeps
    // the correlation in [-1, 1] up to float drift; clamp against drift.
    let corr = (dot / (ss1 * ss2).sqrt()).clamp(-1.0, 1.0);
    ((corr + 1.0) * 50.0).round() as u8
}

/// Symmetric user-user similarity matrix, stored lower-triangular.
///
/// Symmetry is enforced by construction (each unordered pair stored once)
/// and by the accessor, which swaps so the larger index is the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityMatrix {
    user_count: usize,
    /// Row-major lower triangle: row `i` occupies `[i(i-1)/2, i(i-1)/2 + i)`.
    data: Vec<u8>,
}

impl SimilarityMatrix {
    /// Bytes a matrix over `user_count` users occupies: `n(n-1)/2`.
    #[inline]
    #[must_use]
    pub fn expected_len(user_count: usize) -> usize {
        user_count * user_count.saturating_sub(1) / 2
    }

    /// Compute the full matrix: rows `i = 1..n`, columns `j < i`.
    ///
    /// A row is the atomic unit of work; progress is reported every
    /// 250 rows.
    pub fn compute(
        store: &InteractionStore,
        norms: &NormVector,
        metric: SimilarityMetric,
    ) -> Result<Self> {
        let n = store.user_count();
        let mut data = Vec::with_capacity(Self::expected_len(n));

        for i in 0..n as u32 {
            for j in 0..i {
                data.push(metric.between(store, norms, UserIdx(i), UserIdx(j))?);
            }
            if i % PROGRESS_EVERY_ROWS == 0 {
                debug!(row = i, total = n, "similarity rows computed");
            }
        }

        Ok(Self {
            user_count: n,
            data,
        })
    }

    /// Adopt a raw lower-triangular byte buffer, e.g. one read from disk.
    ///
    /// Fails with [`CoplayError::MatrixSizeMismatch`] unless the buffer is
    /// exactly `n(n-1)/2` bytes for the given user count.
    pub fn from_bytes(data: Vec<u8>, user_count: usize) -> Result<Self> {
        let expected = Self::expected_len(user_count);
        if data.len() != expected {
            return Err(CoplayError::MatrixSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { user_count, data })
    }

    /// The raw lower-triangular byte stream (the persistence format).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    /// Similarity for a pair of distinct users, in `[0, 100]`.
    ///
    /// # Panics
    ///
    /// `sim(u, u)` is undefined and never stored; querying it is a bug in
    /// the caller.
    #[inline]
    #[must_use]
    pub fn get(&self, u1: UserIdx, u2: UserIdx) -> u8 {
        assert_ne!(u1, u2, "self-similarity is undefined");
        let (hi, lo) = if u1 > u2 { (u1, u2) } else { (u2, u1) };
        let row_start = hi.as_usize() * (hi.as_usize() - 1) / 2;
        self.data[row_start + lo.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::ids::IdIndex;

    fn record(user: &str, item: &str, count: u32) -> Record {
        Record {
            user: user.to_owned(),
            item: item.to_owned(),
            count,
        }
    }

    /// A:[3,1] B:[2,1] C:[4,0] after quantization; items s1 < s2.
    fn scenario() -> (InteractionStore, NormVector) {
        let records = vec![
            record("A", "s1", 4),
            record("A", "s2", 1),
            record("B", "s1", 2),
            record("B", "s2", 1),
            record("C", "s1", 8),
        ];
        let ids = IdIndex::build(&records).unwrap();
        let store = InteractionStore::build(&records, &ids).unwrap();
        let norms = NormVector::compute(&store);
        (store, norms)
    }

    const A: UserIdx = UserIdx(0);
    const B: UserIdx = UserIdx(1);
    const C: UserIdx = UserIdx(2);

    #[test]
    fn cosine_matches_hand_computation() {
        let (store, norms) = scenario();
        let metric = SimilarityMetric::default();

        // dot(A,B) = 3*2 + 1*1 = 7 over norms sqrt(10)*sqrt(5), damped by 2/7.
        let expected = (7.0 / (10f32.sqrt() * 5f32.sqrt()) * (2.0 / 7.0) * 100.0).round() as u8;
        let sim = metric.between(&store, &norms, A, B).unwrap();
        assert_eq!(sim, expected);
        assert_eq!(sim, 28);
        assert!(sim <= 100);
    }

    #[test]
    fn cosine_thin_overlap_is_damped_harder() {
        let (store, norms) = scenario();
        let metric = SimilarityMetric::default();
        // A and C share one item; B and C share one item.
        let ac = metric.between(&store, &norms, A, C).unwrap();
        let bc = metric.between(&store, &norms, B, C).unwrap();
        let ab = metric.between(&store, &norms, A, B).unwrap();
        assert!(ac < ab);
        assert!(bc < ab);
        assert!(ac <= 100 && bc <= 100);
    }

    #[test]
    fn cosine_is_zero_without_overlap() {
        let records = vec![record("u", "a", 4), record("v", "b", 4)];
        let ids = IdIndex::build(&records).unwrap();
        let store = InteractionStore::build(&records, &ids).unwrap();
        let norms = NormVector::compute(&store);
        let sim = SimilarityMetric::default()
            .between(&store, &norms, UserIdx(0), UserIdx(1))
            .unwrap();
        assert_eq!(sim, 0);
    }

    #[test]
    fn pearson_perfectly_correlated_pair_scores_100() {
        let (store, norms) = scenario();
        // Centered A over {s1,s2}: (+1,-1); centered B: (+0.5,-0.5) -> corr 1.
        let sim = SimilarityMetric::Pearson
            .between(&store, &norms, A, B)
            .unwrap();
        assert_eq!(sim, 100);
    }

    #[test]
    fn pearson_zero_variance_scores_zero() {
        let (store, norms) = scenario();
        // C has a single item, so its centered value at the common item is 0.
        let sim = SimilarityMetric::Pearson
            .between(&store, &norms, A, C)
            .unwrap();
        assert_eq!(sim, 0);
    }

    #[test]
    fn matrix_is_symmetric_and_triangular() {
        let (store, norms) = scenario();
        let matrix =
            SimilarityMatrix::compute(&store, &norms, SimilarityMetric::default()).unwrap();

        assert_eq!(matrix.as_bytes().len(), SimilarityMatrix::expected_len(3));
        for i in 0..3u32 {
            for j in 0..3u32 {
                if i != j {
                    assert_eq!(matrix.get(UserIdx(i), UserIdx(j)), matrix.get(UserIdx(j), UserIdx(i)));
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "self-similarity")]
    fn self_similarity_query_panics() {
        let (store, norms) = scenario();
        let matrix =
            SimilarityMatrix::compute(&store, &norms, SimilarityMetric::default()).unwrap();
        let _ = matrix.get(A, A);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        let err = SimilarityMatrix::from_bytes(vec![0; 5], 3).unwrap_err();
        assert!(matches!(
            err,
            CoplayError::MatrixSizeMismatch {
                expected: 3,
                actual: 5
            }
        ));
    }

    #[test]
    fn merge_join_finds_exactly_the_common_items() {
        let a = [ItemIdx(0), ItemIdx(2), ItemIdx(5), ItemIdx(9)];
        let b = [ItemIdx(2), ItemIdx(3), ItemIdx(9)];
        let mut hits = Vec::new();
        merge_join(&a, &b, |item| hits.push(item));
        assert_eq!(hits, vec![ItemIdx(2), ItemIdx(9)]);
    }
}
