//! The session object: everything one training run owns.
//!
//! A [`Recommender`] is built wholesale from a training record set and is
//! immutable afterwards - no stage ever mutates another stage's state, and
//! there is no partial update path. To change anything, rebuild.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Record;
use crate::error::{CoplayError, Result};
use crate::eval::TestEntry;
use crate::ids::{IdIndex, ItemIdx, UserIdx};
use crate::norm::NormVector;
use crate::persistence;
use crate::predict::{Predictor, DEFAULT_NEIGHBOURS};
use crate::similarity::{SimilarityMatrix, SimilarityMetric};
use crate::store::InteractionStore;

/// Tunables fixed at session build time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Similarity metric for the whole matrix.
    pub metric: SimilarityMetric,
    /// Neighbor count for the KNN weighted average.
    pub neighbours: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::default(),
            neighbours: DEFAULT_NEIGHBOURS,
        }
    }
}

/// An immutable-after-build recommender session.
#[derive(Debug, Clone)]
pub struct Recommender {
    config: Config,
    ids: IdIndex,
    store: InteractionStore,
    norms: NormVector,
    sims: SimilarityMatrix,
}

impl Recommender {
    /// Build the full model, including the similarity matrix, from training
    /// records.
    pub fn build(records: &[Record], config: Config) -> Result<Self> {
        let (ids, store, norms) = Self::build_tables(records)?;
        let sims = SimilarityMatrix::compute(&store, &norms, config.metric)?;
        Ok(Self {
            config,
            ids,
            store,
            norms,
            sims,
        })
    }

    /// Build the model around a similarity matrix persisted by an earlier
    /// run over the same training set.
    pub fn load(records: &[Record], config: Config, matrix_path: &Path) -> Result<Self> {
        let (ids, store, norms) = Self::build_tables(records)?;
        let sims = persistence::load(matrix_path, ids.user_count())?;
        Ok(Self {
            config,
            ids,
            store,
            norms,
            sims,
        })
    }

    /// Adopt an already-deserialized matrix; its user count must match.
    pub fn with_matrix(records: &[Record], config: Config, sims: SimilarityMatrix) -> Result<Self> {
        let (ids, store, norms) = Self::build_tables(records)?;
        if sims.user_count() != ids.user_count() {
            return Err(CoplayError::MatrixSizeMismatch {
                expected: SimilarityMatrix::expected_len(ids.user_count()),
                actual: sims.as_bytes().len(),
            });
        }
        Ok(Self {
            config,
            ids,
            store,
            norms,
            sims,
        })
    }

    fn build_tables(records: &[Record]) -> Result<(IdIndex, InteractionStore, NormVector)> {
        let ids = IdIndex::build(records)?;
        info!(
            users = ids.user_count(),
            items = ids.item_count(),
            records = records.len(),
            "identity index built"
        );
        let store = InteractionStore::build(records, &ids)?;
        let norms = NormVector::compute(&store);
        Ok((ids, store, norms))
    }

    /// Persist the similarity matrix.
    pub fn save_similarities(&self, path: &Path) -> Result<()> {
        persistence::save(&self.sims, path)
    }

    /// Byte-quantized similarity for two distinct users.
    #[inline]
    #[must_use]
    pub fn similarity(&self, u1: UserIdx, u2: UserIdx) -> u8 {
        self.sims.get(u1, u2)
    }

    /// Log-domain KNN prediction for a `(user, item)` pair.
    #[must_use]
    pub fn predict_log(&self, user: UserIdx, item: ItemIdx) -> f32 {
        self.predictor().predict_log(user, item)
    }

    /// Top-`n` recommendations for an external user identifier: items the
    /// user has not interacted with, best predicted score first.
    pub fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<(&str, f32)>> {
        let user = self.ids.user_idx(user_id)?;
        Ok(self
            .predictor()
            .recommend(user, n)
            .into_iter()
            .map(|(item, score)| (self.ids.item_id(item), score))
            .collect())
    }

    /// Map raw held-out records through this session's identity index.
    pub fn resolve_test_set(&self, records: &[Record]) -> Result<Vec<TestEntry>> {
        TestEntry::resolve(records, &self.ids)
    }

    /// Attach predictions to every test entry, in place.
    pub fn score_test_set(&self, entries: &mut [TestEntry]) {
        self.predictor().score_test_set(entries);
    }

    fn predictor(&self) -> Predictor<'_> {
        Predictor::new(&self.store, &self.sims, self.config.neighbours)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdIndex {
        &self.ids
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &InteractionStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn norms(&self) -> &NormVector {
        &self.norms
    }

    #[inline]
    #[must_use]
    pub fn similarities(&self) -> &SimilarityMatrix {
        &self.sims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, item: &str, count: u32) -> Record {
        Record {
            user: user.to_owned(),
            item: item.to_owned(),
            count,
        }
    }

    fn scenario() -> Vec<Record> {
        vec![
            record("A", "s1", 4),
            record("A", "s2", 1),
            record("B", "s1", 2),
            record("B", "s2", 1),
            record("C", "s1", 8),
        ]
    }

    #[test]
    fn build_wires_the_pipeline_together() {
        let session = Recommender::build(&scenario(), Config::default()).unwrap();
        assert_eq!(session.ids().user_count(), 3);
        assert_eq!(session.ids().item_count(), 2);
        assert_eq!(session.similarities().as_bytes().len(), 3);
        assert_eq!(session.similarity(UserIdx(0), UserIdx(1)), 28);
    }

    #[test]
    fn recommend_translates_external_identifiers() {
        let session = Recommender::build(&scenario(), Config::default()).unwrap();
        let recs = session.recommend("C", 10).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].0, "s2");

        assert!(matches!(
            session.recommend("ghost", 10).unwrap_err(),
            CoplayError::UnknownUser(_)
        ));
    }

    #[test]
    fn with_matrix_rejects_foreign_user_count() {
        let records = scenario();
        let foreign = SimilarityMatrix::from_bytes(vec![0; 6], 4).unwrap();
        let err = Recommender::with_matrix(&records, Config::default(), foreign).unwrap_err();
        assert!(matches!(err, CoplayError::MatrixSizeMismatch { .. }));
    }
}
