//! Held-out test entries and aggregate error statistics.
//!
//! A test entry carries the actual raw count and, once scored, the
//! log-domain prediction plus its truncated raw decode. Both aggregate
//! statistics are computed over raw-domain **integer** differences.
//!
//! Note on `root_mean_absolute_error`: it computes
//! `sqrt(mean(|actual - predicted|))` - the square root of the mean
//! absolute error, not the MAE itself. The formula is kept verbatim from
//! the system this crate reimplements, under a neutral name, so scores
//! stay comparable with historical runs. See DESIGN.md.

use serde::Serialize;

use crate::dataset::Record;
use crate::error::{CoplayError, Result};
use crate::ids::{IdIndex, ItemIdx, UserIdx};
use crate::quantize;

/// One held-out `(user, item, count)` observation plus its prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct TestEntry {
    pub user: UserIdx,
    pub item: ItemIdx,
    /// Actual raw play count.
    pub count: u32,
    /// Quantized log of the actual count.
    pub log_count: u8,
    log_prediction: f32,
    prediction: u32,
}

impl TestEntry {
    #[must_use]
    pub fn new(user: UserIdx, item: ItemIdx, count: u32) -> Self {
        Self {
            user,
            item,
            count,
            log_count: quantize::encode(count),
            log_prediction: 0.0,
            prediction: 0,
        }
    }

    /// Map raw test records through the **training** identity index.
    ///
    /// Any identifier absent from the training index is rejected; a test
    /// split must never widen the model's vocabulary.
    pub fn resolve(records: &[Record], ids: &IdIndex) -> Result<Vec<TestEntry>> {
        records
            .iter()
            .enumerate()
            .map(|(pos, r)| {
                if r.count < 1 {
                    return Err(CoplayError::InvalidCount {
                        line: pos + 1,
                        count: i64::from(r.count),
                    });
                }
                Ok(TestEntry::new(
                    ids.user_idx(&r.user)?,
                    ids.item_idx(&r.item)?,
                    r.count,
                ))
            })
            .collect()
    }

    /// Store a log-domain prediction; the raw decode `2^(p - 1)` is
    /// truncated to an integer at the same time.
    pub fn set_log_prediction(&mut self, log_prediction: f32) {
        self.log_prediction = log_prediction;
        self.prediction = quantize::decode_to_count(log_prediction);
    }

    #[inline]
    #[must_use]
    pub fn log_prediction(&self) -> f32 {
        self.log_prediction
    }

    /// Truncated raw-domain prediction.
    #[inline]
    #[must_use]
    pub fn prediction(&self) -> u32 {
        self.prediction
    }
}

/// Aggregate error over a scored test set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    /// `sqrt(mean((actual - predicted)^2))`.
    pub rmse: f32,
    /// `sqrt(mean(|actual - predicted|))` - see the module docs.
    pub rmae: f32,
}

/// Compute both statistics over a scored test set.
pub fn evaluate(entries: &[TestEntry]) -> Result<Evaluation> {
    if entries.is_empty() {
        return Err(CoplayError::EmptyTestSet);
    }

    let mut squared_sum = 0i64;
    let mut absolute_sum = 0i64;
    for entry in entries {
        let diff = i64::from(entry.count) - i64::from(entry.prediction);
        squared_sum += diff * diff;
        absolute_sum += diff.abs();
    }

    let n = entries.len() as f64;
    Ok(Evaluation {
        rmse: ((squared_sum as f64 / n).sqrt()) as f32,
        rmae: ((absolute_sum as f64 / n).sqrt()) as f32,
    })
}
