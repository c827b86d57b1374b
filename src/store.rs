//! Interaction store: quantized counts plus per-user sparse rows.
//!
//! Two views of the same data are kept, because the two hot paths want
//! opposite layouts:
//!
//! - a dense `user_count x item_count` byte table in one flat buffer, for
//!   O(1) "how much did user u play item i" lookups during prediction;
//! - per user, the ascending-sorted list of nonzero item indices, which is
//!   what the similarity merge-join walks.
//!
//! The dense table costs `user_count * item_count` bytes. That is a
//! deliberate simplicity trade-off; it is the dominant memory cost of a
//! session and the first thing to revisit for catalogs beyond a few
//! hundred thousand items.
//!
//! Sortedness of the sparse rows is a hard invariant: every similarity
//! metric assumes it. Rows are sorted (and duplicate records collapsed,
//! last count winning) at build time rather than trusting input order.

use crate::dataset::Record;
use crate::error::{CoplayError, Result};
use crate::ids::{IdIndex, ItemIdx, UserIdx};
use crate::quantize;

/// Immutable-after-build interaction data for one training run.
#[derive(Debug, Clone)]
pub struct InteractionStore {
    user_count: usize,
    item_count: usize,
    /// Row-major `user_count x item_count` quantized counts; 0 = no interaction.
    counts: Vec<u8>,
    /// Ascending nonzero item indices per user.
    items_of_user: Vec<Vec<ItemIdx>>,
}

impl InteractionStore {
    /// Build the store from raw records and the identity index made from them.
    pub fn build(records: &[Record], ids: &IdIndex) -> Result<Self> {
        if records.is_empty() {
            return Err(CoplayError::EmptyInput);
        }

        let user_count = ids.user_count();
        let item_count = ids.item_count();
        let mut counts = vec![0u8; user_count * item_count];
        let mut items_of_user: Vec<Vec<ItemIdx>> = vec![Vec::new(); user_count];

        for (pos, record) in records.iter().enumerate() {
            if record.count < 1 {
                return Err(CoplayError::InvalidCount {
                    line: pos + 1,
                    count: i64::from(record.count),
                });
            }
            let u = ids.user_idx(&record.user)?;
            let i = ids.item_idx(&record.item)?;
            counts[u.as_usize() * item_count + i.as_usize()] = quantize::encode(record.count);
            items_of_user[u.as_usize()].push(i);
        }

        for row in &mut items_of_user {
            row.sort_unstable();
            row.dedup();
        }

        Ok(Self {
            user_count,
            item_count,
            counts,
            items_of_user,
        })
    }

    #[inline]
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Quantized log-count for `(user, item)`; 0 means no interaction.
    #[inline]
    #[must_use]
    pub fn count(&self, user: UserIdx, item: ItemIdx) -> u8 {
        self.counts[user.as_usize() * self.item_count + item.as_usize()]
    }

    /// Whether the user has any interaction with the item.
    #[inline]
    #[must_use]
    pub fn has_interacted(&self, user: UserIdx, item: ItemIdx) -> bool {
        self.count(user, item) != 0
    }

    /// The user's dense quantized-count row.
    #[inline]
    #[must_use]
    pub fn user_row(&self, user: UserIdx) -> &[u8] {
        let start = user.as_usize() * self.item_count;
        &self.counts[start..start + self.item_count]
    }

    /// Ascending nonzero item indices for a user.
    #[inline]
    #[must_use]
    pub fn items_of(&self, user: UserIdx) -> &[ItemIdx] {
        &self.items_of_user[user.as_usize()]
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

    /// The worked 3-user / 2-item example: quantized rows A:[3,1] B:[2,1] C:[4,0].
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
    fn quantized_table_matches_scenario() {
        let records = scenario();
        let ids = IdIndex::build(&records).unwrap();
        let store = InteractionStore::build(&records, &ids).unwrap();

        assert_eq!(store.user_row(UserIdx(0)), &[3, 1]);
        assert_eq!(store.user_row(UserIdx(1)), &[2, 1]);
        assert_eq!(store.user_row(UserIdx(2)), &[4, 0]);
        assert!(store.has_interacted(UserIdx(2), ItemIdx(0)));
        assert!(!store.has_interacted(UserIdx(2), ItemIdx(1)));
    }

    #[test]
    fn sparse_rows_are_sorted_regardless_of_input_order() {
        let records = vec![
            record("u", "zz", 1),
            record("u", "aa", 2),
            record("u", "mm", 3),
        ];
        let ids = IdIndex::build(&records).unwrap();
        let store = InteractionStore::build(&records, &ids).unwrap();
        let items = store.items_of(UserIdx(0));
        assert_eq!(items, &[ItemIdx(0), ItemIdx(1), ItemIdx(2)]);
    }

    #[test]
    fn duplicate_records_collapse_with_last_count_winning() {
        let records = vec![record("u", "s", 2), record("u", "s", 8)];
        let ids = IdIndex::build(&records).unwrap();
        let store = InteractionStore::build(&records, &ids).unwrap();
        assert_eq!(store.items_of(UserIdx(0)).len(), 1);
        assert_eq!(store.count(UserIdx(0), ItemIdx(0)), 4);
    }

    #[test]
    fn zero_count_record_is_rejected() {
        let records = vec![record("u", "s", 0)];
        let ids = IdIndex::build(&records).unwrap();
        let err = InteractionStore::build(&records, &ids).unwrap_err();
        assert!(matches!(err, CoplayError::InvalidCount { line: 1, count: 0 }));
    }
}
