//! Identity index: external string identifiers <-> dense integer indices.
//!
//! Every downstream array is keyed by a dense index, so the mapping rules
//! are load-bearing for binary-format compatibility:
//!
//! - **Users** are numbered in first-appearance order of the input stream
//!   (input-order-dependent).
//! - **Items** are numbered by lexicographic sort of the distinct item
//!   identifiers (input-order-independent).
//!
//! The asymmetry is deliberate and must not be "fixed": a persisted
//! similarity matrix is only meaningful alongside the user numbering that
//! produced it.

use std::collections::HashMap;

use crate::dataset::Record;
use crate::error::{CoplayError, Result};

/// Dense user index in `[0, user_count)`.
///
/// A typed newtype so user and item indices can never be swapped at a call
/// site that indexes into the wrong array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserIdx(pub u32);

/// Dense item index in `[0, item_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemIdx(pub u32);

impl UserIdx {
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl ItemIdx {
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional mapping between external identifiers and dense indices.
#[derive(Debug, Clone)]
pub struct IdIndex {
    user_to_idx: HashMap<String, UserIdx>,
    item_to_idx: HashMap<String, ItemIdx>,
    users: Vec<String>,
    items: Vec<String>,
}

impl IdIndex {
    /// Build the mapping from raw interaction records.
    ///
    /// Returns [`CoplayError::EmptyInput`] for an empty record slice.
    pub fn build(records: &[Record]) -> Result<Self> {
        if records.is_empty() {
            return Err(CoplayError::EmptyInput);
        }

        let mut user_to_idx = HashMap::new();
        let mut users = Vec::new();
        let mut items: Vec<&str> = Vec::new();

        for record in records {
            if !user_to_idx.contains_key(&record.user) {
                user_to_idx.insert(record.user.clone(), UserIdx(users.len() as u32));
                users.push(record.user.clone());
            }
            items.push(&record.item);
        }

        items.sort_unstable();
        items.dedup();

        let item_to_idx = items
            .iter()
            .enumerate()
            .map(|(i, item)| ((*item).to_owned(), ItemIdx(i as u32)))
            .collect();
        let items = items.into_iter().map(str::to_owned).collect();

        Ok(Self {
            user_to_idx,
            item_to_idx,
            users,
            items,
        })
    }

    #[inline]
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Look up the dense index for an external user identifier.
    pub fn user_idx(&self, user: &str) -> Result<UserIdx> {
        self.user_to_idx
            .get(user)
            .copied()
            .ok_or_else(|| CoplayError::UnknownUser(user.to_owned()))
    }

    /// Look up the dense index for an external item identifier.
    pub fn item_idx(&self, item: &str) -> Result<ItemIdx> {
        self.item_to_idx
            .get(item)
            .copied()
            .ok_or_else(|| CoplayError::UnknownItem(item.to_owned()))
    }

    /// The external identifier for a user index.
    #[inline]
    #[must_use]
    pub fn user_id(&self, idx: UserIdx) -> &str {
        &self.users[idx.as_usize()]
    }

    /// The external identifier for an item index.
    #[inline]
    #[must_use]
    pub fn item_id(&self, idx: ItemIdx) -> &str {
        &self.items[idx.as_usize()]
    }
}
