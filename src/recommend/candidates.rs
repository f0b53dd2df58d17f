//! Ordered candidate selection under a quota.

use std::collections::HashSet;

use crate::catalog::ProductId;

/// An ordered, duplicate-free selection of products that fills up to a quota.
///
/// Every selected ID is also added to the exclusion set, so later phases
/// can pass [`CandidateList::excluded`] straight to catalog queries and
/// never propose a product twice. IDs excluded up front (the subject of a
/// request, a user's viewed products) are never selected.
///
/// # Examples
///
/// ```
/// use curio::catalog::ProductId;
/// use curio::recommend::CandidateList;
///
/// let mut list = CandidateList::new(3).excluding([ProductId(1)]);
/// let added = list.extend([1, 2, 3].map(ProductId), 1);
/// assert_eq!(added, 1);
/// assert_eq!(list.selected(), &[ProductId(2)]);
///
/// list.extend([3, 4, 5].map(ProductId), usize::MAX);
/// assert!(list.is_full());
/// assert_eq!(list.into_vec(), vec![ProductId(2), ProductId(3), ProductId(4)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    selected: Vec<ProductId>,
    excluded: HashSet<ProductId>,
    quota: usize,
}

impl CandidateList {
    pub fn new(quota: usize) -> Self {
        CandidateList {
            selected: Vec::with_capacity(quota),
            excluded: HashSet::new(),
            quota,
        }
    }

    /// Exclude IDs without selecting them.
    pub fn excluding<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ProductId>,
    {
        self.excluded.extend(ids);
        self
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Change the quota. Already selected IDs are kept even if the new
    /// quota is smaller.
    pub fn set_quota(&mut self, quota: usize) {
        self.quota = quota;
    }

    /// How many more IDs fit.
    pub fn remaining(&self) -> usize {
        self.quota.saturating_sub(self.selected.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// IDs already selected or excluded up front.
    pub fn excluded(&self) -> &HashSet<ProductId> {
        &self.excluded
    }

    pub fn selected(&self) -> &[ProductId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select one ID. Returns `false` if the list is full or the ID is excluded.
    pub fn push(&mut self, id: ProductId) -> bool {
        if self.is_full() || self.excluded.contains(&id) {
            return false;
        }
        self.excluded.insert(id);
        self.selected.push(id);
        true
    }

    /// Select IDs in order until `cap` were added or the list is full.
    ///
    /// Returns the number of IDs added.
    pub fn extend<I>(&mut self, ids: I, cap: usize) -> usize
    where
        I: IntoIterator<Item = ProductId>,
    {
        let mut added = 0;
        for id in ids {
            if added >= cap || self.is_full() {
                break;
            }
            if self.push(id) {
                added += 1;
            }
        }
        added
    }

    pub fn into_vec(self) -> Vec<ProductId> {
        self.selected
    }
}
