//! Ordered index sets used for marginal extraction.

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// An ordered collection of component indices.
///
/// Used to select sub-components of samples, matrices, tensors and
/// functions. Validation helpers let callers reject out-of-range or
/// duplicated indices before any extraction starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indices(Vec<usize>);

impl Indices {
    /// The contiguous index set `[0, count)`.
    pub fn from_range(count: usize) -> Self {
        Indices((0..count).collect())
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the set holds no index.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every index is strictly below `bound`.
    pub fn check_bound(&self, bound: usize) -> bool {
        self.0.iter().all(|&i| i < bound)
    }

    /// True when at least one index appears twice.
    pub fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        self.0.iter().any(|&i| !seen.insert(i))
    }

    /// True when the set is exactly `[0, bound)` in increasing order.
    ///
    /// The marginal operations use this to detect the identity selection
    /// and return a clone instead of rebuilding the object.
    pub fn is_full_identity(&self, bound: usize) -> bool {
        self.0.len() == bound && self.0.iter().enumerate().all(|(pos, &i)| pos == i)
    }

    /// Indices as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Iterate over the indices.
    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }
}

impl From<Vec<usize>> for Indices {
    fn from(indices: Vec<usize>) -> Self {
        Indices(indices)
    }
}

/// A single index, for one-component marginals.
impl From<usize> for Indices {
    fn from(index: usize) -> Self {
        Indices(vec![index])
    }
}

impl From<&[usize]> for Indices {
    fn from(indices: &[usize]) -> Self {
        Indices(indices.to_vec())
    }
}

impl Index<usize> for Indices {
    type Output = usize;

    fn index(&self, position: usize) -> &usize {
        &self.0[position]
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
