//! Human-readable component labels.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::indices::Indices;

/// An ordered sequence of component labels, one per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description(Vec<String>);

impl Description {
    /// Build the default labels `prefix0, prefix1, ...`.
    pub fn default_labels(prefix: &str, count: usize) -> Self {
        Description((0..count).map(|i| format!("{}{}", prefix, i)).collect())
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there is no label.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Select a subset of labels, in the order given by `indices`.
    pub fn select(&self, indices: &Indices) -> Result<Description, ShapeError> {
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            let label = self.0.get(i).ok_or(ShapeError::IndexOutOfBounds {
                index: i,
                size: self.0.len(),
            })?;
            labels.push(label.clone());
        }
        Ok(Description(labels))
    }

    /// Concatenate two label sequences.
    pub fn concat(&self, other: &Description) -> Description {
        let mut labels = self.0.clone();
        labels.extend(other.0.iter().cloned());
        Description(labels)
    }

    /// Labels as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterate over the labels.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for Description {
    fn from(labels: Vec<String>) -> Self {
        Description(labels)
    }
}

impl From<&[&str]> for Description {
    fn from(labels: &[&str]) -> Self {
        Description(labels.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<&str>> for Description {
    fn from(labels: Vec<&str>) -> Self {
        Description(labels.into_iter().map(str::to_string).collect())
    }
}

impl Index<usize> for Description {
    type Output = String;

    fn index(&self, index: usize) -> &String {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Description {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
