//! Nearest-neighbour lookup behind the database evaluation.
//!
//! The spatial index is an external collaborator consumed through the
//! [`NearestNeighbour`] trait; errors it returns are propagated
//! unmodified. The in-tree [`BruteForceNearestNeighbour`] scans
//! exhaustively under squared Euclidean distance.

use aleator_types::{Point, Sample};

use crate::error::{FunctionError, Result};

/// Spatial index over a reference sample.
pub trait NearestNeighbour: Send + Sync {
    /// Replaces the indexed sample and rebuilds the index.
    fn set_sample(&mut self, sample: &Sample) -> Result<()>;

    /// The currently indexed sample.
    fn sample(&self) -> &Sample;

    /// Row index of the nearest indexed point under the implementation
    /// metric. Ties resolve to the lowest row index.
    fn query(&self, x: &Point) -> Result<usize>;

    /// A fresh, unarmed index of the same implementation.
    fn empty_clone(&self) -> Box<dyn NearestNeighbour>;

    /// A full copy, indexed sample included.
    fn clone_box(&self) -> Box<dyn NearestNeighbour>;
}

/// Exhaustive scan under squared Euclidean distance.
#[derive(Debug, Clone)]
pub struct BruteForceNearestNeighbour {
    sample: Sample,
}

impl BruteForceNearestNeighbour {
    pub fn new() -> Self {
        BruteForceNearestNeighbour {
            sample: Sample::new(0),
        }
    }
}

impl Default for BruteForceNearestNeighbour {
    fn default() -> Self {
        BruteForceNearestNeighbour::new()
    }
}

impl NearestNeighbour for BruteForceNearestNeighbour {
    fn set_sample(&mut self, sample: &Sample) -> Result<()> {
        self.sample = sample.clone();
        Ok(())
    }

    fn sample(&self) -> &Sample {
        &self.sample
    }

    fn query(&self, x: &Point) -> Result<usize> {
        if self.sample.is_empty() {
            return Err(FunctionError::EmptyInput(
                "nearest-neighbour index holds no points".to_string(),
            ));
        }
        if x.dimension() != self.sample.dimension() {
            return Err(FunctionError::dimension(
                "nearest-neighbour query",
                self.sample.dimension(),
                x.dimension(),
            ));
        }
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, row) in self.sample.rows().enumerate() {
            let distance = squared_distance(x.as_slice(), row);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        Ok(best)
    }

    fn empty_clone(&self) -> Box<dyn NearestNeighbour> {
        Box::new(BruteForceNearestNeighbour::new())
    }

    fn clone_box(&self) -> Box<dyn NearestNeighbour> {
        Box::new(self.clone())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
