//! Dense point in R^d.
//!
//! `Point` is the unit of exchange between evaluations, gradients and
//! hessians: a flat vector of `f64` components. Arithmetic operators
//! panic on mismatched dimensions; fallible call sites should validate
//! dimensions before doing arithmetic.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or vector) in R^d.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    data: Vec<f64>,
}

impl Point {
    /// Create a point of the given dimension, filled with zeros.
    pub fn zeros(dimension: usize) -> Self {
        Point {
            data: vec![0.0; dimension],
        }
    }

    /// Create a point from a slice of components.
    pub fn from_slice(components: &[f64]) -> Self {
        Point {
            data: components.to_vec(),
        }
    }

    /// Number of components.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// True when the point has no components (the empty parameter vector).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Components as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Squared Euclidean norm.
    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// Squared Euclidean distance to another point of the same dimension.
    ///
    /// Panics if the dimensions differ.
    pub fn squared_distance(&self, other: &Point) -> f64 {
        assert_eq!(
            self.dimension(),
            other.dimension(),
            "squared_distance on points of dimension {} and {}",
            self.dimension(),
            other.dimension()
        );
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Componentwise comparison within an absolute tolerance.
    pub fn all_close(&self, other: &Point, epsilon: f64) -> bool {
        self.dimension() == other.dimension()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl From<Vec<f64>> for Point {
    fn from(data: Vec<f64>) -> Self {
        Point { data }
    }
}

impl From<Point> for Vec<f64> {
    fn from(point: Point) -> Self {
        point.data
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "]")
    }
}

fn assert_same_dimension(lhs: &Point, rhs: &Point, op: &str) {
    assert_eq!(
        lhs.dimension(),
        rhs.dimension(),
        "{} on points of dimension {} and {}",
        op,
        lhs.dimension(),
        rhs.dimension()
    );
}

impl Add for &Point {
    type Output = Point;

    fn add(self, rhs: &Point) -> Point {
        assert_same_dimension(self, rhs, "add");
        Point {
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl Sub for &Point {
    type Output = Point;

    fn sub(self, rhs: &Point) -> Point {
        assert_same_dimension(self, rhs, "sub");
        Point {
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

impl Mul<f64> for &Point {
    type Output = Point;

    fn mul(self, scalar: f64) -> Point {
        Point {
            data: self.data.iter().map(|a| a * scalar).collect(),
        }
    }
}

impl AddAssign<&Point> for Point {
    fn add_assign(&mut self, rhs: &Point) {
        assert_same_dimension(self, rhs, "add_assign");
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += b;
        }
    }
}

impl<'a> IntoIterator for &'a Point {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
