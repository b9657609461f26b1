//! Core shared types: points, validated correspondence sets, and the
//! row-oriented data matrix consumed by estimators and samplers.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::HomographyError;

/// Dynamic matrix of `f64`, one correspondence per row.
///
/// Homography data uses the layout `[x1, y1, x2, y2]`.
pub type DataMatrix = DMatrix<f64>;

/// Minimum number of correspondences for a homography (8 degrees of freedom).
pub const MIN_CORRESPONDENCES: usize = 4;

/// Immutable 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2D> for [f64; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

/// Positionally paired source and destination points.
///
/// Only constructible through [`PointCorrespondenceSet::new`], so a value of
/// this type always holds at least [`MIN_CORRESPONDENCES`] pairs of finite
/// points and both sides have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCorrespondenceSet {
    source: Vec<Point2D>,
    destination: Vec<Point2D>,
}

impl PointCorrespondenceSet {
    /// Validate and copy the two point sequences.
    ///
    /// Length mismatches are reported before the count check so that
    /// mismatched input is never silently truncated.
    pub fn new(source: &[Point2D], destination: &[Point2D]) -> Result<Self, HomographyError> {
        if source.len() != destination.len() {
            return Err(HomographyError::MismatchedLengths(
                source.len(),
                destination.len(),
            ));
        }
        if source.len() < MIN_CORRESPONDENCES {
            return Err(HomographyError::InsufficientPoints {
                required: MIN_CORRESPONDENCES,
                actual: source.len(),
            });
        }
        if let Some(index) = source
            .iter()
            .zip(destination)
            .position(|(s, d)| !s.is_finite() || !d.is_finite())
        {
            return Err(HomographyError::NonFiniteCoordinate { index });
        }

        Ok(Self {
            source: source.to_vec(),
            destination: destination.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn source(&self) -> &[Point2D] {
        &self.source
    }

    pub fn destination(&self) -> &[Point2D] {
        &self.destination
    }

    /// Iterate over `(source, destination)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&Point2D, &Point2D)> {
        self.source.iter().zip(self.destination.iter())
    }

    /// Pack into an N×4 data matrix with rows `[x1, y1, x2, y2]`.
    pub fn to_data_matrix(&self) -> DataMatrix {
        let mut data = DataMatrix::zeros(self.len(), 4);
        for (i, (s, d)) in self.pairs().enumerate() {
            data[(i, 0)] = s.x;
            data[(i, 1)] = s.y;
            data[(i, 2)] = d.x;
            data[(i, 3)] = d.y;
        }
        data
    }
}
