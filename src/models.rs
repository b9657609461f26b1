//! Planar projective transform model.
//!
//! Coefficients are stored row-major and scaled so that `h33 == 1` whenever
//! the bottom-right entry is not negligible. When it is (the source origin
//! maps to infinity) the matrix is scaled to unit Frobenius norm instead.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::Point2D;

/// Homogeneous `w` below this magnitude is treated as a point at infinity.
const MIN_W: f64 = 1e-12;

/// Relative magnitude of `h33` below which `h33 = 1` scaling is abandoned.
const MIN_RELATIVE_H33: f64 = 1e-12;

/// Planar projective transformation represented by a 3x3 matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 9]", into = "[f64; 9]")]
pub struct HomographyMatrix {
    h: Matrix3<f64>,
}

impl HomographyMatrix {
    /// Wrap `h`, normalizing its scale.
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h: normalize_scale(h) }
    }

    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    /// Build from 9 row-major coefficients.
    pub fn from_coefficients(c: [f64; 9]) -> Self {
        Self::new(Matrix3::from_row_slice(&c))
    }

    /// The 9 row-major coefficients.
    pub fn coefficients(&self) -> [f64; 9] {
        let h = &self.h;
        [
            h[(0, 0)],
            h[(0, 1)],
            h[(0, 2)],
            h[(1, 0)],
            h[(1, 1)],
            h[(1, 2)],
            h[(2, 0)],
            h[(2, 1)],
            h[(2, 2)],
        ]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    pub fn determinant(&self) -> f64 {
        self.h.determinant()
    }

    pub fn is_finite(&self) -> bool {
        self.h.iter().all(|v| v.is_finite())
    }

    /// Map `p` through the transform.
    ///
    /// Returns `None` when `p` lands on the line at infinity or the result
    /// is not finite.
    pub fn apply(&self, p: Point2D) -> Option<Point2D> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v.z;
        if !w.is_finite() || w.abs() <= MIN_W {
            return None;
        }
        let out = Point2D::new(v.x / w, v.y / w);
        out.is_finite().then_some(out)
    }

    /// Inverse transform, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Composition `self ∘ other`: apply `other` first.
    pub fn compose(&self, other: &HomographyMatrix) -> Self {
        Self::new(self.h * other.h)
    }
}

impl Default for HomographyMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 9]> for HomographyMatrix {
    fn from(c: [f64; 9]) -> Self {
        Self::from_coefficients(c)
    }
}

impl From<HomographyMatrix> for [f64; 9] {
    fn from(m: HomographyMatrix) -> Self {
        m.coefficients()
    }
}

fn normalize_scale(h: Matrix3<f64>) -> Matrix3<f64> {
    let norm = h.norm();
    if norm == 0.0 || !norm.is_finite() {
        return h;
    }
    let h33 = h[(2, 2)];
    if h33.abs() > MIN_RELATIVE_H33 * norm {
        h / h33
    } else {
        h / norm
    }
}
