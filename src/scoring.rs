//! Scoring primitives.
//!
//! A basic score type and a RANSAC-style inlier-count scoring implementation
//! that plugs into the generic `Scoring` trait from `core`.

use std::cmp::Ordering;

use crate::core::Scoring;
use crate::types::DataMatrix;

/// Inlier count plus the summed residual of those inliers.
///
/// More inliers is better; for equal counts a lower residual sum is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub inlier_count: usize,
    pub residual_sum: f64,
}

impl Score {
    pub fn new(inlier_count: usize, residual_sum: f64) -> Self {
        Self {
            inlier_count,
            residual_sum,
        }
    }

    /// Mean residual over inliers, `0.0` when there are none.
    pub fn mean_residual(&self) -> f64 {
        if self.inlier_count == 0 {
            0.0
        } else {
            self.residual_sum / self.inlier_count as f64
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.inlier_count.cmp(&other.inlier_count) {
            Ordering::Equal => other.residual_sum.partial_cmp(&self.residual_sum),
            ord => Some(ord),
        }
    }
}

/// RANSAC-style scoring that counts inliers using a user-provided residual
/// function.
///
/// The residual function takes `(data, model, row_index)` and returns a
/// non-negative residual value; non-finite residuals are never inliers.
pub struct RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    threshold: f64,
    residual_fn: F,
    _marker: std::marker::PhantomData<M>,
}

impl<M, F> RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    pub fn new(threshold: f64, residual_fn: F) -> Self {
        Self {
            threshold,
            residual_fn,
            _marker: std::marker::PhantomData,
        }
    }

    /// Residual of a single row under `model`.
    pub fn residual(&self, data: &DataMatrix, model: &M, row: usize) -> f64 {
        (self.residual_fn)(data, model, row)
    }
}

impl<M, F> Scoring<M> for RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    type Score = Score;

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, data: &DataMatrix, model: &M, inliers_out: &mut Vec<usize>) -> Self::Score {
        inliers_out.clear();

        let mut residual_sum = 0.0;
        for i in 0..data.nrows() {
            let r = (self.residual_fn)(data, model, i);
            if r.is_finite() && r <= self.threshold {
                inliers_out.push(i);
                residual_sum += r;
            }
        }

        Score::new(inliers_out.len(), residual_sum)
    }
}
