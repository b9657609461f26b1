//! Homography estimator using the normalized direct linear transform.
//!
//! Both point sets are Hartley-normalized before solving. The minimal
//! 4-point case fixes `h33 = 1` and solves the 8×8 system by Gaussian
//! elimination; larger sets take the right singular vector of the 2N×9 DLT
//! system with the smallest singular value.

use nalgebra::{DMatrix, DVector, Matrix3, Vector2};

use crate::core::Estimator;
use crate::models::HomographyMatrix;
use crate::types::DataMatrix;
use crate::utils::{are_collinear, gauss_elimination, signed_area, Normalization};

/// Lower bound on `σ_min / σ_max` of the model expressed in the normalized
/// frames of its sample; below it the model is treated as singular.
const MIN_SINGULAR_VALUE_RATIO: f64 = 1e-8;

/// Triangles of a 4-point sample, by index into the sample.
const SAMPLE_TRIANGLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

/// Normalized-DLT homography estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl HomographyEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Solve the 4-point case by Gaussian elimination with `h33 = 1`.
    fn estimate_minimal_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<HomographyMatrix> {
        let Some((src_norm, src, dst_norm, dst)) = normalized_points(data, sample) else {
            return Vec::new();
        };

        let mut augmented = DMatrix::<f64>::zeros(8, 9);
        for i in 0..4 {
            let (x1, y1) = (src[i].x, src[i].y);
            let (x2, y2) = (dst[i].x, dst[i].y);

            let r = 2 * i;
            augmented[(r, 0)] = -x1;
            augmented[(r, 1)] = -y1;
            augmented[(r, 2)] = -1.0;
            augmented[(r, 6)] = x2 * x1;
            augmented[(r, 7)] = x2 * y1;
            augmented[(r, 8)] = -x2;

            augmented[(r + 1, 3)] = -x1;
            augmented[(r + 1, 4)] = -y1;
            augmented[(r + 1, 5)] = -1.0;
            augmented[(r + 1, 6)] = y2 * x1;
            augmented[(r + 1, 7)] = y2 * y1;
            augmented[(r + 1, 8)] = -y2;
        }

        let mut h = DVector::<f64>::zeros(8);
        if !gauss_elimination(&mut augmented, &mut h) {
            return Vec::new();
        }
        if h.iter().any(|v| !v.is_finite()) {
            return Vec::new();
        }

        let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        denormalize(&h_norm, &src_norm, &dst_norm)
    }

    /// Least-squares fit over five or more points via SVD.
    fn estimate_svd_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<HomographyMatrix> {
        let Some((src_norm, src, dst_norm, dst)) = normalized_points(data, sample) else {
            return Vec::new();
        };

        let n = sample.len();
        let mut a = DMatrix::<f64>::zeros(2 * n, 9);
        for i in 0..n {
            let (x1, y1) = (src[i].x, src[i].y);
            let (x2, y2) = (dst[i].x, dst[i].y);

            let r = 2 * i;
            a[(r, 0)] = -x1;
            a[(r, 1)] = -y1;
            a[(r, 2)] = -1.0;
            a[(r, 6)] = x2 * x1;
            a[(r, 7)] = x2 * y1;
            a[(r, 8)] = x2;

            a[(r + 1, 3)] = -x1;
            a[(r + 1, 4)] = -y1;
            a[(r + 1, 5)] = -1.0;
            a[(r + 1, 6)] = y2 * x1;
            a[(r + 1, 7)] = y2 * y1;
            a[(r + 1, 8)] = y2;
        }

        let svd = a.svd(false, true);
        let Some(v_t) = svd.v_t.as_ref() else {
            return Vec::new();
        };
        let Some((min_idx, _)) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
        else {
            return Vec::new();
        };

        let row = v_t.row(min_idx);
        if row.iter().any(|v| !v.is_finite()) {
            return Vec::new();
        }
        let h_norm = Matrix3::new(
            row[0], row[1], row[2], row[3], row[4], row[5], row[6], row[7], row[8],
        );
        denormalize(&h_norm, &src_norm, &dst_norm)
    }
}

impl Estimator for HomographyEstimator {
    type Model = HomographyMatrix;

    fn sample_size(&self) -> usize {
        4
    }

    /// Rejects repeated indices and, for minimal samples, collinear triples
    /// and samples whose triangle orientations disagree between the two
    /// views (no homography can fold the plane that way).
    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool {
        if sample.len() < self.sample_size() {
            return false;
        }
        for i in 0..sample.len() {
            if sample[i] >= data.nrows() {
                return false;
            }
            for j in (i + 1)..sample.len() {
                if sample[i] == sample[j] {
                    return false;
                }
            }
        }
        if sample.len() != self.sample_size() {
            return true;
        }

        let src: Vec<Vector2<f64>> = sample.iter().map(|&i| source_point(data, i)).collect();
        let dst: Vec<Vector2<f64>> = sample
            .iter()
            .map(|&i| destination_point(data, i))
            .collect();

        let mut flipped = 0;
        for [a, b, c] in SAMPLE_TRIANGLES {
            if are_collinear(&src[a], &src[b], &src[c]) || are_collinear(&dst[a], &dst[b], &dst[c])
            {
                return false;
            }
            let s = signed_area(&src[a], &src[b], &src[c]);
            let d = signed_area(&dst[a], &dst[b], &dst[c]);
            if s * d < 0.0 {
                flipped += 1;
            }
        }
        // A reflection flips every triangle; a fold flips only some.
        flipped == 0 || flipped == SAMPLE_TRIANGLES.len()
    }

    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model> {
        let n = sample.len();
        if n < self.sample_size() {
            return Vec::new();
        }
        if n == self.sample_size() {
            return self.estimate_minimal_model(data, sample);
        }
        self.estimate_svd_model(data, sample)
    }

    fn estimate_model_nonminimal(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model> {
        self.estimate_model(data, sample)
    }

    /// Conditioning is judged in the Hartley frames of `sample`, so
    /// translations and scale changes between the two planes never count
    /// as singular.
    fn is_valid_model(
        &self,
        model: &HomographyMatrix,
        data: &DataMatrix,
        sample: &[usize],
        _threshold: f64,
    ) -> bool {
        if !model.is_finite() {
            return false;
        }
        let Some((src_norm, _, dst_norm, _)) = normalized_points(data, sample) else {
            return false;
        };

        let conditioned = dst_norm.forward * model.matrix() * src_norm.inverse;
        let singular_values = conditioned.singular_values();
        let largest = singular_values.max();
        largest > 0.0 && singular_values.min() / largest > MIN_SINGULAR_VALUE_RATIO
    }
}

fn source_point(data: &DataMatrix, row: usize) -> Vector2<f64> {
    Vector2::new(data[(row, 0)], data[(row, 1)])
}

fn destination_point(data: &DataMatrix, row: usize) -> Vector2<f64> {
    Vector2::new(data[(row, 2)], data[(row, 3)])
}

type NormalizedSample = (Normalization, Vec<Vector2<f64>>, Normalization, Vec<Vector2<f64>>);

fn normalized_points(data: &DataMatrix, sample: &[usize]) -> Option<NormalizedSample> {
    let src: Vec<Vector2<f64>> = sample.iter().map(|&i| source_point(data, i)).collect();
    let dst: Vec<Vector2<f64>> = sample
        .iter()
        .map(|&i| destination_point(data, i))
        .collect();
    let (src_norm, src) = Normalization::of(&src)?;
    let (dst_norm, dst) = Normalization::of(&dst)?;
    Some((src_norm, src, dst_norm, dst))
}

/// `H = T_dst⁻¹ · H_norm · T_src`.
fn denormalize(
    h_norm: &Matrix3<f64>,
    src_norm: &Normalization,
    dst_norm: &Normalization,
) -> Vec<HomographyMatrix> {
    let h = dst_norm.inverse * h_norm * src_norm.forward;
    if h.iter().any(|v| !v.is_finite()) {
        return Vec::new();
    }
    vec![HomographyMatrix::new(h)]
}
