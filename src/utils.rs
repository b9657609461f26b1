//! Numerical and sampling helpers shared by the estimator and samplers.

use nalgebra::{DMatrix, DVector, Matrix3, Vector2};
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::prelude::*;

/// Pivots smaller than this are treated as singular.
const MIN_PIVOT: f64 = 1e-10;

/// Twice the triangle area, relative to the squared longest edge, below which
/// three points count as collinear.
pub const COLLINEAR_TOLERANCE: f64 = 1e-6;

/// Uniform integer random-number generator.
///
/// Randomly seeded by default; tests and reproducible runs construct it from a
/// fixed seed.
pub struct UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    rng: StdRng,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Default for UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    /// Construct with an entropy seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Construct with a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            _marker: std::marker::PhantomData,
        }
    }

    /// Fill `out` with distinct values drawn uniformly from `[min, max]`.
    ///
    /// Rejection sampling; intended for small minimal samples. The caller
    /// must ensure the range holds at least `out.len()` values.
    pub fn gen_unique(&mut self, out: &mut [T], min: T, max: T)
    where
        T: Eq,
    {
        let dist = Uniform::new_inclusive(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = self.rng.sample(&dist);
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

/// Gaussian elimination with partial pivoting solving `A * x = b`.
///
/// `augmented` is `[A | b]` with `A` square; the solution lands in `result`.
/// Returns `false` on a shape mismatch or a singular pivot.
pub fn gauss_elimination(augmented: &mut DMatrix<f64>, result: &mut DVector<f64>) -> bool {
    let n = augmented.nrows();
    if augmented.ncols() != n + 1 || n != result.len() {
        return false;
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[(i, i)].abs();
        for k in (i + 1)..n {
            let val = augmented[(k, i)].abs();
            if val > max_val {
                max_val = val;
                max_row = k;
            }
        }
        if max_row != i {
            augmented.swap_rows(i, max_row);
        }

        if !(augmented[(i, i)].abs() >= MIN_PIVOT) {
            return false;
        }

        for k in (i + 1)..n {
            let factor = augmented[(k, i)] / augmented[(i, i)];
            for j in i..=n {
                augmented[(k, j)] -= factor * augmented[(i, j)];
            }
        }
    }

    for i in (0..n).rev() {
        let mut acc = augmented[(i, n)];
        for j in (i + 1)..n {
            acc -= augmented[(i, j)] * result[j];
        }
        result[i] = acc / augmented[(i, i)];
    }

    true
}

/// Similarity transform moving a point set to zero centroid and mean
/// distance `sqrt(2)` from the origin (Hartley normalization).
#[derive(Debug, Clone)]
pub struct Normalization {
    /// Maps original coordinates to normalized ones.
    pub forward: Matrix3<f64>,
    /// Maps normalized coordinates back.
    pub inverse: Matrix3<f64>,
}

impl Normalization {
    /// Compute the normalization of `points` and return it with the
    /// normalized points.
    ///
    /// `None` when all points coincide.
    pub fn of(points: &[Vector2<f64>]) -> Option<(Self, Vec<Vector2<f64>>)> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let centroid = points.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n;
        let mean_dist = points.iter().map(|p| (p - centroid).norm()).sum::<f64>() / n;
        if !(mean_dist > f64::EPSILON * (1.0 + centroid.norm())) {
            return None;
        }

        let s = std::f64::consts::SQRT_2 / mean_dist;
        let forward = Matrix3::new(
            s,
            0.0,
            -s * centroid.x,
            0.0,
            s,
            -s * centroid.y,
            0.0,
            0.0,
            1.0,
        );
        let inverse = Matrix3::new(
            1.0 / s,
            0.0,
            centroid.x,
            0.0,
            1.0 / s,
            centroid.y,
            0.0,
            0.0,
            1.0,
        );
        let normalized = points.iter().map(|p| (p - centroid) * s).collect();
        Some((Self { forward, inverse }, normalized))
    }
}

/// Twice the signed area of triangle `(a, b, c)`; positive when
/// counter-clockwise in a y-up frame.
pub fn signed_area(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Whether `a`, `b`, `c` are collinear (or any two coincide) within
/// [`COLLINEAR_TOLERANCE`].
pub fn are_collinear(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> bool {
    let lab = (b - a).norm();
    let lac = (c - a).norm();
    let lbc = (c - b).norm();
    let scale = lab.max(lac).max(lbc);
    if scale == 0.0 {
        return true;
    }
    // Twice the area over the squared longest edge is scale free.
    signed_area(a, b, c).abs() <= COLLINEAR_TOLERANCE * scale * scale
}

/// Whether every point of the set lies on one line.
///
/// Sets with fewer than three distinct points are trivially collinear.
pub fn all_collinear(points: &[Vector2<f64>]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let Some(far) = points
        .iter()
        .max_by(|a, b| (*a - first).norm().total_cmp(&(*b - first).norm()))
    else {
        return true;
    };
    if (far - first).norm() == 0.0 {
        return true;
    }
    points.iter().all(|p| are_collinear(first, far, p))
}

/// Number of distinct points, merging points closer than `tolerance` times
/// the set's extent.
pub fn distinct_count(points: &[Vector2<f64>], tolerance: f64) -> usize {
    let extent = points
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let eps = tolerance * extent;
    let mut distinct: Vec<&Vector2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if distinct.iter().all(|q| (p - *q).norm() > eps) {
            distinct.push(p);
        }
    }
    distinct.len()
}
