//! High-level bridge functions.
//!
//! [`compute_homography`] is the narrow contract: two point sequences in, an
//! optional matrix out, never a panic. [`estimate_homography`] runs the same
//! computation but reports why it failed and exposes inliers and diagnostics.

use log::{debug, warn};
use nalgebra::Vector2;

use crate::core::{
    Estimator, LeastSquaresOptimizer, RansacPipeline, RansacTerminationCriterion, Scoring,
};
use crate::error::HomographyError;
use crate::estimators::HomographyEstimator;
use crate::models::HomographyMatrix;
use crate::samplers::UniformRandomSampler;
use crate::scoring::{RansacInlierCountScoring, Score};
use crate::settings::{EstimationMethod, LocalOptimizationType, RansacSettings};
use crate::types::{DataMatrix, Point2D, PointCorrespondenceSet, MIN_CORRESPONDENCES};
use crate::utils::{all_collinear, distinct_count};

/// Points closer than this fraction of the set's extent count as one point.
const DISTINCT_TOLERANCE: f64 = 1e-9;

/// Result of a homography estimation.
#[derive(Debug, Clone)]
pub struct EstimationResult {
    /// The estimated homography.
    pub model: HomographyMatrix,
    /// Indices of inlier correspondences.
    pub inliers: Vec<usize>,
    /// Score of the estimated model.
    pub score: Score,
    /// Number of RANSAC iterations performed (0 for least squares).
    pub iterations: usize,
    /// Mean transfer error over the inliers.
    pub reprojection_error: f64,
}

/// Estimate the homography mapping `source` onto `destination`.
///
/// Returns `None` on any failure: fewer than 4 correspondences, mismatched
/// lengths, degenerate configurations, or numeric failure. Uses default
/// [`RansacSettings`].
///
/// RANSAC only accepts 4-point samples whose triangles keep (or all reverse)
/// their orientation. When the horizon line of the true mapping crosses the
/// quad, an exact 4-point input therefore fails here as a degenerate
/// configuration, while [`EstimationMethod::LeastSquares`] through
/// [`estimate_homography`] still fits it.
///
/// ```
/// use homography_bridge::{compute_homography, Point2D};
///
/// let src = [
///     Point2D::new(0.0, 0.0),
///     Point2D::new(1.0, 0.0),
///     Point2D::new(1.0, 1.0),
///     Point2D::new(0.0, 1.0),
/// ];
/// let dst: Vec<Point2D> = src.iter().map(|p| Point2D::new(p.x + 2.0, p.y)).collect();
///
/// let h = compute_homography(&src, &dst).unwrap();
/// let c = h.coefficients();
/// assert!((c[2] - 2.0).abs() < 1e-9);
/// ```
pub fn compute_homography(source: &[Point2D], destination: &[Point2D]) -> Option<HomographyMatrix> {
    match estimate_homography(source, destination, None) {
        Ok(result) => Some(result.model),
        Err(e) => {
            warn!("homography computation failed: {e}");
            None
        }
    }
}

/// Same as [`compute_homography`], flattened to 9 row-major coefficients.
pub fn compute_homography_coefficients(
    source: &[Point2D],
    destination: &[Point2D],
) -> Option<[f64; 9]> {
    compute_homography(source, destination).map(|h| h.coefficients())
}

/// Estimate a homography from 2D point correspondences.
///
/// # Arguments
/// * `source` - Points in the source plane
/// * `destination` - Corresponding points in the destination plane
/// * `settings_opt` - Optional settings (uses defaults if None)
///
/// # Returns
/// `EstimationResult` containing the homography, inliers, score, and iterations.
pub fn estimate_homography(
    source: &[Point2D],
    destination: &[Point2D],
    settings_opt: Option<RansacSettings>,
) -> Result<EstimationResult, HomographyError> {
    let settings = settings_opt.unwrap_or_default();
    settings.validate()?;

    let correspondences = PointCorrespondenceSet::new(source, destination)?;
    check_configuration(&correspondences)?;
    let data = correspondences.to_data_matrix();

    debug!(
        "estimating homography from {} correspondences ({:?})",
        data.nrows(),
        settings.method
    );

    match settings.method {
        EstimationMethod::Ransac => estimate_ransac(&data, settings),
        EstimationMethod::LeastSquares => estimate_least_squares(&data, &settings),
    }
}

/// Map one point through `matrix`; `None` if it lands at infinity.
pub fn project_point(point: Point2D, matrix: &HomographyMatrix) -> Option<Point2D> {
    let projected = matrix.apply(point);
    if projected.is_none() {
        debug!("point projection failed for {point:?}");
    }
    projected
}

/// Map every point through `matrix`; `None` if any lands at infinity.
pub fn project_points(points: &[Point2D], matrix: &HomographyMatrix) -> Option<Vec<Point2D>> {
    points.iter().map(|&p| project_point(p, matrix)).collect()
}

/// Mean Euclidean distance between projected `source` and `destination`.
///
/// `None` for empty or mismatched inputs, or if a point projects to infinity.
pub fn reprojection_error(
    matrix: &HomographyMatrix,
    source: &[Point2D],
    destination: &[Point2D],
) -> Option<f64> {
    if source.is_empty() || source.len() != destination.len() {
        return None;
    }
    let mut total = 0.0;
    for (s, d) in source.iter().zip(destination) {
        total += matrix.apply(*s)?.distance(d);
    }
    Some(total / source.len() as f64)
}

/// Forward transfer error `‖H·p1 − p2‖` of one data row.
fn transfer_error(data: &DataMatrix, model: &HomographyMatrix, row: usize) -> f64 {
    let src = Point2D::new(data[(row, 0)], data[(row, 1)]);
    let dst = Point2D::new(data[(row, 2)], data[(row, 3)]);
    model
        .apply(src)
        .map_or(f64::INFINITY, |p| p.distance(&dst))
}

/// Reject arrangements that admit no unique homography on either side.
fn check_configuration(set: &PointCorrespondenceSet) -> Result<(), HomographyError> {
    for (side, points) in [("source", set.source()), ("destination", set.destination())] {
        let pts: Vec<Vector2<f64>> = points.iter().map(|p| Vector2::new(p.x, p.y)).collect();

        let distinct = distinct_count(&pts, DISTINCT_TOLERANCE);
        if distinct < MIN_CORRESPONDENCES {
            return Err(HomographyError::DegenerateConfiguration(format!(
                "{side} has only {distinct} distinct points"
            )));
        }
        if all_collinear(&pts) {
            return Err(HomographyError::DegenerateConfiguration(format!(
                "all {side} points are collinear"
            )));
        }
    }
    Ok(())
}

fn estimate_ransac(
    data: &DataMatrix,
    settings: RansacSettings,
) -> Result<EstimationResult, HomographyError> {
    let scoring = RansacInlierCountScoring::new(settings.inlier_threshold, transfer_error);
    let local_optimizer = match settings.local_optimization {
        LocalOptimizationType::Lsq => Some(
            LeastSquaresOptimizer::new(HomographyEstimator::new())
                .with_max_iterations(settings.local_optimization_settings.max_iterations),
        ),
        LocalOptimizationType::None => None,
    };
    let final_optimizer = match settings.final_optimization {
        LocalOptimizationType::Lsq => Some(
            LeastSquaresOptimizer::new(HomographyEstimator::new())
                .with_max_iterations(settings.final_optimization_settings.max_iterations),
        ),
        LocalOptimizationType::None => None,
    };
    let termination = RansacTerminationCriterion {
        confidence: settings.confidence,
    };
    let sampler = UniformRandomSampler::with_optional_seed(settings.seed);

    let mut ransac = RansacPipeline::new(
        settings,
        HomographyEstimator::new(),
        sampler,
        scoring,
        local_optimizer,
        final_optimizer,
        termination,
    );

    ransac.run(data);

    match (ransac.best_model, ransac.best_score) {
        (Some(model), Some(score)) => Ok(EstimationResult {
            model,
            inliers: ransac.best_inliers,
            reprojection_error: score.mean_residual(),
            score,
            iterations: ransac.iteration,
        }),
        _ if ransac.hypothesis_iterations == 0 => Err(HomographyError::DegenerateConfiguration(
            "no non-degenerate 4-point sample found".to_string(),
        )),
        _ => Err(HomographyError::NumericFailure(
            "no valid homography among sampled hypotheses".to_string(),
        )),
    }
}

fn estimate_least_squares(
    data: &DataMatrix,
    settings: &RansacSettings,
) -> Result<EstimationResult, HomographyError> {
    let estimator = HomographyEstimator::new();
    let all: Vec<usize> = (0..data.nrows()).collect();

    let model = estimator
        .estimate_model_nonminimal(data, &all)
        .into_iter()
        .find(|m| estimator.is_valid_model(m, data, &all, settings.inlier_threshold))
        .ok_or_else(|| {
            HomographyError::NumericFailure("least-squares fit is singular".to_string())
        })?;

    let scoring = RansacInlierCountScoring::new(settings.inlier_threshold, transfer_error);
    let mut inliers = Vec::new();
    let score = scoring.score(data, &model, &mut inliers);

    Ok(EstimationResult {
        model,
        inliers,
        reprojection_error: score.mean_residual(),
        score,
        iterations: 0,
    })
}
