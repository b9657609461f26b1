//! # Homography Bridge - Planar Homographies from Point Correspondences
//!
//! `homography_bridge` computes the 3x3 projective transform mapping one set
//! of 2D points onto another, for calibrating a camera view against a flat
//! reference plane such as a sports court.
//!
//! ## Quick Start
//!
//! The easiest way to use `homography_bridge` is through
//! [`compute_homography`], which returns `None` on any failure:
//!
//! ```rust
//! use homography_bridge::{compute_homography, project_point, Point2D};
//!
//! let image = [
//!     Point2D::new(120.0, 450.0),
//!     Point2D::new(260.0, 450.0),
//!     Point2D::new(140.0, 150.0),
//!     Point2D::new(240.0, 150.0),
//! ];
//! let court = [
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(8.23, 0.0),
//!     Point2D::new(0.0, 5.49),
//!     Point2D::new(8.23, 5.49),
//! ];
//!
//! let h = compute_homography(&image, &court).unwrap();
//! let corner = project_point(image[3], &h).unwrap();
//! assert!((corner.x - 8.23).abs() < 1e-6);
//! assert!((corner.y - 5.49).abs() < 1e-6);
//!
//! // Three points cannot determine a homography.
//! assert!(compute_homography(&image[..3], &court[..3]).is_none());
//! ```
//!
//! [`estimate_homography`] runs the same computation but returns a
//! [`HomographyError`] explaining failures, along with the inlier set and
//! RANSAC diagnostics:
//!
//! ```rust
//! use homography_bridge::{estimate_homography, HomographyError, Point2D, RansacSettings};
//!
//! let line: Vec<Point2D> = (0..6).map(|i| Point2D::new(i as f64, i as f64)).collect();
//! let err = estimate_homography(&line, &line, Some(RansacSettings::default())).unwrap_err();
//! assert!(matches!(err, HomographyError::DegenerateConfiguration(_)));
//! ```
//!
//! ## Extending the Pipeline
//!
//! Estimation runs through a generic RANSAC pipeline built from the traits in
//! [`core`]:
//!
//! - **[`Estimator`](core::Estimator)**: model hypotheses from samples
//! - **[`Sampler`](core::Sampler)**: minimal sample selection
//! - **[`Scoring<M>`](core::Scoring)**: model ranking and inlier selection
//! - **[`LocalOptimizer<M, S>`](core::LocalOptimizer)**: hypothesis refinement
//! - **[`TerminationCriterion<S>`](core::TerminationCriterion)**: adaptive stopping
//!
//! ## Modules
//!
//! - **[`api`](api)**: High-level bridge functions
//! - **[`core`](core)**: Core traits and the `RansacPipeline`
//! - **[`court`](court)**: Tennis court layout and screen-to-court calibration
//! - **[`estimators`](estimators)**: The normalized-DLT homography estimator
//! - **[`ffi`](ffi)**: C ABI entry points
//! - **[`samplers`](samplers)**: Minimal sample selection
//! - **[`scoring`](scoring)**: Inlier-count scoring
//! - **[`models`](models)**: The homography matrix type
//! - **[`settings`](settings)**: RANSAC configuration and JSON loading

pub mod api;
pub mod core;
pub mod court;
pub mod error;
pub mod estimators;
pub mod ffi;
pub mod models;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

// Re-export high-level API
pub use api::{
    EstimationResult, compute_homography, compute_homography_coefficients, estimate_homography,
    project_point, project_points, reprojection_error,
};

// Re-export core traits for easy access
pub use core::{Estimator, LocalOptimizer, Sampler, Scoring, TerminationCriterion};

pub use court::{CourtCalibration, CourtLayout, CourtSide, overlay_trapezoid};
pub use error::HomographyError;
pub use models::HomographyMatrix;
pub use settings::{EstimationMethod, RansacSettings, load_settings, settings_from_json};
pub use types::Point2D;
