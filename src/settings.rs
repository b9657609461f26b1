//! Configuration types for the estimation pipeline.
//!
//! Every struct has a `Default` carrying the documented defaults and
//! deserializes with `#[serde(default)]`, so a settings file only needs the
//! fields it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HomographyError;

/// How the homography is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// Robust RANSAC over minimal 4-point samples.
    Ransac,
    /// One least-squares DLT fit over all correspondences.
    LeastSquares,
}

/// Local optimization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOptimizationType {
    None,
    Lsq,
}

/// Settings controlling local optimization procedures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalOptimizationSettings {
    /// Maximum refit/rescore rounds.
    pub max_iterations: usize,
}

impl Default for LocalOptimizationSettings {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

/// Main configuration object for homography estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacSettings {
    pub method: EstimationMethod,
    /// Minimum number of iterations.
    pub min_iterations: usize,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Inlier threshold on the transfer error, in destination units.
    pub inlier_threshold: f64,
    /// Desired confidence level in (0, 1).
    pub confidence: f64,

    pub local_optimization: LocalOptimizationType,
    pub final_optimization: LocalOptimizationType,
    pub local_optimization_settings: LocalOptimizationSettings,
    pub final_optimization_settings: LocalOptimizationSettings,

    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            method: EstimationMethod::Ransac,
            min_iterations: 10,
            max_iterations: 2000,
            inlier_threshold: 3.0,
            confidence: 0.995,
            local_optimization: LocalOptimizationType::Lsq,
            final_optimization: LocalOptimizationType::Lsq,
            local_optimization_settings: LocalOptimizationSettings::default(),
            final_optimization_settings: LocalOptimizationSettings { max_iterations: 20 },
            seed: None,
        }
    }
}

impl RansacSettings {
    pub fn with_method(mut self, method: EstimationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_threshold(mut self, inlier_threshold: f64) -> Self {
        self.inlier_threshold = inlier_threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), HomographyError> {
        if !(self.inlier_threshold.is_finite() && self.inlier_threshold > 0.0) {
            return Err(HomographyError::InvalidSettings(format!(
                "inlier_threshold must be positive and finite, got {}",
                self.inlier_threshold
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(HomographyError::InvalidSettings(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.max_iterations == 0 {
            return Err(HomographyError::InvalidSettings(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.min_iterations > self.max_iterations {
            return Err(HomographyError::InvalidSettings(format!(
                "min_iterations ({}) exceeds max_iterations ({})",
                self.min_iterations, self.max_iterations
            )));
        }
        Ok(())
    }
}

/// Parse settings from a JSON document; missing fields take defaults.
pub fn settings_from_json(json: &str) -> Result<RansacSettings, HomographyError> {
    let settings: RansacSettings = serde_json::from_str(json)
        .map_err(|e| HomographyError::Config(format!("failed to parse settings: {e}")))?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<RansacSettings, HomographyError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        HomographyError::Config(format!("failed to read settings {}: {e}", path.display()))
    })?;
    settings_from_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let cfg = RansacSettings::default();
        assert_eq!(cfg.method, EstimationMethod::Ransac);
        assert_eq!(cfg.min_iterations, 10);
        assert_eq!(cfg.max_iterations, 2000);
        assert!((cfg.inlier_threshold - 3.0).abs() < 1e-12);
        assert!((cfg.confidence - 0.995).abs() < 1e-12);
        assert_eq!(cfg.local_optimization, LocalOptimizationType::Lsq);
        assert_eq!(cfg.final_optimization, LocalOptimizationType::Lsq);
        assert_eq!(cfg.seed, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = settings_from_json(
            r#"{ "method": "least_squares", "inlier_threshold": 0.5,
                 "final_optimization_settings": { "max_iterations": 3 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.method, EstimationMethod::LeastSquares);
        assert!((cfg.inlier_threshold - 0.5).abs() < 1e-12);
        assert_eq!(cfg.final_optimization_settings.max_iterations, 3);
        assert_eq!(cfg.max_iterations, 2000);
        assert_eq!(cfg.local_optimization_settings.max_iterations, 10);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = settings_from_json("{ not json").unwrap_err();
        assert!(matches!(err, HomographyError::Config(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad_threshold = RansacSettings::default().with_threshold(0.0);
        assert!(matches!(
            bad_threshold.validate(),
            Err(HomographyError::InvalidSettings(_))
        ));

        let bad_confidence = RansacSettings {
            confidence: 1.0,
            ..RansacSettings::default()
        };
        assert!(bad_confidence.validate().is_err());

        let bad_iterations = RansacSettings {
            min_iterations: 10,
            max_iterations: 5,
            ..RansacSettings::default()
        };
        assert!(bad_iterations.validate().is_err());

        let err = settings_from_json(r#"{ "confidence": 2.0 }"#).unwrap_err();
        assert!(matches!(err, HomographyError::InvalidSettings(_)));
    }

    #[test]
    fn load_settings_reports_missing_file() {
        let err = load_settings(Path::new("/nonexistent/homography.json")).unwrap_err();
        assert!(matches!(err, HomographyError::Config(_)));
    }
}
