//! Integration tests for the high-level Rust API.
//!
//! These tests verify that the estimation functions recover known transforms
//! from synthetic correspondences and fail cleanly on bad input.

use homography_bridge::*;
use nalgebra::Matrix3;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn grid(cols: usize, rows: usize, spacing: f64) -> Vec<Point2D> {
    let mut pts = Vec::with_capacity(cols * rows);
    for r in 0..rows {
        for c in 0..cols {
            // Slight bend so rows and columns are not straight lines.
            let x = c as f64 * spacing + (r * r) as f64 * 0.37;
            let y = r as f64 * spacing + (c * c) as f64 * 0.11;
            pts.push(Point2D::new(x + 20.0, y + 30.0));
        }
    }
    pts
}

fn map_all(h: &HomographyMatrix, pts: &[Point2D]) -> Vec<Point2D> {
    project_points(pts, h).expect("test transform keeps points finite")
}

fn assert_reproduces(h: &HomographyMatrix, src: &[Point2D], dst: &[Point2D]) {
    for (s, d) in src.iter().zip(dst) {
        let p = h.apply(*s).expect("finite projection");
        assert!(
            p.distance(d) < 1e-6,
            "{s:?} mapped to {p:?}, expected {d:?}"
        );
    }
}

#[test]
fn test_identity_for_equal_point_sets() {
    init_logger();
    let pts = grid(2, 2, 50.0);
    let h = compute_homography(&pts, &pts).expect("identity should succeed");

    let expected = HomographyMatrix::identity().coefficients();
    for (a, b) in h.coefficients().iter().zip(expected.iter()) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }
}

#[test]
fn test_translation_rotation_and_scale_are_recovered() {
    init_logger();
    let src = grid(4, 3, 40.0);

    let (s, c) = (30f64.to_radians().sin(), 30f64.to_radians().cos());
    let transforms = [
        Matrix3::new(1.0, 0.0, 12.5, 0.0, 1.0, -7.0, 0.0, 0.0, 1.0),
        Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        Matrix3::new(2.5, 0.0, 0.0, 0.0, 2.5, 0.0, 0.0, 0.0, 1.0),
        Matrix3::new(1.5 * c, -1.5 * s, 40.0, 1.5 * s, 1.5 * c, -15.0, 0.0, 0.0, 1.0),
    ];

    for truth in transforms {
        let truth = HomographyMatrix::new(truth);
        let dst = map_all(&truth, &src);
        let h = compute_homography(&src, &dst).expect("similarity should succeed");
        assert_reproduces(&h, &src, &dst);
    }
}

#[test]
fn test_large_translations_are_recovered() {
    init_logger();
    let src = grid(3, 2, 100.0);

    for (tx, ty) in [(2500.0, 0.0), (-2.0e4, 1.5e4), (1.0e6, -3.0e5)] {
        let dst: Vec<Point2D> = src.iter().map(|p| Point2D::new(p.x + tx, p.y + ty)).collect();
        let settings = RansacSettings::default().with_seed(7);
        let result = estimate_homography(&src, &dst, Some(settings)).expect("translation");
        assert_eq!(result.inliers.len(), src.len());

        let c = result.model.coefficients();
        assert!((c[2] - tx).abs() < 1e-6 * (1.0 + tx.abs()), "{c:?}");
        assert!((c[5] - ty).abs() < 1e-6 * (1.0 + ty.abs()), "{c:?}");

        let lsq = RansacSettings::default().with_method(EstimationMethod::LeastSquares);
        assert!(estimate_homography(&src, &dst, Some(lsq)).is_ok());
    }

    // Crop offset inside a 4K frame.
    let quad = vec![
        Point2D::new(3000.0, 2000.0),
        Point2D::new(3400.0, 2010.0),
        Point2D::new(3390.0, 2300.0),
        Point2D::new(3005.0, 2290.0),
    ];
    let shifted: Vec<Point2D> = quad
        .iter()
        .map(|p| Point2D::new(p.x - 2800.0, p.y - 1800.0))
        .collect();
    let h = compute_homography(&quad, &shifted).expect("crop offset");
    for (s, d) in quad.iter().zip(&shifted) {
        assert!(h.apply(*s).unwrap().distance(d) < 1e-6);
    }
}

#[test]
fn test_small_scales_are_recovered() {
    init_logger();
    let src = grid(4, 3, 250.0);

    // Pixels to kilometres and below.
    for scale in [1e-3, 1e-6, 1e-9] {
        let dst: Vec<Point2D> = src
            .iter()
            .map(|p| Point2D::new(p.x * scale, p.y * scale + 2.0 * scale))
            .collect();
        let settings = RansacSettings::default().with_threshold(scale).with_seed(11);
        let result = estimate_homography(&src, &dst, Some(settings)).expect("small scale");
        assert_eq!(result.inliers.len(), src.len());

        let c = result.model.coefficients();
        assert!((c[0] / scale - 1.0).abs() < 1e-6, "{c:?}");
        assert!((c[4] / scale - 1.0).abs() < 1e-6, "{c:?}");
    }
}

#[test]
fn test_perspective_map_from_four_and_many_points() {
    init_logger();
    let truth = HomographyMatrix::from_coefficients([
        0.9, 0.15, 25.0, -0.05, 1.1, 10.0, 4e-4, -2e-4, 1.0,
    ]);

    let four = vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(300.0, 10.0),
        Point2D::new(290.0, 200.0),
        Point2D::new(5.0, 220.0),
    ];
    let dst = map_all(&truth, &four);
    let h = compute_homography(&four, &dst).expect("minimal perspective should succeed");
    assert_reproduces(&h, &four, &dst);

    let many = grid(5, 4, 60.0);
    let dst = map_all(&truth, &many);
    let h = compute_homography(&many, &dst).expect("overdetermined perspective should succeed");
    assert_reproduces(&h, &many, &dst);

    for (a, b) in h.coefficients().iter().zip(truth.coefficients().iter()) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }
}

#[test]
fn test_round_trip_residual_is_zero_for_exact_data() {
    init_logger();
    let src = grid(3, 3, 25.0);
    let truth =
        HomographyMatrix::from_coefficients([1.2, 0.1, 5.0, 0.0, 0.9, -3.0, 1e-3, 0.0, 1.0]);
    let dst = map_all(&truth, &src);

    let result = estimate_homography(&src, &dst, None).expect("estimation should succeed");
    assert_eq!(result.inliers.len(), src.len());
    assert!(result.reprojection_error < 1e-8);

    let err = reprojection_error(&result.model, &src, &dst).unwrap();
    assert!(err < 1e-8);
}

#[test]
fn test_insufficient_points() {
    init_logger();
    let src = grid(3, 1, 10.0);
    assert!(compute_homography(&src, &src).is_none());
    assert!(compute_homography(&[], &[]).is_none());

    let err = estimate_homography(&src, &src, None).unwrap_err();
    assert_eq!(
        err,
        HomographyError::InsufficientPoints {
            required: 4,
            actual: 3
        }
    );
}

#[test]
fn test_mismatched_lengths_are_never_truncated() {
    init_logger();
    let src = grid(5, 1, 10.0);
    let dst = grid(2, 2, 10.0);

    for _ in 0..3 {
        let err = estimate_homography(&src, &dst, None).unwrap_err();
        assert_eq!(err, HomographyError::MismatchedLengths(5, 4));
    }
    assert!(compute_homography(&src, &dst).is_none());
}

#[test]
fn test_collinear_points_fail() {
    init_logger();
    let line: Vec<Point2D> = (0..8).map(|i| Point2D::new(i as f64 * 3.0, 7.0)).collect();
    let plane = grid(4, 2, 10.0);

    assert!(compute_homography(&line, &plane).is_none());
    assert!(compute_homography(&plane, &line).is_none());
    assert!(matches!(
        estimate_homography(&line, &plane, None),
        Err(HomographyError::DegenerateConfiguration(_))
    ));
}

#[test]
fn test_non_finite_coordinates_fail() {
    init_logger();
    let src = grid(2, 2, 10.0);
    let mut dst = src.clone();
    dst[2].y = f64::NAN;

    assert!(compute_homography(&src, &dst).is_none());
    assert_eq!(
        estimate_homography(&src, &dst, None).unwrap_err(),
        HomographyError::NonFiniteCoordinate { index: 2 }
    );
}

#[test]
fn test_estimate_homography_with_outliers() {
    init_logger();
    let truth = HomographyMatrix::from_coefficients([
        1.05, -0.08, 14.0, 0.06, 0.97, -9.0, 2e-4, 1e-4, 1.0,
    ]);
    let src = grid(8, 5, 30.0);
    let mut dst = map_all(&truth, &src);

    // Every fourth correspondence is a gross outlier.
    let outliers: Vec<usize> = (0..src.len()).filter(|i| i % 4 == 1).collect();
    for (k, &i) in outliers.iter().enumerate() {
        dst[i].x += 60.0 + 7.0 * k as f64;
        dst[i].y -= 45.0 + 3.0 * k as f64;
    }

    let settings = RansacSettings::default().with_threshold(2.0).with_seed(2024);
    let result = estimate_homography(&src, &dst, Some(settings)).expect("RANSAC should succeed");

    for i in 0..src.len() {
        let is_outlier = outliers.contains(&i);
        assert_eq!(
            result.inliers.contains(&i),
            !is_outlier,
            "correspondence {i} misclassified"
        );
        if !is_outlier {
            let p = result.model.apply(src[i]).unwrap();
            assert!(p.distance(&dst[i]) < 1e-6);
        }
    }
    assert!(result.iterations >= 10);
}

#[test]
fn test_least_squares_method_and_json_settings() {
    init_logger();
    let settings = settings_from_json(r#"{ "method": "least_squares", "inlier_threshold": 0.5 }"#)
        .expect("valid settings JSON");
    assert_eq!(settings.method, EstimationMethod::LeastSquares);

    let src = grid(3, 2, 20.0);
    let dst: Vec<Point2D> = src.iter().map(|p| Point2D::new(p.x * 0.5, p.y * 0.5 + 1.0)).collect();
    let result = estimate_homography(&src, &dst, Some(settings)).unwrap();
    assert_eq!(result.iterations, 0);
    assert_reproduces(&result.model, &src, &dst);

    assert!(matches!(
        settings_from_json("{ not json"),
        Err(HomographyError::Config(_))
    ));
}

#[test]
fn test_court_calibration_from_reference_points() {
    init_logger();
    let calibration = CourtCalibration::new(&CourtLayout::REFERENCE_IMAGE_POINTS).unwrap();
    for (image, court) in CourtLayout::REFERENCE_IMAGE_POINTS
        .iter()
        .zip(CourtLayout::REFERENCE_COURT_POINTS.iter())
    {
        let p = calibration.to_court(*image).unwrap();
        assert!(p.distance(court) < 1e-6);
    }

    // A point beyond the far baseline projects off court.
    let beyond = calibration.to_court(Point2D::new(190.0, 120.0)).unwrap();
    assert!(!CourtLayout::contains(beyond));
}
