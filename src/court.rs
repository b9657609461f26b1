//! Mapping camera frames onto a tennis half court.
//!
//! Court coordinates are metres with the origin at the near-left service
//! line corner, `x` across the court and `y` towards the far baseline.

use log::debug;

use crate::api::{estimate_homography, project_point};
use crate::error::HomographyError;
use crate::models::HomographyMatrix;
use crate::settings::RansacSettings;
use crate::types::Point2D;

/// Coarse lateral position on the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourtSide {
    Left,
    Center,
    Right,
}

/// Fixed dimensions and reference correspondences of the half court.
pub struct CourtLayout;

impl CourtLayout {
    /// Singles court width in metres.
    pub const WIDTH: f64 = 8.23;
    /// Service line to baseline in metres.
    pub const DEPTH: f64 = 5.49;

    /// Screen pixels of the court corners for the default camera framing:
    /// near-left, near-right, far-left, far-right.
    pub const REFERENCE_IMAGE_POINTS: [Point2D; 4] = [
        Point2D { x: 120.0, y: 450.0 },
        Point2D { x: 260.0, y: 450.0 },
        Point2D { x: 140.0, y: 150.0 },
        Point2D { x: 240.0, y: 150.0 },
    ];

    /// Court corners in the same order as [`Self::REFERENCE_IMAGE_POINTS`].
    pub const REFERENCE_COURT_POINTS: [Point2D; 4] = [
        Point2D { x: 0.0, y: 0.0 },
        Point2D { x: Self::WIDTH, y: 0.0 },
        Point2D { x: 0.0, y: Self::DEPTH },
        Point2D { x: Self::WIDTH, y: Self::DEPTH },
    ];

    /// Zone grid columns across the court.
    pub const ZONE_COLUMNS: usize = 4;
    /// Zone grid rows from the service line to the baseline.
    pub const ZONE_ROWS: usize = 4;

    /// `x` below this is [`CourtSide::Left`].
    pub const LEFT_LANE_EDGE: f64 = 2.0;
    /// `x` above this is [`CourtSide::Right`].
    pub const RIGHT_LANE_EDGE: f64 = 6.0;

    /// Whether `point` lies on the half court, edges included.
    pub fn contains(point: Point2D) -> bool {
        point.is_finite()
            && (0.0..=Self::WIDTH).contains(&point.x)
            && (0.0..=Self::DEPTH).contains(&point.y)
    }

    /// Row-major index into the 4×4 zone grid, row 0 along the service line.
    ///
    /// Points on the far edges belong to the last column or row; points off
    /// the court have no zone.
    pub fn zone_id(point: Point2D) -> Option<usize> {
        if !Self::contains(point) {
            return None;
        }
        let zone_width = Self::WIDTH / Self::ZONE_COLUMNS as f64;
        let zone_depth = Self::DEPTH / Self::ZONE_ROWS as f64;
        let col = ((point.x / zone_width).floor() as usize).min(Self::ZONE_COLUMNS - 1);
        let row = ((point.y / zone_depth).floor() as usize).min(Self::ZONE_ROWS - 1);
        Some(row * Self::ZONE_COLUMNS + col)
    }

    /// Left, centre or right lane of an on-court point.
    pub fn side(point: Point2D) -> Option<CourtSide> {
        if !Self::contains(point) {
            return None;
        }
        Some(if point.x < Self::LEFT_LANE_EDGE {
            CourtSide::Left
        } else if point.x > Self::RIGHT_LANE_EDGE {
            CourtSide::Right
        } else {
            CourtSide::Center
        })
    }
}

/// Alignment guide drawn over the camera preview.
///
/// Corners come back as near-left, near-right, far-right, far-left, which is
/// drawing order rather than [`CourtLayout`] order.
pub fn overlay_trapezoid(screen_width: f64, screen_height: f64) -> [Point2D; 4] {
    let top_y = screen_height * 0.55;
    let bottom_y = screen_height * 0.85;
    let top_inset = screen_width * 0.25;
    let bottom_inset = screen_width * 0.15;

    [
        Point2D::new(bottom_inset, bottom_y),
        Point2D::new(screen_width - bottom_inset, bottom_y),
        Point2D::new(screen_width - top_inset, top_y),
        Point2D::new(top_inset, top_y),
    ]
}

/// Screen-to-court homography.
#[derive(Debug, Clone, PartialEq)]
pub struct CourtCalibration {
    screen_to_court: HomographyMatrix,
    inliers: Vec<usize>,
    reprojection_error: f64,
}

impl CourtCalibration {
    /// Largest court-space error, in metres, for a correspondence to count
    /// as an inlier.
    pub const INLIER_THRESHOLD: f64 = 0.1;

    /// Calibrate from the four court corners as seen on screen, ordered like
    /// [`CourtLayout::REFERENCE_COURT_POINTS`].
    pub fn new(image_points: &[Point2D]) -> Result<Self, HomographyError> {
        let court = CourtLayout::REFERENCE_COURT_POINTS;
        if image_points.len() != court.len() {
            return Err(HomographyError::MismatchedLengths(
                image_points.len(),
                court.len(),
            ));
        }
        Self::with_court_points(image_points, &court)
    }

    /// Calibrate from the default camera framing.
    pub fn reference() -> Result<Self, HomographyError> {
        Self::new(&CourtLayout::REFERENCE_IMAGE_POINTS)
    }

    /// Calibrate from the overlay guide, assuming the user lined the court up
    /// with it.
    pub fn from_overlay(screen_width: f64, screen_height: f64) -> Result<Self, HomographyError> {
        let [near_left, near_right, far_right, far_left] =
            overlay_trapezoid(screen_width, screen_height);
        Self::new(&[near_left, near_right, far_left, far_right])
    }

    /// Calibrate from any number (≥ 4) of screen/court correspondences,
    /// rejecting those off by more than [`Self::INLIER_THRESHOLD`].
    pub fn with_court_points(
        image_points: &[Point2D],
        court_points: &[Point2D],
    ) -> Result<Self, HomographyError> {
        let settings = RansacSettings::default().with_threshold(Self::INLIER_THRESHOLD);
        Self::with_settings(image_points, court_points, settings)
    }

    /// Calibrate with explicit settings; the threshold is in metres.
    pub fn with_settings(
        image_points: &[Point2D],
        court_points: &[Point2D],
        settings: RansacSettings,
    ) -> Result<Self, HomographyError> {
        let result = estimate_homography(image_points, court_points, Some(settings))?;
        debug!(
            "court calibration: {} of {} points, mean error {:.4} m",
            result.inliers.len(),
            image_points.len(),
            result.reprojection_error
        );
        Ok(Self {
            screen_to_court: result.model,
            inliers: result.inliers,
            reprojection_error: result.reprojection_error,
        })
    }

    pub fn homography(&self) -> &HomographyMatrix {
        &self.screen_to_court
    }

    /// Indices of the correspondences the calibration agrees with.
    pub fn inliers(&self) -> &[usize] {
        &self.inliers
    }

    /// Mean court-space error of the inliers, in metres.
    pub fn reprojection_error(&self) -> f64 {
        self.reprojection_error
    }

    /// Court position of a screen point.
    pub fn to_court(&self, screen_point: Point2D) -> Option<Point2D> {
        project_point(screen_point, &self.screen_to_court)
    }

    /// Screen position of a court point.
    pub fn to_screen(&self, court_point: Point2D) -> Option<Point2D> {
        project_point(court_point, &self.screen_to_court.inverse()?)
    }

    /// Zone of the court under a screen point.
    pub fn zone_at(&self, screen_point: Point2D) -> Option<usize> {
        CourtLayout::zone_id(self.to_court(screen_point)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2D, b: Point2D) {
        assert!(a.distance(&b) < 1e-6, "{a:?} != {b:?}");
    }

    #[test]
    fn reference_corners_map_to_court_corners() {
        let calibration = CourtCalibration::reference().unwrap();
        for (image, court) in CourtLayout::REFERENCE_IMAGE_POINTS
            .iter()
            .zip(CourtLayout::REFERENCE_COURT_POINTS.iter())
        {
            assert_close(calibration.to_court(*image).unwrap(), *court);
            assert_close(calibration.to_screen(*court).unwrap(), *image);
        }
    }

    #[test]
    fn screen_centre_of_reference_lands_inside_court() {
        let calibration = CourtCalibration::reference().unwrap();
        let p = calibration.to_court(Point2D::new(190.0, 300.0)).unwrap();
        assert!(CourtLayout::contains(p));
        assert!((p.x - CourtLayout::WIDTH / 2.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let three = &CourtLayout::REFERENCE_IMAGE_POINTS[..3];
        assert_eq!(
            CourtCalibration::new(three),
            Err(HomographyError::MismatchedLengths(3, 4))
        );
    }

    #[test]
    fn overlay_trapezoid_geometry() {
        let t = overlay_trapezoid(400.0, 800.0);
        assert_eq!(t[0], Point2D::new(60.0, 680.0));
        assert_eq!(t[1], Point2D::new(340.0, 680.0));
        assert_eq!(t[2], Point2D::new(300.0, 440.0));
        assert_eq!(t[3], Point2D::new(100.0, 440.0));
    }

    #[test]
    fn overlay_calibration_maps_guide_to_court() {
        let calibration = CourtCalibration::from_overlay(400.0, 800.0).unwrap();
        let t = overlay_trapezoid(400.0, 800.0);
        assert_close(calibration.to_court(t[0]).unwrap(), Point2D::new(0.0, 0.0));
        assert_close(
            calibration.to_court(t[2]).unwrap(),
            Point2D::new(CourtLayout::WIDTH, CourtLayout::DEPTH),
        );
    }

    #[test]
    fn mislabelled_court_point_is_not_an_inlier() {
        let reference = CourtCalibration::reference().unwrap();
        let screen = vec![
            Point2D::new(120.0, 450.0),
            Point2D::new(260.0, 450.0),
            Point2D::new(140.0, 150.0),
            Point2D::new(240.0, 150.0),
            Point2D::new(190.0, 450.0),
            Point2D::new(190.0, 150.0),
            Point2D::new(130.0, 300.0),
            Point2D::new(250.0, 300.0),
        ];
        let mut court: Vec<Point2D> = screen
            .iter()
            .map(|&p| reference.to_court(p).unwrap())
            .collect();
        court[5].y += 2.0;

        let calibration = CourtCalibration::with_court_points(&screen, &court).unwrap();
        assert_eq!(calibration.inliers(), &[0, 1, 2, 3, 4, 6, 7]);
        assert!(calibration.reprojection_error() < 1e-6);
        assert_close(
            calibration.to_court(screen[5]).unwrap(),
            Point2D::new(CourtLayout::WIDTH / 2.0, CourtLayout::DEPTH),
        );
    }

    #[test]
    fn zone_ids_cover_the_grid_row_major() {
        let w = CourtLayout::WIDTH / 4.0;
        let d = CourtLayout::DEPTH / 4.0;
        assert_eq!(CourtLayout::zone_id(Point2D::new(0.0, 0.0)), Some(0));
        assert_eq!(CourtLayout::zone_id(Point2D::new(w * 0.5, d * 0.5)), Some(0));
        assert_eq!(CourtLayout::zone_id(Point2D::new(w * 3.5, d * 0.5)), Some(3));
        assert_eq!(CourtLayout::zone_id(Point2D::new(w * 1.5, d * 1.5)), Some(5));
        assert_eq!(CourtLayout::zone_id(Point2D::new(w * 0.5, d * 3.5)), Some(12));
        // Interior boundaries belong to the next zone.
        assert_eq!(CourtLayout::zone_id(Point2D::new(w, 0.0)), Some(1));
        // Far edges stay on court.
        assert_eq!(
            CourtLayout::zone_id(Point2D::new(CourtLayout::WIDTH, CourtLayout::DEPTH)),
            Some(15)
        );
    }

    #[test]
    fn off_court_points_have_no_zone_or_side() {
        for p in [
            Point2D::new(-0.01, 1.0),
            Point2D::new(1.0, -0.01),
            Point2D::new(8.24, 1.0),
            Point2D::new(4.0, 5.5),
            Point2D::new(f64::NAN, 1.0),
        ] {
            assert_eq!(CourtLayout::zone_id(p), None, "{p:?}");
            assert_eq!(CourtLayout::side(p), None, "{p:?}");
        }
    }

    #[test]
    fn sides_split_at_lane_edges() {
        assert_eq!(CourtLayout::side(Point2D::new(1.99, 1.0)), Some(CourtSide::Left));
        assert_eq!(CourtLayout::side(Point2D::new(2.0, 1.0)), Some(CourtSide::Center));
        assert_eq!(CourtLayout::side(Point2D::new(6.0, 1.0)), Some(CourtSide::Center));
        assert_eq!(CourtLayout::side(Point2D::new(6.01, 1.0)), Some(CourtSide::Right));
    }

    #[test]
    fn screen_points_map_to_zones() {
        let calibration = CourtCalibration::reference().unwrap();
        assert_eq!(calibration.zone_at(Point2D::new(121.0, 449.0)), Some(0));
        assert_eq!(calibration.zone_at(Point2D::new(239.0, 151.0)), Some(15));
        assert_eq!(calibration.zone_at(Point2D::new(190.0, 120.0)), None);
    }

    #[test]
    fn contains_checks_bounds() {
        assert!(CourtLayout::contains(Point2D::new(0.0, 0.0)));
        assert!(CourtLayout::contains(Point2D::new(8.23, 5.49)));
        assert!(!CourtLayout::contains(Point2D::new(-0.1, 1.0)));
        assert!(!CourtLayout::contains(Point2D::new(4.0, 6.0)));
        assert!(!CourtLayout::contains(Point2D::new(f64::NAN, 1.0)));
    }
}
