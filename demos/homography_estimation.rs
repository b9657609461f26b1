//! Example: Homography estimation from point correspondences
//!
//! Calibrates a camera view against a tennis half court, then estimates a
//! homography with RANSAC from noisy synthetic correspondences.
//!
//! Run with `RUST_LOG=debug` to see pipeline diagnostics.

use homography_bridge::*;
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Court Calibration ===\n");

    let calibration = CourtCalibration::new(&CourtLayout::REFERENCE_IMAGE_POINTS)?;
    print_matrix(calibration.homography());

    for screen in [Point2D::new(190.0, 300.0), Point2D::new(100.0, 460.0)] {
        match calibration.to_court(screen) {
            Some(court) => println!(
                "  screen ({:6.1}, {:6.1}) -> court ({:5.2} m, {:5.2} m){}",
                screen.x,
                screen.y,
                court.x,
                court.y,
                if CourtLayout::contains(court) { "" } else { "  [out]" }
            ),
            None => println!("  screen {screen:?} projects to infinity"),
        }
    }

    println!("\n=== Homography Estimation ===\n");

    let n_points = 30;
    let n_outliers = 10;
    let n_total = n_points + n_outliers;

    let truth = HomographyMatrix::from_coefficients([
        0.98, -0.1, 10.0, 0.1, 0.98, 5.0, 1e-4, -5e-5, 1.0,
    ]);

    let mut rng = rand::thread_rng();
    let mut source = Vec::with_capacity(n_total);
    let mut destination = Vec::with_capacity(n_total);

    for _ in 0..n_points {
        let p = Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
        let q = truth.apply(p).ok_or("truth maps a sample to infinity")?;
        source.push(p);
        destination.push(Point2D::new(
            q.x + rng.gen_range(-0.5..0.5),
            q.y + rng.gen_range(-0.5..0.5),
        ));
    }
    for _ in 0..n_outliers {
        source.push(Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)));
        destination.push(Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)));
    }

    println!("Generated {n_points} inliers and {n_outliers} outliers");

    let settings = RansacSettings::default().with_threshold(2.0);
    let result = estimate_homography(&source, &destination, Some(settings))?;

    println!("Estimation results:");
    println!("  Found {} inliers out of {}", result.inliers.len(), n_total);
    println!(
        "  Inlier ratio: {:.2}%",
        100.0 * result.inliers.len() as f64 / n_total as f64
    );
    println!("  Iterations: {}", result.iterations);
    println!("  Mean inlier error: {:.4} px", result.reprojection_error);

    println!("\nEstimated homography matrix:");
    print_matrix(&result.model);

    let correct = result.inliers.iter().filter(|&&i| i < n_points).count();
    println!(
        "\n  {correct} of {} inliers are true inliers",
        result.inliers.len()
    );

    Ok(())
}

fn print_matrix(h: &HomographyMatrix) {
    for row in h.coefficients().chunks_exact(3) {
        println!("  [{:10.5}, {:10.5}, {:10.5}]", row[0], row[1], row[2]);
    }
}
