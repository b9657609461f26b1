//! C ABI entry points.
//!
//! Points cross the boundary as interleaved `x, y` `f64` buffers and matrices
//! as 9 row-major coefficients. Every function reports failure by returning
//! `false` and never unwinds into the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::error;

use crate::api::{compute_homography, project_point};
use crate::models::HomographyMatrix;
use crate::types::{Point2D, MIN_CORRESPONDENCES};

fn read_points(buffer: &[f64]) -> Vec<Point2D> {
    buffer
        .chunks_exact(2)
        .map(|xy| Point2D::new(xy[0], xy[1]))
        .collect()
}

fn read_matrix(buffer: &[f64]) -> HomographyMatrix {
    let mut c = [0.0; 9];
    c.copy_from_slice(&buffer[..9]);
    HomographyMatrix::from_coefficients(c)
}

fn guarded(name: &str, f: impl FnOnce() -> bool) -> bool {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("{name}: panic caught at FFI boundary");
        false
    })
}

/// Estimate the homography mapping the source points onto the destination
/// points and write its 9 row-major coefficients into `out_ptr`.
///
/// # Safety
/// `src_ptr` and `dst_ptr` must each point to `2 * point_count` readable
/// `f64` values and `out_ptr` to 9 writable ones.
#[no_mangle]
pub unsafe extern "C" fn hb_compute_homography(
    src_ptr: *const f64,
    dst_ptr: *const f64,
    point_count: usize,
    out_ptr: *mut f64,
) -> bool {
    if src_ptr.is_null() || dst_ptr.is_null() || out_ptr.is_null() {
        return false;
    }
    if point_count < MIN_CORRESPONDENCES {
        return false;
    }
    let Some(len) = point_count.checked_mul(2) else {
        return false;
    };

    guarded("hb_compute_homography", || {
        let src = read_points(unsafe { std::slice::from_raw_parts(src_ptr, len) });
        let dst = read_points(unsafe { std::slice::from_raw_parts(dst_ptr, len) });

        match compute_homography(&src, &dst) {
            Some(h) => {
                let output = unsafe { std::slice::from_raw_parts_mut(out_ptr, 9) };
                output.copy_from_slice(&h.coefficients());
                true
            }
            None => false,
        }
    })
}

/// Map `(x, y)` through the matrix at `matrix_ptr`, writing `[x', y']` into
/// `out_ptr`.
///
/// # Safety
/// `matrix_ptr` must point to 9 readable `f64` values and `out_ptr` to 2
/// writable ones.
#[no_mangle]
pub unsafe extern "C" fn hb_project_point(
    matrix_ptr: *const f64,
    x: f64,
    y: f64,
    out_ptr: *mut f64,
) -> bool {
    if matrix_ptr.is_null() || out_ptr.is_null() {
        return false;
    }

    guarded("hb_project_point", || {
        let matrix = read_matrix(unsafe { std::slice::from_raw_parts(matrix_ptr, 9) });
        match project_point(Point2D::new(x, y), &matrix) {
            Some(p) => {
                let output = unsafe { std::slice::from_raw_parts_mut(out_ptr, 2) };
                output[0] = p.x;
                output[1] = p.y;
                true
            }
            None => false,
        }
    })
}

/// Write the inverse of the matrix at `matrix_ptr` into `out_ptr`.
///
/// # Safety
/// `matrix_ptr` must point to 9 readable `f64` values and `out_ptr` to 9
/// writable ones.
#[no_mangle]
pub unsafe extern "C" fn hb_invert_homography(matrix_ptr: *const f64, out_ptr: *mut f64) -> bool {
    if matrix_ptr.is_null() || out_ptr.is_null() {
        return false;
    }

    guarded("hb_invert_homography", || {
        let matrix = read_matrix(unsafe { std::slice::from_raw_parts(matrix_ptr, 9) });
        match matrix.inverse().filter(HomographyMatrix::is_finite) {
            Some(inv) => {
                let output = unsafe { std::slice::from_raw_parts_mut(out_ptr, 9) };
                output.copy_from_slice(&inv.coefficients());
                true
            }
            None => false,
        }
    })
}
