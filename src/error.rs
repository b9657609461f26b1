//! Error type shared by the estimation pipeline and the bridge functions.

use thiserror::Error;

/// Reasons a homography could not be computed.
///
/// Every variant is recoverable; [`compute_homography`](crate::api::compute_homography)
/// collapses all of them into `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    /// Fewer correspondences than the 4 needed to fix 8 degrees of freedom.
    #[error("homography requires at least {required} point correspondences, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences supplied.
        actual: usize,
    },

    /// Source and destination sequences differ in length.
    #[error("mismatched point counts: source ({0}) != destination ({1})")]
    MismatchedLengths(usize, usize),

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in correspondence {index}")]
    NonFiniteCoordinate {
        /// Index of the offending correspondence.
        index: usize,
    },

    /// Point arrangement admits no unique homography (collinear, coincident).
    #[error("degenerate point configuration: {0}")]
    DegenerateConfiguration(String),

    /// The linear solver failed or produced a singular / non-finite matrix.
    #[error("numeric failure: {0}")]
    NumericFailure(String),

    /// A settings value is out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}
