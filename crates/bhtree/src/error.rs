//! Tree construction errors.

use thiserror::Error;

use crate::body::BodyId;

/// Reasons a tree build can fail.
///
/// A failed build never yields a partial tree: the arena is dropped and the
/// caller gets the error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// No bodies were supplied, so there are no bounds to compute.
    #[error("cannot build an octree from an empty body set")]
    EmptyInput,

    /// A body had a non-finite position, a non-finite mass, or a negative mass.
    #[error("body {index} is invalid: {reason}")]
    InvalidBody {
        /// Index of the offending body
        index: usize,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Bodies could not be separated before the depth cap and the
    /// configuration forbids sharing a leaf.
    #[error("body {body} could not be separated before depth {depth}")]
    DepthLimitExceeded {
        /// Depth at which insertion stopped
        depth: u8,
        /// Body being inserted when the cap was hit
        body: BodyId,
    },

    /// Body positions span a distance that is not representable as `f64`.
    #[error("body positions span a non-finite extent")]
    ExtentOverflow,

    /// More bodies than a [`BodyId`] can address.
    #[error("too many bodies: {0}")]
    TooManyBodies(usize),
}

/// A [`Gravity`](crate::Gravity) setting outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("gravity {field} must be {requirement}, got {value}")]
pub struct InvalidGravity {
    /// Name of the offending field
    pub field: &'static str,
    /// What the field must satisfy
    pub requirement: &'static str,
    /// The rejected value
    pub value: f64,
}
