//! PostError: Unified error type for cfd-post public APIs
//!
//! This error type is used throughout the cfd-post library to provide robust,
//! non-panicking error handling for all public APIs. Configuration-incomplete
//! situations (missing input, missing implicit function, no active stage
//! chain) are deliberately *not* errors; they surface as
//! [`Outcome::NothingToDo`](crate::filter::Outcome::NothingToDo) instead.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for cfd-post operations.
#[derive(Debug, Error)]
pub enum PostError {
    /// The source file does not exist or is not readable. This is the only
    /// condition `PostPipeline::read` treats as fatal.
    #[error("result file `{0}` not existing or not readable")]
    FileUnreadable(String),
    /// Underlying I/O failure while a reader was consuming a readable file.
    #[error("I/O error while reading result data: {0}")]
    Io(#[from] std::io::Error),
    /// A reader hit malformed content it cannot recover from.
    #[error("parse error in `{file}`: {reason}")]
    MalformedFile {
        /// File being parsed.
        file: String,
        /// What was wrong.
        reason: String,
    },
    /// A stage was asked to process an array that is not on its input.
    #[error("array `{0}` not present on the input dataset")]
    MissingArray(String),
    /// A cell references a point index outside the dataset's point range.
    #[error("cell references point index {index}, but dataset has {points} points")]
    PointIndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of points in the dataset.
        points: usize,
    },
    /// Array length is not a multiple of its component count.
    #[error("array `{0}` has {1} values, not divisible by {2} components")]
    RaggedArray(String, usize, usize),
}
