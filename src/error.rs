//! Error types shared by the containers.

use std::error;
use std::fmt::{self, Display};

/// The reasons a container operation can fail.
///
/// Failures are synchronous and leave the container in its pre-call state;
/// no partially applied change is ever observable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// An index argument was outside `[0, len)`, or `[0, len]` for
    /// insertion points.
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The length of the container at the time of the call.
        len: usize,
    },

    /// A range argument was malformed or extended past the container.
    InvalidRange {
        /// Start of the range, inclusive.
        start: usize,
        /// End of the range, exclusive.
        end: usize,
        /// The length of the container at the time of the call.
        len: usize,
    },

    /// A load factor was not a positive finite number.
    InvalidLoadFactor(f32),

    /// A cursor or sub-list view detected that the underlying structure was
    /// changed via a path other than its own sanctioned operations.
    ///
    /// Detection is best-effort: it is meant to catch programming errors,
    /// not to be relied upon for correctness.
    ConcurrentModification,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds, length {len}")
            }
            Self::InvalidRange { start, end, len } => {
                write!(f, "invalid range {start}..{end}, length {len}")
            }
            Self::InvalidLoadFactor(load_factor) => {
                write!(f, "invalid load factor {load_factor}")
            }
            Self::ConcurrentModification => {
                f.write_str("the container was structurally modified by another path")
            }
        }
    }
}

impl error::Error for Error {}
