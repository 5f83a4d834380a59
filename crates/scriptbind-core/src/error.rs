//! Conversion errors.
//!
//! A value whose runtime kind or shape does not match what the host type
//! requires is a contract violation of the caller. It is reported as a
//! `ConvertError` in every build profile; the dispatch layer turns it into a
//! script error instead of aborting the process.

use thiserror::Error;

use crate::kind::ValueKind;
use crate::state::StackIndex;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The value at `index` has the wrong runtime kind.
    #[error("bad value at stack index {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: StackIndex,
        expected: &'static str,
        found: ValueKind,
    },

    /// A fixed-arity table (pair, tuple, array) has the wrong length.
    #[error("bad table at stack index {index}: expected {expected} elements, found {found}")]
    LengthMismatch {
        index: StackIndex,
        expected: usize,
        found: usize,
    },

    /// A number that does not fit the requested integer type.
    #[error("number at stack index {index} does not fit in {target}")]
    OutOfRange {
        index: StackIndex,
        target: &'static str,
    },

    #[error("string at stack index {index} is not valid UTF-8")]
    InvalidUtf8 { index: StackIndex },

    #[error("string at stack index {index} contains an interior NUL byte")]
    InteriorNul { index: StackIndex },
}

impl ConvertError {
    #[inline]
    pub fn mismatch(index: StackIndex, expected: &'static str, found: ValueKind) -> Self {
        ConvertError::TypeMismatch { index, expected, found }
    }
}
