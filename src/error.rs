//! Error types for Dson encoding and decoding.
//!
//! Every fault raised by the engine is fatal for the current pass: the reader or
//! writer that produced it should be closed (dropping it is enough) and the pass
//! restarted. Nothing in the core retries or coerces values.
//!
//! ## Error Categories
//!
//! - **State errors**: an operation was invoked in the wrong reader/writer state
//! - **Type mismatches**: the requested scalar type differs from the tag on the wire
//! - **Structural errors**: recursion limit, trailing container data, oversized headers
//! - **Format errors**: malformed tags, varints, UTF-8 or truncated input
//!
//! ## Examples
//!
//! ```rust
//! use dson::{from_slice, DsonValue, Error};
//!
//! // An OBJECT tag whose length prefix is cut short.
//! let result: Result<Vec<DsonValue>, Error> = from_slice(&[0xF8, 0x01]);
//! assert!(result.is_err());
//!
//! if let Err(err) = result {
//!     eprintln!("Decode error: {}", err);
//! }
//! ```

use crate::context::DsonState;
use crate::types::DsonType;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading or writing Dson.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error from the backing sink or source
    #[error("IO error: {0}")]
    Io(String),

    /// Operation invoked while the state machine is not in a permitted state
    #[error("Invalid state: expected one of {expected:?}, found {found:?}")]
    State {
        expected: Vec<DsonState>,
        found: DsonState,
    },

    /// Requested value type differs from the type on the wire
    #[error("Type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: DsonType, found: DsonType },

    /// Explicit field name differs from the name actually present
    #[error("Name mismatch: expected {expected}, found {found}")]
    NameMismatch { expected: String, found: String },

    /// Random-access lookup of a field that the object does not contain
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Container nesting exceeds the configured ceiling
    #[error("Recursion limit of {limit} nested containers exceeded")]
    RecursionLimit { limit: usize },

    /// Declared container length differs from the bytes consumed by its body
    #[error("Trailing data: container declared {declared} bytes, body consumed {consumed}")]
    TrailingData { declared: usize, consumed: usize },

    /// A value that must be OBJECT, ARRAY or HEADER is not
    #[error("Invalid top-level type {0:?}: expected OBJECT, ARRAY or HEADER")]
    InvalidTopLevelType(DsonType),

    /// Header body larger than its 16-bit length prefix can describe
    #[error("Header body of {size} bytes exceeds the 65535 byte limit")]
    OversizedHeader { size: usize },

    /// Byte source exhausted before a value was complete
    #[error("Unexpected end of input at byte {position}: needed {needed} more bytes")]
    UnexpectedEof { position: usize, needed: usize },

    /// Malformed input or an illegal value for the format
    #[error("Invalid Dson format at byte {position}: {msg}")]
    InvalidFormat { position: usize, msg: String },

    /// Operation on a reader or writer that was already closed
    #[error("Reader or writer is closed")]
    Closed,

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a state error listing the states the operation accepts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonState, Error};
    ///
    /// let err = Error::invalid_state(&[DsonState::Name], DsonState::Type);
    /// assert!(err.to_string().contains("Name"));
    /// ```
    pub fn invalid_state(expected: &[DsonState], found: DsonState) -> Self {
        Error::State {
            expected: expected.to_vec(),
            found,
        }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{DsonType, Error};
    ///
    /// let err = Error::type_mismatch(DsonType::Int32, DsonType::String);
    /// assert!(err.to_string().contains("expected Int32"));
    /// ```
    pub fn type_mismatch(expected: DsonType, found: DsonType) -> Self {
        Error::TypeMismatch { expected, found }
    }

    /// Creates a name mismatch error from the two names' debug forms.
    pub fn name_mismatch<E, F>(expected: &E, found: &F) -> Self
    where
        E: fmt::Debug + ?Sized,
        F: fmt::Debug + ?Sized,
    {
        Error::NameMismatch {
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }

    /// Creates a field-not-found error for the buffered reader.
    pub fn field_not_found<N: fmt::Debug + ?Sized>(name: &N) -> Self {
        Error::FieldNotFound(format!("{:?}", name))
    }

    /// Creates a recursion limit error.
    pub fn recursion_limit(limit: usize) -> Self {
        Error::RecursionLimit { limit }
    }

    /// Creates a trailing data error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// let err = Error::trailing_data(10, 12);
    /// assert!(err.to_string().contains("declared 10 bytes"));
    /// ```
    pub fn trailing_data(declared: usize, consumed: usize) -> Self {
        Error::TrailingData { declared, consumed }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(position: usize, needed: usize) -> Self {
        Error::UnexpectedEof { position, needed }
    }

    /// Creates an invalid format error for malformed bytes.
    pub fn invalid_format(position: usize, msg: &str) -> Self {
        Error::InvalidFormat {
            position,
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for sink or source failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::recursion_limit(4);
        assert_eq!(
            err.to_string(),
            "Recursion limit of 4 nested containers exceeded"
        );

        let err = Error::InvalidTopLevelType(DsonType::Int32);
        assert!(err.to_string().contains("Int32"));

        let err = Error::OversizedHeader { size: 70000 };
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_name_mismatch_uses_debug_forms() {
        let err = Error::name_mismatch("x", "y");
        assert_eq!(err.to_string(), "Name mismatch: expected \"x\", found \"y\"");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref msg) if msg.contains("pipe closed")));
    }
}
