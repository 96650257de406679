//! Accessor and resolver errors
//!
//! Two classes of failure reach callers:
//!
//! - **Defects**: a stream reference whose shape is not one of the supported
//!   ones. This is a programming error and is never reported as "not found".
//! - **Connection failures**: transport or authorization errors from the
//!   injected [`Connection`](crate::connection::Connection), passed through
//!   untouched.
//!
//! A stream that does not exist or is not visible to the session is not an
//! error at all; it surfaces as `Ok(None)` or an empty sequence.

use thiserror::Error;

use crate::connection::ConnectionError;

/// Errors returned by stream operations
#[derive(Debug, Error)]
pub enum StreamError {
    /// The value passed as a stream reference has no known shape
    #[error("unrecognized stream reference: {shape}")]
    UnrecognizedReference {
        /// Description of the offending value
        shape: String,
    },

    /// The connection collaborator failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl StreamError {
    /// Whether this error indicates a caller bug rather than a runtime failure
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::UnrecognizedReference { .. })
    }
}
