//! Connection Traits
//!
//! Contract between the stream accessor and whatever session object talks to
//! the pod. Implementations must be safe to share between tasks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NativeStreamDescriptor, NativeUser, StreamFilter, StreamId};

/// Process-unique handle for a connection
///
/// Keys per-connection state such as cached classifications. Every call to
/// [`ConnectionId::new`] yields a fresh value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a new unique connection ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw numeric value
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Failures raised by a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("pod request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The pod answered with a non-success status
    #[error("pod returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("failed to decode pod response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured pod URL cannot address API endpoints
    #[error("invalid pod URL: {0}")]
    InvalidUrl(String),
}

impl ConnectionError {
    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Session handle for a pod
///
/// Implement this trait to plug a different transport (or a test double)
/// under the accessor.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Stable identity of this connection
    fn connection_id(&self) -> ConnectionId;

    /// List every stream visible to the session that matches `filter`
    ///
    /// Elements may be `None` when the pod returns null entries.
    async fn list_streams(
        &self,
        filter: &StreamFilter,
    ) -> Result<Vec<Option<NativeStreamDescriptor>>, ConnectionError>;

    /// Fetch one stream descriptor
    ///
    /// Returns `Ok(None)` when the stream does not exist or the session
    /// cannot see it.
    async fn stream_info(
        &self,
        stream_id: &StreamId,
    ) -> Result<Option<NativeStreamDescriptor>, ConnectionError>;

    /// Enumerate the users participating in a stream
    ///
    /// Returns an empty list when the stream does not exist or the session
    /// cannot see it.
    async fn stream_members(
        &self,
        stream_id: &StreamId,
    ) -> Result<Vec<NativeUser>, ConnectionError>;
}
