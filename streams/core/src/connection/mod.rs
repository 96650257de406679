//! Pod Connection
//!
//! The accessor never talks to the pod directly; it goes through the
//! [`Connection`] trait. Authentication, retries, timeouts and pagination are
//! the connection's business.
//!
//! # Available Connections
//!
//! - **PodConnection**: REST client for a pod's stream and user endpoints
//!
//! # Usage
//!
//! ```ignore
//! use stream_core::config::load_config;
//! use stream_core::connection::PodConnection;
//!
//! let config = load_config()?;
//! let connection = PodConnection::new(&config)?;
//! ```

mod pod;
mod traits;

pub use pod::PodConnection;
pub use traits::{Connection, ConnectionError, ConnectionId};
