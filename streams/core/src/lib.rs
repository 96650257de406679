//! Stream Core - Canonical stream access for a messaging pod
//!
//! This crate is the stream layer of a messaging-platform integration. It
//! lists the conversation streams a session can see, fetches individual
//! streams, classifies them by type, and enumerates their members. Native
//! pod descriptors are projected into flat canonical records so callers
//! never depend on the pod's wire shapes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Callers                                │
//! │    stream references: id │ structured │ descriptor │ chat │      │
//! │                      room │ message │ JSON value                 │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                          STREAM CORE                             │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │                     StreamAccessor                         │  │
//! │  │  ┌────────────┐  ┌────────────┐  ┌──────────────────────┐  │  │
//! │  │  │ Reference  │  │ Projection │  │ Classification cache │  │  │
//! │  │  │ resolver   │  │            │  │ (conn, stream) → type│  │  │
//! │  │  └────────────┘  └─────┬──────┘  └──────────────────────┘  │  │
//! │  │                  StreamTypes                               │  │
//! │  └────────────────────────┬───────────────────────────────────┘  │
//! │                           │ Connection (trait)                   │
//! └───────────────────────────┼──────────────────────────────────────┘
//!                             │
//!                   PodConnection (REST) or test double
//! ```
//!
//! # Key Types
//!
//! - [`StreamAccessor`]: Listing, fetching, classification and membership
//! - [`StreamRef`]: Every supported way of naming a stream
//! - [`CanonicalStream`]: Flat stream record produced by projection
//! - [`StreamTypes`]: Immutable set of declared stream types
//! - [`Connection`]: Session collaborator the accessor calls into
//! - [`PodConnection`]: [`Connection`] over the pod REST API
//!
//! # Quick Start
//!
//! ```ignore
//! use stream_core::{load_config, PodConnection, StreamAccessor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     let connection = PodConnection::new(&config)?;
//!     let accessor = StreamAccessor::new();
//!
//!     for record in accessor.list_streams(&connection).await?.records() {
//!         println!("{} {:?}", record.stream_id, record.stream_type);
//!     }
//!
//!     let kind = accessor.classify(&connection, "iWyZBIOdQQzQj0tKOLRivX___qu6YeyZdA").await?;
//!     println!("{kind:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`accessor`]: Stateful operations over a connection
//! - [`config`]: Pod connection settings (file, environment, overrides)
//! - [`connection`]: Connection trait and the pod REST implementation
//! - [`error`]: Error types returned to callers
//! - [`model`]: Native pod data shapes
//! - [`projection`]: Native descriptor to canonical record conversion
//! - [`reference`]: Stream reference forms and identifier resolution
//! - [`stream_type`]: Stream type enumeration and the declared type set
//! - [`user`]: Canonical user records

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accessor;
pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod projection;
pub mod reference;
pub mod stream_type;
pub mod user;

// Core exports
pub use accessor::{StreamAccessor, StreamListing, StreamMembers};
pub use error::StreamError;
pub use projection::{project, project_with, CanonicalStream};
pub use reference::{resolve_identifier, ReferenceShape, StreamRef, StructuredRef};
pub use stream_type::{StreamType, StreamTypes, UnknownStreamType, PLATFORM_STREAM_TYPES};
pub use user::{project_user, CanonicalUser, UserProjection};

// Model exports
pub use model::{
    ChatAttributes, ChatSession, MessageStream, NativeMessage, NativeStreamDescriptor,
    NativeUser, RoomAttributes, RoomDetail, RoomSystemInfo, StreamFilter, StreamId,
    StreamTypeWrapper, UserId,
};

// Connection exports
pub use connection::{Connection, ConnectionError, ConnectionId, PodConnection};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, PodConfig, StreamsToml,
};
