//! Stream Accessor
//!
//! Remote stream lookups on top of an injected [`Connection`]: listing,
//! single-stream fetches, membership enumeration, and a memoized
//! classification lookup.
//!
//! # Classification Cache
//!
//! ```text
//!   classify(conn, ref)
//!          │
//!          ▼
//!   resolve_identifier ──► (ConnectionId, StreamId)
//!          │                        │
//!          │              ┌─────────▼──────────┐  hit
//!          │              │ DashMap<key, type> │──────► cached type
//!          │              └─────────┬──────────┘
//!          │                        │ miss
//!          ▼                        ▼
//!   connection.stream_info ──► project ──► entry().or_insert()
//! ```
//!
//! Entries are written once per key and never invalidated: a stream's type
//! does not change after creation. Concurrent misses on the same key may
//! each hit the pod, but the first value inserted wins and every caller
//! receives that stored value. No lock is held across the remote call.
//! Absent classifications (unknown or hidden streams) are cached like any
//! other result; connection errors are not.
//!
//! # Listings
//!
//! [`StreamAccessor::list_streams`] materializes the pod's listing once and
//! returns a [`StreamListing`] snapshot. Iterating it projects lazily and can
//! be repeated without another remote call. A null entry in the pod's listing
//! stays in place as an absent record, so the snapshot has exactly as many
//! entries as the pod returned.

use dashmap::DashMap;

use crate::connection::{Connection, ConnectionId};
use crate::error::StreamError;
use crate::model::{NativeStreamDescriptor, NativeUser, StreamFilter, StreamId};
use crate::projection::{project_with, CanonicalStream};
use crate::reference::{resolve_identifier, StreamRef};
use crate::stream_type::{StreamType, StreamTypes};
use crate::user::{project_user, CanonicalUser, UserProjection};

type ClassificationKey = (ConnectionId, StreamId);

/// Stateful stream lookups over a connection
pub struct StreamAccessor {
    /// Declared stream types used for projection
    types: StreamTypes,
    /// Native user to canonical user conversion
    user_projection: UserProjection,
    /// Memoized classifications, first writer wins
    classifications: DashMap<ClassificationKey, Option<StreamType>>,
}

impl Default for StreamAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAccessor")
            .field("types", &self.types)
            .field("cached_classifications", &self.classifications.len())
            .finish_non_exhaustive()
    }
}

impl StreamAccessor {
    /// Create an accessor using the platform stream types and the default
    /// user projection
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: StreamTypes::platform().clone(),
            user_projection: project_user,
            classifications: DashMap::new(),
        }
    }

    /// Use an explicit stream type set
    #[must_use]
    pub fn with_stream_types(mut self, types: StreamTypes) -> Self {
        self.types = types;
        self
    }

    /// Use a different user projection for membership listings
    #[must_use]
    pub fn with_user_projection(mut self, projection: UserProjection) -> Self {
        self.user_projection = projection;
        self
    }

    /// The stream types this accessor projects with
    #[must_use]
    pub fn stream_types(&self) -> &StreamTypes {
        &self.types
    }

    /// Number of memoized classifications
    #[must_use]
    pub fn cached_classifications(&self) -> usize {
        self.classifications.len()
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// List every stream visible to the session, unprojected
    ///
    /// Issues one listing call with the unfiltered criterion.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the connection fails.
    pub async fn list_native_streams<C>(
        &self,
        connection: &C,
    ) -> Result<Vec<Option<NativeStreamDescriptor>>, StreamError>
    where
        C: Connection + ?Sized,
    {
        self.list_native_filtered(connection, &StreamFilter::unfiltered())
            .await
    }

    /// List every stream visible to the session as canonical records
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the connection fails.
    pub async fn list_streams<C>(&self, connection: &C) -> Result<StreamListing, StreamError>
    where
        C: Connection + ?Sized,
    {
        let descriptors = self.list_native_streams(connection).await?;
        Ok(self.listing(descriptors))
    }

    /// List streams of the given types, narrowed on the pod side
    ///
    /// An empty `types` slice applies no type narrowing.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Connection`] if the connection fails.
    pub async fn list_streams_of_types<C>(
        &self,
        connection: &C,
        types: &[StreamType],
        include_inactive: bool,
    ) -> Result<StreamListing, StreamError>
    where
        C: Connection + ?Sized,
    {
        let filter = StreamFilter::unfiltered()
            .with_types(types.iter().map(|t| t.symbol()))
            .with_inactive(include_inactive);
        let descriptors = self.list_native_filtered(connection, &filter).await?;
        Ok(self.listing(descriptors))
    }

    async fn list_native_filtered<C>(
        &self,
        connection: &C,
        filter: &StreamFilter,
    ) -> Result<Vec<Option<NativeStreamDescriptor>>, StreamError>
    where
        C: Connection + ?Sized,
    {
        let descriptors = connection.list_streams(filter).await?;
        tracing::debug!(
            connection = %connection.connection_id(),
            count = descriptors.len(),
            unfiltered = filter.is_unfiltered(),
            "Listed streams"
        );
        Ok(descriptors)
    }

    fn listing(&self, descriptors: Vec<Option<NativeStreamDescriptor>>) -> StreamListing {
        StreamListing {
            descriptors,
            types: self.types.clone(),
        }
    }

    // ========================================================================
    // Single stream
    // ========================================================================

    /// Fetch the native descriptor of a referenced stream
    ///
    /// Absent references resolve to `Ok(None)` without a remote call.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnrecognizedReference`] for an unsupported
    /// reference shape, or [`StreamError::Connection`] if the connection
    /// fails.
    pub async fn fetch_native_stream<'r, C>(
        &self,
        connection: &C,
        reference: impl Into<StreamRef<'r>>,
    ) -> Result<Option<NativeStreamDescriptor>, StreamError>
    where
        C: Connection + ?Sized,
    {
        let Some(stream_id) = resolve_identifier(reference)? else {
            return Ok(None);
        };
        self.fetch_by_id(connection, &stream_id).await
    }

    /// Fetch a referenced stream as a canonical record
    ///
    /// # Errors
    ///
    /// Same as [`fetch_native_stream`](Self::fetch_native_stream).
    pub async fn fetch_stream<'r, C>(
        &self,
        connection: &C,
        reference: impl Into<StreamRef<'r>>,
    ) -> Result<Option<CanonicalStream>, StreamError>
    where
        C: Connection + ?Sized,
    {
        let descriptor = self.fetch_native_stream(connection, reference).await?;
        Ok(project_with(descriptor.as_ref(), &self.types))
    }

    /// Determine a stream's type, memoized per connection and stream id
    ///
    /// The first call for a key fetches the stream; later calls return the
    /// stored result without a remote call.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_native_stream`](Self::fetch_native_stream). Errors are
    /// never cached.
    pub async fn classify<'r, C>(
        &self,
        connection: &C,
        reference: impl Into<StreamRef<'r>>,
    ) -> Result<Option<StreamType>, StreamError>
    where
        C: Connection + ?Sized,
    {
        let Some(stream_id) = resolve_identifier(reference)? else {
            return Ok(None);
        };
        let key = (connection.connection_id(), stream_id);

        let cached = self.classifications.get(&key).map(|entry| *entry);
        if let Some(stream_type) = cached {
            tracing::trace!(
                connection = %key.0,
                stream_id = %key.1,
                "Classification cache hit"
            );
            return Ok(stream_type);
        }

        let descriptor = self.fetch_by_id(connection, &key.1).await?;
        let classified =
            project_with(descriptor.as_ref(), &self.types).and_then(|record| record.stream_type);

        let stored = *self.classifications.entry(key).or_insert(classified);
        if stored != classified {
            tracing::debug!(
                ?stored,
                ?classified,
                "Concurrent classification lost the race; keeping first value"
            );
        }
        Ok(stored)
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Enumerate the users participating in a referenced stream
    ///
    /// Absent references yield an empty sequence without a remote call.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_native_stream`](Self::fetch_native_stream).
    pub async fn list_stream_members<'r, C>(
        &self,
        connection: &C,
        reference: impl Into<StreamRef<'r>>,
    ) -> Result<StreamMembers, StreamError>
    where
        C: Connection + ?Sized,
    {
        let users = match resolve_identifier(reference)? {
            Some(stream_id) => {
                let users = connection.stream_members(&stream_id).await?;
                tracing::debug!(
                    connection = %connection.connection_id(),
                    stream_id = %stream_id,
                    count = users.len(),
                    "Listed stream members"
                );
                users
            }
            None => Vec::new(),
        };

        Ok(StreamMembers {
            users,
            projection: self.user_projection,
        })
    }

    async fn fetch_by_id<C>(
        &self,
        connection: &C,
        stream_id: &StreamId,
    ) -> Result<Option<NativeStreamDescriptor>, StreamError>
    where
        C: Connection + ?Sized,
    {
        let descriptor = connection.stream_info(stream_id).await?;
        tracing::debug!(
            connection = %connection.connection_id(),
            stream_id = %stream_id,
            found = descriptor.is_some(),
            "Fetched stream info"
        );
        Ok(descriptor)
    }
}

/// Snapshot of a stream listing
///
/// Holds the native descriptors as returned by the pod; canonical records
/// are produced on iteration.
#[derive(Debug, Clone)]
pub struct StreamListing {
    descriptors: Vec<Option<NativeStreamDescriptor>>,
    types: StreamTypes,
}

impl StreamListing {
    /// Canonical records in pod order; null entries yield `None`
    pub fn iter(&self) -> impl Iterator<Item = Option<CanonicalStream>> + '_ {
        self.descriptors
            .iter()
            .map(|descriptor| project_with(descriptor.as_ref(), &self.types))
    }

    /// Canonical records, skipping null entries
    pub fn records(&self) -> impl Iterator<Item = CanonicalStream> + '_ {
        self.iter().flatten()
    }

    /// The native descriptors behind this snapshot
    #[must_use]
    pub fn native(&self) -> &[Option<NativeStreamDescriptor>] {
        &self.descriptors
    }

    /// Number of entries, including null ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the listing is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Participants of a stream
///
/// Users are projected on iteration through the accessor's
/// [`UserProjection`].
#[derive(Clone)]
pub struct StreamMembers {
    users: Vec<NativeUser>,
    projection: UserProjection,
}

impl std::fmt::Debug for StreamMembers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamMembers")
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}

impl StreamMembers {
    /// Canonical user records in membership order
    pub fn iter(&self) -> impl Iterator<Item = CanonicalUser> + '_ {
        self.users.iter().map(self.projection)
    }

    /// The native user descriptors
    #[must_use]
    pub fn native(&self) -> &[NativeUser] {
        &self.users
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the stream has no visible members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
