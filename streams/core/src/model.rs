//! Native Pod Types
//!
//! Shapes returned by the pod REST API. These mirror the platform's JSON
//! (camelCase keys, most fields optional) and are never handed to callers
//! as-is by the accessor's canonical operations: the projector flattens them
//! into [`CanonicalStream`](crate::projection::CanonicalStream) records.
//!
//! Four of these types double as stream references accepted by
//! [`resolve_identifier`](crate::reference::resolve_identifier):
//!
//! | Type | Identifier location |
//! |------|---------------------|
//! | [`NativeStreamDescriptor`] | `id` |
//! | [`ChatSession`] | `id` |
//! | [`RoomDetail`] | `roomSystemInfo.id` |
//! | [`NativeMessage`] | `stream.streamId` |

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical stream identifier
///
/// Pod stream ids are opaque URL-safe strings. The newtype keeps them from
/// being confused with user ids or message ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Create a stream id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the raw string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Pod user identifier
///
/// The pod reports user ids as 64-bit JSON numbers in most payloads and as
/// strings in a few. Both forms deserialize to the same decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

// ============================================================================
// Stream descriptors
// ============================================================================

/// Type wrapper object (`{"type": "ROOM"}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTypeWrapper {
    /// Symbolic type name as reported by the pod
    #[serde(rename = "type")]
    pub name: String,
}

impl StreamTypeWrapper {
    /// Wrap a symbolic type name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Chat-specific attributes carried by IM and MIM descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAttributes {
    /// Participants, in the order the pod reports them
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// Room-specific attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAttributes {
    /// Room display name
    pub name: Option<String>,
    /// Free-form room description
    pub description: Option<String>,
    /// Whether the room is publicly listed
    pub public: Option<bool>,
    /// Whether only owners may post
    pub read_only: Option<bool>,
    /// Whether the room can be found through search
    pub discoverable: Option<bool>,
}

/// Full stream descriptor as returned by the stream info and stream list calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeStreamDescriptor {
    /// Stream identifier
    pub id: StreamId,
    /// Whether the stream spans more than one pod
    pub cross_pod: Option<bool>,
    /// Whether the stream is active
    pub active: Option<bool>,
    /// Type wrapper, absent when the pod did not report a type
    pub stream_type: Option<StreamTypeWrapper>,
    /// Chat-specific attributes (IM / MIM only)
    pub stream_attributes: Option<ChatAttributes>,
    /// Room-specific attributes (ROOM only)
    pub room_attributes: Option<RoomAttributes>,
}

/// Chat session handle returned when an IM is opened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Identifier of the chat stream
    pub id: StreamId,
}

/// System-managed room metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSystemInfo {
    /// Room stream identifier
    pub id: StreamId,
    /// Creation time, epoch milliseconds
    pub creation_date: Option<i64>,
    /// User that created the room
    pub created_by_user_id: Option<UserId>,
    /// Whether the room is active
    pub active: Option<bool>,
}

/// Room detail object returned by the room info call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    /// User-editable room attributes
    pub room_attributes: Option<RoomAttributes>,
    /// System metadata; carries the stream id
    pub room_system_info: RoomSystemInfo,
}

/// Stream pointer embedded in a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStream {
    /// Stream the message was posted to
    pub stream_id: StreamId,
    /// Symbolic type of that stream, when reported
    pub stream_type: Option<String>,
}

/// Message as delivered by the pod's message and datafeed APIs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeMessage {
    /// Message identifier
    pub message_id: String,
    /// Post time, epoch milliseconds
    pub timestamp: Option<i64>,
    /// Message body (markup)
    pub message: Option<String>,
    /// Stream the message belongs to
    pub stream: MessageStream,
}

// ============================================================================
// Users
// ============================================================================

/// User descriptor as returned by the user lookup call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeUser {
    /// User identifier
    pub id: UserId,
    /// Primary email address
    pub email_address: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Name shown in clients
    pub display_name: Option<String>,
    /// Login name
    pub username: Option<String>,
    /// Company the user belongs to
    pub company: Option<String>,
}

impl NativeUser {
    /// Create a user with only an id set
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email_address: None,
            first_name: None,
            last_name: None,
            display_name: None,
            username: None,
            company: None,
        }
    }
}

// ============================================================================
// Listing filter
// ============================================================================

/// Filter body for the stream list call
///
/// The default value is the unfiltered criterion: it serializes to `{}` and
/// applies no server-side narrowing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFilter {
    /// Restrict to these stream types (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream_types: Vec<StreamTypeWrapper>,
    /// Include deactivated streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_inactive_streams: Option<bool>,
}

impl StreamFilter {
    /// The unfiltered criterion
    #[must_use]
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// Restrict to the given symbolic type names
    #[must_use]
    pub fn with_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stream_types = names.into_iter().map(StreamTypeWrapper::new).collect();
        self
    }

    /// Set whether inactive streams are included
    #[must_use]
    pub fn with_inactive(mut self, include: bool) -> Self {
        self.include_inactive_streams = Some(include);
        self
    }

    /// Whether this filter applies no narrowing at all
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.stream_types.is_empty() && self.include_inactive_streams.is_none()
    }
}
