//! Stream Projection
//!
//! Flattens a [`NativeStreamDescriptor`] into a [`CanonicalStream`]. Each
//! optional field comes from exactly one nested sub-object of the descriptor
//! and is left absent when that sub-object is missing:
//!
//! | Field | Source |
//! |-------|--------|
//! | `name` | `roomAttributes.name` |
//! | `type` | `streamType.type`, mapped by symbolic name |
//! | `member-user-ids` | `streamAttributes.members` |
//!
//! Absent never becomes `false`, `""` or `[]`.

use serde::{Deserialize, Serialize};

use crate::model::{NativeStreamDescriptor, StreamId, StreamTypeWrapper, UserId};
use crate::stream_type::{StreamType, StreamTypes};

/// Flat, language-neutral stream record
///
/// Serializes with kebab-case keys; absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CanonicalStream {
    /// Canonical identifier
    pub stream_id: StreamId,
    /// Room name (rooms only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remote "active" flag, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Stream classification, when reported
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<StreamType>,
    /// Whether the stream spans more than one pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_pod: Option<bool>,
    /// Chat participants in remote order (chats only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_user_ids: Option<Vec<UserId>>,
}

impl CanonicalStream {
    /// Whether the record describes a room
    #[must_use]
    pub fn is_room(&self) -> bool {
        self.stream_type == Some(StreamType::Room)
    }
}

/// Project a descriptor using the platform's declared stream types
///
/// Total: an absent descriptor yields an absent record.
#[must_use]
pub fn project(descriptor: Option<&NativeStreamDescriptor>) -> Option<CanonicalStream> {
    project_with(descriptor, StreamTypes::platform())
}

/// Project a descriptor against an explicit stream type set
#[must_use]
pub fn project_with(
    descriptor: Option<&NativeStreamDescriptor>,
    types: &StreamTypes,
) -> Option<CanonicalStream> {
    let descriptor = descriptor?;

    Some(CanonicalStream {
        stream_id: descriptor.id.clone(),
        name: descriptor
            .room_attributes
            .as_ref()
            .and_then(|room| room.name.clone()),
        active: descriptor.active,
        stream_type: descriptor
            .stream_type
            .as_ref()
            .and_then(|wrapper| map_type(&descriptor.id, wrapper, types)),
        cross_pod: descriptor.cross_pod,
        member_user_ids: descriptor
            .stream_attributes
            .as_ref()
            .map(|chat| chat.members.clone()),
    })
}

fn map_type(
    stream_id: &StreamId,
    wrapper: &StreamTypeWrapper,
    types: &StreamTypes,
) -> Option<StreamType> {
    let mapped = types.lookup(&wrapper.name);
    if mapped.is_none() {
        tracing::warn!(
            stream_id = %stream_id,
            symbol = %wrapper.name,
            "Stream reported an undeclared type; leaving type absent"
        );
    }
    mapped
}
