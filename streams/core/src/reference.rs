//! Stream Reference Resolution
//!
//! Callers identify a stream with whatever they have on hand: a raw id, a
//! descriptor returned by a listing, the chat session from opening an IM, a
//! room detail, or a message received from the datafeed. [`StreamRef`] is the
//! closed set of those shapes and [`resolve_identifier`] extracts the id from
//! any of them.
//!
//! Dynamically shaped payloads (webhook bodies, CLI input) go through
//! [`StreamRef::Json`], which runs an ordered chain of shape predicates. A
//! JSON value that matches none of them is a defect and fails with
//! [`StreamError::UnrecognizedReference`] rather than resolving to `None`,
//! since `None` already means "no stream".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StreamError;
use crate::model::{ChatSession, NativeMessage, NativeStreamDescriptor, RoomDetail, StreamId};

/// Reference that names its stream through a `stream-obj` field
///
/// Resolution is single-level: the field's value is the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRef {
    /// The referenced stream id
    #[serde(rename = "stream-obj", alias = "streamObj")]
    pub stream_obj: Option<StreamId>,
}

impl StructuredRef {
    /// Reference a stream id
    pub fn new(stream_id: impl Into<StreamId>) -> Self {
        Self {
            stream_obj: Some(stream_id.into()),
        }
    }
}

/// Any value that identifies a stream
#[derive(Debug, Clone, Copy)]
pub enum StreamRef<'a> {
    /// No reference at all
    Absent,
    /// A raw identifier
    Id(&'a str),
    /// A structured `stream-obj` reference
    Structured(&'a StructuredRef),
    /// A full stream descriptor
    Descriptor(&'a NativeStreamDescriptor),
    /// A chat session object
    Chat(&'a ChatSession),
    /// A room detail object
    Room(&'a RoomDetail),
    /// A message posted to the stream
    Message(&'a NativeMessage),
    /// An untyped JSON value, classified by shape
    Json(&'a Value),
}

/// Which shape a reference was recognized as
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceShape {
    /// No reference
    Absent,
    /// Raw identifier
    Id,
    /// `stream-obj` reference
    Structured,
    /// Stream descriptor
    Descriptor,
    /// Chat session
    Chat,
    /// Room detail
    Room,
    /// Message
    Message,
}

impl std::fmt::Display for ReferenceShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Id => "identifier",
            Self::Structured => "stream-obj reference",
            Self::Descriptor => "stream descriptor",
            Self::Chat => "chat session",
            Self::Room => "room detail",
            Self::Message => "message",
        };
        f.write_str(name)
    }
}

type ShapeMatcher = fn(&Map<String, Value>) -> Option<&Value>;

/// Object shapes tried in order; the first predicate to match decides.
///
/// Descriptors and chat sessions both carry a top-level `id`, so they share
/// the last entry.
const OBJECT_SHAPES: &[(ReferenceShape, ShapeMatcher)] = &[
    (ReferenceShape::Structured, structured_id),
    (ReferenceShape::Room, room_id),
    (ReferenceShape::Message, message_stream_id),
    (ReferenceShape::Descriptor, top_level_id),
];

fn structured_id(map: &Map<String, Value>) -> Option<&Value> {
    map.get("stream-obj").or_else(|| map.get("streamObj"))
}

fn room_id(map: &Map<String, Value>) -> Option<&Value> {
    map.get("roomSystemInfo").and_then(|info| info.get("id"))
}

fn message_stream_id(map: &Map<String, Value>) -> Option<&Value> {
    map.get("stream").and_then(|stream| stream.get("streamId"))
}

fn top_level_id(map: &Map<String, Value>) -> Option<&Value> {
    map.get("id")
}

impl<'a> StreamRef<'a> {
    /// The shape this reference is recognized as
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnrecognizedReference`] for JSON values that
    /// match no known shape.
    pub fn shape(&self) -> Result<ReferenceShape, StreamError> {
        Ok(match self {
            Self::Absent => ReferenceShape::Absent,
            Self::Id(_) => ReferenceShape::Id,
            Self::Structured(_) => ReferenceShape::Structured,
            Self::Descriptor(_) => ReferenceShape::Descriptor,
            Self::Chat(_) => ReferenceShape::Chat,
            Self::Room(_) => ReferenceShape::Room,
            Self::Message(_) => ReferenceShape::Message,
            Self::Json(value) => classify_json(value)?.0,
        })
    }

    /// Extract the stream identifier
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnrecognizedReference`] for JSON values that
    /// match no known shape.
    pub fn identifier(&self) -> Result<Option<StreamId>, StreamError> {
        match self {
            Self::Absent => Ok(None),
            Self::Id(id) => Ok(Some(StreamId::from(*id))),
            Self::Structured(reference) => Ok(reference.stream_obj.clone()),
            Self::Descriptor(descriptor) => Ok(Some(descriptor.id.clone())),
            Self::Chat(chat) => Ok(Some(chat.id.clone())),
            Self::Room(room) => Ok(Some(room.room_system_info.id.clone())),
            Self::Message(message) => Ok(Some(message.stream.stream_id.clone())),
            Self::Json(value) => {
                let (shape, id) = classify_json(value)?;
                match id {
                    // Only an absent value or an empty stream-obj means "no stream"
                    Value::Null
                        if matches!(shape, ReferenceShape::Absent | ReferenceShape::Structured) =>
                    {
                        Ok(None)
                    }
                    Value::String(id) => Ok(Some(StreamId::from(id.as_str()))),
                    other => Err(unrecognized(&format!(
                        "{shape} whose id is {}",
                        describe(other)
                    ))),
                }
            }
        }
    }
}

/// Resolve any stream reference to its canonical identifier
///
/// Pure and side-effect free. Absent references resolve to `Ok(None)`.
///
/// # Errors
///
/// Returns [`StreamError::UnrecognizedReference`] when the reference has no
/// known shape.
///
/// # Example
///
/// ```
/// use stream_core::model::ChatSession;
/// use stream_core::reference::resolve_identifier;
///
/// let chat = ChatSession { id: "C42".into() };
/// assert_eq!(resolve_identifier(&chat).unwrap().unwrap().as_str(), "C42");
/// assert_eq!(resolve_identifier("S1").unwrap().unwrap().as_str(), "S1");
/// ```
pub fn resolve_identifier<'a>(
    reference: impl Into<StreamRef<'a>>,
) -> Result<Option<StreamId>, StreamError> {
    reference.into().identifier()
}

/// Match a JSON value against the known shapes, returning the id slot
fn classify_json(value: &Value) -> Result<(ReferenceShape, &Value), StreamError> {
    match value {
        Value::Null => Ok((ReferenceShape::Absent, value)),
        Value::String(_) => Ok((ReferenceShape::Id, value)),
        Value::Object(map) => OBJECT_SHAPES
            .iter()
            .find_map(|(shape, matcher)| matcher(map).map(|id| (*shape, id)))
            .ok_or_else(|| unrecognized(&describe(value))),
        other => Err(unrecognized(&describe(other))),
    }
}

fn unrecognized(shape: &str) -> StreamError {
    tracing::error!(shape, "Unrecognized stream reference");
    StreamError::UnrecognizedReference {
        shape: shape.to_string(),
    }
}

/// Short human description of a JSON value's shape
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(items) => format!("an array of {} element(s)", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("an object with keys [{}]", keys.join(", "))
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl<'a> From<&'a str> for StreamRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for StreamRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id.as_str())
    }
}

impl<'a> From<&'a StreamId> for StreamRef<'a> {
    fn from(id: &'a StreamId) -> Self {
        Self::Id(id.as_str())
    }
}

impl<'a> From<&'a StructuredRef> for StreamRef<'a> {
    fn from(reference: &'a StructuredRef) -> Self {
        Self::Structured(reference)
    }
}

impl<'a> From<&'a NativeStreamDescriptor> for StreamRef<'a> {
    fn from(descriptor: &'a NativeStreamDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl<'a> From<&'a ChatSession> for StreamRef<'a> {
    fn from(chat: &'a ChatSession) -> Self {
        Self::Chat(chat)
    }
}

impl<'a> From<&'a RoomDetail> for StreamRef<'a> {
    fn from(room: &'a RoomDetail) -> Self {
        Self::Room(room)
    }
}

impl<'a> From<&'a NativeMessage> for StreamRef<'a> {
    fn from(message: &'a NativeMessage) -> Self {
        Self::Message(message)
    }
}

impl<'a> From<&'a Value> for StreamRef<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Json(value)
    }
}

impl<'a, T: Into<StreamRef<'a>>> From<Option<T>> for StreamRef<'a> {
    fn from(reference: Option<T>) -> Self {
        reference.map_or(Self::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageStream, RoomSystemInfo};
    use serde_json::json;

    fn id(value: &str) -> Option<StreamId> {
        Some(StreamId::from(value))
    }

    #[test]
    fn test_absent_resolves_to_none() {
        assert_eq!(resolve_identifier(StreamRef::Absent).unwrap(), None);
        assert_eq!(resolve_identifier(None::<&str>).unwrap(), None);
    }

    #[test]
    fn test_plain_identifier_is_unchanged() {
        assert_eq!(resolve_identifier("S1").unwrap(), id("S1"));
        let owned = String::from("S2");
        assert_eq!(resolve_identifier(&owned).unwrap(), id("S2"));
    }

    #[test]
    fn test_structured_reference_is_single_level() {
        let reference = StructuredRef::new("{\"stream-obj\":\"S3\"}");
        assert_eq!(
            resolve_identifier(&reference).unwrap(),
            id("{\"stream-obj\":\"S3\"}")
        );
        assert_eq!(resolve_identifier(&StructuredRef::default()).unwrap(), None);
    }

    #[test]
    fn test_native_shapes() {
        let descriptor = NativeStreamDescriptor {
            id: "D1".into(),
            ..Default::default()
        };
        let chat = ChatSession { id: "C42".into() };
        let room = RoomDetail {
            room_attributes: None,
            room_system_info: RoomSystemInfo {
                id: "R1".into(),
                ..Default::default()
            },
        };
        let message = NativeMessage {
            message_id: "M1".to_string(),
            stream: MessageStream {
                stream_id: "S9".into(),
                stream_type: Some("IM".to_string()),
            },
            ..Default::default()
        };

        assert_eq!(resolve_identifier(&descriptor).unwrap(), id("D1"));
        assert_eq!(resolve_identifier(&chat).unwrap(), id("C42"));
        assert_eq!(resolve_identifier(&room).unwrap(), id("R1"));
        assert_eq!(resolve_identifier(&message).unwrap(), id("S9"));
        assert_eq!(StreamRef::from(&room).shape().unwrap(), ReferenceShape::Room);
    }

    #[test]
    fn test_json_shapes_resolve_in_order() {
        let cases = [
            (json!(null), ReferenceShape::Absent, None),
            (json!("S1"), ReferenceShape::Id, id("S1")),
            (json!({"stream-obj": "S2"}), ReferenceShape::Structured, id("S2")),
            (json!({"streamObj": null}), ReferenceShape::Structured, None),
            (
                json!({"roomSystemInfo": {"id": "R1"}, "roomAttributes": {"name": "Eng"}}),
                ReferenceShape::Room,
                id("R1"),
            ),
            (
                json!({"messageId": "M1", "stream": {"streamId": "S3"}}),
                ReferenceShape::Message,
                id("S3"),
            ),
            (json!({"id": "C42"}), ReferenceShape::Descriptor, id("C42")),
        ];

        for (value, shape, expected) in cases {
            let reference = StreamRef::from(&value);
            assert_eq!(reference.shape().unwrap(), shape, "shape of {value}");
            assert_eq!(reference.identifier().unwrap(), expected, "id of {value}");
        }
    }

    #[test]
    fn test_unrecognized_json_is_a_defect() {
        for value in [
            json!(42),
            json!(["S1"]),
            json!({"name": "Eng"}),
            json!({"id": 7}),
            json!({"id": null}),
            json!({"roomSystemInfo": {"id": null}}),
            json!({"messageId": "m", "stream": {"streamId": null}}),
        ] {
            let err = resolve_identifier(&value).unwrap_err();
            assert!(err.is_defect(), "{value} should be a defect");
            assert!(matches!(err, StreamError::UnrecognizedReference { .. }));
        }
    }

    #[test]
    fn test_null_id_slot_is_not_absent() {
        let err = resolve_identifier(&json!({"roomSystemInfo": {"id": null}})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized stream reference: room detail whose id is null"
        );
        assert_eq!(resolve_identifier(&json!({"stream-obj": null})).unwrap(), None);
    }

    #[test]
    fn test_unrecognized_shape_is_described() {
        let err = resolve_identifier(&json!({"name": "Eng"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized stream reference: an object with keys [name]"
        );
    }
}
