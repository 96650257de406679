//! Stream Types
//!
//! The closed set of stream kinds a pod can report. The platform declares
//! its type constants once; [`StreamTypes`] is the immutable set derived
//! from that declaration at startup and shared for the rest of the process.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type constants declared by the pod platform, in declaration order
pub const PLATFORM_STREAM_TYPES: &[&str] = &["IM", "MIM", "ROOM", "POST"];

/// Kind of messaging channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamType {
    /// 1:1 instant message
    Im,
    /// Multi-party instant message (group chat)
    Mim,
    /// Chat room
    Room,
    /// Broadcast wall
    Post,
}

impl StreamType {
    /// Every stream type, in platform declaration order
    pub const ALL: [StreamType; 4] = [Self::Im, Self::Mim, Self::Room, Self::Post];

    /// Symbolic name used on the wire
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Im => "IM",
            Self::Mim => "MIM",
            Self::Room => "ROOM",
            Self::Post => "POST",
        }
    }

    /// Look up a type by its exact symbolic name
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.symbol() == symbol)
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A type symbol that is not part of the declared set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stream type symbol: {0}")]
pub struct UnknownStreamType(pub String);

impl FromStr for StreamType {
    type Err = UnknownStreamType;

    /// Parses case-insensitively (`room` and `ROOM` are equivalent)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(&s.trim().to_ascii_uppercase())
            .ok_or_else(|| UnknownStreamType(s.to_string()))
    }
}

/// Immutable set of stream types derived from a platform declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamTypes {
    types: Vec<StreamType>,
}

impl StreamTypes {
    /// Derive the set from declared type names
    ///
    /// Duplicates collapse to their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStreamType`] for a name with no [`StreamType`]
    /// counterpart.
    pub fn from_names<I, S>(names: I) -> Result<Self, UnknownStreamType>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types = Vec::new();
        for name in names {
            let name = name.as_ref();
            let stream_type = StreamType::from_symbol(name)
                .ok_or_else(|| UnknownStreamType(name.to_string()))?;
            if !types.contains(&stream_type) {
                types.push(stream_type);
            }
        }
        Ok(Self { types })
    }

    /// The process-wide set derived from [`PLATFORM_STREAM_TYPES`]
    ///
    /// Derived on first use and never refreshed.
    #[must_use]
    pub fn platform() -> &'static StreamTypes {
        static PLATFORM: OnceLock<StreamTypes> = OnceLock::new();
        PLATFORM.get_or_init(|| {
            let types = PLATFORM_STREAM_TYPES
                .iter()
                .filter_map(|name| StreamType::from_symbol(name))
                .collect();
            tracing::debug!(?types, "Derived platform stream types");
            StreamTypes { types }
        })
    }

    /// Map a reported symbol into the set
    ///
    /// Returns `None` when the symbol is unknown or not declared.
    #[must_use]
    pub fn lookup(&self, symbol: &str) -> Option<StreamType> {
        StreamType::from_symbol(symbol).filter(|t| self.contains(*t))
    }

    /// Whether the set contains a type
    #[must_use]
    pub fn contains(&self, stream_type: StreamType) -> bool {
        self.types.contains(&stream_type)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = StreamType> + '_ {
        self.types.iter().copied()
    }

    /// Number of declared types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing was declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for StreamTypes {
    fn default() -> Self {
        Self::platform().clone()
    }
}
