//! Strongly typed identifier wrappers around engine-native string ids.
//!
//! The traffic engine is the authority on naming: vehicles, edges, and POIs
//! arrive as opaque strings over its RPC surface, so the wrappers hold a
//! `String` rather than a dense integer.  Wrapping them keeps an `AgentId`
//! from ever being passed where an `EdgeId` is expected and gives every map
//! in the control core an explicit key type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around an engine-native string.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A synthetic traveler.  The same id names the itinerary record before
    /// spawn and the live vehicle once the engine has spawned it.
    pub struct AgentId;
}

string_id! {
    /// An engine-native directed road segment.  Ids beginning with `:` are
    /// engine-internal junction edges and never appear in stop chains.
    pub struct EdgeId;
}

string_id! {
    /// A point-of-interest identifier from the static catalog.
    pub struct PoiId;
}

impl EdgeId {
    /// Engine-internal edges (junction connectors) carry a `:` prefix and
    /// cannot be routed to or stopped on.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with(':')
    }
}
