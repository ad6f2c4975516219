// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stable identifiers for authoring graph entities.
//!
//! Ids are assigned at creation and never reused; the bridge keys every
//! mirror map on them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a graph
    GraphId
}

entity_id! {
    /// Unique identifier for a node
    NodeId
}

entity_id! {
    /// Unique identifier for a port
    PortId
}

entity_id! {
    /// Unique identifier for a connection
    ConnectionId
}
