// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types of the mirror.

use rigbridge_graph::PortType;
use rigbridge_scene::SceneError;
use uuid::Uuid;

/// Kind of mirrored entity, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Graph adapter map
    Graph,
    /// Node adapter map
    Node,
    /// Port adapter map
    Port,
    /// Connection adapter map
    Connection,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Port => "port",
            Self::Connection => "connection",
        };
        f.write_str(name)
    }
}

/// Error from mirror operations.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// An id is missing from its identity map: the mirror and the
    /// authoring graph have diverged. Always fatal.
    #[error("{kind} {id} is not tracked by the mirror")]
    Desync {
        /// Which map missed
        kind: EntityKind,
        /// The id that failed to resolve
        id: Uuid,
    },

    /// A host command failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A native value does not fit the port's abstract type
    #[error("a {got} attribute value does not fit a {expected:?} port")]
    Value {
        /// The port's abstract type
        expected: PortType,
        /// Kind of the native value
        got: &'static str,
    },

    /// A snapshot record failed to serialize
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
