// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle notifications fired by the authoring graph.

use crate::id::{ConnectionId, GraphId, NodeId, PortId};
use crate::port::{PortDirection, PortType};
use serde::{Deserialize, Serialize};

/// Metadata carried by a graph creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInfo {
    /// Graph id
    pub id: GraphId,
}

/// Metadata carried by a node creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node id
    pub id: NodeId,
    /// Node name
    pub name: String,
    /// Authoring type name of the node
    pub node_type: String,
    /// Library the node type comes from, if any
    pub library: Option<String>,
}

/// Metadata carried by a port creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    /// Port id
    pub id: PortId,
    /// Owning node id
    pub node: NodeId,
    /// Port name
    pub name: String,
    /// Direction
    pub direction: PortDirection,
    /// Value type
    pub port_type: PortType,
    /// Parent port for children of compound ports
    pub parent: Option<PortId>,
}

/// Metadata carried by a connection creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection id
    pub id: ConnectionId,
    /// Source port id
    pub source: PortId,
    /// Target port id
    pub target: PortId,
}

/// One notification from the authoring side.
///
/// Structural ordering is guaranteed by the sender: creations arrive
/// parent-before-children (a node before its ports, ports before their
/// connections) and deletions children-before-parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphEvent {
    /// A graph was created
    GraphCreated(GraphInfo),
    /// A graph was deleted
    GraphDeleted(GraphId),
    /// A node was created
    NodeCreated(NodeInfo),
    /// A node was deleted
    NodeDeleted(NodeId),
    /// A node was renamed
    NodeRenamed {
        /// Renamed node
        node: NodeId,
        /// New name
        name: String,
    },
    /// A port was registered on a node
    PortCreated(PortInfo),
    /// A port was removed from its node
    PortDeleted(PortId),
    /// A connection was created between two ports
    ConnectionCreated(ConnectionInfo),
    /// A connection was removed
    ConnectionDeleted(ConnectionId),
    /// The presentation layer changed the node selection
    SelectionChanged(Vec<NodeId>),
}
