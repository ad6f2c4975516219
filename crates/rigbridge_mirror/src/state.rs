// SPDX-License-Identifier: MIT OR Apache-2.0
//! The top-level synchronization controller.
//!
//! [`StateMirror`] owns the four identity maps and consumes every
//! lifecycle notification from the authoring side. Each map entry exists
//! exactly while the corresponding abstract entity exists: handlers insert
//! fully built adapters and remove them on deletion, so a lookup miss is
//! a desync between the two worlds and always raises.

use crate::connection::MirrorConnection;
use crate::error::{EntityKind, MirrorError};
use crate::graph::MirrorGraph;
use crate::node::{AdapterRegistry, GroupNode, NodeAdapter};
use crate::port::MirrorPort;
use indexmap::IndexMap;
use rigbridge_graph::{
    ConnectionId, ConnectionInfo, GraphEvent, GraphId, GraphInfo, NodeId, NodeInfo, PortId,
    PortInfo,
};
use rigbridge_scene::SceneHost;

/// Lookup key for the graph map.
#[derive(Debug, Clone, Copy)]
pub struct GraphKey(GraphId);

impl From<GraphId> for GraphKey {
    fn from(id: GraphId) -> Self {
        Self(id)
    }
}

impl From<&GraphInfo> for GraphKey {
    fn from(info: &GraphInfo) -> Self {
        Self(info.id)
    }
}

impl From<&MirrorGraph> for GraphKey {
    fn from(adapter: &MirrorGraph) -> Self {
        Self(adapter.id())
    }
}

/// Lookup key for the node map.
#[derive(Debug, Clone, Copy)]
pub struct NodeKey(NodeId);

impl From<NodeId> for NodeKey {
    fn from(id: NodeId) -> Self {
        Self(id)
    }
}

impl From<&NodeInfo> for NodeKey {
    fn from(info: &NodeInfo) -> Self {
        Self(info.id)
    }
}

impl From<&dyn NodeAdapter> for NodeKey {
    fn from(adapter: &dyn NodeAdapter) -> Self {
        Self(adapter.id())
    }
}

/// Lookup key for the port map.
#[derive(Debug, Clone, Copy)]
pub struct PortKey(PortId);

impl From<PortId> for PortKey {
    fn from(id: PortId) -> Self {
        Self(id)
    }
}

impl From<&PortInfo> for PortKey {
    fn from(info: &PortInfo) -> Self {
        Self(info.id)
    }
}

impl From<&MirrorPort> for PortKey {
    fn from(adapter: &MirrorPort) -> Self {
        Self(adapter.id())
    }
}

/// Lookup key for the connection map.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionKey(ConnectionId);

impl From<ConnectionId> for ConnectionKey {
    fn from(id: ConnectionId) -> Self {
        Self(id)
    }
}

impl From<&ConnectionInfo> for ConnectionKey {
    fn from(info: &ConnectionInfo) -> Self {
        Self(info.id)
    }
}

impl From<&MirrorConnection> for ConnectionKey {
    fn from(adapter: &MirrorConnection) -> Self {
        Self(adapter.id())
    }
}

/// Registry of adapters mirroring the authoring graph into the host.
pub struct StateMirror {
    graphs: IndexMap<GraphId, MirrorGraph>,
    nodes: IndexMap<NodeId, Box<dyn NodeAdapter>>,
    ports: IndexMap<PortId, MirrorPort>,
    connections: IndexMap<ConnectionId, MirrorConnection>,
    adapters: AdapterRegistry,
}

impl StateMirror {
    /// Create a mirror resolving specialized adapters from a registry.
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            graphs: IndexMap::new(),
            nodes: IndexMap::new(),
            ports: IndexMap::new(),
            connections: IndexMap::new(),
            adapters,
        }
    }

    /// Dispatch one authoring-side notification.
    pub fn handle_event(
        &mut self,
        host: &mut dyn SceneHost,
        event: &GraphEvent,
    ) -> Result<(), MirrorError> {
        match event {
            GraphEvent::GraphCreated(info) => self.on_graph_created(info),
            GraphEvent::GraphDeleted(id) => self.on_graph_deleted(*id),
            GraphEvent::NodeCreated(info) => self.on_node_created(host, info),
            GraphEvent::NodeDeleted(id) => self.on_node_deleted(host, *id),
            GraphEvent::NodeRenamed { node, name } => self.on_node_renamed(host, *node, name),
            GraphEvent::PortCreated(info) => self.on_port_created(host, info),
            GraphEvent::PortDeleted(id) => self.on_port_deleted(host, *id),
            GraphEvent::ConnectionCreated(info) => self.on_connection_created(host, info),
            GraphEvent::ConnectionDeleted(id) => self.on_connection_deleted(host, *id),
            GraphEvent::SelectionChanged(ids) => self.on_selection_changed(host, ids),
        }
    }

    /// Look up a graph adapter.
    pub fn graph(&self, key: impl Into<GraphKey>) -> Result<&MirrorGraph, MirrorError> {
        let GraphKey(id) = key.into();
        self.graphs.get(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Graph,
            id: id.0,
        })
    }

    /// Look up a node adapter.
    pub fn node(&self, key: impl Into<NodeKey>) -> Result<&dyn NodeAdapter, MirrorError> {
        let NodeKey(id) = key.into();
        self.nodes
            .get(&id)
            .map(|adapter| &**adapter)
            .ok_or(MirrorError::Desync {
                kind: EntityKind::Node,
                id: id.0,
            })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Box<dyn NodeAdapter>, MirrorError> {
        self.nodes.get_mut(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Node,
            id: id.0,
        })
    }

    /// Look up a port adapter.
    pub fn port(&self, key: impl Into<PortKey>) -> Result<&MirrorPort, MirrorError> {
        let PortKey(id) = key.into();
        self.ports.get(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Port,
            id: id.0,
        })
    }

    /// Look up a connection adapter.
    pub fn connection(
        &self,
        key: impl Into<ConnectionKey>,
    ) -> Result<&MirrorConnection, MirrorError> {
        let ConnectionKey(id) = key.into();
        self.connections.get(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Connection,
            id: id.0,
        })
    }

    /// Number of mirrored graphs.
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    /// Number of mirrored nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of mirrored ports.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Number of mirrored connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn on_graph_created(&mut self, info: &GraphInfo) -> Result<(), MirrorError> {
        self.graphs.insert(info.id, MirrorGraph::from_info(info));
        tracing::debug!(graph = %info.id, "mirrored graph created");
        Ok(())
    }

    fn on_graph_deleted(&mut self, id: GraphId) -> Result<(), MirrorError> {
        self.graphs
            .shift_remove(&id)
            .ok_or(MirrorError::Desync {
                kind: EntityKind::Graph,
                id: id.0,
            })?;
        tracing::debug!(graph = %id, "mirrored graph deleted");
        Ok(())
    }

    /// Resolve the adapter class for a node and build it.
    ///
    /// Library types with a registered factory get their specialized
    /// adapter; everything else is mirrored by the generic group adapter.
    fn on_node_created(
        &mut self,
        host: &mut dyn SceneHost,
        info: &NodeInfo,
    ) -> Result<(), MirrorError> {
        let factory = info
            .library
            .as_deref()
            .and_then(|library| self.adapters.resolve(library, &info.node_type));
        let adapter: Box<dyn NodeAdapter> = match factory {
            Some(factory) => factory(host, info)?,
            None => Box::new(GroupNode::create(host, info)?),
        };
        self.nodes.insert(info.id, adapter);
        tracing::debug!(node = %info.id, name = %info.name, "mirrored node created");
        Ok(())
    }

    fn on_node_deleted(&mut self, host: &mut dyn SceneHost, id: NodeId) -> Result<(), MirrorError> {
        let mut adapter = self.nodes.shift_remove(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Node,
            id: id.0,
        })?;
        adapter.delete(host)?;
        tracing::debug!(node = %id, "mirrored node deleted");
        Ok(())
    }

    fn on_node_renamed(
        &mut self,
        host: &mut dyn SceneHost,
        id: NodeId,
        name: &str,
    ) -> Result<(), MirrorError> {
        self.node_mut(id)?.set_name(host, name)?;
        Ok(())
    }

    fn on_port_created(
        &mut self,
        host: &mut dyn SceneHost,
        info: &PortInfo,
    ) -> Result<(), MirrorError> {
        let port = MirrorPort::from_info(info);
        let parent_attr = match info.parent {
            Some(parent) => Some(self.port(parent)?.name().to_string()),
            None => None,
        };
        let adapter = self.node_mut(info.node)?;
        adapter.register_port(host, &port, parent_attr.as_deref())?;
        self.ports.insert(info.id, port);
        tracing::debug!(port = %info.id, name = %info.name, "mirrored port created");
        Ok(())
    }

    /// Remove the port map entry; the owning adapter is responsible for
    /// the native attribute cleanup.
    fn on_port_deleted(&mut self, host: &mut dyn SceneHost, id: PortId) -> Result<(), MirrorError> {
        let port = self.ports.shift_remove(&id).ok_or(MirrorError::Desync {
            kind: EntityKind::Port,
            id: id.0,
        })?;
        self.node_mut(port.node())?.unregister_port(host, id)?;
        tracing::debug!(port = %id, "mirrored port deleted");
        Ok(())
    }

    fn on_connection_created(
        &mut self,
        host: &mut dyn SceneHost,
        info: &ConnectionInfo,
    ) -> Result<(), MirrorError> {
        let source_plug = {
            let port = self.port(info.source)?;
            self.node(port.node())?.plug_for(port)
        };
        let target_plug = {
            let port = self.port(info.target)?;
            self.node(port.node())?.plug_for(port)
        };
        let connection =
            MirrorConnection::new(info.id, info.source, info.target, source_plug, target_plug);
        connection.build(host)?;
        self.connections.insert(info.id, connection);
        tracing::debug!(connection = %info.id, "mirrored connection created");
        Ok(())
    }

    fn on_connection_deleted(
        &mut self,
        host: &mut dyn SceneHost,
        id: ConnectionId,
    ) -> Result<(), MirrorError> {
        let connection = self
            .connections
            .shift_remove(&id)
            .ok_or(MirrorError::Desync {
                kind: EntityKind::Connection,
                id: id.0,
            })?;
        connection.remove(host)?;
        tracing::debug!(connection = %id, "mirrored connection deleted");
        Ok(())
    }

    /// Translate abstract node ids into native input nodes and select them.
    fn on_selection_changed(
        &mut self,
        host: &mut dyn SceneHost,
        ids: &[NodeId],
    ) -> Result<(), MirrorError> {
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            handles.push(self.node(*id)?.input_node());
        }
        host.select(&handles)?;
        Ok(())
    }
}

impl Default for StateMirror {
    fn default() -> Self {
        Self::new(AdapterRegistry::new())
    }
}
