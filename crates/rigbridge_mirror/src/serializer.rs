// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialization hook.
//!
//! The authoring side drives serialization; the mirror's only contribution
//! is the per-port record. For an instance snapshot that means reading the
//! live native attribute value back into the abstract model; a template
//! snapshot records the port type's default instead.

use crate::error::MirrorError;
use crate::state::{ConnectionKey, GraphKey, NodeKey, PortKey, StateMirror};
use rigbridge_graph::PortValue;
use rigbridge_scene::SceneHost;
use serde_json::{Map, Value};

/// What a snapshot captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    /// Live values as they currently are in the host scene
    Instance,
    /// Declared defaults, independent of scene state
    Template,
}

/// Produces the flat per-entity records consumed by the serialization
/// subsystem.
pub struct SceneSerializer<'a> {
    mirror: &'a StateMirror,
}

impl<'a> SceneSerializer<'a> {
    /// Create a serializer over a mirror.
    pub fn new(mirror: &'a StateMirror) -> Self {
        Self { mirror }
    }

    /// Record for a graph. Graphs carry no native state.
    pub fn serialize_graph(&self, key: impl Into<GraphKey>) -> Result<Map<String, Value>, MirrorError> {
        self.mirror.graph(key)?;
        Ok(Map::new())
    }

    /// Record for a node. The native projection is reconstructed from the
    /// abstract side on load, so nothing is recorded.
    pub fn serialize_node(&self, key: impl Into<NodeKey>) -> Result<Map<String, Value>, MirrorError> {
        self.mirror.node(key)?;
        Ok(Map::new())
    }

    /// Record for a connection. The wire itself is abstract state.
    pub fn serialize_connection(
        &self,
        key: impl Into<ConnectionKey>,
    ) -> Result<Map<String, Value>, MirrorError> {
        self.mirror.connection(key)?;
        Ok(Map::new())
    }

    /// Record for a port: its current native value, or its default for a
    /// template snapshot.
    pub fn serialize_port(
        &self,
        host: &dyn SceneHost,
        key: impl Into<PortKey>,
        snapshot: Snapshot,
    ) -> Result<Map<String, Value>, MirrorError> {
        let port = self.mirror.port(key)?;
        let value = match snapshot {
            Snapshot::Template => PortValue::default_for(port.port_type()),
            Snapshot::Instance => {
                let plug = self.mirror.node(port.node())?.plug_for(port);
                port.abstract_value(&host.get_attr(&plug)?)?
            }
        };
        let mut record = Map::new();
        record.insert("value".to_string(), serde_json::to_value(value)?);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_graph::{
        GraphEvent, NodeId, NodeInfo, PortDirection, PortId, PortInfo, PortType,
    };
    use rigbridge_scene::{MemoryScene, SceneValue, SetOptions};

    fn mirrored_port() -> (MemoryScene, StateMirror, PortInfo) {
        let mut scene = MemoryScene::new();
        let mut mirror = StateMirror::default();
        let node = NodeInfo {
            id: NodeId::new(),
            name: "n1".to_string(),
            node_type: "Group".to_string(),
            library: None,
        };
        mirror
            .handle_event(&mut scene, &GraphEvent::NodeCreated(node.clone()))
            .unwrap();
        let port = PortInfo {
            id: PortId::new(),
            node: node.id,
            name: "amount".to_string(),
            direction: PortDirection::Input,
            port_type: PortType::Float,
            parent: None,
        };
        mirror
            .handle_event(&mut scene, &GraphEvent::PortCreated(port.clone()))
            .unwrap();
        (scene, mirror, port)
    }

    #[test]
    fn test_instance_snapshot_reads_live_value() {
        let (mut scene, mirror, port) = mirrored_port();
        let plug = {
            let mirrored = mirror.port(port.id).unwrap();
            mirror.node(mirrored.node()).unwrap().plug_for(mirrored)
        };
        scene
            .set_attr(&plug, SceneValue::Float(3.75), SetOptions::default())
            .unwrap();

        let serializer = SceneSerializer::new(&mirror);
        let record = serializer
            .serialize_port(&scene, port.id, Snapshot::Instance)
            .unwrap();
        assert_eq!(record["value"], serde_json::json!({"Float": 3.75}));
    }

    #[test]
    fn test_template_snapshot_uses_default() {
        let (mut scene, mirror, port) = mirrored_port();
        let plug = {
            let mirrored = mirror.port(port.id).unwrap();
            mirror.node(mirrored.node()).unwrap().plug_for(mirrored)
        };
        scene
            .set_attr(&plug, SceneValue::Float(3.75), SetOptions::default())
            .unwrap();

        let serializer = SceneSerializer::new(&mirror);
        let record = serializer
            .serialize_port(&scene, port.id, Snapshot::Template)
            .unwrap();
        assert_eq!(record["value"], serde_json::json!({"Float": 0.0}));
    }

    #[test]
    fn test_other_records_are_empty() {
        let (_scene, mirror, port) = mirrored_port();
        let serializer = SceneSerializer::new(&mirror);
        let node = mirror.port(port.id).unwrap().node();
        assert!(serializer.serialize_node(node).unwrap().is_empty());
    }
}
