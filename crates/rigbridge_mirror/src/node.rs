// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node adapters.
//!
//! A node adapter owns the native node (or nodes) projecting one abstract
//! node. The default [`GroupNode`] keeps a separate input and output
//! native node; [`SimpleNode`] coincides both on one node. Specialized
//! adapters for library types come out of the [`AdapterRegistry`].

use crate::error::MirrorError;
use crate::port::MirrorPort;
use rigbridge_graph::{NodeId, NodeInfo, PortDirection, PortId};
use rigbridge_scene::{NodeHandle, Plug, SceneHost};
use std::collections::HashMap;

/// Record of one port registered on an adapter.
#[derive(Debug, Clone)]
pub struct RegisteredPort {
    /// Mirrored port id
    pub id: PortId,
    /// Native node carrying the attribute
    pub node: NodeHandle,
    /// Native attribute name
    pub attr: String,
    /// Whether the adapter created the attribute (and so owns it)
    pub created: bool,
}

/// Projects one abstract node onto native scene nodes.
pub trait NodeAdapter {
    /// Mirrored node id.
    fn id(&self) -> NodeId;

    /// Current name.
    fn name(&self) -> &str;

    /// Native node receiving input-direction attributes.
    fn input_node(&self) -> NodeHandle;

    /// Native node receiving output-direction attributes.
    fn output_node(&self) -> NodeHandle;

    /// Rename the native nodes after the abstract node was renamed.
    fn set_name(&mut self, host: &mut dyn SceneHost, name: &str) -> Result<(), MirrorError>;

    /// Ports registered on this adapter, in registration order.
    fn registered_ports(&mut self) -> &mut Vec<RegisteredPort>;

    /// Native attribute name for a port name.
    ///
    /// Adapters mapping ports onto pre-existing native attributes override
    /// this; the default is the port name itself.
    fn attr_name(&self, port_name: &str) -> String {
        port_name.to_string()
    }

    /// Ensure the native attribute for a port exists and record the port.
    fn register_port(
        &mut self,
        host: &mut dyn SceneHost,
        port: &MirrorPort,
        parent_attr: Option<&str>,
    ) -> Result<(), MirrorError> {
        let node = match port.direction() {
            PortDirection::Input => self.input_node(),
            PortDirection::Output => self.output_node(),
        };
        let attr = self.attr_name(port.name());
        let mut created = false;
        if !host.attr_exists(node, &attr) {
            host.add_attr(node, port.attr_spec(&attr, parent_attr))?;
            created = true;
        }
        self.registered_ports().push(RegisteredPort {
            id: port.id(),
            node,
            attr,
            created,
        });
        Ok(())
    }

    /// Drop a registered port, removing its attribute if the adapter
    /// created it.
    fn unregister_port(&mut self, host: &mut dyn SceneHost, id: PortId) -> Result<(), MirrorError> {
        let ports = self.registered_ports();
        let Some(position) = ports.iter().position(|port| port.id == id) else {
            return Ok(());
        };
        let port = ports.remove(position);
        if port.created && host.node_exists(port.node) && host.attr_exists(port.node, &port.attr) {
            host.remove_attr(port.node, &port.attr)?;
        }
        Ok(())
    }

    /// Native plug backing a port of this node.
    fn plug_for(&self, port: &MirrorPort) -> Plug {
        let node = match port.direction() {
            PortDirection::Input => self.input_node(),
            PortDirection::Output => self.output_node(),
        };
        Plug::new(node, self.attr_name(port.name()))
    }

    /// Delete the owned native nodes.
    fn delete(&mut self, host: &mut dyn SceneHost) -> Result<(), MirrorError> {
        let input = self.input_node();
        let output = self.output_node();
        host.delete(input)?;
        if output != input {
            host.delete(output)?;
        }
        Ok(())
    }
}

/// Adapter backed by a single native node.
#[derive(Debug)]
pub struct SimpleNode {
    id: NodeId,
    name: String,
    node: NodeHandle,
    ports: Vec<RegisteredPort>,
}

impl SimpleNode {
    /// Native node type created for simple adapters.
    pub const NODE_TYPE: &'static str = "network";

    /// Create the native node for an abstract node.
    pub fn create(host: &mut dyn SceneHost, info: &NodeInfo) -> Result<Self, MirrorError> {
        let node = host.create_node(Self::NODE_TYPE, &info.name, None)?;
        Ok(Self {
            id: info.id,
            name: info.name.clone(),
            node,
            ports: Vec::new(),
        })
    }

    /// Boxing factory for the adapter registry.
    pub fn factory(
        host: &mut dyn SceneHost,
        info: &NodeInfo,
    ) -> Result<Box<dyn NodeAdapter>, MirrorError> {
        Ok(Box::new(Self::create(host, info)?))
    }
}

impl NodeAdapter for SimpleNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn input_node(&self) -> NodeHandle {
        self.node
    }

    fn output_node(&self) -> NodeHandle {
        self.node
    }

    fn set_name(&mut self, host: &mut dyn SceneHost, name: &str) -> Result<(), MirrorError> {
        self.name = host.rename(self.node, name)?;
        Ok(())
    }

    fn registered_ports(&mut self) -> &mut Vec<RegisteredPort> {
        &mut self.ports
    }
}

/// Default adapter: a native node pair, inputs on `<name>_IN`, outputs on
/// `<name>_OUT`.
#[derive(Debug)]
pub struct GroupNode {
    id: NodeId,
    name: String,
    input: NodeHandle,
    output: NodeHandle,
    ports: Vec<RegisteredPort>,
}

impl GroupNode {
    /// Native node type created for group adapters.
    pub const NODE_TYPE: &'static str = "network";

    /// Create the native node pair for an abstract node.
    pub fn create(host: &mut dyn SceneHost, info: &NodeInfo) -> Result<Self, MirrorError> {
        let input = host.create_node(Self::NODE_TYPE, &format!("{}_IN", info.name), None)?;
        let output = host.create_node(Self::NODE_TYPE, &format!("{}_OUT", info.name), None)?;
        Ok(Self {
            id: info.id,
            name: info.name.clone(),
            input,
            output,
            ports: Vec::new(),
        })
    }

    /// Boxing factory for the adapter registry.
    pub fn factory(
        host: &mut dyn SceneHost,
        info: &NodeInfo,
    ) -> Result<Box<dyn NodeAdapter>, MirrorError> {
        Ok(Box::new(Self::create(host, info)?))
    }
}

impl NodeAdapter for GroupNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn input_node(&self) -> NodeHandle {
        self.input
    }

    fn output_node(&self) -> NodeHandle {
        self.output
    }

    fn set_name(&mut self, host: &mut dyn SceneHost, name: &str) -> Result<(), MirrorError> {
        host.rename(self.input, &format!("{name}_IN"))?;
        host.rename(self.output, &format!("{name}_OUT"))?;
        self.name = name.to_string();
        Ok(())
    }

    fn registered_ports(&mut self) -> &mut Vec<RegisteredPort> {
        &mut self.ports
    }
}

/// Factory producing a specialized adapter for an abstract node.
pub type AdapterFactory =
    fn(&mut dyn SceneHost, &NodeInfo) -> Result<Box<dyn NodeAdapter>, MirrorError>;

/// Registry of specialized adapters, keyed by `(library, type)`.
///
/// Populated explicitly at startup; resolution happens once per node
/// creation. Types without an entry fall back to [`GroupNode`].
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<(String, String), AdapterFactory>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a library type.
    pub fn register(&mut self, library: &str, node_type: &str, factory: AdapterFactory) {
        self.factories
            .insert((library.to_string(), node_type.to_string()), factory);
    }

    /// Look up the factory for a library type.
    pub fn resolve(&self, library: &str, node_type: &str) -> Option<AdapterFactory> {
        self.factories
            .get(&(library.to_string(), node_type.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_graph::{PortInfo, PortType};
    use rigbridge_scene::MemoryScene;

    fn node_info(name: &str) -> NodeInfo {
        NodeInfo {
            id: NodeId::new(),
            name: name.to_string(),
            node_type: "Group".to_string(),
            library: None,
        }
    }

    fn float_port(node: NodeId, name: &str, direction: PortDirection) -> MirrorPort {
        MirrorPort::from_info(&PortInfo {
            id: PortId::new(),
            node,
            name: name.to_string(),
            direction,
            port_type: PortType::Float,
            parent: None,
        })
    }

    #[test]
    fn test_group_node_pair() {
        let mut scene = MemoryScene::new();
        let mut adapter = GroupNode::create(&mut scene, &node_info("arm")).unwrap();
        assert_eq!(scene.node_name(adapter.input_node()).unwrap(), "arm_IN");
        assert_eq!(scene.node_name(adapter.output_node()).unwrap(), "arm_OUT");

        adapter.set_name(&mut scene, "leg").unwrap();
        assert_eq!(scene.node_name(adapter.input_node()).unwrap(), "leg_IN");
        assert_eq!(scene.node_name(adapter.output_node()).unwrap(), "leg_OUT");
    }

    #[test]
    fn test_ports_land_on_direction_node() {
        let mut scene = MemoryScene::new();
        let info = node_info("arm");
        let mut adapter = GroupNode::create(&mut scene, &info).unwrap();

        let input = float_port(info.id, "amount", PortDirection::Input);
        let output = float_port(info.id, "result", PortDirection::Output);
        adapter.register_port(&mut scene, &input, None).unwrap();
        adapter.register_port(&mut scene, &output, None).unwrap();

        assert!(scene.attr_exists(adapter.input_node(), "amount"));
        assert!(!scene.attr_exists(adapter.input_node(), "result"));
        assert!(scene.attr_exists(adapter.output_node(), "result"));
    }

    #[test]
    fn test_unregister_removes_owned_attribute() {
        let mut scene = MemoryScene::new();
        let info = node_info("arm");
        let mut adapter = GroupNode::create(&mut scene, &info).unwrap();
        let port = float_port(info.id, "amount", PortDirection::Input);
        adapter.register_port(&mut scene, &port, None).unwrap();
        assert!(scene.attr_exists(adapter.input_node(), "amount"));

        adapter.unregister_port(&mut scene, port.id()).unwrap();
        assert!(!scene.attr_exists(adapter.input_node(), "amount"));
    }

    #[test]
    fn test_pre_existing_attribute_is_not_owned() {
        let mut scene = MemoryScene::new();
        let info = node_info("arm");
        let mut adapter = SimpleNode::create(&mut scene, &info).unwrap();
        scene
            .add_attr(
                adapter.input_node(),
                rigbridge_scene::AttrSpec::new("amount", rigbridge_scene::AttrKind::Double),
            )
            .unwrap();

        let port = float_port(info.id, "amount", PortDirection::Input);
        adapter.register_port(&mut scene, &port, None).unwrap();
        adapter.unregister_port(&mut scene, port.id()).unwrap();
        // The attribute pre-existed, so it must survive the port.
        assert!(scene.attr_exists(adapter.input_node(), "amount"));
    }

    #[test]
    fn test_simple_node_delete() {
        let mut scene = MemoryScene::new();
        let mut adapter = SimpleNode::create(&mut scene, &node_info("solo")).unwrap();
        let handle = adapter.input_node();
        adapter.delete(&mut scene).unwrap();
        assert!(!scene.node_exists(handle));
    }

    #[test]
    fn test_registry_resolution() {
        let mut registry = AdapterRegistry::new();
        registry.register("CreatureLibrary", "Joint", SimpleNode::factory);
        assert!(registry.resolve("CreatureLibrary", "Joint").is_some());
        assert!(registry.resolve("CreatureLibrary", "Control").is_none());
    }
}
