// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component trees consumed by the rig builder.
//!
//! A component describes one authored unit: its typed ports with their
//! current values, its sub-components, and the connections between ports of
//! its direct children (or between a child and the component itself).

use crate::port::{PortDirection, PortType, PortValue};
use serde::{Deserialize, Serialize};

/// A typed port on a component, with its authored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentPort {
    /// Port name, unique on the component
    pub name: String,
    /// Direction
    pub direction: PortDirection,
    /// Value type
    pub port_type: PortType,
    /// Authored value
    pub value: PortValue,
}

impl ComponentPort {
    /// Create a port carrying the neutral value for its type.
    pub fn new(name: impl Into<String>, direction: PortDirection, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            direction,
            port_type,
            value: PortValue::default_for(port_type),
        }
    }

    /// Set the authored value.
    pub fn with_value(mut self, value: PortValue) -> Self {
        self.value = value;
        self
    }
}

/// One endpoint of a cross-component connection.
///
/// The component is referenced by name; it is either a direct child of the
/// enclosing component or the enclosing component itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRef {
    /// Component name
    pub component: String,
    /// Port name on that component
    pub port: String,
}

impl PortRef {
    /// Reference a port by component and port name.
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }
}

/// A connection between ports of a component's children, or between a child
/// and the component itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConnection {
    /// Driving endpoint
    pub source: PortRef,
    /// Driven endpoint
    pub target: PortRef,
}

/// One authored component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Component name, unique among its siblings
    pub name: String,
    /// Authoring type name
    pub component_type: String,
    /// Library the type comes from, if any
    pub library: Option<String>,
    /// Typed ports
    pub ports: Vec<ComponentPort>,
    /// Sub-components
    pub children: Vec<Component>,
    /// Connections between children (and this component's own ports)
    pub connections: Vec<ComponentConnection>,
}

impl Component {
    /// Create an empty component of a type.
    pub fn new(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            library: None,
            ports: Vec::new(),
            children: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Set the source library.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Add a port.
    pub fn with_port(mut self, port: ComponentPort) -> Self {
        self.ports.push(port);
        self
    }

    /// Add a sub-component.
    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Record a connection between child ports.
    pub fn with_connection(mut self, source: PortRef, target: PortRef) -> Self {
        self.connections.push(ComponentConnection { source, target });
        self
    }

    /// Find a port by name.
    pub fn port(&self, name: &str) -> Option<&ComponentPort> {
        self.ports.iter().find(|port| port.name == name)
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children.iter().find(|child| child.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_builder() {
        let component = Component::new("arm", "Arm")
            .with_library("CreatureLibrary")
            .with_port(ComponentPort::new(
                "length",
                PortDirection::Input,
                PortType::Float,
            ))
            .with_child(Component::new("upper", "Segment"))
            .with_connection(PortRef::new("arm", "length"), PortRef::new("upper", "size"));

        assert_eq!(component.library.as_deref(), Some("CreatureLibrary"));
        assert!(component.port("length").is_some());
        assert!(component.child("upper").is_some());
        assert_eq!(component.connections.len(), 1);
    }
}
