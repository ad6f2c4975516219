// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port adapter.

use crate::error::MirrorError;
use rigbridge_graph::{NodeId, PortDirection, PortId, PortInfo, PortType, PortValue};
use rigbridge_scene::{AttrKind, AttrSpec, SceneValue};
use uuid::Uuid;

/// Mirror-side representation of one abstract port.
///
/// A port references its owning node adapter and describes the native
/// attribute that backs it; the attribute itself lives on the node
/// adapter's input or output native node, depending on direction.
#[derive(Debug, Clone)]
pub struct MirrorPort {
    id: PortId,
    node: NodeId,
    name: String,
    direction: PortDirection,
    port_type: PortType,
    parent: Option<PortId>,
}

impl MirrorPort {
    /// Build the adapter for a created port.
    pub fn from_info(info: &PortInfo) -> Self {
        Self {
            id: info.id,
            node: info.node,
            name: info.name.clone(),
            direction: info.direction,
            port_type: info.port_type,
            parent: info.parent,
        }
    }

    /// Mirrored port id.
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Owning node id.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Abstract value type.
    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    /// Parent port, for children of compound ports.
    pub fn parent(&self) -> Option<PortId> {
        self.parent
    }

    /// Native storage kind for a port type.
    pub fn attr_kind(port_type: PortType) -> AttrKind {
        match port_type {
            PortType::Int => AttrKind::Long,
            PortType::Float => AttrKind::Double,
            PortType::Bool => AttrKind::Bool,
            PortType::Text | PortType::Reference => AttrKind::Text,
            PortType::Vector2 => AttrKind::Double2,
            PortType::Vector3 => AttrKind::Double3,
            PortType::Quaternion => AttrKind::Double4,
            PortType::Matrix4 => AttrKind::Matrix,
        }
    }

    /// Declaration for the backing native attribute.
    ///
    /// `attr` is the resolved native attribute name (adapters may remap
    /// port names), `parent_attr` the resolved name of the compound parent
    /// attribute if the port has one.
    pub fn attr_spec(&self, attr: &str, parent_attr: Option<&str>) -> AttrSpec {
        let mut spec = AttrSpec::new(attr, Self::attr_kind(self.port_type));
        if let Some(parent) = parent_attr {
            spec = spec.with_parent(parent);
        }
        spec
    }

    /// Convert a native attribute value back to the port's abstract value.
    pub fn abstract_value(&self, raw: &SceneValue) -> Result<PortValue, MirrorError> {
        let mismatch = || MirrorError::Value {
            expected: self.port_type,
            got: raw.kind_name(),
        };
        match self.port_type {
            PortType::Int => raw.as_int().map(PortValue::Int).ok_or_else(mismatch),
            PortType::Float => raw.as_float().map(PortValue::Float).ok_or_else(mismatch),
            PortType::Bool => raw.as_bool().map(PortValue::Bool).ok_or_else(mismatch),
            PortType::Text => raw
                .as_text()
                .map(|text| PortValue::Text(text.to_string()))
                .ok_or_else(mismatch),
            PortType::Vector2 => raw.as_vec2().map(PortValue::Vector2).ok_or_else(mismatch),
            PortType::Vector3 => raw.as_vec3().map(PortValue::Vector3).ok_or_else(mismatch),
            PortType::Quaternion => raw
                .as_vec4()
                .map(PortValue::Quaternion)
                .ok_or_else(mismatch),
            PortType::Matrix4 => raw.as_matrix().map(PortValue::Matrix4).ok_or_else(mismatch),
            PortType::Reference => {
                let text = raw.as_text().ok_or_else(mismatch)?;
                if text.is_empty() {
                    Ok(PortValue::Reference(None))
                } else {
                    Uuid::parse_str(text)
                        .map(|uuid| PortValue::Reference(Some(uuid)))
                        .map_err(|_| mismatch())
                }
            }
        }
    }
}
