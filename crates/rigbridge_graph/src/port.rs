// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port model of the authoring graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Value flows into the node
    Input,
    /// Value flows out of the node
    Output,
}

/// Abstract type of the data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// Boolean value
    Bool,
    /// String value
    Text,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// Quaternion
    Quaternion,
    /// 4x4 matrix
    Matrix4,
    /// Reference to another bridge-managed node
    Reference,
}

/// Value carried by a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String
    Text(String),
    /// 2D vector
    Vector2([f64; 2]),
    /// 3D vector
    Vector3([f64; 3]),
    /// Quaternion, `[x, y, z, w]`
    Quaternion([f64; 4]),
    /// 4x4 matrix, row major
    Matrix4([[f64; 4]; 4]),
    /// Referenced node unique id, if any
    Reference(Option<Uuid>),
}

impl PortValue {
    /// The port type of this value.
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::Bool(_) => PortType::Bool,
            Self::Text(_) => PortType::Text,
            Self::Vector2(_) => PortType::Vector2,
            Self::Vector3(_) => PortType::Vector3,
            Self::Quaternion(_) => PortType::Quaternion,
            Self::Matrix4(_) => PortType::Matrix4,
            Self::Reference(_) => PortType::Reference,
        }
    }

    /// The neutral value for a port type.
    ///
    /// Quaternions and matrices default to identity, references to none.
    pub fn default_for(port_type: PortType) -> Self {
        match port_type {
            PortType::Int => Self::Int(0),
            PortType::Float => Self::Float(0.0),
            PortType::Bool => Self::Bool(false),
            PortType::Text => Self::Text(String::new()),
            PortType::Vector2 => Self::Vector2([0.0; 2]),
            PortType::Vector3 => Self::Vector3([0.0; 3]),
            PortType::Quaternion => Self::Quaternion([0.0, 0.0, 0.0, 1.0]),
            PortType::Matrix4 => Self::Matrix4([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            PortType::Reference => Self::Reference(None),
        }
    }
}
