// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value codecs between abstract field values and native attributes.
//!
//! A validator pins down, per supported type, the native storage kind, the
//! zero value, and the conversions in both directions. Validators are
//! referenced by name in the self-description registry stored on meta
//! nodes, so the set is a closed enum rather than an open trait.

use rigbridge_scene::{AttrKind, AttrSpec, SceneHost, SceneValue, SetOptions};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A validated abstract value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
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
    /// Reference to another bridge-managed node by its native unique id
    NodeRef(Option<Uuid>),
    /// Structured value, stored serialized over the string codec
    Json(serde_json::Value),
}

impl FieldValue {
    /// Short name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Vector2(_) => "vector2",
            Self::Vector3(_) => "vector3",
            Self::Quaternion(_) => "quaternion",
            Self::Matrix4(_) => "matrix4",
            Self::NodeRef(_) => "node reference",
            Self::Json(_) => "json",
        }
    }
}

/// Conversion failure between a field value and its native representation.
#[derive(Debug, thiserror::Error)]
#[error("{validator:?} validator: {detail}")]
pub struct ValidatorError {
    /// Validator that rejected the value
    pub validator: ValidatorKind,
    /// What went wrong
    pub detail: String,
}

impl ValidatorError {
    fn new(validator: ValidatorKind, detail: impl Into<String>) -> Self {
        Self {
            validator,
            detail: detail.into(),
        }
    }
}

/// The closed set of value codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorKind {
    /// Integer values
    Int,
    /// Float values
    Float,
    /// Boolean values
    Bool,
    /// String values
    Text,
    /// 2D vectors
    Vector2,
    /// 3D vectors
    Vector3,
    /// Quaternions
    Quaternion,
    /// 4x4 matrices
    Matrix4,
    /// References to other bridge-managed nodes, stored as unique ids
    NodeRef,
    /// Structured values layered over the string codec
    Json,
}

impl ValidatorKind {
    /// Native storage kind backing this validator.
    pub fn attr_kind(self) -> AttrKind {
        match self {
            Self::Int => AttrKind::Long,
            Self::Float => AttrKind::Double,
            Self::Bool => AttrKind::Bool,
            Self::Text | Self::NodeRef | Self::Json => AttrKind::Text,
            Self::Vector2 => AttrKind::Double2,
            Self::Vector3 => AttrKind::Double3,
            Self::Quaternion => AttrKind::Double4,
            Self::Matrix4 => AttrKind::Matrix,
        }
    }

    /// The zero value of this validator's domain.
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Int => FieldValue::Int(0),
            Self::Float => FieldValue::Float(0.0),
            Self::Bool => FieldValue::Bool(false),
            Self::Text => FieldValue::Text(String::new()),
            Self::Vector2 => FieldValue::Vector2([0.0; 2]),
            Self::Vector3 => FieldValue::Vector3([0.0; 3]),
            Self::Quaternion => FieldValue::Quaternion([0.0, 0.0, 0.0, 1.0]),
            Self::Matrix4 => FieldValue::Matrix4([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            Self::NodeRef => FieldValue::NodeRef(None),
            Self::Json => FieldValue::Json(serde_json::Value::Object(serde_json::Map::new())),
        }
    }

    /// Parameters for declaring the backing attribute.
    pub fn attr_spec(self, name: &str, multi: bool) -> AttrSpec {
        let mut spec = AttrSpec::new(name, self.attr_kind());
        spec.multi = multi;
        spec
    }

    /// Extra parameters for the set-attribute command.
    pub fn set_options(self) -> SetOptions {
        let kind = self.attr_kind();
        if kind.needs_type_tag() {
            SetOptions::typed(kind)
        } else {
            SetOptions::default()
        }
    }

    /// Convert a field value to the representation the host accepts.
    pub fn to_native(self, value: &FieldValue) -> Result<SceneValue, ValidatorError> {
        match (self, value) {
            (Self::Int, FieldValue::Int(v)) => Ok(SceneValue::Int(*v)),
            (Self::Int, FieldValue::Float(v)) => Ok(SceneValue::Int(*v as i64)),
            (Self::Float, FieldValue::Float(v)) => Ok(SceneValue::Float(*v)),
            (Self::Float, FieldValue::Int(v)) => Ok(SceneValue::Float(*v as f64)),
            (Self::Bool, FieldValue::Bool(v)) => Ok(SceneValue::Bool(*v)),
            (Self::Text, FieldValue::Text(v)) => Ok(SceneValue::Text(v.clone())),
            (Self::Vector2, FieldValue::Vector2(v)) => Ok(SceneValue::Vec2(*v)),
            (Self::Vector3, FieldValue::Vector3(v)) => Ok(SceneValue::Vec3(*v)),
            (Self::Quaternion, FieldValue::Quaternion(v)) => Ok(SceneValue::Vec4(*v)),
            (Self::Matrix4, FieldValue::Matrix4(v)) => Ok(SceneValue::Matrix(*v)),
            (Self::NodeRef, FieldValue::NodeRef(uuid)) => Ok(SceneValue::Text(
                uuid.map(|u| u.to_string()).unwrap_or_default(),
            )),
            (Self::Json, FieldValue::Json(v)) => serde_json::to_string(v)
                .map(SceneValue::Text)
                .map_err(|error| ValidatorError::new(self, error.to_string())),
            (validator, value) => Err(ValidatorError::new(
                validator,
                format!("cannot store a {} value", value.kind_name()),
            )),
        }
    }

    /// Convert a host value back into the validator's domain.
    ///
    /// Node references are resolved against the live scene; an id that no
    /// longer resolves yields an empty reference rather than an error.
    pub fn from_native(
        self,
        raw: &SceneValue,
        host: &dyn SceneHost,
    ) -> Result<FieldValue, ValidatorError> {
        let mismatch = || {
            ValidatorError::new(
                self,
                format!("cannot read a {} attribute value", raw.kind_name()),
            )
        };
        match self {
            Self::Int => raw.as_int().map(FieldValue::Int).ok_or_else(mismatch),
            Self::Float => raw.as_float().map(FieldValue::Float).ok_or_else(mismatch),
            Self::Bool => raw.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
            Self::Text => raw
                .as_text()
                .map(|v| FieldValue::Text(v.to_string()))
                .ok_or_else(mismatch),
            Self::Vector2 => raw.as_vec2().map(FieldValue::Vector2).ok_or_else(mismatch),
            Self::Vector3 => raw.as_vec3().map(FieldValue::Vector3).ok_or_else(mismatch),
            Self::Quaternion => raw
                .as_vec4()
                .map(FieldValue::Quaternion)
                .ok_or_else(mismatch),
            Self::Matrix4 => raw.as_matrix().map(FieldValue::Matrix4).ok_or_else(mismatch),
            Self::NodeRef => {
                let text = raw.as_text().ok_or_else(mismatch)?;
                if text.is_empty() {
                    return Ok(FieldValue::NodeRef(None));
                }
                let uuid = Uuid::parse_str(text)
                    .map_err(|error| ValidatorError::new(self, error.to_string()))?;
                // A stale id is not an error, the referenced node is gone.
                Ok(FieldValue::NodeRef(
                    host.find_by_uuid(uuid).map(|_| uuid),
                ))
            }
            Self::Json => {
                let text = raw.as_text().ok_or_else(mismatch)?;
                if text.is_empty() {
                    return Ok(self.default_value());
                }
                serde_json::from_str(text)
                    .map(FieldValue::Json)
                    .map_err(|error| ValidatorError::new(self, error.to_string()))
            }
        }
    }
}
