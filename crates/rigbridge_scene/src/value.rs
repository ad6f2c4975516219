// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tagged values accepted and returned by the scene host.

use serde::{Deserialize, Serialize};

/// A native attribute value.
///
/// This is the only value type that crosses the command surface; richer
/// abstract types are converted to and from it by the validator layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneValue {
    /// Boolean
    Bool(bool),
    /// Integer (native `long`)
    Int(i64),
    /// Floating point (native `double`)
    Float(f64),
    /// String
    Text(String),
    /// 2-component vector
    Vec2([f64; 2]),
    /// 3-component vector
    Vec3([f64; 3]),
    /// 4-component vector
    Vec4([f64; 4]),
    /// 4x4 matrix, row major
    Matrix([[f64; 4]; 4]),
}

impl SceneValue {
    /// The identity matrix.
    pub fn identity_matrix() -> Self {
        Self::Matrix([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Matrix(_) => "matrix",
        }
    }

    /// Get the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the float value, accepting an `Int` as well.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the text value, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get the 2-vector, if this is a `Vec2`.
    pub fn as_vec2(&self) -> Option<[f64; 2]> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the 3-vector, if this is a `Vec3`.
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the 4-vector, if this is a `Vec4`.
    pub fn as_vec4(&self) -> Option<[f64; 4]> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the matrix, if this is a `Matrix`.
    pub fn as_matrix(&self) -> Option<[[f64; 4]; 4]> {
        match self {
            Self::Matrix(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(SceneValue::Int(3).as_int(), Some(3));
        assert_eq!(SceneValue::Int(3).as_float(), Some(3.0));
        assert_eq!(SceneValue::Float(1.5).as_int(), None);
        assert_eq!(SceneValue::Text("a".into()).as_text(), Some("a"));
        assert!(SceneValue::Bool(true).as_bool().unwrap());
    }

    #[test]
    fn test_identity_matrix() {
        let m = SceneValue::identity_matrix().as_matrix().unwrap();
        assert_eq!(m[0][0], 1.0);
        assert_eq!(m[3][3], 1.0);
        assert_eq!(m[0][1], 0.0);
    }
}
