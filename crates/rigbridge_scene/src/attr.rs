// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attribute declaration parameters.

use crate::value::SceneValue;
use serde::{Deserialize, Serialize};

/// Native data kind of an attribute.
///
/// This is the storage type the host allocates for an attribute, not the
/// abstract type of the data flowing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrKind {
    /// Integer storage
    Long,
    /// Floating point storage
    Double,
    /// Boolean storage
    Bool,
    /// String storage
    Text,
    /// 2-component double compound
    Double2,
    /// 3-component double compound
    Double3,
    /// 4-component double compound
    Double4,
    /// 4x4 matrix storage
    Matrix,
}

impl AttrKind {
    /// Value a freshly declared attribute of this kind reads back as.
    pub fn default_value(self) -> SceneValue {
        match self {
            Self::Long => SceneValue::Int(0),
            Self::Double => SceneValue::Float(0.0),
            Self::Bool => SceneValue::Bool(false),
            Self::Text => SceneValue::Text(String::new()),
            Self::Double2 => SceneValue::Vec2([0.0; 2]),
            Self::Double3 => SceneValue::Vec3([0.0; 3]),
            Self::Double4 => SceneValue::Vec4([0.0; 4]),
            Self::Matrix => SceneValue::identity_matrix(),
        }
    }

    /// Whether writes to this kind require an explicit type tag.
    ///
    /// Typed-storage kinds reject a bare value on the set command and need
    /// the tag carried by [`SetOptions`].
    pub fn needs_type_tag(self) -> bool {
        matches!(self, Self::Text | Self::Matrix)
    }

    /// Whether a value is accepted by an attribute of this kind.
    pub fn accepts(self, value: &SceneValue) -> bool {
        matches!(
            (self, value),
            (Self::Long, SceneValue::Int(_))
                | (Self::Double, SceneValue::Float(_) | SceneValue::Int(_))
                | (Self::Bool, SceneValue::Bool(_))
                | (Self::Text, SceneValue::Text(_))
                | (Self::Double2, SceneValue::Vec2(_))
                | (Self::Double3, SceneValue::Vec3(_))
                | (Self::Double4, SceneValue::Vec4(_))
                | (Self::Matrix, SceneValue::Matrix(_))
        )
    }
}

/// Parameters needed to declare a new attribute on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Attribute name, unique on the node
    pub name: String,
    /// Native storage kind
    pub kind: AttrKind,
    /// Declare as a sparse array
    pub multi: bool,
    /// Expose the attribute for direct user edits
    pub keyable: bool,
    /// Parent attribute name, for children of compound attributes
    pub parent: Option<String>,
}

impl AttrSpec {
    /// Create a spec for a plain single attribute.
    pub fn new(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
            multi: false,
            keyable: false,
            parent: None,
        }
    }

    /// Declare as a sparse array.
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Expose for direct user edits.
    pub fn keyable(mut self) -> Self {
        self.keyable = true;
        self
    }

    /// Declare under a compound parent attribute.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Extra parameters for the set-attribute command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Explicit type tag, required by typed-storage kinds.
    pub type_tag: Option<AttrKind>,
}

impl SetOptions {
    /// Options carrying an explicit type tag.
    pub fn typed(kind: AttrKind) -> Self {
        Self {
            type_tag: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accepts() {
        assert!(AttrKind::Double.accepts(&SceneValue::Float(1.0)));
        assert!(AttrKind::Double.accepts(&SceneValue::Int(1)));
        assert!(!AttrKind::Long.accepts(&SceneValue::Float(1.0)));
        assert!(AttrKind::Matrix.accepts(&SceneValue::identity_matrix()));
    }

    #[test]
    fn test_spec_builder() {
        let spec = AttrSpec::new("items", AttrKind::Text).multi().keyable();
        assert!(spec.multi);
        assert!(spec.keyable);
        assert_eq!(spec.parent, None);

        let child = AttrSpec::new("x", AttrKind::Double).with_parent("offset");
        assert_eq!(child.parent.as_deref(), Some("offset"));
    }

    #[test]
    fn test_type_tags() {
        assert!(AttrKind::Text.needs_type_tag());
        assert!(AttrKind::Matrix.needs_type_tag());
        assert!(!AttrKind::Double.needs_type_tag());
    }
}
