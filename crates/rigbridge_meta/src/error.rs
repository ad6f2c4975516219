// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types of the persistence subsystem.

use crate::validator::ValidatorError;
use rigbridge_scene::SceneError;

/// Error from field, meta node or builder operations.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// A host command failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A value failed to convert to or from its native representation
    #[error(transparent)]
    Validator(#[from] ValidatorError),

    /// A stored class name has no registered class
    #[error("class `{stored}` stored on the node is not registered (attaching as `{requesting}`)")]
    ClassResolution {
        /// Class name read from the node
        stored: String,
        /// Class the attach was requested as
        requesting: String,
    },

    /// Field name not present on the node
    #[error("node {node} has no field named `{name}`")]
    UnknownField {
        /// Owning node
        node: String,
        /// Requested field name
        name: String,
    },

    /// Field name already taken on the node
    #[error("node {node} already has a field named `{name}`")]
    DuplicateField {
        /// Owning node
        node: String,
        /// Conflicting field name
        name: String,
    },

    /// Field exists but has the wrong multiplicity
    #[error("field `{name}` is a {actual} field, expected {expected}")]
    FieldShape {
        /// Field name
        name: String,
        /// Expected multiplicity
        expected: &'static str,
        /// Actual multiplicity
        actual: &'static str,
    },

    /// The stored self-description could not be interpreted
    #[error("corrupt field registry on node {node}: {detail}")]
    Registry {
        /// Owning node
        node: String,
        /// What was wrong with the stored data
        detail: String,
    },

    /// A connection endpoint names a component no rig was built for
    #[error("no rig was built for connection endpoint component `{component}`")]
    UnresolvedEndpoint {
        /// Component name from the connection record
        component: String,
    },

    /// Both connection endpoints resolve to the enclosing component
    #[error("connection on `{component}` loops back onto the component itself")]
    SelfLoop {
        /// Enclosing component name
        component: String,
    },
}
