// SPDX-License-Identifier: MIT OR Apache-2.0
//! The command surface the bridge issues against the hosting application.

use crate::attr::{AttrSpec, SetOptions};
use crate::value::SceneValue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a node in the host scene.
///
/// Handles are opaque and stable across renames; they are only valid within
/// the host instance that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of one attribute slot on a node.
///
/// A plug optionally targets one logical element of an array attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plug {
    /// Owning node
    pub node: NodeHandle,
    /// Attribute name
    pub attr: String,
    /// Logical array index, for elements of array attributes
    pub index: Option<u32>,
}

impl Plug {
    /// Address an attribute on a node.
    pub fn new(node: NodeHandle, attr: impl Into<String>) -> Self {
        Self {
            node,
            attr: attr.into(),
            index: None,
        }
    }

    /// Address one logical element of this array attribute.
    pub fn element(&self, index: u32) -> Self {
        Self {
            node: self.node,
            attr: self.attr.clone(),
            index: Some(index),
        }
    }

    /// The parent array plug of an element, or a clone of a non-element.
    pub fn parent(&self) -> Self {
        Self {
            node: self.node,
            attr: self.attr.clone(),
            index: None,
        }
    }
}

impl std::fmt::Display for Plug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}.{}[{}]", self.node, self.attr, i),
            None => write!(f, "{}.{}", self.node, self.attr),
        }
    }
}

/// Error from a host command.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Node handle does not resolve to a live node
    #[error("node not found: {0}")]
    NodeNotFound(NodeHandle),

    /// Attribute does not exist on the node
    #[error("attribute not found: {0}")]
    AttrNotFound(Plug),

    /// Attribute already declared on the node
    #[error("attribute already exists: {0}")]
    AttrExists(Plug),

    /// Attribute is locked against edits
    #[error("attribute is locked: {0}")]
    Locked(Plug),

    /// No connection exists between the two plugs
    #[error("{source_plug} is not connected to {target_plug}")]
    NotConnected {
        /// Claimed connection source
        source_plug: Plug,
        /// Claimed connection target
        target_plug: Plug,
    },

    /// Value or addressing mode rejected by the attribute
    #[error("type mismatch on {plug}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Rejecting plug
        plug: Plug,
        /// What the attribute accepts
        expected: String,
        /// What the command carried
        got: String,
    },
}

/// The fixed command surface of the hosting application.
///
/// All scene mutations performed by the bridge go through this trait. The
/// host runs single-threaded and synchronous; commands either complete or
/// return a [`SceneError`], there is no partial application.
pub trait SceneHost {
    /// Create a node and return its handle.
    fn create_node(
        &mut self,
        node_type: &str,
        name: &str,
        parent: Option<NodeHandle>,
    ) -> Result<NodeHandle, SceneError>;

    /// Rename a node. Returns the actual name, uniquified on collision.
    fn rename(&mut self, node: NodeHandle, name: &str) -> Result<String, SceneError>;

    /// Delete a node and every connection involving it.
    fn delete(&mut self, node: NodeHandle) -> Result<(), SceneError>;

    /// Whether the handle resolves to a live node.
    fn node_exists(&self, node: NodeHandle) -> bool;

    /// Short name of a node.
    fn node_name(&self, node: NodeHandle) -> Result<String, SceneError>;

    /// Full path of a node, `|`-joined from the root.
    fn node_path(&self, node: NodeHandle) -> Result<String, SceneError>;

    /// Unique id of a node, assigned at creation and stable across renames.
    fn node_uuid(&self, node: NodeHandle) -> Result<Uuid, SceneError>;

    /// Resolve a unique id back to a handle.
    fn find_by_uuid(&self, uuid: Uuid) -> Option<NodeHandle>;

    /// Declare a new attribute on a node.
    fn add_attr(&mut self, node: NodeHandle, spec: AttrSpec) -> Result<(), SceneError>;

    /// Whether an attribute is declared on a node.
    fn attr_exists(&self, node: NodeHandle, attr: &str) -> bool;

    /// Remove an attribute declaration and its stored values.
    fn remove_attr(&mut self, node: NodeHandle, attr: &str) -> Result<(), SceneError>;

    /// Read a plug's value. Connected plugs read the driving value.
    fn get_attr(&self, plug: &Plug) -> Result<SceneValue, SceneError>;

    /// Write a plug's value.
    fn set_attr(
        &mut self,
        plug: &Plug,
        value: SceneValue,
        options: SetOptions,
    ) -> Result<(), SceneError>;

    /// Wire `source` to drive `target`, replacing any prior incoming
    /// connection at `target`.
    fn connect_attr(&mut self, source: &Plug, target: &Plug) -> Result<(), SceneError>;

    /// Remove the connection from `source` to `target`.
    fn disconnect_attr(&mut self, source: &Plug, target: &Plug) -> Result<(), SceneError>;

    /// The plug currently driving `target`, if any.
    fn source_connection(&self, target: &Plug) -> Result<Option<Plug>, SceneError>;

    /// Lock a plug against edits.
    fn lock_attr(&mut self, plug: &Plug) -> Result<(), SceneError>;

    /// Unlock a plug.
    fn unlock_attr(&mut self, plug: &Plug) -> Result<(), SceneError>;

    /// Existing logical indices of an array attribute, ascending. Gaps are
    /// possible; indices are never compacted.
    fn array_elements(&self, plug: &Plug) -> Result<Vec<u32>, SceneError>;

    /// Delete every element of an array attribute.
    fn remove_array_elements(&mut self, plug: &Plug) -> Result<(), SceneError>;

    /// Replace the active selection.
    fn select(&mut self, nodes: &[NodeHandle]) -> Result<(), SceneError>;

    /// The active selection.
    fn selection(&self) -> Vec<NodeHandle>;
}
