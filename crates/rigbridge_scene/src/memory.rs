// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-process scene host.
//!
//! [`MemoryScene`] implements the full command surface against plain maps.
//! It backs every test in the workspace and any headless embedding that
//! wants bridge semantics without a host application attached.

use crate::attr::{AttrSpec, SetOptions};
use crate::host::{NodeHandle, Plug, SceneError, SceneHost};
use crate::value::SceneValue;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Follow-depth cap when reading through connection chains.
const MAX_CONNECTION_DEPTH: u32 = 64;

/// One stored attribute slot.
#[derive(Debug, Clone)]
struct Cell {
    value: SceneValue,
    locked: bool,
    source: Option<Plug>,
}

impl Cell {
    fn new(value: SceneValue) -> Self {
        Self {
            value,
            locked: false,
            source: None,
        }
    }
}

/// Single or sparse-array storage behind an attribute.
#[derive(Debug, Clone)]
enum Storage {
    Single(Cell),
    Multi(BTreeMap<u32, Cell>),
}

#[derive(Debug, Clone)]
struct Attribute {
    spec: AttrSpec,
    /// Lock on the attribute itself; array elements carry their own.
    locked: bool,
    storage: Storage,
}

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    node_type: String,
    parent: Option<NodeHandle>,
    uuid: Uuid,
    attrs: IndexMap<String, Attribute>,
}

/// A complete in-memory implementation of [`SceneHost`].
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: IndexMap<NodeHandle, SceneNode>,
    selection: Vec<NodeHandle>,
    next_handle: u64,
}

impl MemoryScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Declared type of a node.
    pub fn node_type(&self, node: NodeHandle) -> Result<&str, SceneError> {
        Ok(&self.node(node)?.node_type)
    }

    /// Find a node by its current short name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(handle, _)| *handle)
    }

    /// Whether a plug is currently locked.
    pub fn is_locked(&self, plug: &Plug) -> Result<bool, SceneError> {
        let attribute = self.attribute(plug)?;
        match (&attribute.storage, plug.index) {
            (Storage::Single(cell), None) => Ok(cell.locked),
            (Storage::Multi(_), None) => Ok(attribute.locked),
            (Storage::Multi(cells), Some(index)) => cells
                .get(&index)
                .map(|cell| cell.locked)
                .ok_or_else(|| SceneError::AttrNotFound(plug.clone())),
            (Storage::Single(_), Some(_)) => Err(indexed_single(plug)),
        }
    }

    /// Delete one logical element of an array attribute, leaving a gap.
    ///
    /// Models a direct user edit; later elements are never re-indexed.
    pub fn remove_array_element(&mut self, plug: &Plug) -> Result<(), SceneError> {
        let Some(index) = plug.index else {
            return Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: "array element".into(),
                got: "parent plug".into(),
            });
        };
        let attribute = self.attribute_mut(&plug.parent())?;
        match &mut attribute.storage {
            Storage::Multi(cells) => {
                cells
                    .remove(&index)
                    .ok_or_else(|| SceneError::AttrNotFound(plug.clone()))?;
                Ok(())
            }
            Storage::Single(_) => Err(indexed_single(plug)),
        }
    }

    fn node(&self, handle: NodeHandle) -> Result<&SceneNode, SceneError> {
        self.nodes
            .get(&handle)
            .ok_or(SceneError::NodeNotFound(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut SceneNode, SceneError> {
        self.nodes
            .get_mut(&handle)
            .ok_or(SceneError::NodeNotFound(handle))
    }

    fn attribute(&self, plug: &Plug) -> Result<&Attribute, SceneError> {
        self.node(plug.node)?
            .attrs
            .get(&plug.attr)
            .ok_or_else(|| SceneError::AttrNotFound(plug.parent()))
    }

    fn attribute_mut(&mut self, plug: &Plug) -> Result<&mut Attribute, SceneError> {
        let handle = plug.node;
        self.nodes
            .get_mut(&handle)
            .ok_or(SceneError::NodeNotFound(handle))?
            .attrs
            .get_mut(&plug.attr)
            .ok_or_else(|| SceneError::AttrNotFound(plug.parent()))
    }

    fn cell(&self, plug: &Plug) -> Result<&Cell, SceneError> {
        let attribute = self.attribute(plug)?;
        match (&attribute.storage, plug.index) {
            (Storage::Single(cell), None) => Ok(cell),
            (Storage::Multi(cells), Some(index)) => cells
                .get(&index)
                .ok_or_else(|| SceneError::AttrNotFound(plug.clone())),
            (Storage::Multi(_), None) => Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: "array element".into(),
                got: "parent plug".into(),
            }),
            (Storage::Single(_), Some(_)) => Err(indexed_single(plug)),
        }
    }

    /// Cell for a write, creating missing array elements on demand.
    fn cell_mut(&mut self, plug: &Plug) -> Result<&mut Cell, SceneError> {
        let attribute = self.attribute_mut(plug)?;
        let default = attribute.spec.kind.default_value();
        match (&mut attribute.storage, plug.index) {
            (Storage::Single(cell), None) => Ok(cell),
            (Storage::Multi(cells), Some(index)) => {
                Ok(cells.entry(index).or_insert_with(|| Cell::new(default)))
            }
            (Storage::Multi(_), None) => Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: "array element".into(),
                got: "parent plug".into(),
            }),
            (Storage::Single(_), Some(_)) => Err(indexed_single(plug)),
        }
    }

    fn resolve_value(&self, plug: &Plug, depth: u32) -> Result<SceneValue, SceneError> {
        let cell = self.cell(plug)?;
        match &cell.source {
            Some(source) if depth < MAX_CONNECTION_DEPTH => self.resolve_value(source, depth + 1),
            _ => Ok(cell.value.clone()),
        }
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| self.nodes.values().any(|node| node.name == name);
        if !taken(base) {
            return base.to_string();
        }
        let mut counter = 1u32;
        loop {
            let candidate = format!("{base}{counter}");
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Drop connection sources pointing at a deleted node.
    fn prune_sources(&mut self, deleted: NodeHandle) {
        for node in self.nodes.values_mut() {
            for attribute in node.attrs.values_mut() {
                match &mut attribute.storage {
                    Storage::Single(cell) => {
                        if cell.source.as_ref().is_some_and(|s| s.node == deleted) {
                            cell.source = None;
                        }
                    }
                    Storage::Multi(cells) => {
                        for cell in cells.values_mut() {
                            if cell.source.as_ref().is_some_and(|s| s.node == deleted) {
                                cell.source = None;
                            }
                        }
                    }
                }
            }
        }
    }
}

fn indexed_single(plug: &Plug) -> SceneError {
    SceneError::TypeMismatch {
        plug: plug.clone(),
        expected: "single attribute".into(),
        got: "array element".into(),
    }
}

impl SceneHost for MemoryScene {
    fn create_node(
        &mut self,
        node_type: &str,
        name: &str,
        parent: Option<NodeHandle>,
    ) -> Result<NodeHandle, SceneError> {
        if let Some(parent) = parent {
            if !self.node_exists(parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
        }
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        let node = SceneNode {
            name: self.unique_name(name),
            node_type: node_type.to_string(),
            parent,
            uuid: Uuid::new_v4(),
            attrs: IndexMap::new(),
        };
        self.nodes.insert(handle, node);
        Ok(handle)
    }

    fn rename(&mut self, node: NodeHandle, name: &str) -> Result<String, SceneError> {
        if !self.node_exists(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        let current = self.node(node)?.name.clone();
        let unique = if current == name {
            current
        } else {
            self.unique_name(name)
        };
        self.node_mut(node)?.name = unique.clone();
        Ok(unique)
    }

    fn delete(&mut self, node: NodeHandle) -> Result<(), SceneError> {
        self.nodes
            .shift_remove(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        self.selection.retain(|handle| *handle != node);
        self.prune_sources(node);
        Ok(())
    }

    fn node_exists(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(&node)
    }

    fn node_name(&self, node: NodeHandle) -> Result<String, SceneError> {
        Ok(self.node(node)?.name.clone())
    }

    fn node_path(&self, node: NodeHandle) -> Result<String, SceneError> {
        let mut segments = vec![self.node(node)?.name.clone()];
        let mut current = self.node(node)?.parent;
        while let Some(parent) = current {
            let parent_node = self.node(parent)?;
            segments.push(parent_node.name.clone());
            current = parent_node.parent;
        }
        segments.reverse();
        Ok(segments.join("|"))
    }

    fn node_uuid(&self, node: NodeHandle) -> Result<Uuid, SceneError> {
        Ok(self.node(node)?.uuid)
    }

    fn find_by_uuid(&self, uuid: Uuid) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.uuid == uuid)
            .map(|(handle, _)| *handle)
    }

    fn add_attr(&mut self, node: NodeHandle, spec: AttrSpec) -> Result<(), SceneError> {
        let name = spec.name.clone();
        if self.attr_exists(node, &name) {
            return Err(SceneError::AttrExists(Plug::new(node, name)));
        }
        let storage = if spec.multi {
            Storage::Multi(BTreeMap::new())
        } else {
            Storage::Single(Cell::new(spec.kind.default_value()))
        };
        self.node_mut(node)?.attrs.insert(
            name,
            Attribute {
                spec,
                locked: false,
                storage,
            },
        );
        Ok(())
    }

    fn attr_exists(&self, node: NodeHandle, attr: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.attrs.contains_key(attr))
    }

    fn remove_attr(&mut self, node: NodeHandle, attr: &str) -> Result<(), SceneError> {
        self.node_mut(node)?
            .attrs
            .shift_remove(attr)
            .map(|_| ())
            .ok_or_else(|| SceneError::AttrNotFound(Plug::new(node, attr)))
    }

    fn get_attr(&self, plug: &Plug) -> Result<SceneValue, SceneError> {
        self.resolve_value(plug, 0)
    }

    fn set_attr(
        &mut self,
        plug: &Plug,
        value: SceneValue,
        options: SetOptions,
    ) -> Result<(), SceneError> {
        let attribute = self.attribute(plug)?;
        let kind = attribute.spec.kind;
        if attribute.locked {
            return Err(SceneError::Locked(plug.parent()));
        }
        if !kind.accepts(&value) {
            return Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: format!("{kind:?}"),
                got: value.kind_name().to_string(),
            });
        }
        if kind.needs_type_tag() && options.type_tag != Some(kind) {
            return Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: format!("explicit {kind:?} type tag"),
                got: "untagged value".to_string(),
            });
        }
        let cell = self.cell_mut(plug)?;
        if cell.locked {
            return Err(SceneError::Locked(plug.clone()));
        }
        cell.value = value;
        Ok(())
    }

    fn connect_attr(&mut self, source: &Plug, target: &Plug) -> Result<(), SceneError> {
        // Validate the source side resolves before touching the target.
        self.cell_mut(source)?;
        let cell = self.cell_mut(target)?;
        if cell.locked {
            return Err(SceneError::Locked(target.clone()));
        }
        cell.source = Some(source.clone());
        Ok(())
    }

    fn disconnect_attr(&mut self, source: &Plug, target: &Plug) -> Result<(), SceneError> {
        let cell = self.cell_mut(target)?;
        if cell.source.as_ref() != Some(source) {
            return Err(SceneError::NotConnected {
                source_plug: source.clone(),
                target_plug: target.clone(),
            });
        }
        cell.source = None;
        Ok(())
    }

    fn source_connection(&self, target: &Plug) -> Result<Option<Plug>, SceneError> {
        Ok(self.cell(target)?.source.clone())
    }

    fn lock_attr(&mut self, plug: &Plug) -> Result<(), SceneError> {
        let attribute = self.attribute_mut(plug)?;
        match (&mut attribute.storage, plug.index) {
            (Storage::Single(cell), None) => {
                cell.locked = true;
                Ok(())
            }
            (Storage::Multi(_), None) => {
                attribute.locked = true;
                Ok(())
            }
            (Storage::Multi(cells), Some(index)) => {
                let cell = cells
                    .get_mut(&index)
                    .ok_or_else(|| SceneError::AttrNotFound(plug.clone()))?;
                cell.locked = true;
                Ok(())
            }
            (Storage::Single(_), Some(_)) => Err(indexed_single(plug)),
        }
    }

    fn unlock_attr(&mut self, plug: &Plug) -> Result<(), SceneError> {
        let attribute = self.attribute_mut(plug)?;
        match (&mut attribute.storage, plug.index) {
            (Storage::Single(cell), None) => {
                cell.locked = false;
                Ok(())
            }
            (Storage::Multi(_), None) => {
                attribute.locked = false;
                Ok(())
            }
            (Storage::Multi(cells), Some(index)) => {
                let cell = cells
                    .get_mut(&index)
                    .ok_or_else(|| SceneError::AttrNotFound(plug.clone()))?;
                cell.locked = false;
                Ok(())
            }
            (Storage::Single(_), Some(_)) => Err(indexed_single(plug)),
        }
    }

    fn array_elements(&self, plug: &Plug) -> Result<Vec<u32>, SceneError> {
        let attribute = self.attribute(plug)?;
        match &attribute.storage {
            Storage::Multi(cells) => Ok(cells.keys().copied().collect()),
            Storage::Single(_) => Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: "array attribute".into(),
                got: "single attribute".into(),
            }),
        }
    }

    fn remove_array_elements(&mut self, plug: &Plug) -> Result<(), SceneError> {
        let attribute = self.attribute_mut(plug)?;
        match &mut attribute.storage {
            Storage::Multi(cells) => {
                cells.clear();
                Ok(())
            }
            Storage::Single(_) => Err(SceneError::TypeMismatch {
                plug: plug.clone(),
                expected: "array attribute".into(),
                got: "single attribute".into(),
            }),
        }
    }

    fn select(&mut self, nodes: &[NodeHandle]) -> Result<(), SceneError> {
        for handle in nodes {
            if !self.node_exists(*handle) {
                return Err(SceneError::NodeNotFound(*handle));
            }
        }
        self.selection = nodes.to_vec();
        Ok(())
    }

    fn selection(&self) -> Vec<NodeHandle> {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrKind;

    fn scene_with_node() -> (MemoryScene, NodeHandle) {
        let mut scene = MemoryScene::new();
        let node = scene.create_node("network", "node", None).unwrap();
        (scene, node)
    }

    #[test]
    fn test_create_rename_keeps_uuid() {
        let (mut scene, node) = scene_with_node();
        let uuid = scene.node_uuid(node).unwrap();
        scene.rename(node, "renamed").unwrap();
        assert_eq!(scene.node_name(node).unwrap(), "renamed");
        assert_eq!(scene.node_uuid(node).unwrap(), uuid);
        assert_eq!(scene.find_by_uuid(uuid), Some(node));
    }

    #[test]
    fn test_name_collisions_uniquified() {
        let mut scene = MemoryScene::new();
        scene.create_node("network", "node", None).unwrap();
        let second = scene.create_node("network", "node", None).unwrap();
        assert_eq!(scene.node_name(second).unwrap(), "node1");
    }

    #[test]
    fn test_node_path() {
        let mut scene = MemoryScene::new();
        let root = scene.create_node("transform", "root", None).unwrap();
        let child = scene.create_node("transform", "child", Some(root)).unwrap();
        assert_eq!(scene.node_path(child).unwrap(), "root|child");
    }

    #[test]
    fn test_attr_roundtrip() {
        let (mut scene, node) = scene_with_node();
        scene
            .add_attr(node, AttrSpec::new("amount", AttrKind::Double))
            .unwrap();
        let plug = Plug::new(node, "amount");
        assert_eq!(scene.get_attr(&plug).unwrap(), SceneValue::Float(0.0));
        scene
            .set_attr(&plug, SceneValue::Float(2.5), SetOptions::default())
            .unwrap();
        assert_eq!(scene.get_attr(&plug).unwrap(), SceneValue::Float(2.5));
    }

    #[test]
    fn test_text_requires_type_tag() {
        let (mut scene, node) = scene_with_node();
        scene
            .add_attr(node, AttrSpec::new("label", AttrKind::Text))
            .unwrap();
        let plug = Plug::new(node, "label");
        let untagged = scene.set_attr(&plug, SceneValue::Text("x".into()), SetOptions::default());
        assert!(matches!(untagged, Err(SceneError::TypeMismatch { .. })));
        scene
            .set_attr(
                &plug,
                SceneValue::Text("x".into()),
                SetOptions::typed(AttrKind::Text),
            )
            .unwrap();
    }

    #[test]
    fn test_locked_attr_rejects_writes() {
        let (mut scene, node) = scene_with_node();
        scene
            .add_attr(node, AttrSpec::new("amount", AttrKind::Double))
            .unwrap();
        let plug = Plug::new(node, "amount");
        scene.lock_attr(&plug).unwrap();
        let result = scene.set_attr(&plug, SceneValue::Float(1.0), SetOptions::default());
        assert!(matches!(result, Err(SceneError::Locked(_))));
        scene.unlock_attr(&plug).unwrap();
        scene
            .set_attr(&plug, SceneValue::Float(1.0), SetOptions::default())
            .unwrap();
    }

    #[test]
    fn test_connection_drives_value() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node("network", "a", None).unwrap();
        let b = scene.create_node("network", "b", None).unwrap();
        scene
            .add_attr(a, AttrSpec::new("result", AttrKind::Double))
            .unwrap();
        scene
            .add_attr(b, AttrSpec::new("value", AttrKind::Double))
            .unwrap();
        let source = Plug::new(a, "result");
        let target = Plug::new(b, "value");

        scene
            .set_attr(&source, SceneValue::Float(4.0), SetOptions::default())
            .unwrap();
        scene.connect_attr(&source, &target).unwrap();
        assert_eq!(scene.get_attr(&target).unwrap(), SceneValue::Float(4.0));
        assert_eq!(
            scene.source_connection(&target).unwrap(),
            Some(source.clone())
        );

        scene.disconnect_attr(&source, &target).unwrap();
        assert_eq!(scene.source_connection(&target).unwrap(), None);
        scene
            .set_attr(&target, SceneValue::Float(1.0), SetOptions::default())
            .unwrap();
        assert_eq!(scene.get_attr(&target).unwrap(), SceneValue::Float(1.0));
    }

    #[test]
    fn test_connect_overwrites_prior_source() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node("network", "a", None).unwrap();
        let b = scene.create_node("network", "b", None).unwrap();
        let c = scene.create_node("network", "c", None).unwrap();
        for (node, attr) in [(a, "out"), (b, "out"), (c, "in")] {
            scene
                .add_attr(node, AttrSpec::new(attr, AttrKind::Double))
                .unwrap();
        }
        let target = Plug::new(c, "in");
        scene.connect_attr(&Plug::new(a, "out"), &target).unwrap();
        scene.connect_attr(&Plug::new(b, "out"), &target).unwrap();
        assert_eq!(
            scene.source_connection(&target).unwrap(),
            Some(Plug::new(b, "out"))
        );
    }

    #[test]
    fn test_sparse_array_elements() {
        let (mut scene, node) = scene_with_node();
        scene
            .add_attr(node, AttrSpec::new("items", AttrKind::Double).multi())
            .unwrap();
        let parent = Plug::new(node, "items");
        for index in [0u32, 1, 2] {
            scene
                .set_attr(
                    &parent.element(index),
                    SceneValue::Float(f64::from(index)),
                    SetOptions::default(),
                )
                .unwrap();
        }
        scene.remove_array_element(&parent.element(1)).unwrap();
        assert_eq!(scene.array_elements(&parent).unwrap(), vec![0, 2]);
        assert_eq!(
            scene.get_attr(&parent.element(2)).unwrap(),
            SceneValue::Float(2.0)
        );

        scene.remove_array_elements(&parent).unwrap();
        assert!(scene.array_elements(&parent).unwrap().is_empty());
    }

    #[test]
    fn test_delete_prunes_connections_and_selection() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node("network", "a", None).unwrap();
        let b = scene.create_node("network", "b", None).unwrap();
        scene
            .add_attr(a, AttrSpec::new("out", AttrKind::Double))
            .unwrap();
        scene
            .add_attr(b, AttrSpec::new("in", AttrKind::Double))
            .unwrap();
        let target = Plug::new(b, "in");
        scene.connect_attr(&Plug::new(a, "out"), &target).unwrap();
        scene.select(&[a, b]).unwrap();

        scene.delete(a).unwrap();
        assert!(!scene.node_exists(a));
        assert_eq!(scene.selection(), vec![b]);
        assert_eq!(scene.source_connection(&target).unwrap(), None);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let (mut scene, node) = scene_with_node();
        scene
            .add_attr(node, AttrSpec::new("count", AttrKind::Long))
            .unwrap();
        let plug = Plug::new(node, "count");
        let result = scene.set_attr(&plug, SceneValue::Float(1.5), SetOptions::default());
        assert!(matches!(result, Err(SceneError::TypeMismatch { .. })));
    }
}
