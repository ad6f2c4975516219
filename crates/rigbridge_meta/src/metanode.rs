// SPDX-License-Identifier: MIT OR Apache-2.0
//! Self-describing meta nodes and the process-wide instance store.
//!
//! A meta node is a native scene node carrying a table of typed fields plus
//! four bookkeeping fields that make it self-describing:
//! - `meta_fields`: a serialized registry of every caller-added field
//! - `meta_class`: the specialized class name to reconstruct as
//! - `owner`: back-reference to the owning meta node
//! - `owned_nodes`: ordered references to the nodes this one owns
//!
//! Attaching a node the store has seen before returns the cached instance;
//! attaching a freshly loaded node rebuilds its class and fields from the
//! registry stored on the node itself.

use crate::error::MetaError;
use crate::field::{Accessibility, Field, FieldDescription, MultiField, SingleField};
use crate::validator::{FieldValue, ValidatorKind};
use indexmap::IndexMap;
use rigbridge_scene::{NodeHandle, SceneHost};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use uuid::Uuid;

/// Class name stored on nodes with no specialized class.
pub const BASE_CLASS: &str = "MetaNode";

/// Name of the self-description registry field.
pub const FIELDS_FIELD: &str = "meta_fields";
/// Name of the class tag field.
pub const CLASS_FIELD: &str = "meta_class";
/// Name of the owner back-reference field.
pub const OWNER_FIELD: &str = "owner";
/// Name of the owned-nodes reference field.
pub const OWNED_FIELD: &str = "owned_nodes";

/// Native node type used when a class does not pick its own.
pub const DEFAULT_NODE_TYPE: &str = "network";

/// Shared handle to a cached meta node instance.
pub type MetaNodeRef = Rc<RefCell<MetaNode>>;

/// Specialized behavior attachable to a meta node.
///
/// Classes are registered by name in the [`MetaStore`]; the name is what
/// gets stored in the `meta_class` field and resolved again on attach.
pub trait MetaClass {
    /// Registered name, stored on nodes built from this class.
    fn class_name(&self) -> &str;

    /// Native node type for the primary node.
    fn node_type(&self) -> &str {
        DEFAULT_NODE_TYPE
    }

    /// Whether rigs of this class keep inputs and outputs on one node.
    fn single_node(&self) -> bool {
        false
    }

    /// Populate the native scene below a freshly created rig node.
    fn build(
        &self,
        _host: &mut dyn SceneHost,
        _store: &MetaStore,
        _node: &MetaNodeRef,
    ) -> Result<(), MetaError> {
        Ok(())
    }
}

/// A native node with typed fields and self-describing bookkeeping.
#[derive(Debug)]
pub struct MetaNode {
    handle: NodeHandle,
    uuid: Uuid,
    class: String,
    fields: IndexMap<String, Field>,
}

impl MetaNode {
    /// Native handle of the backing node.
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Native unique id of the backing node.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Resolved class name.
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Short name of the backing node.
    pub fn name(&self, host: &dyn SceneHost) -> Result<String, MetaError> {
        Ok(host.node_name(self.handle)?)
    }

    /// Full path of the backing node.
    pub fn path(&self, host: &dyn SceneHost) -> Result<String, MetaError> {
        Ok(host.node_path(self.handle)?)
    }

    /// Names of all fields, in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&Field, MetaError> {
        self.fields.get(name).ok_or_else(|| MetaError::UnknownField {
            node: self.handle.to_string(),
            name: name.to_string(),
        })
    }

    /// Look up a field by name, mutably.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field, MetaError> {
        let node = self.handle.to_string();
        self.fields.get_mut(name).ok_or(MetaError::UnknownField {
            node,
            name: name.to_string(),
        })
    }

    /// Look up a single field by name.
    pub fn single(&self, name: &str) -> Result<&SingleField, MetaError> {
        self.field(name)?.as_single()
    }

    /// Look up a single field by name, mutably.
    pub fn single_mut(&mut self, name: &str) -> Result<&mut SingleField, MetaError> {
        self.field_mut(name)?.as_single_mut()
    }

    /// Look up a multi field by name.
    pub fn multi(&self, name: &str) -> Result<&MultiField, MetaError> {
        self.field(name)?.as_multi()
    }

    /// Look up a multi field by name, mutably.
    pub fn multi_mut(&mut self, name: &str) -> Result<&mut MultiField, MetaError> {
        self.field_mut(name)?.as_multi_mut()
    }

    /// Add a caller field and record it in the self-description registry so
    /// it is rebuilt on the next attach.
    pub fn add_field(
        &mut self,
        host: &mut dyn SceneHost,
        name: &str,
        validator: ValidatorKind,
        accessibility: Accessibility,
        multi: bool,
        default: Option<FieldValue>,
    ) -> Result<(), MetaError> {
        let description = FieldDescription {
            validator,
            accessibility,
            multi,
            default: default.clone(),
        };
        self.add_field_inner(host, name, validator, accessibility, multi, default)?;
        self.registry_insert(host, name, &description)?;
        Ok(())
    }

    /// Add a field without touching the registry. Used for the bookkeeping
    /// fields and when rebuilding described fields on attach.
    fn add_field_inner(
        &mut self,
        host: &mut dyn SceneHost,
        name: &str,
        validator: ValidatorKind,
        accessibility: Accessibility,
        multi: bool,
        default: Option<FieldValue>,
    ) -> Result<(), MetaError> {
        if self.fields.contains_key(name) {
            return Err(MetaError::DuplicateField {
                node: self.handle.to_string(),
                name: name.to_string(),
            });
        }
        let field = if multi {
            Field::Multi(MultiField::create(host, self.handle, name, validator)?)
        } else {
            Field::Single(SingleField::create(
                host,
                self.handle,
                name,
                validator,
                accessibility,
                default,
            )?)
        };
        self.fields.insert(name.to_string(), field);
        Ok(())
    }

    fn registry_insert(
        &mut self,
        host: &mut dyn SceneHost,
        name: &str,
        description: &FieldDescription,
    ) -> Result<(), MetaError> {
        let node = self.handle.to_string();
        let registry = self.single_mut(FIELDS_FIELD)?;
        let FieldValue::Json(mut value) = registry.peek().clone() else {
            return Err(MetaError::Registry {
                node,
                detail: "registry field does not hold a json value".to_string(),
            });
        };
        let entry = serde_json::to_value(description).map_err(|error| MetaError::Registry {
            node: node.clone(),
            detail: error.to_string(),
        })?;
        match &mut value {
            serde_json::Value::Object(map) => {
                map.insert(name.to_string(), entry);
            }
            _ => {
                return Err(MetaError::Registry {
                    node,
                    detail: "registry value is not an object".to_string(),
                })
            }
        }
        registry.set(host, FieldValue::Json(value))?;
        Ok(())
    }

    /// Described caller fields, as stored in the registry field.
    fn described_fields(&self) -> Result<Vec<(String, FieldDescription)>, MetaError> {
        let registry = self.single(FIELDS_FIELD)?;
        let FieldValue::Json(serde_json::Value::Object(map)) = registry.peek() else {
            return Err(MetaError::Registry {
                node: self.handle.to_string(),
                detail: "registry field does not hold an object".to_string(),
            });
        };
        let mut described = Vec::with_capacity(map.len());
        for (name, entry) in map {
            let description: FieldDescription =
                serde_json::from_value(entry.clone()).map_err(|error| MetaError::Registry {
                    node: self.handle.to_string(),
                    detail: format!("field `{name}`: {error}"),
                })?;
            described.push((name.clone(), description));
        }
        Ok(described)
    }

    /// Uuids referenced by the owned-nodes field.
    pub fn owned_uuids(&self) -> Result<Vec<Uuid>, MetaError> {
        Ok(self
            .multi(OWNED_FIELD)?
            .get()
            .iter()
            .filter_map(|value| match value {
                FieldValue::NodeRef(Some(uuid)) => Some(*uuid),
                _ => None,
            })
            .collect())
    }

    /// Uuid referenced by the owner field, if set.
    pub fn owner_uuid(&self) -> Result<Option<Uuid>, MetaError> {
        match self.single(OWNER_FIELD)?.peek() {
            FieldValue::NodeRef(uuid) => Ok(*uuid),
            _ => Ok(None),
        }
    }

    /// Write every field of this node to the host. Owned nodes are covered
    /// by [`MetaStore::write_fields`].
    pub fn write_local(&mut self, host: &mut dyn SceneHost) -> Result<(), MetaError> {
        for field in self.fields.values_mut() {
            field.write(host)?;
        }
        Ok(())
    }

    /// Read every field of this node from the host.
    pub fn read_local(&mut self, host: &dyn SceneHost) -> Result<(), MetaError> {
        for field in self.fields.values_mut() {
            field.read(host)?;
        }
        Ok(())
    }
}

/// Process-wide registry of meta node instances and classes.
///
/// The store caches one instance per native unique id for its whole
/// lifetime; entries are only dropped by [`reset`](Self::reset). Classes
/// are registered by name and looked up when a stored class tag is
/// encountered, and by `(library, type)` when the builder resolves a
/// component.
#[derive(Default)]
pub struct MetaStore {
    instances: RefCell<HashMap<Uuid, MetaNodeRef>>,
    classes: RefCell<HashMap<String, Rc<dyn MetaClass>>>,
    rig_types: RefCell<HashMap<(String, String), String>>,
}

impl MetaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class by its name.
    pub fn register_class(&self, class: Rc<dyn MetaClass>) {
        let name = class.class_name().to_string();
        self.classes.borrow_mut().insert(name, class);
    }

    /// Register a class as the rig implementation for a library type.
    pub fn register_rig(&self, library: &str, component_type: &str, class: Rc<dyn MetaClass>) {
        self.rig_types.borrow_mut().insert(
            (library.to_string(), component_type.to_string()),
            class.class_name().to_string(),
        );
        self.register_class(class);
    }

    /// Look up a registered class by name.
    pub fn resolve_class(&self, name: &str) -> Option<Rc<dyn MetaClass>> {
        self.classes.borrow().get(name).cloned()
    }

    /// Look up the rig class registered for a library type.
    pub fn resolve_rig(&self, library: &str, component_type: &str) -> Option<Rc<dyn MetaClass>> {
        let names = self.rig_types.borrow();
        let name = names.get(&(library.to_string(), component_type.to_string()))?;
        self.resolve_class(name)
    }

    /// Number of cached instances.
    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Drop every cached instance. Classes stay registered.
    pub fn reset(&self) {
        self.instances.borrow_mut().clear();
    }

    /// Create a native node and wrap it as a meta node of a class.
    pub fn create(
        &self,
        host: &mut dyn SceneHost,
        node_type: &str,
        name: &str,
        class: Option<&str>,
    ) -> Result<MetaNodeRef, MetaError> {
        let handle = host.create_node(node_type, name, None)?;
        let node = self.init(host, handle, class.unwrap_or(BASE_CLASS))?;
        tracing::debug!(node = %host.node_path(handle)?, "created meta node");
        Ok(node)
    }

    /// Create a node owned by `parent`: the child gets its owner
    /// back-reference set and the parent records it in its owned list.
    pub fn create_owned(
        &self,
        host: &mut dyn SceneHost,
        parent: &MetaNodeRef,
        node_type: &str,
        name: &str,
        class: Option<&str>,
    ) -> Result<MetaNodeRef, MetaError> {
        let child = self.create(host, node_type, name, class)?;
        let parent_uuid = parent.borrow().uuid();
        let child_uuid = child.borrow().uuid();
        child
            .borrow_mut()
            .single_mut(OWNER_FIELD)?
            .set(host, FieldValue::NodeRef(Some(parent_uuid)))?;
        parent
            .borrow_mut()
            .multi_mut(OWNED_FIELD)?
            .push(FieldValue::NodeRef(Some(child_uuid)));
        Ok(child)
    }

    /// Wrap an existing native node, reconstructing its specialized class
    /// and fields from the self-description stored on the node.
    ///
    /// Attaching the same node twice returns the identical instance.
    pub fn attach(
        &self,
        host: &mut dyn SceneHost,
        handle: NodeHandle,
    ) -> Result<MetaNodeRef, MetaError> {
        let uuid = host.node_uuid(handle)?;
        if let Some(cached) = self.instances.borrow().get(&uuid) {
            return Ok(cached.clone());
        }

        let stored = if host.attr_exists(handle, CLASS_FIELD) {
            match host.get_attr(&rigbridge_scene::Plug::new(handle, CLASS_FIELD))? {
                rigbridge_scene::SceneValue::Text(name) => name,
                _ => String::new(),
            }
        } else {
            String::new()
        };

        let class_name = if stored.is_empty() || stored == BASE_CLASS {
            BASE_CLASS.to_string()
        } else if self.resolve_class(&stored).is_some() {
            stored
        } else {
            return Err(MetaError::ClassResolution {
                stored,
                requesting: BASE_CLASS.to_string(),
            });
        };

        let node = self.init(host, handle, &class_name)?;
        tracing::debug!(node = %host.node_path(handle)?, class = %class_name, "attached meta node");
        Ok(node)
    }

    /// Build the field table for a node and cache the instance.
    ///
    /// The registry field must exist before anything else: rebuilding the
    /// described fields depends on its read-through.
    fn init(
        &self,
        host: &mut dyn SceneHost,
        handle: NodeHandle,
        class_name: &str,
    ) -> Result<MetaNodeRef, MetaError> {
        let uuid = host.node_uuid(handle)?;
        let mut node = MetaNode {
            handle,
            uuid,
            class: class_name.to_string(),
            fields: IndexMap::new(),
        };

        node.add_field_inner(
            host,
            FIELDS_FIELD,
            ValidatorKind::Json,
            Accessibility::Private,
            false,
            None,
        )?;

        for (name, description) in node.described_fields()? {
            node.add_field_inner(
                host,
                &name,
                description.validator,
                description.accessibility,
                description.multi,
                description.default,
            )?;
        }

        node.add_field_inner(
            host,
            CLASS_FIELD,
            ValidatorKind::Text,
            Accessibility::Private,
            false,
            None,
        )?;
        node.single_mut(CLASS_FIELD)?
            .set(host, FieldValue::Text(class_name.to_string()))?;

        node.add_field_inner(
            host,
            OWNER_FIELD,
            ValidatorKind::NodeRef,
            Accessibility::Private,
            false,
            None,
        )?;
        node.add_field_inner(
            host,
            OWNED_FIELD,
            ValidatorKind::NodeRef,
            Accessibility::Private,
            true,
            None,
        )?;

        let node = Rc::new(RefCell::new(node));
        self.instances.borrow_mut().insert(uuid, node.clone());
        Ok(node)
    }

    /// Resolve a native unique id to its meta node, attaching on demand.
    /// Returns `None` when the id no longer resolves in the scene.
    pub fn resolve(
        &self,
        host: &mut dyn SceneHost,
        uuid: Uuid,
    ) -> Result<Option<MetaNodeRef>, MetaError> {
        if let Some(cached) = self.instances.borrow().get(&uuid) {
            return Ok(Some(cached.clone()));
        }
        match host.find_by_uuid(uuid) {
            Some(handle) => Ok(Some(self.attach(host, handle)?)),
            None => Ok(None),
        }
    }

    /// Recursively write the fields of a node and of every node it
    /// transitively owns.
    pub fn write_fields(
        &self,
        host: &mut dyn SceneHost,
        node: &MetaNodeRef,
    ) -> Result<(), MetaError> {
        self.write_walk(host, node, &mut HashSet::new())
    }

    fn write_walk(
        &self,
        host: &mut dyn SceneHost,
        node: &MetaNodeRef,
        visited: &mut HashSet<Uuid>,
    ) -> Result<(), MetaError> {
        if !visited.insert(node.borrow().uuid()) {
            return Ok(());
        }
        node.borrow_mut().write_local(host)?;
        let owned = node.borrow().owned_uuids()?;
        for uuid in owned {
            if let Some(child) = self.resolve(host, uuid)? {
                self.write_walk(host, &child, visited)?;
            }
        }
        Ok(())
    }

    /// Recursively read the fields of a node and of every node it
    /// transitively owns.
    pub fn read_fields(
        &self,
        host: &mut dyn SceneHost,
        node: &MetaNodeRef,
    ) -> Result<(), MetaError> {
        self.read_walk(host, node, &mut HashSet::new())
    }

    fn read_walk(
        &self,
        host: &mut dyn SceneHost,
        node: &MetaNodeRef,
        visited: &mut HashSet<Uuid>,
    ) -> Result<(), MetaError> {
        if !visited.insert(node.borrow().uuid()) {
            return Ok(());
        }
        node.borrow_mut().read_local(host)?;
        let owned = node.borrow().owned_uuids()?;
        for uuid in owned {
            if let Some(child) = self.resolve(host, uuid)? {
                self.read_walk(host, &child, visited)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_scene::MemoryScene;

    struct WingRig;

    impl MetaClass for WingRig {
        fn class_name(&self) -> &str {
            "WingRig"
        }
    }

    #[test]
    fn test_create_adds_bookkeeping_fields() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let node = store.create(&mut scene, "network", "meta", None).unwrap();

        let node = node.borrow();
        for name in [FIELDS_FIELD, CLASS_FIELD, OWNER_FIELD, OWNED_FIELD] {
            assert!(node.field(name).is_ok(), "missing bookkeeping field {name}");
            assert!(scene.attr_exists(node.handle(), name));
        }
        assert_eq!(node.class_name(), BASE_CLASS);
    }

    #[test]
    fn test_attach_returns_cached_instance() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let created = store.create(&mut scene, "network", "meta", None).unwrap();
        let attached = store.attach(&mut scene, created.borrow().handle()).unwrap();
        assert!(Rc::ptr_eq(&created, &attached));
        assert_eq!(store.instance_count(), 1);
    }

    #[test]
    fn test_self_description_roundtrip() {
        let mut scene = MemoryScene::new();
        let handle;
        {
            let store = MetaStore::new();
            store.register_class(Rc::new(WingRig));
            let node = store
                .create(&mut scene, "network", "wing", Some("WingRig"))
                .unwrap();
            handle = node.borrow().handle();
            {
                let mut node = node.borrow_mut();
                node.add_field(
                    &mut scene,
                    "span",
                    ValidatorKind::Float,
                    Accessibility::Public,
                    false,
                    None,
                )
                .unwrap();
                node.add_field(
                    &mut scene,
                    "label",
                    ValidatorKind::Text,
                    Accessibility::Private,
                    false,
                    None,
                )
                .unwrap();
                node.single_mut("span")
                    .unwrap()
                    .set(&mut scene, FieldValue::Float(7.5))
                    .unwrap();
                node.single_mut("label")
                    .unwrap()
                    .set(&mut scene, FieldValue::Text("left".into()))
                    .unwrap();
            }
            store.write_fields(&mut scene, &node).unwrap();
        }

        // A fresh store, as after a file reload: everything must come back
        // from the data stored on the node.
        let store = MetaStore::new();
        store.register_class(Rc::new(WingRig));
        let node = store.attach(&mut scene, handle).unwrap();
        let mut node = node.borrow_mut();
        assert_eq!(node.class_name(), "WingRig");
        assert_eq!(
            node.single_mut("span").unwrap().get(&scene).unwrap(),
            &FieldValue::Float(7.5)
        );
        assert_eq!(
            node.single("label").unwrap().peek(),
            &FieldValue::Text("left".into())
        );
    }

    #[test]
    fn test_unknown_stored_class_is_an_error() {
        let mut scene = MemoryScene::new();
        let handle;
        {
            let store = MetaStore::new();
            store.register_class(Rc::new(WingRig));
            let node = store
                .create(&mut scene, "network", "wing", Some("WingRig"))
                .unwrap();
            handle = node.borrow().handle();
            store.write_fields(&mut scene, &node).unwrap();
        }

        // WingRig is not registered in this process.
        let store = MetaStore::new();
        let result = store.attach(&mut scene, handle);
        assert!(matches!(
            result,
            Err(MetaError::ClassResolution { ref stored, .. }) if stored == "WingRig"
        ));
    }

    #[test]
    fn test_ownership_recursion() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let parent = store.create(&mut scene, "network", "root", None).unwrap();
        let child = store
            .create_owned(&mut scene, &parent, "network", "limb", None)
            .unwrap();

        assert_eq!(
            child.borrow().owner_uuid().unwrap(),
            Some(parent.borrow().uuid())
        );
        assert_eq!(
            parent.borrow().owned_uuids().unwrap(),
            vec![child.borrow().uuid()]
        );

        child
            .borrow_mut()
            .add_field(
                &mut scene,
                "length",
                ValidatorKind::Float,
                Accessibility::Private,
                false,
                None,
            )
            .unwrap();
        child
            .borrow_mut()
            .single_mut("length")
            .unwrap()
            .set(&mut scene, FieldValue::Float(3.0))
            .unwrap();

        // Writing the parent must cascade into the owned child.
        store.write_fields(&mut scene, &parent).unwrap();
        let plug = rigbridge_scene::Plug::new(child.borrow().handle(), "length");
        assert_eq!(
            scene.get_attr(&plug).unwrap(),
            rigbridge_scene::SceneValue::Float(3.0)
        );
    }

    #[test]
    fn test_attach_plain_native_node() {
        let mut scene = MemoryScene::new();
        let handle = scene.create_node("transform", "plain", None).unwrap();
        let store = MetaStore::new();
        let node = store.attach(&mut scene, handle).unwrap();
        assert_eq!(node.borrow().class_name(), BASE_CLASS);
        assert!(scene.attr_exists(handle, FIELDS_FIELD));
    }

    #[test]
    fn test_reset_clears_instances() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let node = store.create(&mut scene, "network", "meta", None).unwrap();
        let handle = node.borrow().handle();
        assert_eq!(store.instance_count(), 1);
        store.reset();
        assert_eq!(store.instance_count(), 0);
        let reattached = store.attach(&mut scene, handle).unwrap();
        assert!(!Rc::ptr_eq(&node, &reattached));
    }
}
