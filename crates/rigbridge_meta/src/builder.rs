// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recursive component builder.
//!
//! Walks a component tree depth first: resolves a specialized rig class
//! for each component, builds child rigs before wiring the connections
//! between them, and pushes every field to the host once a subtree is
//! complete. Connection wiring is best effort; a single refused native
//! connection never aborts the build.

use crate::error::MetaError;
use crate::metanode::{MetaNodeRef, MetaStore};
use crate::rig::{create_rig, rig_output_node};
use indexmap::IndexMap;
use rigbridge_graph::{Component, ComponentConnection};
use rigbridge_scene::{Plug, SceneHost};

/// One rig built during a container's recursion, with how it was resolved.
struct BuiltRig {
    node: MetaNodeRef,
    /// Built by the generic container path, so it has a separate output
    /// node that descendant connections should read from.
    generic: bool,
}

/// Builds component trees into the host scene.
pub struct ComponentBuilder<'a> {
    store: &'a MetaStore,
}

impl<'a> ComponentBuilder<'a> {
    /// Create a builder resolving rig classes through a store.
    pub fn new(store: &'a MetaStore) -> Self {
        Self { store }
    }

    /// Build a component and everything below it. Returns the root rig.
    pub fn build(
        &self,
        host: &mut dyn SceneHost,
        component: &Component,
    ) -> Result<MetaNodeRef, MetaError> {
        let (rig, _) = self.build_inner(host, component)?;
        Ok(rig)
    }

    fn build_inner(
        &self,
        host: &mut dyn SceneHost,
        component: &Component,
    ) -> Result<(MetaNodeRef, bool), MetaError> {
        let class = component
            .library
            .as_deref()
            .and_then(|library| {
                let resolved = self.store.resolve_rig(library, &component.component_type);
                if resolved.is_none() {
                    tracing::debug!(
                        library,
                        component_type = %component.component_type,
                        "no specialized rig class, using the generic rig"
                    );
                }
                resolved
            });
        let generic = class.is_none();

        let rig = create_rig(self.store, host, component, class.as_ref())?;

        match class {
            Some(class) => {
                // Specialized rigs are leaves: they wire their own insides.
                class.build(host, self.store, &rig)?;
            }
            None => {
                let mut built: IndexMap<String, BuiltRig> = IndexMap::new();
                built.insert(
                    component.name.clone(),
                    BuiltRig {
                        node: rig.clone(),
                        generic: true,
                    },
                );
                for child in &component.children {
                    let (node, child_generic) = self.build_inner(host, child)?;
                    built.insert(
                        child.name.clone(),
                        BuiltRig {
                            node,
                            generic: child_generic,
                        },
                    );
                }
                for connection in &component.connections {
                    self.wire(host, component, &built, connection)?;
                }
            }
        }

        self.store.write_fields(host, &rig)?;
        Ok((rig, generic))
    }

    /// Wire one recorded connection between built rigs.
    ///
    /// Endpoint resolution depends on who the endpoint is:
    /// - the container itself as source: its own input node carries the
    ///   attribute
    /// - the container itself as target: both ends read from output nodes
    /// - a generic descendant as source: its output node
    /// - a specialized descendant: its primary node
    fn wire(
        &self,
        host: &mut dyn SceneHost,
        component: &Component,
        built: &IndexMap<String, BuiltRig>,
        connection: &ComponentConnection,
    ) -> Result<(), MetaError> {
        let source_is_container = connection.source.component == component.name;
        let target_is_container = connection.target.component == component.name;
        if source_is_container && target_is_container {
            return Err(MetaError::SelfLoop {
                component: component.name.clone(),
            });
        }

        let source = built.get(&connection.source.component).ok_or_else(|| {
            MetaError::UnresolvedEndpoint {
                component: connection.source.component.clone(),
            }
        })?;
        let target = built.get(&connection.target.component).ok_or_else(|| {
            MetaError::UnresolvedEndpoint {
                component: connection.target.component.clone(),
            }
        })?;

        let (source_node, target_node) = if source_is_container {
            (source.node.clone(), target.node.clone())
        } else if target_is_container {
            (
                self.output_of(host, &source.node)?,
                self.output_of(host, &target.node)?,
            )
        } else {
            let source_node = if source.generic {
                self.output_of(host, &source.node)?
            } else {
                source.node.clone()
            };
            (source_node, target.node.clone())
        };

        let source_plug = Plug::new(source_node.borrow().handle(), &connection.source.port);
        let target_plug = Plug::new(target_node.borrow().handle(), &connection.target.port);
        if let Err(error) = host.connect_attr(&source_plug, &target_plug) {
            tracing::warn!(
                source = %source_plug,
                target = %target_plug,
                %error,
                "skipping rig connection"
            );
        }
        Ok(())
    }

    fn output_of(
        &self,
        host: &mut dyn SceneHost,
        rig: &MetaNodeRef,
    ) -> Result<MetaNodeRef, MetaError> {
        rig_output_node(self.store, host, rig)?.ok_or_else(|| MetaError::Registry {
            node: rig.borrow().handle().to_string(),
            detail: "output node reference is unset".to_string(),
        })
    }
}
