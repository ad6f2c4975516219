// SPDX-License-Identifier: MIT OR Apache-2.0
//! The rig layer: meta nodes projected from authored components.
//!
//! A rig is a meta node pair (input and output) carrying one public field
//! per component port. Generic rigs are containers whose insides are built
//! by recursing into sub-components; specialized rig classes implement
//! their own internals in [`MetaClass::build`].

use crate::error::MetaError;
use crate::metanode::{MetaClass, MetaNodeRef, MetaStore, DEFAULT_NODE_TYPE};
use crate::validator::{FieldValue, ValidatorKind};
use crate::field::Accessibility;
use rigbridge_graph::{Component, PortDirection, PortType, PortValue};
use std::rc::Rc;

/// Name of the field referencing a rig's output node.
pub const OUTPUT_NODE_FIELD: &str = "output_node";

/// Validator used for a port's value type.
pub fn validator_for_port(port_type: PortType) -> ValidatorKind {
    match port_type {
        PortType::Int => ValidatorKind::Int,
        PortType::Float => ValidatorKind::Float,
        PortType::Bool => ValidatorKind::Bool,
        PortType::Text => ValidatorKind::Text,
        PortType::Vector2 => ValidatorKind::Vector2,
        PortType::Vector3 => ValidatorKind::Vector3,
        PortType::Quaternion => ValidatorKind::Quaternion,
        PortType::Matrix4 => ValidatorKind::Matrix4,
        PortType::Reference => ValidatorKind::NodeRef,
    }
}

/// Field value carrying an authored port value.
pub fn field_value_from_port(value: &PortValue) -> FieldValue {
    match value {
        PortValue::Int(v) => FieldValue::Int(*v),
        PortValue::Float(v) => FieldValue::Float(*v),
        PortValue::Bool(v) => FieldValue::Bool(*v),
        PortValue::Text(v) => FieldValue::Text(v.clone()),
        PortValue::Vector2(v) => FieldValue::Vector2(*v),
        PortValue::Vector3(v) => FieldValue::Vector3(*v),
        PortValue::Quaternion(v) => FieldValue::Quaternion(*v),
        PortValue::Matrix4(v) => FieldValue::Matrix4(*v),
        PortValue::Reference(v) => FieldValue::NodeRef(*v),
    }
}

/// Create the meta node pair for a component and declare its port fields.
///
/// Input ports land on the input node, output ports on the output node.
/// Classes opting into [`MetaClass::single_node`] keep both on one native
/// node. The returned rig is the input node; its output node is reachable
/// through the [`OUTPUT_NODE_FIELD`] reference.
pub fn create_rig(
    store: &MetaStore,
    host: &mut dyn rigbridge_scene::SceneHost,
    component: &Component,
    class: Option<&Rc<dyn MetaClass>>,
) -> Result<MetaNodeRef, MetaError> {
    let class_name = class.map(|class| class.class_name().to_string());
    let node_type = class.map_or(DEFAULT_NODE_TYPE, |class| class.node_type());

    let (rig, output) = if class.is_some_and(|class| class.single_node()) {
        let node = store.create(host, node_type, &component.name, class_name.as_deref())?;
        (node.clone(), node)
    } else {
        let input = store.create(
            host,
            node_type,
            &format!("{}_input", component.name),
            class_name.as_deref(),
        )?;
        let output = store.create_owned(
            host,
            &input,
            DEFAULT_NODE_TYPE,
            &format!("{}_output", component.name),
            None,
        )?;
        (input, output)
    };

    let output_uuid = output.borrow().uuid();
    {
        let mut node = rig.borrow_mut();
        node.add_field(
            host,
            OUTPUT_NODE_FIELD,
            ValidatorKind::NodeRef,
            Accessibility::Private,
            false,
            None,
        )?;
        node.single_mut(OUTPUT_NODE_FIELD)?
            .set(host, FieldValue::NodeRef(Some(output_uuid)))?;
    }

    for port in &component.ports {
        let target = match port.direction {
            PortDirection::Input => &rig,
            PortDirection::Output => &output,
        };
        let mut node = target.borrow_mut();
        node.add_field(
            host,
            &port.name,
            validator_for_port(port.port_type),
            Accessibility::Public,
            false,
            None,
        )?;
        node.single_mut(&port.name)?
            .set(host, field_value_from_port(&port.value))?;
    }

    Ok(rig)
}

/// Resolve a rig's output node through its stored reference.
pub fn rig_output_node(
    store: &MetaStore,
    host: &mut dyn rigbridge_scene::SceneHost,
    rig: &MetaNodeRef,
) -> Result<Option<MetaNodeRef>, MetaError> {
    let uuid = match rig.borrow().single(OUTPUT_NODE_FIELD)?.peek() {
        FieldValue::NodeRef(Some(uuid)) => *uuid,
        _ => return Ok(None),
    };
    store.resolve(host, uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_graph::ComponentPort;
    use rigbridge_scene::{MemoryScene, Plug, SceneHost, SceneValue};

    #[test]
    fn test_rig_splits_ports_by_direction() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let component = Component::new("blend", "ChainBlender")
            .with_port(ComponentPort::new(
                "weight",
                PortDirection::Input,
                PortType::Float,
            ))
            .with_port(ComponentPort::new(
                "result",
                PortDirection::Output,
                PortType::Float,
            ));

        let rig = create_rig(&store, &mut scene, &component, None).unwrap();
        let output = rig_output_node(&store, &mut scene, &rig)
            .unwrap()
            .expect("output node reference set");

        assert!(scene.attr_exists(rig.borrow().handle(), "weight"));
        assert!(!scene.attr_exists(rig.borrow().handle(), "result"));
        assert!(scene.attr_exists(output.borrow().handle(), "result"));
        assert_eq!(scene.node_name(rig.borrow().handle()).unwrap(), "blend_input");
        assert_eq!(
            scene.node_name(output.borrow().handle()).unwrap(),
            "blend_output"
        );
    }

    #[test]
    fn test_port_values_written_through() {
        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let component = Component::new("ctl", "Control").with_port(
            ComponentPort::new("size", PortDirection::Input, PortType::Float)
                .with_value(PortValue::Float(2.5)),
        );

        let rig = create_rig(&store, &mut scene, &component, None).unwrap();
        let plug = Plug::new(rig.borrow().handle(), "size");
        assert_eq!(scene.get_attr(&plug).unwrap(), SceneValue::Float(2.5));
    }

    #[test]
    fn test_single_node_class_shares_the_node() {
        struct ControlRig;
        impl MetaClass for ControlRig {
            fn class_name(&self) -> &str {
                "ControlRig"
            }
            fn node_type(&self) -> &str {
                "transform"
            }
            fn single_node(&self) -> bool {
                true
            }
        }

        let mut scene = MemoryScene::new();
        let store = MetaStore::new();
        let class: Rc<dyn MetaClass> = Rc::new(ControlRig);
        store.register_class(class.clone());

        let component = Component::new("ctl", "Control")
            .with_port(ComponentPort::new(
                "world_matrix",
                PortDirection::Output,
                PortType::Matrix4,
            ));
        let rig = create_rig(&store, &mut scene, &component, Some(&class)).unwrap();
        let output = rig_output_node(&store, &mut scene, &rig).unwrap().unwrap();

        assert!(Rc::ptr_eq(&rig, &output));
        assert_eq!(scene.node_type(rig.borrow().handle()).unwrap(), "transform");
        assert!(scene.attr_exists(rig.borrow().handle(), "world_matrix"));
    }
}
