// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed fields bound to native attributes.
//!
//! A field is one named, validated slot on a meta node, backed by exactly
//! one native attribute (or one native array attribute for multi fields).
//! Private fields keep their attribute locked outside programmatic writes;
//! public fields write through on set and re-read on get so direct user
//! edits in the host are always honored.

use crate::error::MetaError;
use crate::validator::{FieldValue, ValidatorKind};
use rigbridge_scene::{NodeHandle, Plug, SceneError, SceneHost};
use serde::{Deserialize, Serialize};

/// Who may edit a field's backing attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    /// Only written programmatically; the attribute stays locked otherwise
    Private,
    /// Editable by the user through the host UI
    Public,
}

/// Serialized description of one field, as stored in the self-description
/// registry on the owning node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Value codec
    pub validator: ValidatorKind,
    /// Access rule
    pub accessibility: Accessibility,
    /// Whether the field is an ordered sequence
    pub multi: bool,
    /// Construction-time value, if one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

/// Keeps a set of plugs unlocked for the duration of a write.
///
/// The plugs are re-locked when the guard drops, on every exit path. A
/// failure to restore a lock is logged rather than raised, the write
/// itself already succeeded or failed on its own terms.
struct LockGuard<'a> {
    host: &'a mut dyn SceneHost,
    plugs: Vec<Plug>,
}

impl<'a> LockGuard<'a> {
    fn open(host: &'a mut dyn SceneHost, plugs: Vec<Plug>) -> Result<Self, SceneError> {
        for plug in &plugs {
            host.unlock_attr(plug)?;
        }
        Ok(Self { host, plugs })
    }

    fn host(&mut self) -> &mut dyn SceneHost {
        &mut *self.host
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        for plug in &self.plugs {
            if let Err(error) = self.host.lock_attr(plug) {
                tracing::warn!(plug = %plug, %error, "failed to restore attribute lock");
            }
        }
    }
}

/// Keeps the elements of an array attribute unlocked for a rewrite.
///
/// Elements existing when the guard drops are locked, which covers both
/// the surviving and the freshly written set.
struct ElementLockGuard<'a> {
    host: &'a mut dyn SceneHost,
    plug: Plug,
}

impl<'a> ElementLockGuard<'a> {
    fn open(host: &'a mut dyn SceneHost, plug: Plug) -> Result<Self, SceneError> {
        host.unlock_attr(&plug)?;
        for index in host.array_elements(&plug)? {
            host.unlock_attr(&plug.element(index))?;
        }
        Ok(Self { host, plug })
    }

    fn host(&mut self) -> &mut dyn SceneHost {
        &mut *self.host
    }
}

impl Drop for ElementLockGuard<'_> {
    fn drop(&mut self) {
        match self.host.array_elements(&self.plug) {
            Ok(indices) => {
                for index in indices {
                    let element = self.plug.element(index);
                    if let Err(error) = self.host.lock_attr(&element) {
                        tracing::warn!(plug = %element, %error, "failed to restore element lock");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(plug = %self.plug, %error, "failed to restore element locks");
            }
        }
    }
}

/// A single-valued typed field.
#[derive(Debug)]
pub struct SingleField {
    name: String,
    validator: ValidatorKind,
    plug: Plug,
    accessibility: Accessibility,
    value: FieldValue,
}

impl SingleField {
    /// Bind a field to an attribute, creating the attribute if absent, then
    /// read through whatever value is already stored on the node.
    pub fn create(
        host: &mut dyn SceneHost,
        node: NodeHandle,
        name: &str,
        validator: ValidatorKind,
        accessibility: Accessibility,
        default: Option<FieldValue>,
    ) -> Result<Self, MetaError> {
        if !host.attr_exists(node, name) {
            let mut spec = validator.attr_spec(name, false);
            spec.keyable = accessibility == Accessibility::Public;
            host.add_attr(node, spec)?;
        }
        let mut field = Self {
            name: name.to_string(),
            validator,
            plug: Plug::new(node, name),
            accessibility,
            value: default.unwrap_or_else(|| validator.default_value()),
        };
        field.read(host)?;
        Ok(field)
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value codec.
    pub fn validator(&self) -> ValidatorKind {
        self.validator
    }

    /// Access rule.
    pub fn accessibility(&self) -> Accessibility {
        self.accessibility
    }

    /// Backing plug.
    pub fn plug(&self) -> &Plug {
        &self.plug
    }

    /// Current in-memory value, without consulting the host.
    pub fn peek(&self) -> &FieldValue {
        &self.value
    }

    /// Current value.
    ///
    /// Public fields re-read from the host first, the user may have edited
    /// the attribute directly. Private fields trust memory.
    pub fn get(&mut self, host: &dyn SceneHost) -> Result<&FieldValue, MetaError> {
        if self.accessibility == Accessibility::Public {
            self.read(host)?;
        }
        Ok(&self.value)
    }

    /// Set the value.
    ///
    /// Public fields write through immediately so the attribute is correct
    /// without an explicit save step; private fields wait for [`write`].
    ///
    /// [`write`]: Self::write
    pub fn set(&mut self, host: &mut dyn SceneHost, value: FieldValue) -> Result<(), MetaError> {
        self.value = value;
        if self.accessibility == Accessibility::Public {
            self.write(host)?;
        }
        Ok(())
    }

    /// Push the in-memory value to the host.
    ///
    /// A value that fails to convert is logged and skipped, keeping the
    /// in-memory value for a later retry. An attribute with an incoming
    /// connection is never overwritten.
    pub fn write(&mut self, host: &mut dyn SceneHost) -> Result<(), MetaError> {
        let native = match self.validator.to_native(&self.value) {
            Ok(native) => native,
            Err(error) => {
                tracing::warn!(plug = %self.plug, %error, "skipping field write");
                return Ok(());
            }
        };
        if self.accessibility == Accessibility::Private {
            let mut guard = LockGuard::open(host, vec![self.plug.clone()])?;
            push_unconnected(guard.host(), &self.plug, native, self.validator)
        } else {
            push_unconnected(host, &self.plug, native, self.validator)
        }
    }

    /// Pull the host value into memory.
    pub fn read(&mut self, host: &dyn SceneHost) -> Result<(), MetaError> {
        let raw = host.get_attr(&self.plug)?;
        self.value = self.validator.from_native(&raw, host)?;
        Ok(())
    }
}

fn push_unconnected(
    host: &mut dyn SceneHost,
    plug: &Plug,
    native: rigbridge_scene::SceneValue,
    validator: ValidatorKind,
) -> Result<(), MetaError> {
    // Connected attributes are driven by the connection; the stored value
    // must not fight it.
    if host.source_connection(plug)?.is_some() {
        tracing::debug!(plug = %plug, "attribute is connected, write skipped");
        return Ok(());
    }
    host.set_attr(plug, native, validator.set_options())?;
    Ok(())
}

/// An ordered sequence field backed by a native array attribute.
///
/// Multi fields are programmatic: they refresh only on an explicit
/// [`read`](Self::read) and keep their elements locked between writes.
#[derive(Debug)]
pub struct MultiField {
    name: String,
    validator: ValidatorKind,
    plug: Plug,
    values: Vec<FieldValue>,
}

impl MultiField {
    /// Bind a multi field to an array attribute, creating it if absent,
    /// then read through the elements already stored on the node.
    pub fn create(
        host: &mut dyn SceneHost,
        node: NodeHandle,
        name: &str,
        validator: ValidatorKind,
    ) -> Result<Self, MetaError> {
        if !host.attr_exists(node, name) {
            host.add_attr(node, validator.attr_spec(name, true))?;
        }
        let mut field = Self {
            name: name.to_string(),
            validator,
            plug: Plug::new(node, name),
            values: Vec::new(),
        };
        field.read(host)?;
        Ok(field)
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value codec.
    pub fn validator(&self) -> ValidatorKind {
        self.validator
    }

    /// Backing array plug.
    pub fn plug(&self) -> &Plug {
        &self.plug
    }

    /// Current in-memory sequence.
    pub fn get(&self) -> &[FieldValue] {
        &self.values
    }

    /// Replace the in-memory sequence.
    pub fn set(&mut self, values: Vec<FieldValue>) {
        self.values = values;
    }

    /// Append one value to the in-memory sequence.
    pub fn push(&mut self, value: FieldValue) {
        self.values.push(value);
    }

    /// Rewrite the native array from the in-memory sequence.
    ///
    /// Existing elements are cleared first; the sequence is written densely
    /// from index zero. Elements are re-locked when the write finishes,
    /// whether it succeeded or not.
    pub fn write(&mut self, host: &mut dyn SceneHost) -> Result<(), MetaError> {
        let mut guard = ElementLockGuard::open(host, self.plug.clone())?;
        guard.host().remove_array_elements(&self.plug)?;
        for (index, value) in self.values.iter().enumerate() {
            let native = match self.validator.to_native(value) {
                Ok(native) => native,
                Err(error) => {
                    tracing::warn!(plug = %self.plug, index, %error, "skipping element write");
                    continue;
                }
            };
            guard.host().set_attr(
                &self.plug.element(index as u32),
                native,
                self.validator.set_options(),
            )?;
        }
        Ok(())
    }

    /// Rebuild the in-memory sequence from the native array.
    ///
    /// Elements are visited in index order; removed elements leave gaps in
    /// the native array and are simply absent from the result.
    pub fn read(&mut self, host: &dyn SceneHost) -> Result<(), MetaError> {
        let mut values = Vec::new();
        for index in host.array_elements(&self.plug)? {
            let raw = host.get_attr(&self.plug.element(index))?;
            values.push(self.validator.from_native(&raw, host)?);
        }
        self.values = values;
        Ok(())
    }

    /// Empty the sequence in memory and remove every native element.
    pub fn clear(&mut self, host: &mut dyn SceneHost) -> Result<(), MetaError> {
        self.values.clear();
        host.unlock_attr(&self.plug)?;
        for index in host.array_elements(&self.plug)? {
            host.unlock_attr(&self.plug.element(index))?;
        }
        host.remove_array_elements(&self.plug)?;
        Ok(())
    }
}

/// A field of either multiplicity, as held in a node's field table.
#[derive(Debug)]
pub enum Field {
    /// Single-valued field
    Single(SingleField),
    /// Ordered sequence field
    Multi(MultiField),
}

impl Field {
    /// Field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Single(field) => field.name(),
            Self::Multi(field) => field.name(),
        }
    }

    /// Value codec.
    pub fn validator(&self) -> ValidatorKind {
        match self {
            Self::Single(field) => field.validator(),
            Self::Multi(field) => field.validator(),
        }
    }

    /// Push the in-memory value to the host.
    pub fn write(&mut self, host: &mut dyn SceneHost) -> Result<(), MetaError> {
        match self {
            Self::Single(field) => field.write(host),
            Self::Multi(field) => field.write(host),
        }
    }

    /// Pull the host value into memory.
    pub fn read(&mut self, host: &dyn SceneHost) -> Result<(), MetaError> {
        match self {
            Self::Single(field) => field.read(host),
            Self::Multi(field) => field.read(host),
        }
    }

    /// View as a single field.
    pub fn as_single(&self) -> Result<&SingleField, MetaError> {
        match self {
            Self::Single(field) => Ok(field),
            Self::Multi(field) => Err(MetaError::FieldShape {
                name: field.name().to_string(),
                expected: "single",
                actual: "multi",
            }),
        }
    }

    /// View as a mutable single field.
    pub fn as_single_mut(&mut self) -> Result<&mut SingleField, MetaError> {
        match self {
            Self::Single(field) => Ok(field),
            Self::Multi(field) => Err(MetaError::FieldShape {
                name: field.name().to_string(),
                expected: "single",
                actual: "multi",
            }),
        }
    }

    /// View as a multi field.
    pub fn as_multi(&self) -> Result<&MultiField, MetaError> {
        match self {
            Self::Multi(field) => Ok(field),
            Self::Single(field) => Err(MetaError::FieldShape {
                name: field.name().to_string(),
                expected: "multi",
                actual: "single",
            }),
        }
    }

    /// View as a mutable multi field.
    pub fn as_multi_mut(&mut self) -> Result<&mut MultiField, MetaError> {
        match self {
            Self::Multi(field) => Ok(field),
            Self::Single(field) => Err(MetaError::FieldShape {
                name: field.name().to_string(),
                expected: "multi",
                actual: "single",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_scene::{MemoryScene, SceneValue, SetOptions};

    fn scene_with_node() -> (MemoryScene, NodeHandle) {
        let mut scene = MemoryScene::new();
        let node = scene.create_node("network", "meta", None).unwrap();
        (scene, node)
    }

    #[test]
    fn test_public_field_reads_live_values() {
        let (mut scene, node) = scene_with_node();
        let mut field = SingleField::create(
            &mut scene,
            node,
            "size",
            ValidatorKind::Float,
            Accessibility::Public,
            None,
        )
        .unwrap();

        // Out-of-band edit, as a user would do through the host UI.
        scene
            .set_attr(
                &Plug::new(node, "size"),
                SceneValue::Float(4.5),
                SetOptions::default(),
            )
            .unwrap();
        assert_eq!(field.get(&scene).unwrap(), &FieldValue::Float(4.5));
    }

    #[test]
    fn test_private_field_trusts_memory() {
        let (mut scene, node) = scene_with_node();
        let mut field = SingleField::create(
            &mut scene,
            node,
            "state",
            ValidatorKind::Float,
            Accessibility::Private,
            None,
        )
        .unwrap();
        field.set(&mut scene, FieldValue::Float(1.0)).unwrap();

        // Private attributes are not written until an explicit write; an
        // out-of-band edit must not leak into get either.
        scene
            .set_attr(
                &Plug::new(node, "state"),
                SceneValue::Float(9.0),
                SetOptions::default(),
            )
            .unwrap();
        assert_eq!(field.get(&scene).unwrap(), &FieldValue::Float(1.0));
    }

    #[test]
    fn test_public_set_writes_through() {
        let (mut scene, node) = scene_with_node();
        let mut field = SingleField::create(
            &mut scene,
            node,
            "size",
            ValidatorKind::Float,
            Accessibility::Public,
            None,
        )
        .unwrap();
        field.set(&mut scene, FieldValue::Float(2.0)).unwrap();
        assert_eq!(
            scene.get_attr(&Plug::new(node, "size")).unwrap(),
            SceneValue::Float(2.0)
        );
    }

    #[test]
    fn test_private_write_restores_lock() {
        let (mut scene, node) = scene_with_node();
        let mut field = SingleField::create(
            &mut scene,
            node,
            "state",
            ValidatorKind::Text,
            Accessibility::Private,
            None,
        )
        .unwrap();
        let plug = Plug::new(node, "state");
        scene.lock_attr(&plug).unwrap();

        field
            .set(&mut scene, FieldValue::Text("written".into()))
            .unwrap();
        field.write(&mut scene).unwrap();

        assert!(scene.is_locked(&plug).unwrap());
        assert_eq!(
            scene.get_attr(&plug).unwrap(),
            SceneValue::Text("written".into())
        );
    }

    #[test]
    fn test_write_skipped_on_connected_attribute() {
        let (mut scene, node) = scene_with_node();
        let driver = scene.create_node("network", "driver", None).unwrap();
        scene
            .add_attr(driver, rigbridge_scene::AttrSpec::new("out", rigbridge_scene::AttrKind::Double))
            .unwrap();
        let source = Plug::new(driver, "out");
        scene
            .set_attr(&source, SceneValue::Float(10.0), SetOptions::default())
            .unwrap();

        let mut field = SingleField::create(
            &mut scene,
            node,
            "size",
            ValidatorKind::Float,
            Accessibility::Public,
            None,
        )
        .unwrap();
        let target = Plug::new(node, "size");
        scene.connect_attr(&source, &target).unwrap();

        field.set(&mut scene, FieldValue::Float(99.0)).unwrap();
        // The connection wins over the stored value.
        assert_eq!(scene.get_attr(&target).unwrap(), SceneValue::Float(10.0));
    }

    #[test]
    fn test_conversion_failure_skips_write() {
        let (mut scene, node) = scene_with_node();
        let mut field = SingleField::create(
            &mut scene,
            node,
            "count",
            ValidatorKind::Int,
            Accessibility::Private,
            None,
        )
        .unwrap();
        // Force an unconvertible in-memory value.
        field.set(&mut scene, FieldValue::Text("nope".into())).unwrap();
        field.write(&mut scene).unwrap();
        assert_eq!(
            scene.get_attr(&Plug::new(node, "count")).unwrap(),
            SceneValue::Int(0)
        );
        // The bad value is retained for a later retry.
        assert_eq!(field.peek(), &FieldValue::Text("nope".into()));
    }

    #[test]
    fn test_multi_gap_tolerance() {
        let (mut scene, node) = scene_with_node();
        let mut field =
            MultiField::create(&mut scene, node, "items", ValidatorKind::Float).unwrap();
        field.set(vec![
            FieldValue::Float(0.0),
            FieldValue::Float(1.0),
            FieldValue::Float(2.0),
        ]);
        field.write(&mut scene).unwrap();

        // Remove the middle element directly on the host, leaving a gap.
        scene
            .remove_array_element(&Plug::new(node, "items").element(1))
            .unwrap();
        field.read(&mut scene).unwrap();
        assert_eq!(field.get(), &[FieldValue::Float(0.0), FieldValue::Float(2.0)]);
    }

    #[test]
    fn test_multi_write_locks_elements() {
        let (mut scene, node) = scene_with_node();
        let mut field = MultiField::create(&mut scene, node, "items", ValidatorKind::Int).unwrap();
        field.set(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        field.write(&mut scene).unwrap();

        let plug = Plug::new(node, "items");
        assert!(scene.is_locked(&plug.element(0)).unwrap());
        assert!(scene.is_locked(&plug.element(1)).unwrap());

        // A rewrite must cope with its own locks.
        field.set(vec![FieldValue::Int(7)]);
        field.write(&mut scene).unwrap();
        assert_eq!(scene.array_elements(&plug).unwrap(), vec![0]);
        assert_eq!(
            scene.get_attr(&plug.element(0)).unwrap(),
            SceneValue::Int(7)
        );
    }

    #[test]
    fn test_multi_clear() {
        let (mut scene, node) = scene_with_node();
        let mut field = MultiField::create(&mut scene, node, "items", ValidatorKind::Int).unwrap();
        field.set(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        field.write(&mut scene).unwrap();

        field.clear(&mut scene).unwrap();
        assert!(field.get().is_empty());
        assert!(scene
            .array_elements(&Plug::new(node, "items"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_field_shape_errors() {
        let (mut scene, node) = scene_with_node();
        let single = Field::Single(
            SingleField::create(
                &mut scene,
                node,
                "one",
                ValidatorKind::Int,
                Accessibility::Private,
                None,
            )
            .unwrap(),
        );
        assert!(single.as_single().is_ok());
        assert!(matches!(
            single.as_multi(),
            Err(MetaError::FieldShape { .. })
        ));
    }
}
