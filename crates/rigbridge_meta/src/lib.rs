// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed-field persistence for rigbridge.
//!
//! This crate stores typed, validated key/value state directly on native
//! scene nodes so rig state survives a host file save/reload without an
//! external database:
//! - Value codecs between abstract values and native attributes
//! - Single and multi (array) fields with private/public access rules
//! - Self-describing meta nodes that recover their specialized class and
//!   field set from data stored on the node itself
//! - A rig layer and a recursive component builder on top
//!
//! ## Architecture
//!
//! A [`MetaStore`] owns the process-wide instance cache and the class
//! registry. Everything else flows through it: attaching a native node
//! yields the one cached [`MetaNode`] for it, reference fields resolve
//! through it, and the [`ComponentBuilder`] uses it to pick specialized
//! rig classes by library and type name.

pub mod builder;
pub mod error;
pub mod field;
pub mod metanode;
pub mod rig;
pub mod validator;

pub use builder::ComponentBuilder;
pub use error::MetaError;
pub use field::{Accessibility, Field, FieldDescription, MultiField, SingleField};
pub use metanode::{
    MetaClass, MetaNode, MetaNodeRef, MetaStore, BASE_CLASS, CLASS_FIELD, FIELDS_FIELD,
    OWNED_FIELD, OWNER_FIELD,
};
pub use rig::{
    create_rig, field_value_from_port, rig_output_node, validator_for_port, OUTPUT_NODE_FIELD,
};
pub use validator::{FieldValue, ValidatorError, ValidatorKind};
