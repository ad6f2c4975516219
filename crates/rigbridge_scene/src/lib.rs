// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene host command surface for rigbridge.
//!
//! This crate defines the small, fixed set of commands the bridge layer is
//! allowed to issue against the hosting 3D application:
//! - Node creation, renaming, deletion
//! - Dynamic attribute declaration and value access
//! - Attribute connections and locks
//! - Selection
//!
//! ## Architecture
//!
//! The surface is a single trait, [`SceneHost`], over a plug/value model:
//! - [`NodeHandle`] identifies a node, stable across renames
//! - [`Plug`] addresses one attribute slot, optionally an array element
//! - [`SceneValue`] is the tagged value type accepted and returned by the host
//! - [`AttrSpec`] carries the parameters needed to declare a new attribute
//!
//! [`MemoryScene`] is a complete in-process host used for headless builds
//! and tests.

pub mod attr;
pub mod host;
pub mod memory;
pub mod value;

pub use attr::{AttrKind, AttrSpec, SetOptions};
pub use host::{NodeHandle, Plug, SceneError, SceneHost};
pub use memory::MemoryScene;
pub use value::SceneValue;
