// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authoring graph interface consumed by rigbridge.
//!
//! The authoring library itself lives outside this workspace; the bridge
//! only sees what this crate defines:
//! - Stable entity ids ([`GraphId`], [`NodeId`], [`PortId`], [`ConnectionId`])
//! - The port model ([`PortDirection`], [`PortType`], [`PortValue`])
//! - Lifecycle notifications ([`GraphEvent`]) with their metadata records
//! - Component trees ([`Component`]) fed to the rig builder
//!
//! Events are delivered synchronously, in the order the authoring side
//! fires them: entities are created before anything that depends on them
//! and deleted before anything they depend on.

pub mod component;
pub mod event;
pub mod id;
pub mod port;

pub use component::{Component, ComponentConnection, ComponentPort, PortRef};
pub use event::{ConnectionInfo, GraphEvent, GraphInfo, NodeInfo, PortInfo};
pub use id::{ConnectionId, GraphId, NodeId, PortId};
pub use port::{PortDirection, PortType, PortValue};
