// SPDX-License-Identifier: MIT OR Apache-2.0
//! State mirror for rigbridge.
//!
//! Keeps the host scene in sync with the authoring graph: every abstract
//! graph, node, port and connection is projected onto native objects by a
//! per-entity adapter, and a top-level [`StateMirror`] owns the id-keyed
//! maps tying the two worlds together.
//!
//! ## Architecture
//!
//! - [`StateMirror`] consumes [`GraphEvent`]s and dispatches to adapters
//! - [`NodeAdapter`] implementations own the native nodes of one abstract
//!   node; specialized adapters are picked through an [`AdapterRegistry`]
//! - [`MirrorPort`] and [`MirrorConnection`] project attributes and wires
//! - [`SceneSerializer`] reads live native values back at snapshot time
//!
//! Lookups into the maps are strict: an unknown id means the mirror and
//! the authoring graph have diverged, which is always surfaced as a
//! [`MirrorError::Desync`], never swallowed.
//!
//! [`GraphEvent`]: rigbridge_graph::GraphEvent

pub mod connection;
pub mod error;
pub mod graph;
pub mod node;
pub mod port;
pub mod serializer;
pub mod state;

pub use connection::MirrorConnection;
pub use error::{EntityKind, MirrorError};
pub use graph::MirrorGraph;
pub use node::{AdapterFactory, AdapterRegistry, GroupNode, NodeAdapter, SimpleNode};
pub use port::MirrorPort;
pub use serializer::{SceneSerializer, Snapshot};
pub use state::{ConnectionKey, GraphKey, NodeKey, PortKey, StateMirror};
