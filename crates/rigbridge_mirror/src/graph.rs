// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph adapter.

use rigbridge_graph::{GraphId, GraphInfo};

/// Mirror-side representation of one abstract graph.
///
/// Graphs carry no native state of their own; the adapter exists so the
/// existence invariant holds uniformly across all four entity kinds.
#[derive(Debug, Clone)]
pub struct MirrorGraph {
    id: GraphId,
}

impl MirrorGraph {
    /// Build the adapter for a created graph.
    pub fn from_info(info: &GraphInfo) -> Self {
        Self { id: info.id }
    }

    /// Mirrored graph id.
    pub fn id(&self) -> GraphId {
        self.id
    }
}
