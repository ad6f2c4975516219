// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection adapter.

use crate::error::MirrorError;
use rigbridge_graph::{ConnectionId, PortId};
use rigbridge_scene::{Plug, SceneHost};

/// Mirror-side representation of one abstract connection.
///
/// Exactly one native connection corresponds to each adapter. The native
/// plugs are resolved when the adapter is built and kept so teardown does
/// not depend on the port maps still holding both endpoints.
#[derive(Debug, Clone)]
pub struct MirrorConnection {
    id: ConnectionId,
    source: PortId,
    target: PortId,
    source_plug: Plug,
    target_plug: Plug,
}

impl MirrorConnection {
    /// Build the adapter from resolved endpoints.
    pub fn new(
        id: ConnectionId,
        source: PortId,
        target: PortId,
        source_plug: Plug,
        target_plug: Plug,
    ) -> Self {
        Self {
            id,
            source,
            target,
            source_plug,
            target_plug,
        }
    }

    /// Mirrored connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Source port id.
    pub fn source(&self) -> PortId {
        self.source
    }

    /// Target port id.
    pub fn target(&self) -> PortId {
        self.target
    }

    /// Native plug driving the connection.
    pub fn source_plug(&self) -> &Plug {
        &self.source_plug
    }

    /// Native plug driven by the connection.
    pub fn target_plug(&self) -> &Plug {
        &self.target_plug
    }

    /// Wire the native connection, replacing any prior incoming connection
    /// at the target.
    pub fn build(&self, host: &mut dyn SceneHost) -> Result<(), MirrorError> {
        host.connect_attr(&self.source_plug, &self.target_plug)?;
        Ok(())
    }

    /// Tear the native connection down.
    pub fn remove(&self, host: &mut dyn SceneHost) -> Result<(), MirrorError> {
        host.disconnect_attr(&self.source_plug, &self.target_plug)?;
        Ok(())
    }
}
