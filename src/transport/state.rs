// SPDX-License-Identifier: MIT

//! Shared application state: the payload axum's `State` extractor hands to
//! every handler.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::collab::Collaborators;
use crate::config::Config;

/// Runtime lifecycle primitives independent of any one connection.
pub struct LifecycleState {
    pub shutdown: CancellationToken,
    pub ws_client_count: AtomicI32,
}

impl LifecycleState {
    fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown, ws_client_count: AtomicI32::new(0) }
    }
}

/// Shared state for the whole gateway process.
pub struct Store {
    pub collab: Collaborators,
    pub config: Arc<Config>,
    pub lifecycle: LifecycleState,
}

impl Store {
    pub fn new(collab: Collaborators, config: Arc<Config>, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self { collab, config, lifecycle: LifecycleState::new(shutdown) })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
