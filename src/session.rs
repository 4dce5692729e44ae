// SPDX-License-Identifier: MIT

//! Session record (C4): the factory that turns an authenticated upgrade
//! request into a `Session`, plus the session's own identity and status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::collab::{Collaborators, ContainerRef};
use crate::error::{ErrorKind, GatewayError};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> String {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Inactive,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// The raw fields a client supplies to open a session, gathered by the
/// transport layer either from request headers or from the client's first
/// WebSocket auth message (`method=web`).
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub access_token: String,
    pub app_name: String,
    pub proc_name: String,
    pub instance_no: String,
    pub source_ip: String,
}

/// The immutable identity of a session, shared with the `Pipe` so it never
/// needs a mutable reference back into the orchestrator-owned `Session`.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub session_id: String,
    pub user: String,
    pub source_ip: String,
    pub app_name: String,
    pub proc_name: String,
    pub instance_no: String,
    pub container: ContainerRef,
    pub created_at: SystemTime,
}

/// A live user session connected to a container.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Arc<SessionIdentity>,
    pub status: SessionStatus,
}

impl Session {
    /// The directory name (under the configured data root) this session's
    /// replay transcript and timing files are written to.
    pub fn data_dir_name(&self) -> &str {
        &self.identity.session_id
    }
}

/// Authorize and resolve `req` into a new `Session`.
///
/// Rejects `app_name == own_app_name` (the gateway refusing to let an
/// operator open a shell into itself), then calls the `Authorizer` and
/// `Discovery` collaborators in turn. Any failure is returned as a
/// `GatewayError` whose `styled_message()` is the exact CLOSE payload the
/// caller should send back over the WebSocket before dropping the
/// connection.
pub async fn create_session(
    req: SessionRequest,
    collab: &Collaborators,
    own_app_name: &str,
) -> Result<Session, GatewayError> {
    if req.app_name == own_app_name {
        return Err(GatewayError::new(
            ErrorKind::ForbiddenTarget,
            format!("appName == {own_app_name} is not allowed."),
        ));
    }

    let user = collab
        .authorizer
        .authorize(&req.access_token, &req.app_name)
        .await
        .map_err(|_| GatewayError::new(ErrorKind::AuthFailed, "Authorization failed."))?;

    let container = collab
        .discovery
        .locate_container(&req.app_name, &req.proc_name, &req.instance_no)
        .await
        .map_err(|_| GatewayError::new(ErrorKind::ContainerNotFound, "Container is not found."))?;

    let identity = SessionIdentity {
        session_id: next_session_id(),
        user: user.email,
        source_ip: req.source_ip,
        app_name: req.app_name,
        proc_name: req.proc_name,
        instance_no: req.instance_no,
        container,
        created_at: SystemTime::now(),
    };

    Ok(Session { identity: Arc::new(identity), status: SessionStatus::Active })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
