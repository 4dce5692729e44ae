// SPDX-License-Identifier: MIT

//! Minimal, production-usable default collaborators.
//!
//! `Persistence` and `Authorizer` get real (if simple) defaults per the
//! spec's non-goals: an in-memory audit log and a single shared
//! bearer-token check. `Discovery` and `ContainerRuntime` genuinely need a
//! container platform integration (Docker/Kubernetes); main.rs wires these
//! with a stub that fails clearly until an operator supplies a real one —
//! standing up that integration is explicitly out of this gateway's scope.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    Alerter, AttachStreams, AuthorizedUser, Authorizer, ContainerRef, ContainerRuntime, Discovery,
    ExecStreams, Persistence,
};
use crate::command::Command;
use crate::error::{ErrorKind, GatewayError};
use crate::session::SessionIdentity;

/// Authorizes any request whose token matches the gateway's own configured
/// bearer token. Real deployments with per-application SSO should replace
/// this with an `Authorizer` that calls out to their identity provider.
pub struct BearerAuthorizer {
    token: Option<String>,
}

impl BearerAuthorizer {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl Authorizer for BearerAuthorizer {
    async fn authorize(&self, token: &str, app_name: &str) -> Result<AuthorizedUser, GatewayError> {
        match self.token.as_deref() {
            Some(expected) if expected == token => {
                Ok(AuthorizedUser { email: format!("operator@{app_name}") })
            }
            Some(_) => Err(GatewayError::new(ErrorKind::AuthFailed, "token mismatch")),
            None => Ok(AuthorizedUser { email: format!("operator@{app_name}") }),
        }
    }
}

/// Audit log that keeps commands in memory for the life of the process.
/// Good enough for a single-instance deployment or a dev box; anything that
/// needs durability across restarts should persist elsewhere.
pub struct InMemoryPersistence {
    commands: Mutex<Vec<Command>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self { commands: Mutex::new(Vec::new()) }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn save_command(&self, command: &Command) -> Result<(), GatewayError> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(())
    }
}

/// Delivers risky-command alerts to the logs. A real deployment typically
/// wants this routed to chat/email/pager instead.
pub struct LoggingAlerter;

#[async_trait]
impl Alerter for LoggingAlerter {
    async fn alert(&self, command: &Command, identity: &SessionIdentity) -> Result<(), GatewayError> {
        tracing::warn!(
            app_name = %identity.app_name,
            user = %identity.user,
            source_ip = %identity.source_ip,
            session_id = %command.session_id,
            command = %command.content,
            "risky command alert (no alert sink configured)"
        );
        Ok(())
    }
}

/// Placeholder `Discovery`/`ContainerRuntime` pair for deployments that
/// haven't wired a real container platform integration yet. Every call
/// fails with a clear, actionable error rather than panicking.
pub struct UnconfiguredContainerPlatform;

#[async_trait]
impl Discovery for UnconfiguredContainerPlatform {
    async fn locate_container(
        &self,
        _app_name: &str,
        _proc_name: &str,
        _instance_no: &str,
    ) -> Result<ContainerRef, GatewayError> {
        Err(GatewayError::new(
            ErrorKind::ContainerNotFound,
            "no container platform configured for this gateway",
        ))
    }
}

#[async_trait]
impl ContainerRuntime for UnconfiguredContainerPlatform {
    async fn create_exec(
        &self,
        _container: &ContainerRef,
        _term_type: &str,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::new(
            ErrorKind::ExecCreateFailed,
            "no container platform configured for this gateway",
        ))
    }

    async fn start_exec(&self, _exec_id: &str) -> Result<ExecStreams, GatewayError> {
        Err(GatewayError::new(
            ErrorKind::ExecStartFailed,
            "no container platform configured for this gateway",
        ))
    }

    async fn resize_exec_tty(
        &self,
        _exec_id: &str,
        _cols: i32,
        _rows: i32,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::new(
            ErrorKind::ExecStartFailed,
            "no container platform configured for this gateway",
        ))
    }

    async fn attach(&self, _container: &ContainerRef) -> Result<AttachStreams, GatewayError> {
        Err(GatewayError::new(
            ErrorKind::ExecStartFailed,
            "no container platform configured for this gateway",
        ))
    }
}

#[cfg(test)]
#[path = "defaults_tests.rs"]
mod tests;
