// SPDX-License-Identifier: MIT

//! External collaborator interfaces.
//!
//! The gateway never talks to a container runtime, an SSO provider, a
//! mail server, or a database directly — it talks to these five trait
//! objects, stored as `Arc<dyn Trait + Send + Sync>` on the orchestrator's
//! dependency struct. Swapping a real Docker/Kubernetes-backed
//! implementation in for the in-memory test doubles below is the only
//! thing a deployment needs to do to run this gateway for real.

pub mod defaults;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::Command;
use crate::error::GatewayError;
use crate::session::SessionIdentity;

/// Identity of a resolved, authorized session target.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub email: String,
}

/// A container resolved by app name / process name / instance number.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    pub container_id: String,
    pub node_ip: String,
}

/// Authorizes whether a bearer token may access a given application.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, token: &str, app_name: &str) -> Result<AuthorizedUser, GatewayError>;
}

/// Resolves an (app, proc, instance) triple to a concrete running container.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn locate_container(
        &self,
        app_name: &str,
        proc_name: &str,
        instance_no: &str,
    ) -> Result<ContainerRef, GatewayError>;
}

/// Bidirectional stdin/stdout/stderr streams for an interactive exec.
pub struct ExecStreams {
    pub stdin: Box<dyn AsyncWrite + Send + Unpin>,
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
}

/// Read-only stdout/stderr streams for a passive attach.
pub struct AttachStreams {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
}

/// Creates, starts, resizes, and attaches to execs inside a container.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn create_exec(
        &self,
        container: &ContainerRef,
        term_type: &str,
    ) -> Result<String, GatewayError>;

    async fn start_exec(&self, exec_id: &str) -> Result<ExecStreams, GatewayError>;

    async fn resize_exec_tty(&self, exec_id: &str, cols: i32, rows: i32)
        -> Result<(), GatewayError>;

    async fn attach(&self, container: &ContainerRef) -> Result<AttachStreams, GatewayError>;
}

/// Delivers a risky-command alert to whoever owns the target application.
/// Receives a snapshot of the session the command came from, not just the
/// application name, so an implementation can report who ran it and where.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn alert(&self, command: &Command, identity: &SessionIdentity) -> Result<(), GatewayError>;
}

/// Persists completed commands for audit.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save_command(&self, command: &Command) -> Result<(), GatewayError>;
}

/// The full set of external collaborators, grouped into one struct so the
/// orchestrator and session factory take a single dependency rather than a
/// handful of loose `Arc`s.
#[derive(Clone)]
pub struct Collaborators {
    pub authorizer: std::sync::Arc<dyn Authorizer>,
    pub discovery: std::sync::Arc<dyn Discovery>,
    pub runtime: std::sync::Arc<dyn ContainerRuntime>,
    pub alerter: std::sync::Arc<dyn Alerter>,
    pub persistence: std::sync::Arc<dyn Persistence>,
}

#[cfg(any(test, feature = "test-support"))]
pub mod mock {
    use std::sync::Mutex;

    use tokio::io::{duplex, DuplexStream};

    use super::*;

    pub struct AllowAllAuthorizer;

    #[async_trait]
    impl Authorizer for AllowAllAuthorizer {
        async fn authorize(
            &self,
            _token: &str,
            _app_name: &str,
        ) -> Result<AuthorizedUser, GatewayError> {
            Ok(AuthorizedUser { email: "test@example.com".to_owned() })
        }
    }

    pub struct StaticDiscovery;

    #[async_trait]
    impl Discovery for StaticDiscovery {
        async fn locate_container(
            &self,
            _app_name: &str,
            _proc_name: &str,
            _instance_no: &str,
        ) -> Result<ContainerRef, GatewayError> {
            Ok(ContainerRef { container_id: "container-1".to_owned(), node_ip: "10.0.0.1".to_owned() })
        }
    }

    /// A runtime whose exec streams are the server side of an in-memory
    /// duplex pipe; the test holds the client side to drive input/output.
    pub struct DuplexRuntime {
        pub server_stdout: Mutex<Option<DuplexStream>>,
        pub server_stderr: Mutex<Option<DuplexStream>>,
        pub server_stdin: Mutex<Option<DuplexStream>>,
        pub resized: Mutex<Vec<(i32, i32)>>,
    }

    impl DuplexRuntime {
        /// Build a runtime plus the client-side halves the test keeps.
        pub fn new() -> (Self, DuplexStream, DuplexStream, DuplexStream) {
            let (stdin_server, stdin_client) = duplex(64 * 1024);
            let (stdout_server, stdout_client) = duplex(64 * 1024);
            let (stderr_server, stderr_client) = duplex(64 * 1024);
            (
                Self {
                    server_stdout: Mutex::new(Some(stdout_server)),
                    server_stderr: Mutex::new(Some(stderr_server)),
                    server_stdin: Mutex::new(Some(stdin_server)),
                    resized: Mutex::new(Vec::new()),
                },
                stdin_client,
                stdout_client,
                stderr_client,
            )
        }
    }

    #[async_trait]
    impl ContainerRuntime for DuplexRuntime {
        async fn create_exec(
            &self,
            _container: &ContainerRef,
            _term_type: &str,
        ) -> Result<String, GatewayError> {
            Ok("exec-1".to_owned())
        }

        async fn start_exec(&self, _exec_id: &str) -> Result<ExecStreams, GatewayError> {
            let stdin = self.server_stdin.lock().unwrap().take().expect("start_exec called twice");
            let stdout =
                self.server_stdout.lock().unwrap().take().expect("start_exec called twice");
            let stderr =
                self.server_stderr.lock().unwrap().take().expect("start_exec called twice");
            Ok(ExecStreams { stdin: Box::new(stdin), stdout: Box::new(stdout), stderr: Box::new(stderr) })
        }

        async fn resize_exec_tty(
            &self,
            _exec_id: &str,
            cols: i32,
            rows: i32,
        ) -> Result<(), GatewayError> {
            self.resized.lock().unwrap().push((cols, rows));
            Ok(())
        }

        async fn attach(&self, _container: &ContainerRef) -> Result<AttachStreams, GatewayError> {
            let stdout =
                self.server_stdout.lock().unwrap().take().expect("attach called twice");
            let stderr =
                self.server_stderr.lock().unwrap().take().expect("attach called twice");
            Ok(AttachStreams { stdout: Box::new(stdout), stderr: Box::new(stderr) })
        }
    }

    pub struct RecordingAlerter {
        pub alerts: Mutex<Vec<String>>,
    }

    impl RecordingAlerter {
        pub fn new() -> Self {
            Self { alerts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Alerter for RecordingAlerter {
        async fn alert(&self, command: &Command, identity: &SessionIdentity) -> Result<(), GatewayError> {
            self.alerts.lock().unwrap().push(format!("{}: {}", identity.app_name, command.content));
            Ok(())
        }
    }

    pub struct InMemoryPersistence {
        pub saved: Mutex<Vec<Command>>,
    }

    impl InMemoryPersistence {
        pub fn new() -> Self {
            Self { saved: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Persistence for InMemoryPersistence {
        async fn save_command(&self, command: &Command) -> Result<(), GatewayError> {
            self.saved.lock().unwrap().push(command.clone());
            Ok(())
        }
    }
}
