use super::*;
use crate::codec::{Codec, Response};
use crate::collab::mock::{AllowAllAuthorizer, DuplexRuntime, InMemoryPersistence, RecordingAlerter, StaticDiscovery};
use crate::collab::{Alerter, AttachStreams, ContainerRef, ContainerRuntime, ExecStreams, Persistence};
use crate::error::{ErrorKind, GatewayError};
use async_trait::async_trait;
use futures_util::stream;
use std::sync::Mutex as StdMutex;
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

struct CollectingSink {
    frames: StdMutex<Vec<Vec<u8>>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self { frames: StdMutex::new(Vec::new()) }
    }

    fn responses(&self) -> Vec<Response> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .map(|f| serde_json::from_slice(f).expect("frame decodes as JSON response"))
            .collect()
    }
}

#[async_trait]
impl FrameSink for CollectingSink {
    async fn send_frame(&self, data: Vec<u8>) -> Result<(), GatewayError> {
        self.frames.lock().unwrap().push(data);
        Ok(())
    }
}

/// A runtime whose every exec/attach call fails, for error-path tests.
struct FailingRuntime;

#[async_trait]
impl ContainerRuntime for FailingRuntime {
    async fn create_exec(&self, _container: &ContainerRef, _term_type: &str) -> Result<String, GatewayError> {
        Err(GatewayError::new(ErrorKind::ExecCreateFailed, "Can't enter your container, try again."))
    }

    async fn start_exec(&self, _exec_id: &str) -> Result<ExecStreams, GatewayError> {
        unreachable!("create_exec fails first in these tests")
    }

    async fn resize_exec_tty(&self, _exec_id: &str, _cols: i32, _rows: i32) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn attach(&self, _container: &ContainerRef) -> Result<AttachStreams, GatewayError> {
        Err(GatewayError::new(ErrorKind::ExecStartFailed, "Can't attach your container, try again."))
    }
}

fn identity() -> Arc<SessionIdentity> {
    Arc::new(SessionIdentity {
        session_id: "sess-1".into(),
        user: "alice".into(),
        source_ip: "127.0.0.1".into(),
        app_name: "myapp".into(),
        proc_name: "web".into(),
        instance_no: "0".into(),
        container: ContainerRef { container_id: "c1".into(), node_ip: "10.0.0.1".into() },
        created_at: SystemTime::now(),
    })
}

fn collaborators_with(runtime: Arc<dyn ContainerRuntime>) -> Collaborators {
    Collaborators {
        authorizer: Arc::new(AllowAllAuthorizer),
        discovery: Arc::new(StaticDiscovery),
        runtime,
        alerter: Arc::new(RecordingAlerter::new()) as Arc<dyn Alerter>,
        persistence: Arc::new(InMemoryPersistence::new()) as Arc<dyn Persistence>,
    }
}

#[tokio::test]
async fn enter_sends_styled_close_when_create_exec_fails() {
    let sink = Arc::new(CollectingSink::new());
    let collab = collaborators_with(Arc::new(FailingRuntime));

    run_enter(
        identity(),
        collab,
        Codec::Json,
        Arc::clone(&sink) as Arc<dyn FrameSink>,
        stream::empty(),
        "xterm-256color",
        None,
        Duration::from_millis(20),
        Duration::from_millis(20),
        CancellationToken::new(),
    )
    .await;

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    match &responses[0] {
        Response::Close { content } => {
            let text = String::from_utf8(content.clone()).unwrap();
            assert!(text.contains("Can't enter your container"));
        }
        other => panic!("expected Close, got {other:?}"),
    }
}

#[tokio::test]
async fn attach_sends_styled_close_when_attach_fails() {
    let sink = Arc::new(CollectingSink::new());
    let collab = collaborators_with(Arc::new(FailingRuntime));

    run_attach(
        identity(),
        collab,
        Codec::Json,
        Arc::clone(&sink) as Arc<dyn FrameSink>,
        stream::empty(),
        None,
        Duration::from_millis(20),
        CancellationToken::new(),
    )
    .await;

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    match &responses[0] {
        Response::Close { content } => {
            let text = String::from_utf8(content.clone()).unwrap();
            assert!(text.contains("Can't attach your container"));
        }
        other => panic!("expected Close, got {other:?}"),
    }
}

#[tokio::test]
async fn enter_streams_output_and_says_farewell_once_the_container_exits() {
    let sink = Arc::new(CollectingSink::new());
    let (runtime, mut stdin_client, mut stdout_client, _stderr_client) = DuplexRuntime::new();
    let runtime = Arc::new(runtime);
    let collab = collaborators_with(Arc::clone(&runtime) as Arc<dyn ContainerRuntime>);

    let client_frame =
        serde_json::to_vec(&crate::codec::Request::Plain { content: b"ls\r".to_vec() }).unwrap();

    let run = tokio::spawn(run_enter(
        identity(),
        collab,
        Codec::Json,
        Arc::clone(&sink) as Arc<dyn FrameSink>,
        stream::iter(vec![client_frame]),
        "xterm-256color",
        None,
        Duration::from_secs(5),
        Duration::from_millis(20),
        CancellationToken::new(),
    ));

    // The container "echoes" the command back over stdout.
    use tokio::io::AsyncReadExt;
    let mut seen = vec![0u8; 3];
    stdin_client.read_exact(&mut seen).await.unwrap();
    assert_eq!(&seen, b"ls\r");

    stdout_client.write_all(b"ls\r\n").await.unwrap();

    // Simulate the container process exiting: both output streams close.
    drop(stdout_client);
    drop(_stderr_client);

    run.await.unwrap();

    let responses = sink.responses();
    assert!(responses.iter().any(|r| matches!(r, Response::Stdout { content } if content == b"ls\r\n")));
    assert!(matches!(responses.last(), Some(Response::Close { .. })));
}

#[tokio::test]
async fn attach_ends_when_client_disconnects_without_touching_stdin() {
    let sink = Arc::new(CollectingSink::new());
    let (runtime, _stdin_client, _stdout_client, _stderr_client) = DuplexRuntime::new();
    let runtime = Arc::new(runtime);
    let collab = collaborators_with(Arc::clone(&runtime) as Arc<dyn ContainerRuntime>);

    // The client stream ends immediately; the dedicated reader task should
    // observe that directly rather than polling the connection on a timer.
    let frames = stream::empty::<Vec<u8>>();

    run_attach(
        identity(),
        collab,
        Codec::Json,
        Arc::clone(&sink) as Arc<dyn FrameSink>,
        frames,
        None,
        Duration::from_secs(5),
        CancellationToken::new(),
    )
    .await;

    let responses = sink.responses();
    assert!(matches!(responses.last(), Some(Response::Close { .. })));
}
