// SPDX-License-Identifier: MIT

//! Session orchestrator (C7): wires one authorized `Session` to its `Pipe`
//! workers for the two supported flows.
//!
//! `run_enter` creates an interactive exec, spawns the request worker, both
//! response workers, and the liveness pinger, and tears everything down
//! once either the container process exits or the caller cancels.
//! `run_attach` is the read-only counterpart: no exec, no stdin, and
//! client-disconnect detection via a dedicated reader task rather than the
//! polling loop older implementations of this kind of gateway have used.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use crate::codec::Codec;
use crate::collab::Collaborators;
use crate::error::FAREWELL_MESSAGE;
use crate::pipe::{FrameSink, Pipe, ResponseKind};
use crate::replay::{ReplayPaths, ReplayRecorder};
use crate::session::SessionIdentity;

async fn open_replay(paths: Option<ReplayPaths>) -> Option<Arc<AsyncMutex<ReplayRecorder>>> {
    let paths = paths?;
    match ReplayRecorder::create(&paths) {
        Ok(recorder) => Some(Arc::new(AsyncMutex::new(recorder))),
        Err(e) => {
            tracing::warn!(error = %e, path = ?paths.data_path, "failed to open replay recorder");
            None
        }
    }
}

async fn close_replay(replay: Option<Arc<AsyncMutex<ReplayRecorder>>>) {
    let Some(replay) = replay else { return };
    match Arc::try_unwrap(replay) {
        Ok(mutex) => {
            if let Err(e) = mutex.into_inner().close() {
                tracing::warn!(error = %e, "failed to close replay recorder");
            }
        }
        Err(_) => {
            tracing::warn!("replay recorder still referenced at session teardown");
        }
    }
}

/// Drive an interactive `/enter` session to completion.
pub async fn run_enter<S>(
    identity: Arc<SessionIdentity>,
    collab: Collaborators,
    codec: Codec,
    sink: Arc<dyn FrameSink>,
    frames: S,
    term_type: &str,
    replay_paths: Option<ReplayPaths>,
    ping_interval: Duration,
    feedback_timeout: Duration,
    cancel: CancellationToken,
) where
    S: Stream<Item = Vec<u8>> + Send + Unpin + 'static,
{
    let pipe = Arc::new(Pipe::new(Arc::clone(&identity), codec, Arc::clone(&sink), collab.clone()));

    let exec_id = match collab.runtime.create_exec(&identity.container, term_type).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(session = %identity.session_id, error = %e, "create_exec failed");
            pipe.send_close(&e.styled_message()).await;
            return;
        }
    };

    let streams = match collab.runtime.start_exec(&exec_id).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(session = %identity.session_id, error = %e, "start_exec failed");
            pipe.send_close(&e.styled_message()).await;
            return;
        }
    };

    let replay = open_replay(replay_paths).await;

    let (stop_tx, stop_rx) = watch::channel(false);
    let pinger = tokio::spawn(Arc::clone(&pipe).liveness_pinger(ping_interval, stop_rx));

    let mut request_task = tokio::spawn({
        let pipe = Arc::clone(&pipe);
        let exec_id = exec_id.clone();
        async move {
            pipe.handle_request(frames, Some(streams.stdin), Some(exec_id), feedback_timeout).await;
        }
    });
    let mut stdout_task =
        tokio::spawn(Arc::clone(&pipe).handle_response(streams.stdout, ResponseKind::Stdout, replay.clone()));
    let mut stderr_task =
        tokio::spawn(Arc::clone(&pipe).handle_response(streams.stderr, ResponseKind::Stderr, replay.clone()));

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!(session = %identity.session_id, "enter session canceled");
        }
        _ = async { let _ = tokio::join!(&mut stdout_task, &mut stderr_task); } => {
            tracing::info!(session = %identity.session_id, "container exec ended");
        }
    }

    let _ = stop_tx.send(true);
    request_task.abort();
    stdout_task.abort();
    stderr_task.abort();
    let _ = request_task.await;
    let _ = stdout_task.await;
    let _ = stderr_task.await;
    let _ = pinger.await;

    close_replay(replay).await;
    pipe.send_close(FAREWELL_MESSAGE).await;
}

/// Drive a read-only `/attach` session to completion.
pub async fn run_attach<S>(
    identity: Arc<SessionIdentity>,
    collab: Collaborators,
    codec: Codec,
    sink: Arc<dyn FrameSink>,
    mut frames: S,
    replay_paths: Option<ReplayPaths>,
    ping_interval: Duration,
    cancel: CancellationToken,
) where
    S: Stream<Item = Vec<u8>> + Send + Unpin + 'static,
{
    let pipe = Arc::new(Pipe::new(Arc::clone(&identity), codec, Arc::clone(&sink), collab.clone()));

    let streams = match collab.runtime.attach(&identity.container).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(session = %identity.session_id, error = %e, "attach failed");
            pipe.send_close(&e.styled_message()).await;
            return;
        }
    };

    let replay = open_replay(replay_paths).await;

    let (stop_tx, stop_rx) = watch::channel(false);
    let pinger = tokio::spawn(Arc::clone(&pipe).liveness_pinger(ping_interval, stop_rx));

    // Attach accepts no input, but a dedicated reader still has to drain the
    // socket so a client disconnect is observed directly instead of by
    // polling the connection on a timer.
    let mut client_closed = tokio::spawn(async move { while frames.next().await.is_some() {} });

    let mut stdout_task =
        tokio::spawn(Arc::clone(&pipe).handle_response(streams.stdout, ResponseKind::Stdout, replay.clone()));
    let mut stderr_task =
        tokio::spawn(Arc::clone(&pipe).handle_response(streams.stderr, ResponseKind::Stderr, replay.clone()));

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!(session = %identity.session_id, "attach session canceled");
        }
        _ = &mut client_closed => {
            tracing::info!(session = %identity.session_id, "client disconnected from attach");
        }
        _ = async { let _ = tokio::join!(&mut stdout_task, &mut stderr_task); } => {
            tracing::info!(session = %identity.session_id, "attached container ended");
        }
    }

    let _ = stop_tx.send(true);
    client_closed.abort();
    stdout_task.abort();
    stderr_task.abort();
    let _ = client_closed.await;
    let _ = stdout_task.await;
    let _ = stderr_task.await;
    let _ = pinger.await;

    close_replay(replay).await;
    pipe.send_close(FAREWELL_MESSAGE).await;
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
