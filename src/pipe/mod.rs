// SPDX-License-Identifier: MIT

//! Pipe (C6): the full-duplex channel between one container exec/attach and
//! one WebSocket connection. Four concurrent workers cooperate over it: a
//! request reader, one or two response readers (stdout/stderr), a liveness
//! pinger, and the feedback-correlation channel threading them together.

pub mod feedback;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;

use crate::codec::{Codec, Request, Response};
use crate::collab::Collaborators;
use crate::command::Command;
use crate::error::{ErrorKind, GatewayError};
use crate::replay::ReplayRecorder;
use crate::session::SessionIdentity;
use crate::term;
use feedback::FeedbackChannel;

/// Matches the original's oversized write buffer: container output is
/// bursty and a generous buffer avoids needless short reads.
const WRITE_BUFFER_SIZE: usize = 10 * 1024;

/// Lifecycle of one pipe, from upgrade to teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    Opening,
    Streaming,
    Draining,
    Closed,
}

impl PipeState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Opening,
            1 => Self::Streaming,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

/// Which container stream a response worker is draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Stdout,
    Stderr,
}

/// Delivers one fully-encoded outbound frame at a time. Implementations
/// must serialize concurrent calls (the response workers and the liveness
/// pinger all call this) so frames are never interleaved on the wire —
/// the async analogue of the original's `writeLock`.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_frame(&self, data: Vec<u8>) -> Result<(), GatewayError>;
}

/// Shared state for one pipe, referenced by all of its workers.
pub struct Pipe {
    pub identity: Arc<SessionIdentity>,
    pub codec: Codec,
    pub sink: Arc<dyn FrameSink>,
    pub feedback: FeedbackChannel,
    pub collab: Collaborators,
    state: AtomicU8,
}

impl Pipe {
    pub fn new(
        identity: Arc<SessionIdentity>,
        codec: Codec,
        sink: Arc<dyn FrameSink>,
        collab: Collaborators,
    ) -> Self {
        Self {
            identity,
            codec,
            sink,
            feedback: FeedbackChannel::new(),
            collab,
            state: AtomicU8::new(PipeState::Opening as u8),
        }
    }

    pub fn state(&self) -> PipeState {
        PipeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, s: PipeState) {
        self.state.store(s as u8, Ordering::Release);
    }

    async fn write_response(&self, msg: &Response) -> Result<(), GatewayError> {
        let data = self
            .codec
            .marshal_response(msg)
            .map_err(|_| GatewayError::new(ErrorKind::FrameDecodeError, "failed to encode response frame"))?;
        self.sink.send_frame(data).await
    }

    /// Send the styled CLOSE frame and mark the pipe closed. Callers do
    /// this once, after every worker has wound down.
    pub async fn send_close(&self, payload: &str) {
        self.set_state(PipeState::Closed);
        let _ = self.write_response(&Response::close(payload.as_bytes().to_vec())).await;
    }

    /// Request worker (C6): reads decoded client frames, forwards `Plain`
    /// content to the container's stdin, resizes the TTY on `Winch`, and
    /// drives submitted lines through the line-editor/feedback/command-save
    /// state machine.
    ///
    /// `frames` yields raw (still wire-encoded) request frames; `exec_id`
    /// is `None` for passive attach sessions, which accept no input.
    pub async fn handle_request<S>(
        self: &Arc<Self>,
        mut frames: S,
        mut exec_stdin: Option<Box<dyn AsyncWrite + Send + Unpin>>,
        exec_id: Option<String>,
        feedback_timeout: Duration,
    ) where
        S: Stream<Item = Vec<u8>> + Unpin,
    {
        self.set_state(PipeState::Streaming);
        let mut buf: Vec<u8> = Vec::new();

        while let Some(frame) = frames.next().await {
            let req = match self.codec.unmarshal_request(&frame) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(session = %self.identity.session_id, error = %e, "failed to decode request frame");
                    continue;
                }
            };

            match req {
                Request::Plain { content } => {
                    if let Some(stdin) = exec_stdin.as_mut() {
                        if stdin.write_all(&content).await.is_err() {
                            break;
                        }
                    }
                    self.handle_input(&content, &mut buf, feedback_timeout).await;
                }
                Request::Winch { content } => {
                    let (width, height) = term::get_width_and_height(&content);
                    if width >= 0 && height >= 0 {
                        if let Some(ref id) = exec_id {
                            let _ = self.collab.runtime.resize_exec_tty(id, width, height).await;
                        }
                    }
                }
            }
        }

        if let Some(mut stdin) = exec_stdin {
            let _ = stdin.shutdown().await;
        }
        self.set_state(PipeState::Draining);
    }

    async fn handle_input(&self, input: &[u8], buf: &mut Vec<u8>, feedback_timeout: Duration) {
        if term::is_cr(input) {
            let line = std::mem::take(buf);
            self.save_command(line).await;
        } else if term::is_tab(input) {
            let feedback = self.feedback.ask_for_feedback(input.to_vec(), feedback_timeout).await;
            buf.extend_from_slice(&feedback);
        } else {
            buf.extend_from_slice(input);
            if term::has_up_arrow_suffix(buf) || term::has_down_arrow_suffix(buf) {
                let feedback = self.feedback.ask_for_feedback(buf.clone(), feedback_timeout).await;
                buf.truncate(buf.len() - 3);
                buf.extend_from_slice(&feedback);
            }
        }
    }

    async fn save_command(&self, input: Vec<u8>) {
        let content = String::from_utf8(term::escape_input(&input)).unwrap_or_default();
        if content.is_empty() {
            return;
        }

        let command =
            Command::new(self.identity.session_id.clone(), self.identity.user.clone(), content);

        if let Err(e) = self.collab.persistence.save_command(&command).await {
            tracing::error!(session = %self.identity.session_id, error = %e, "failed to persist command");
        }

        if command.is_risky() {
            tracing::warn!(
                session = %self.identity.session_id,
                command = %command.content,
                "risky command detected, alerting owners"
            );
            let alerter = Arc::clone(&self.collab.alerter);
            let identity = Arc::clone(&self.identity);
            tokio::spawn(async move {
                if let Err(e) = alerter.alert(&command, &identity).await {
                    tracing::error!(error = %e, "failed to deliver risky-command alert");
                }
            });
        } else {
            tracing::info!(session = %self.identity.session_id, command = %command.content, "command recorded");
        }
    }

    /// Response worker (C6): drains one container stream (stdout or
    /// stderr), chunking on the longest valid UTF-8 prefix so a rune split
    /// across reads is never sent (or recorded) incomplete, forwarding
    /// completed chunks to the feedback channel, the replay recorder (if
    /// any), and the client.
    ///
    /// `replay` is shared (`Enter` runs this twice, once per stream, both
    /// recording into the same transcript) so it is passed in already
    /// behind a mutex; the caller is responsible for closing it once both
    /// response workers have finished.
    pub async fn handle_response<R>(
        self: Arc<Self>,
        mut reader: R,
        kind: ResponseKind,
        replay: Option<Arc<AsyncMutex<ReplayRecorder>>>,
    ) where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; WRITE_BUFFER_SIZE];
        let mut cursor = 0usize;

        loop {
            let n = match reader.read(&mut buf[cursor..]).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(session = %self.identity.session_id, error = %e, "response read failed");
                    break;
                }
            };

            let filled = cursor + n;
            let valid_len = term::valid_utf8_prefix_len(&buf[..filled]);
            if valid_len == 0 {
                tracing::error!(session = %self.identity.session_id, "no valid UTF8 sequence prefix");
                break;
            }

            let chunk = buf[..valid_len].to_vec();
            self.feedback.try_fulfill(&chunk).await;

            if let Some(replay) = replay.as_ref() {
                if let Err(e) = replay.lock().await.record(&chunk) {
                    tracing::warn!(session = %self.identity.session_id, error = %e, "replay record failed");
                }
            }

            let msg = match kind {
                ResponseKind::Stdout => Response::Stdout { content: chunk },
                ResponseKind::Stderr => Response::Stderr { content: chunk },
            };
            if self.write_response(&msg).await.is_err() {
                break;
            }

            let remainder = filled - valid_len;
            buf.copy_within(valid_len..filled, 0);
            cursor = remainder;
        }
    }

    /// Liveness pinger (C6): keeps intermediary proxies from idling the
    /// connection out, independent of actual container activity.
    pub async fn liveness_pinger(
        self: Arc<Self>,
        interval: Duration,
        mut stop: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.write_response(&Response::ping()).await.is_err() {
                        break;
                    }
                }
                _ = stop.changed() => break,
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
