// SPDX-License-Identifier: MIT

//! WebSocket upgrade handlers (C8): turns an authorized `/enter` or
//! `/attach` upgrade into a running `Pipe`/orchestrator pair.
//!
//! Session bootstrapping mirrors the original's `NewSession`: a
//! `method=web` query selects a browser client, which authenticates by
//! sending one JSON message right after the upgrade (`access_token`,
//! `app_name`, `proc_name`, `instance_no`); any other client supplies the
//! same fields as request headers before the upgrade.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use serde::Deserialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::codec::Codec;
use crate::error::GatewayError;
use crate::orchestrator::{run_attach, run_enter};
use crate::pipe::FrameSink;
use crate::replay::ReplayPaths;
use crate::session::{create_session, SessionRequest};
use crate::transport::state::Store;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    method: Option<String>,
}

/// Delivers outbound frames over one half of a split `WebSocket`, always as
/// a binary message — the original sends `SendCloseMessage` (and every
/// other outbound frame) as `websocket.BinaryMessage` regardless of whether
/// the payload happens to be JSON or the compact binary encoding.
pub struct AxumFrameSink {
    tx: AsyncMutex<futures_util::stream::SplitSink<WebSocket, Message>>,
}

impl AxumFrameSink {
    fn new(tx: futures_util::stream::SplitSink<WebSocket, Message>) -> Self {
        Self { tx: AsyncMutex::new(tx) }
    }
}

#[async_trait::async_trait]
impl FrameSink for AxumFrameSink {
    async fn send_frame(&self, data: Vec<u8>) -> Result<(), GatewayError> {
        self.tx
            .lock()
            .await
            .send(Message::Binary(data.into()))
            .await
            .map_err(|e| GatewayError::new(crate::error::ErrorKind::WebsocketWriteError, e.to_string()))
    }
}

fn source_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.to_owned();
    }
    addr.map(|a| a.to_string()).unwrap_or_default()
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_owned()
}

/// A browser client's first message after upgrade, carrying the fields a
/// non-browser client would otherwise have supplied as headers.
#[derive(Debug, Deserialize, Default)]
struct WebAuthMessage {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    app_name: String,
    #[serde(default)]
    proc_name: String,
    #[serde(default)]
    instance_no: String,
}

/// Parse a browser client's JSON auth message into a session request.
fn parse_web_auth_message(text: &str, source_ip: String) -> Result<SessionRequest, ()> {
    let auth: WebAuthMessage = serde_json::from_str(text).map_err(|_| ())?;
    Ok(SessionRequest {
        access_token: auth.access_token,
        app_name: auth.app_name,
        proc_name: auth.proc_name,
        instance_no: auth.instance_no,
        source_ip,
    })
}

/// Build a session request from the headers a non-browser client supplies
/// up front, instead of a post-upgrade auth message.
fn header_session_request(headers: &HeaderMap, source_ip: String) -> SessionRequest {
    SessionRequest {
        access_token: header_str(headers, "access-token"),
        app_name: header_str(headers, "app-name"),
        proc_name: header_str(headers, "proc-name"),
        instance_no: header_str(headers, "instance-no"),
        source_ip,
    }
}

/// Resolve the raw session-request fields either from headers (non-browser
/// clients) or from the client's first WebSocket message (`method=web`).
async fn bootstrap_session_request(
    method: Option<&str>,
    headers: &HeaderMap,
    source_ip: String,
    rx: &mut futures_util::stream::SplitStream<WebSocket>,
) -> Result<SessionRequest, ()> {
    if method == Some("web") {
        let msg = loop {
            match rx.next().await {
                Some(Ok(Message::Text(text))) => break text.to_string(),
                Some(Ok(Message::Binary(data))) => {
                    break String::from_utf8(data.to_vec()).map_err(|_| ())?;
                }
                Some(Ok(_)) => continue,
                _ => return Err(()),
            }
        };
        parse_web_auth_message(&msg, source_ip)
    } else {
        Ok(header_session_request(headers, source_ip))
    }
}

/// Incoming client frames, adapted from the raw `WebSocket` stream into the
/// plain byte-frame stream the orchestrator/pipe layer consumes. A `Close`
/// frame, a protocol error, or the stream ending all terminate it the same
/// way: no more frames.
fn client_frame_stream(
    rx: futures_util::stream::SplitStream<WebSocket>,
) -> impl futures_util::Stream<Item = Vec<u8>> + Send + Unpin {
    Box::pin(rx.filter_map(|msg| async move {
        match msg {
            Ok(Message::Binary(data)) => Some(data.to_vec()),
            Ok(Message::Text(text)) => Some(text.into_bytes()),
            _ => None,
        }
    }))
}

pub async fn enter_handler(
    State(store): State<Arc<Store>>,
    Query(query): Query<ConnectQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let method = query.method;
    let term_type = {
        let t = header_str(&headers, "term-type");
        if t.is_empty() {
            "xterm-256color".to_owned()
        } else {
            t
        }
    };
    let source = source_ip(&headers, Some(addr));

    ws.on_upgrade(move |socket| async move {
        store.lifecycle.ws_client_count.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = socket.split();
        let sink = Arc::new(AxumFrameSink::new(tx));

        let req = match bootstrap_session_request(method.as_deref(), &headers, source, &mut rx).await
        {
            Ok(req) => req,
            Err(()) => {
                store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        };
        let codec = Codec::for_method(method.as_deref());

        let session = match create_session(req, &store.collab, &store.config.own_app_name).await {
            Ok(s) => s,
            Err(e) => {
                let _ = sink.send_frame(codec.marshal_response(&crate::codec::Response::close(e.styled_message().into_bytes())).unwrap_or_default()).await;
                store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        };

        let replay_paths =
            Some(ReplayPaths::new(&store.config.session_data_root, &session.identity.session_id));

        run_enter(
            Arc::clone(&session.identity),
            store.collab.clone(),
            codec,
            sink as Arc<dyn FrameSink>,
            client_frame_stream(rx),
            &term_type,
            replay_paths,
            store.config.ping_interval(),
            store.config.feedback_timeout(),
            store.lifecycle.shutdown.clone(),
        )
        .await;

        store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
    })
}

pub async fn attach_handler(
    State(store): State<Arc<Store>>,
    Query(query): Query<ConnectQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let method = query.method;
    let source = source_ip(&headers, Some(addr));

    ws.on_upgrade(move |socket| async move {
        store.lifecycle.ws_client_count.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = socket.split();
        let sink = Arc::new(AxumFrameSink::new(tx));

        let req = match bootstrap_session_request(method.as_deref(), &headers, source, &mut rx).await
        {
            Ok(req) => req,
            Err(()) => {
                store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        };
        let codec = Codec::for_method(method.as_deref());

        let session = match create_session(req, &store.collab, &store.config.own_app_name).await {
            Ok(s) => s,
            Err(e) => {
                let _ = sink.send_frame(codec.marshal_response(&crate::codec::Response::close(e.styled_message().into_bytes())).unwrap_or_default()).await;
                store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        };

        let replay_paths =
            Some(ReplayPaths::new(&store.config.session_data_root, &session.identity.session_id));

        run_attach(
            Arc::clone(&session.identity),
            store.collab.clone(),
            codec,
            sink as Arc<dyn FrameSink>,
            client_frame_stream(rx),
            replay_paths,
            store.config.ping_interval(),
            store.lifecycle.shutdown.clone(),
        )
        .await;

        store.lifecycle.ws_client_count.fetch_sub(1, Ordering::Relaxed);
    })
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
