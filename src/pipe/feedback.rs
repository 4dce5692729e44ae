// SPDX-License-Identifier: MIT

//! Feedback correlation channel: lets the request worker ask "what did tab
//! completion / history recall just produce?" and have the response worker
//! answer it, without either side blocking the other's main loop for long.

use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::term;

/// A rendezvous point between the request worker (which sees Tab/Up/Down
/// keystrokes) and the response workers (which see the container's echoed
/// reply to them).
pub struct FeedbackChannel {
    request_tx: mpsc::Sender<Vec<u8>>,
    request_rx: Mutex<mpsc::Receiver<Vec<u8>>>,
    response_tx: mpsc::Sender<Vec<u8>>,
    response_rx: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl Default for FeedbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackChannel {
    pub fn new() -> Self {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (response_tx, response_rx) = mpsc::channel(1);
        Self {
            request_tx,
            request_rx: Mutex::new(request_rx),
            response_tx,
            response_rx: Mutex::new(response_rx),
        }
    }

    /// Ask for feedback on `input` (the raw Tab/Up/Down bytes just sent to
    /// the container), waiting up to `timeout` for a response worker to
    /// fulfil it. Gives up and returns an empty buffer on timeout.
    pub async fn ask_for_feedback(&self, input: Vec<u8>, timeout: Duration) -> Vec<u8> {
        let _ = self.request_tx.try_send(input);

        let mut response_rx = self.response_rx.lock().await;
        match tokio::time::timeout(timeout, response_rx.recv()).await {
            Ok(Some(feedback)) => feedback,
            _ => {
                // Give up: drop any request nobody picked up.
                let mut request_rx = self.request_rx.lock().await;
                let _ = request_rx.try_recv();
                Vec::new()
            }
        }
    }

    /// Called by a response worker each time it has fresh container output.
    /// If a feedback request is pending, sanitizes `feedback` appropriately
    /// for the kind of request (Tab vs history recall) and fulfils it.
    /// A no-op if no request is currently pending.
    pub async fn try_fulfill(&self, feedback: &[u8]) {
        let mut request_rx = self.request_rx.lock().await;
        let Ok(input) = request_rx.try_recv() else {
            return;
        };
        drop(request_rx);

        let escaped = if term::is_tab(&input) {
            term::escape_tab_completion(feedback)
        } else if term::has_up_arrow_suffix(&input) || term::has_down_arrow_suffix(&input) {
            term::escape_history_command(feedback)
        } else {
            Vec::new()
        };

        let _ = self.response_tx.try_send(escaped);
    }
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod tests;
