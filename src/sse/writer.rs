// ABOUTME: Serialized Server-Sent Events frame writer shared by keepalive and message paths
// ABOUTME: Wraps any AsyncWrite behind a single async mutex and flushes after every frame
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Render one SSE record
///
/// Multi-line payloads become one `data:` line per line, as the SSE grammar
/// requires.
#[must_use]
pub fn format_frame(event: Option<&str>, data: &str) -> String {
    let mut frame = String::with_capacity(data.len() + 32);
    if let Some(event) = event {
        frame.push_str("event: ");
        frame.push_str(event);
        frame.push('\n');
    }
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Cloneable handle writing whole SSE frames to one connection
pub struct SseWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SseWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> SseWriter<W> {
    /// Wrap `sink`
    pub fn new(sink: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    /// Write and flush one frame; frames never interleave
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is gone
    pub async fn send(&self, event: Option<&str>, data: &str) -> io::Result<()> {
        let frame = format_frame(event, data);
        let mut sink = self.inner.lock().await;
        sink.write_all(frame.as_bytes()).await?;
        sink.flush().await
    }

    /// Shut the sink down so the reading side observes end of stream
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails
    pub async fn close(&self) -> io::Result<()> {
        self.inner.lock().await.shutdown().await
    }
}
