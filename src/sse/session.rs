// ABOUTME: Long-lived bidirectional MCP session over a streamed request body and an SSE response
// ABOUTME: Background line reader, bounded queue, keepalive timer and cooperative cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Bidirectional Session
//!
//! The inbound body is split on newlines by a reader task that forwards each
//! line into a bounded queue. The session loop multiplexes cancellation, the
//! keepalive timer, the optional idle deadline and inbound messages. Every
//! outbound frame goes through one [`SseWriter`].
//!
//! The reader task is always joined before [`run_session`] returns.

use super::writer::SseWriter;
use crate::config::SessionConfig;
use crate::constants::sse::{EVENT_KEEPALIVE, EVENT_MESSAGE, KEEPALIVE_DATA};
use crate::jsonrpc::JsonRpcRequest;
use crate::mcp::protocol::ProtocolDispatcher;
use crate::oauth2_server::models::Principal;
use std::future;
use std::str;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client disconnect or server shutdown
    Cancelled,
    /// The inbound body reached end of stream
    InputClosed,
    /// No inbound message within the idle timeout
    IdleTimeout,
    /// Writing to the client failed
    WriteFailed,
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Termination cause
    pub end: SessionEnd,
    /// Inbound messages dispatched
    pub messages: u64,
    /// Keepalive frames written
    pub keepalives: u64,
}

fn spawn_reader<R>(
    input: R,
    queue: mpsc::Sender<String>,
    max_line: usize,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(input);
        let limit = u64::try_from(max_line).unwrap_or(u64::MAX);
        let mut buf = Vec::new();
        // Inside a line that already exceeded the limit
        let mut oversized = false;

        loop {
            buf.clear();
            let mut bounded = (&mut reader).take(limit);
            let read = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                read = bounded.read_until(b'\n', &mut buf) => read,
            };
            match read {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Error reading session input");
                    break;
                }
            }

            let complete = buf.ends_with(b"\n");
            if oversized || (!complete && buf.len() >= max_line) {
                if !oversized {
                    warn!(limit = max_line, "Skipping oversized session message");
                }
                oversized = !complete;
                continue;
            }
            let Ok(line) = str::from_utf8(&buf) else {
                debug!("Skipping non-UTF-8 session message");
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = queue.send(line.to_owned()) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Session reader stopped");
    })
}

/// Serve one bidirectional session until it ends
///
/// `cancel` should be a child of the server shutdown token; the caller
/// cancels it when the client disconnects.
pub async fn run_session<R, W>(
    input: R,
    writer: SseWriter<W>,
    dispatcher: &ProtocolDispatcher,
    principal: &Principal,
    config: &SessionConfig,
    cancel: CancellationToken,
) -> SessionSummary
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    info!(user = %principal.login, "SSE session opened");

    let (queue, mut inbound) = mpsc::channel(config.channel_capacity.max(1));
    let reader_cancel = cancel.child_token();
    let reader = spawn_reader(
        input,
        queue,
        config.max_message_bytes.max(1),
        reader_cancel.clone(),
    );

    let mut keepalive = interval_at(
        Instant::now() + config.keepalive_interval,
        config.keepalive_interval,
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut idle_deadline = config.idle_timeout.map(|timeout| Instant::now() + timeout);

    let mut messages = 0_u64;
    let mut keepalives = 0_u64;

    let end = loop {
        let deadline = idle_deadline;
        let idle = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break SessionEnd::Cancelled,
            _ = keepalive.tick() => {
                if writer.send(Some(EVENT_KEEPALIVE), KEEPALIVE_DATA).await.is_err() {
                    break SessionEnd::WriteFailed;
                }
                keepalives += 1;
            }
            () = idle => break SessionEnd::IdleTimeout,
            received = inbound.recv() => {
                let Some(line) = received else {
                    break SessionEnd::InputClosed;
                };
                idle_deadline = config.idle_timeout.map(|timeout| Instant::now() + timeout);

                let request = match serde_json::from_str::<JsonRpcRequest>(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        debug!(error = %e, "Skipping unparseable session message");
                        continue;
                    }
                };
                messages += 1;
                let Some(response) = dispatcher.dispatch(request, principal) else {
                    continue;
                };
                let payload = match serde_json::to_string(&response) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize session response");
                        continue;
                    }
                };
                if writer.send(Some(EVENT_MESSAGE), &payload).await.is_err() {
                    break SessionEnd::WriteFailed;
                }
            }
        }
    };

    reader_cancel.cancel();
    drop(inbound);
    if let Err(e) = reader.await {
        warn!(error = %e, "Session reader task failed");
    }

    info!(
        user = %principal.login,
        end = ?end,
        messages,
        keepalives,
        "SSE session closed"
    );
    SessionSummary {
        end,
        messages,
        keepalives,
    }
}
