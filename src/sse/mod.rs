// ABOUTME: Server-Sent Events framing and the long-lived bidirectional MCP session
// ABOUTME: Shared by the single-shot SSE binding and the streaming session transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Bidirectional session loop with keepalive and cancellation
pub mod session;
/// Serialized SSE frame writer
pub mod writer;

pub use session::{run_session, SessionEnd, SessionSummary};
pub use writer::{format_frame, SseWriter};
