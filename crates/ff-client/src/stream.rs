// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event stream reader.
//!
//! Reads one stream connection to completion, classifying each frame and
//! dispatching it to a [`StreamListener`]. The reader never reconnects; the
//! supervisor decides what happens after a stream ends.

use std::time::Duration;

use async_trait::async_trait;
use ff_client_core::{parse_frame, StreamAction};
use futures::StreamExt;
use tracing::{debug, trace, warn};

use crate::api::LineStream;
use crate::error::Result;
use crate::sdk_codes;

/// A read that produces no line within this window fails the stream.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Receives stream lifecycle and change notifications.
///
/// An error returned from any callback ends the stream.
#[async_trait]
pub(crate) trait StreamListener: Send {
	async fn on_start(&mut self) -> Result<()>;

	/// Called exactly once per stream, after the connection is released.
	async fn on_end(&mut self, cause: Option<&str>);

	async fn on_evaluation_changed(&mut self, flag: &str) -> Result<()>;

	async fn on_evaluation_removed(&mut self, flag: &str) -> Result<()>;

	async fn on_evaluation_reload(&mut self) -> Result<()>;
}

/// How a stream finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StreamOutcome {
	/// True if the stream was established and `on_start` succeeded.
	pub connected: bool,
	/// Why the stream ended. `None` for an orderly end of stream.
	pub cause: Option<String>,
	pub events: u64,
}

#[derive(Debug)]
pub(crate) struct EventStreamReader {
	read_timeout: Duration,
}

impl Default for EventStreamReader {
	fn default() -> Self {
		Self {
			read_timeout: READ_TIMEOUT,
		}
	}
}

impl EventStreamReader {
	/// Drives `opened` until it ends, then reports to `listener`.
	///
	/// A stream that failed to open is reported through `on_end` too, without
	/// a preceding `on_start`.
	pub async fn run<L>(&self, opened: Result<LineStream>, listener: &mut L) -> StreamOutcome
	where
		L: StreamListener + ?Sized,
	{
		let mut outcome = StreamOutcome {
			connected: false,
			cause: None,
			events: 0,
		};

		match opened {
			Ok(lines) => {
				sdk_codes::stream_connected();
				let cause = self.read(lines, listener, &mut outcome).await;
				outcome.cause = cause;
			}
			Err(e) => outcome.cause = Some(e.to_string()),
		}

		let reason = outcome.cause.as_deref().unwrap_or("end of stream");
		sdk_codes::stream_stopped(reason);
		listener.on_end(outcome.cause.as_deref()).await;
		outcome
	}

	/// Consumes `lines`, returning the failure cause if any. The connection is
	/// dropped when this returns.
	async fn read<L>(&self, mut lines: LineStream, listener: &mut L, outcome: &mut StreamOutcome) -> Option<String>
	where
		L: StreamListener + ?Sized,
	{
		if let Err(e) = listener.on_start().await {
			return Some(e.to_string());
		}
		outcome.connected = true;

		loop {
			let line = match tokio::time::timeout(self.read_timeout, lines.next()).await {
				Err(_) => {
					return Some(format!(
						"read timed out after {}s",
						self.read_timeout.as_secs()
					))
				}
				Ok(None) => return None,
				Ok(Some(Err(e))) => return Some(e.to_string()),
				Ok(Some(Ok(line))) => line,
			};

			let event = match parse_frame(&line) {
				Ok(Some(event)) => event,
				Ok(None) => {
					trace!("Stream heartbeat");
					continue;
				}
				Err(e) => {
					warn!(error = %e, "Failed to parse stream frame");
					return Some(e.to_string());
				}
			};

			outcome.events += 1;
			sdk_codes::stream_event_received(&event.domain, &event.event, &event.identifier);

			let dispatched = match event.action() {
				StreamAction::EvaluationChanged(flag) => listener.on_evaluation_changed(&flag).await,
				StreamAction::EvaluationRemoved(flag) => listener.on_evaluation_removed(&flag).await,
				StreamAction::EvaluationReload => listener.on_evaluation_reload().await,
				StreamAction::Ignored => {
					debug!(domain = %event.domain, event = %event.event, "Ignoring stream event");
					Ok(())
				}
			};

			if let Err(e) = dispatched {
				return Some(e.to_string());
			}
		}
	}
}
