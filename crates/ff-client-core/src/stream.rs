// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stream frame decoding and classification.
//!
//! The backend pushes newline-terminated text frames. Frames that do not
//! mention the [`DOMAIN_MARKER`] are keep-alives; the rest carry a JSON
//! `data` object:
//!
//! ```text
//! data: {"event":"patch","domain":"flag","identifier":"dark-mode","version":4}
//! ```
//!
//! | domain | event | action |
//! |--------|-------|--------|
//! | `flag` | `create`, `patch` | [`StreamAction::EvaluationChanged`] |
//! | `flag` | `delete` | [`StreamAction::EvaluationRemoved`] |
//! | `target-segment` | `create`, `patch`, `delete` | [`StreamAction::EvaluationReload`] |
//! | anything else | | [`StreamAction::Ignored`] |

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Substring that distinguishes a structured event from a heartbeat.
pub const DOMAIN_MARKER: &str = "domain";

const DATA_PREFIX: &str = "data:";

/// A structured change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
	#[serde(default)]
	pub domain: String,
	#[serde(default)]
	pub event: String,
	#[serde(default)]
	pub identifier: String,
}

/// What the client should do in response to a [`StreamEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAction {
	/// Re-fetch a single evaluation.
	EvaluationChanged(String),
	/// Evict a single evaluation.
	EvaluationRemoved(String),
	/// Re-fetch every evaluation. Segment membership can affect many flags.
	EvaluationReload,
	Ignored,
}

impl StreamEvent {
	pub fn new(
		domain: impl Into<String>,
		event: impl Into<String>,
		identifier: impl Into<String>,
	) -> Self {
		Self {
			domain: domain.into(),
			event: event.into(),
			identifier: identifier.into(),
		}
	}

	pub fn action(&self) -> StreamAction {
		match (self.domain.as_str(), self.event.as_str()) {
			("flag", "create" | "patch") => StreamAction::EvaluationChanged(self.identifier.clone()),
			("flag", "delete") => StreamAction::EvaluationRemoved(self.identifier.clone()),
			("target-segment", "create" | "patch" | "delete") => StreamAction::EvaluationReload,
			_ => StreamAction::Ignored,
		}
	}
}

/// Decodes one stream frame.
///
/// Returns `Ok(None)` for heartbeats and an error when a frame carries the
/// domain marker but is not a JSON object.
pub fn parse_frame(line: &str) -> Result<Option<StreamEvent>> {
	if !line.contains(DOMAIN_MARKER) {
		return Ok(None);
	}

	let body = line.trim();
	let body = body.strip_prefix(DATA_PREFIX).unwrap_or(body).trim();

	let value: serde_json::Value =
		serde_json::from_str(body).map_err(|e| CoreError::InvalidFrame(e.to_string()))?;

	let data = match value.get("data") {
		Some(inner) if inner.is_object() => inner.clone(),
		_ => value,
	};

	if !data.is_object() {
		return Err(CoreError::InvalidFrame(format!("expected object, got {data}")));
	}

	serde_json::from_value(data)
		.map(Some)
		.map_err(|e| CoreError::InvalidFrame(e.to_string()))
}
