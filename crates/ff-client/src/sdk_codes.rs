// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stable SDK log codes.
//!
//! Every operator-relevant lifecycle event is logged through one of these
//! helpers so the `SDKCODE(area:nnnn)` prefix never drifts between call sites.

use std::error::Error as StdError;

use tracing::{error, info, warn};

pub(crate) fn missing_api_key() {
	error!("SDKCODE(auth:1002): Missing or empty API key");
}

pub(crate) fn invalid_certificate() {
	error!("SDKCODE(auth:1004): Invalid TLS certificate chain - server not trusted");
}

pub(crate) fn auth_ok(sdk_version: &str) {
	info!(version = %sdk_version, "SDKCODE(auth:2000): Authenticated ok");
}

pub(crate) fn polling_started(interval_secs: u64) {
	info!(interval_secs, "SDKCODE(poll:4000): Polling started");
}

pub(crate) fn polling_stopped() {
	info!("SDKCODE(poll:4001): Polling stopped");
}

pub(crate) fn stream_connected() {
	info!("SDKCODE(stream:5000): Stream connected ok");
}

pub(crate) fn stream_stopped(reason: &str) {
	info!(reason = %reason, "SDKCODE(stream:5001): Stream disconnected");
}

pub(crate) fn stream_event_received(domain: &str, event: &str, identifier: &str) {
	info!(
		domain = %domain,
		event = %event,
		identifier = %identifier,
		"SDKCODE(stream:5002): Stream event received"
	);
}

pub(crate) fn default_variation_served(evaluation_id: &str, default: &str, reason: &str) {
	warn!(
		identifier = %evaluation_id,
		default_served = %default,
		reason = %reason,
		"SDKCODE(eval:6001): Default variation was served"
	);
}

pub(crate) fn metrics_started(interval_secs: u64) {
	info!(interval_secs, "SDKCODE(metric:7000): Metrics task started");
}

pub(crate) fn metrics_exited() {
	info!("SDKCODE(metric:7001): Metrics task exited");
}

pub(crate) fn metrics_post_failed(reason: &str) {
	warn!(reason = %reason, "SDKCODE(metric:7002): Posting metrics failed");
}

pub(crate) fn metrics_buffer_full(dropped: u64) {
	warn!(
		dropped,
		"SDKCODE(metric:7008): Metrics buffer is full and metrics will be discarded"
	);
}

/// Renders an error and its sources as `outer > inner > root`.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
	let mut parts = vec![err.to_string()];
	let mut source = err.source();
	while let Some(cause) = source {
		parts.push(cause.to_string());
		source = cause.source();
	}
	parts.join(" > ")
}
