// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Usage metrics aggregation and background flush.

use std::sync::Arc;
use std::time::Duration;

use ff_client_core::{
	AnalyticsKey, AuthInfo, KeyValue, Metrics, MetricsData, MetricsType, Target, TargetData, Variation,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ClientApi;
use crate::config::NetworkChecker;
use crate::frequency::{FrequencyMap, UsageCount};
use crate::sdk_codes;

const FEATURE_IDENTIFIER_ATTRIBUTE: &str = "featureIdentifier";
const FEATURE_NAME_ATTRIBUTE: &str = "featureName";
const VARIATION_IDENTIFIER_ATTRIBUTE: &str = "variationIdentifier";
const TARGET_ATTRIBUTE: &str = "target";
const SDK_TYPE_ATTRIBUTE: &str = "SDK_TYPE";
const SDK_LANGUAGE_ATTRIBUTE: &str = "SDK_LANGUAGE";
const SDK_VERSION_ATTRIBUTE: &str = "SDK_VERSION";
const SDK_TYPE: &str = "client";

/// Counts served evaluations and periodically reports them.
#[derive(Debug)]
pub(crate) struct MetricsAggregator {
	target: Target,
	frequency: FrequencyMap,
}

impl MetricsAggregator {
	pub fn new(target: Target, capacity: usize) -> Self {
		Self {
			target,
			frequency: FrequencyMap::new(capacity),
		}
	}

	/// Counts one served evaluation. Never blocks and never fails; records
	/// beyond capacity are dropped and reported at the next flush.
	pub fn record(&self, evaluation_id: &str, variation: Variation) {
		let key = AnalyticsKey::new(self.target.identifier(), evaluation_id);
		self.frequency.record(key, variation);
	}

	/// Drains the counters into a report. Returns `None` when nothing was
	/// recorded since the previous drain.
	pub fn take_report(&self) -> Option<Metrics> {
		let dropped = self.frequency.take_dropped();
		if dropped > 0 {
			sdk_codes::metrics_buffer_full(dropped);
		}

		let usage = self.frequency.drain();
		if usage.is_empty() {
			return None;
		}

		let timestamp = chrono::Utc::now().timestamp_millis();
		Some(Metrics {
			target_data: vec![TargetData::from(&self.target)],
			metrics_data: usage.into_iter().map(|u| row(timestamp, u)).collect(),
		})
	}

	/// Drains and submits one report. Submission failures are logged and the
	/// drained counts are not retried.
	pub async fn flush(&self, api: &dyn ClientApi, auth: &AuthInfo) {
		let Some(report) = self.take_report() else {
			debug!("No metrics to flush");
			return;
		};

		let rows = report.metrics_data.len();
		let total = report.total_count();
		match api.post_metrics(auth, &report).await {
			Ok(()) => debug!(rows, total, "Metrics posted"),
			Err(e) => sdk_codes::metrics_post_failed(&sdk_codes::error_chain(&e)),
		}
	}

	/// Flushes every `interval` until `cancel` fires, then flushes once more.
	///
	/// Cycles are skipped while the network is unavailable; the counts stay
	/// in the map for the next cycle. The final flush ignores connectivity.
	pub async fn run(
		self: Arc<Self>,
		api: Arc<dyn ClientApi>,
		auth: Arc<AuthInfo>,
		interval: Duration,
		network: Arc<dyn NetworkChecker>,
		cancel: CancellationToken,
	) {
		sdk_codes::metrics_started(interval.as_secs());
		debug!(capacity = self.frequency.capacity(), "Metrics buffer ready");

		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				_ = tokio::time::sleep(interval) => {}
			}

			if network.is_network_available() {
				self.flush(api.as_ref(), &auth).await;
			} else {
				debug!(pending = self.frequency.len(), "Network unavailable, skipping metrics flush");
			}
		}

		self.flush(api.as_ref(), &auth).await;
		sdk_codes::metrics_exited();
	}

	#[cfg(test)]
	pub(crate) fn pending(&self) -> usize {
		self.frequency.len()
	}
}

fn row(timestamp: i64, usage: UsageCount) -> MetricsData {
	let UsageCount { key, count, variation } = usage;
	MetricsData {
		timestamp,
		count,
		metrics_type: MetricsType::FfMetrics,
		attributes: vec![
			KeyValue::new(FEATURE_IDENTIFIER_ATTRIBUTE, variation.name.as_str()),
			KeyValue::new(FEATURE_NAME_ATTRIBUTE, variation.name),
			KeyValue::new(VARIATION_IDENTIFIER_ATTRIBUTE, variation.identifier),
			KeyValue::new(TARGET_ATTRIBUTE, key.target_identifier),
			KeyValue::new(SDK_TYPE_ATTRIBUTE, SDK_TYPE),
			KeyValue::new(SDK_LANGUAGE_ATTRIBUTE, ff_common_http::SDK_LANGUAGE),
			KeyValue::new(SDK_VERSION_ATTRIBUTE, ff_common_http::SDK_VERSION),
		],
	}
}
