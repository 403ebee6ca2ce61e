// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Usage metrics report shapes.

use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Aggregation key for usage counts.
///
/// The served variation is deliberately not part of the key: repeated
/// evaluations of one flag count against one row even if the variation
/// changes between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyticsKey {
	pub target_identifier: String,
	pub evaluation_id: String,
}

impl AnalyticsKey {
	pub fn new(target_identifier: impl Into<String>, evaluation_id: impl Into<String>) -> Self {
		Self {
			target_identifier: target_identifier.into(),
			evaluation_id: evaluation_id.into(),
		}
	}
}

/// Body posted to the metrics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
	pub target_data: Vec<TargetData>,
	pub metrics_data: Vec<MetricsData>,
}

impl Metrics {
	/// Sum of all row counts.
	pub fn total_count(&self) -> u64 {
		self.metrics_data.iter().map(|m| m.count).sum()
	}
}

/// One usage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
	/// Milliseconds since the Unix epoch.
	pub timestamp: i64,
	pub count: u64,
	pub metrics_type: MetricsType,
	pub attributes: Vec<KeyValue>,
}

impl MetricsData {
	/// Looks up an attribute value by key.
	pub fn attribute(&self, key: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|kv| kv.key == key)
			.map(|kv| kv.value.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsType {
	#[serde(rename = "FFMETRICS")]
	FfMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
	pub key: String,
	pub value: String,
}

impl KeyValue {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

/// Target usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetData {
	pub identifier: String,
	pub name: String,
	pub attributes: Vec<KeyValue>,
}

impl From<&Target> for TargetData {
	fn from(target: &Target) -> Self {
		Self {
			identifier: target.identifier().to_string(),
			name: target.name().to_string(),
			attributes: target
				.attributes()
				.iter()
				.map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn analytics_key_ignores_variation() {
		let mut keys = HashSet::new();
		keys.insert(AnalyticsKey::new("ada", "dark-mode"));
		keys.insert(AnalyticsKey::new("ada", "dark-mode"));
		keys.insert(AnalyticsKey::new("ada", "banner"));
		assert_eq!(keys.len(), 2);
	}

	#[test]
	fn metrics_serialize_with_backend_field_names() {
		let metrics = Metrics {
			target_data: vec![TargetData::from(&Target::new("ada", "Ada"))],
			metrics_data: vec![MetricsData {
				timestamp: 1_700_000_000_000,
				count: 3,
				metrics_type: MetricsType::FfMetrics,
				attributes: vec![KeyValue::new("featureIdentifier", "dark-mode")],
			}],
		};

		let json = serde_json::to_value(&metrics).unwrap();
		assert_eq!(json["targetData"][0]["identifier"], "ada");
		assert_eq!(json["metricsData"][0]["count"], 3);
		assert_eq!(json["metricsData"][0]["metricsType"], "FFMETRICS");
		assert_eq!(json["metricsData"][0]["attributes"][0]["key"], "featureIdentifier");
	}

	#[test]
	fn attribute_lookup() {
		let row = MetricsData {
			timestamp: 0,
			count: 1,
			metrics_type: MetricsType::FfMetrics,
			attributes: vec![KeyValue::new("target", "ada")],
		};
		assert_eq!(row.attribute("target"), Some("ada"));
		assert_eq!(row.attribute("missing"), None);
	}
}
