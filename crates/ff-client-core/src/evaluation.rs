// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation results delivered by the backend.
//!
//! Values are computed server-side and carried as opaque strings. The client
//! only caches them and converts them to typed values on lookup.

use serde::{Deserialize, Serialize};

/// A flag's resolved value for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
	/// The flag identifier.
	pub flag: String,
	/// Value kind as reported by the backend (`boolean`, `string`, `int`, `json`).
	#[serde(default)]
	pub kind: String,
	/// String-encoded value.
	#[serde(default)]
	pub value: String,
	/// Identifier of the variation that was served.
	#[serde(default)]
	pub identifier: String,
}

impl Evaluation {
	pub fn new(
		flag: impl Into<String>,
		kind: impl Into<String>,
		value: impl Into<String>,
		identifier: impl Into<String>,
	) -> Self {
		Self {
			flag: flag.into(),
			kind: kind.into(),
			value: value.into(),
			identifier: identifier.into(),
		}
	}

	/// An evaluation is usable only when none of its fields are empty.
	pub fn is_valid(&self) -> bool {
		!self.flag.is_empty()
			&& !self.kind.is_empty()
			&& !self.identifier.is_empty()
			&& !self.value.is_empty()
	}

	/// The variation recorded for usage metrics when this evaluation is served.
	pub fn variation(&self, evaluation_id: &str) -> Variation {
		Variation {
			identifier: self.identifier.clone(),
			value: self.value.clone(),
			name: evaluation_id.to_string(),
		}
	}
}

/// The served variation attached to a usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
	pub identifier: String,
	pub value: String,
	pub name: String,
}

/// Builds the evaluation cache key for a flag in an environment.
///
/// Flags are scoped by environment so that evaluations observed before a key
/// rotation never answer lookups made after it.
pub fn cache_key(environment_identifier: &str, flag: &str) -> String {
	let mut key = String::with_capacity(environment_identifier.len() + flag.len() + 1);
	key.push_str(environment_identifier);
	key.push('_');
	key.push_str(flag);
	key
}
