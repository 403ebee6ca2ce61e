// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication request/response shapes and the resulting session info.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Body of the authenticate call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
	pub api_key: String,
	pub target: AuthenticationTarget,
}

impl AuthenticationRequest {
	pub fn new(api_key: impl Into<String>, target: &Target) -> Self {
		Self {
			api_key: api_key.into(),
			target: AuthenticationTarget::from(target),
		}
	}
}

/// Target descriptor sent with the authenticate call.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationTarget {
	pub identifier: String,
	pub name: String,
	pub anonymous: bool,
	pub attributes: BTreeMap<String, String>,
}

impl From<&Target> for AuthenticationTarget {
	fn from(target: &Target) -> Self {
		Self {
			identifier: target.identifier().to_string(),
			name: target.name().to_string(),
			anonymous: false,
			attributes: target.attributes().clone(),
		}
	}
}

/// Response of the authenticate call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
	pub auth_token: String,
}

/// Session details established by a successful authentication.
///
/// Replaced wholesale on every re-authentication and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthInfo {
	pub bearer_token: String,
	pub api_key: String,
	/// Environment id used in request paths.
	pub environment: String,
	/// Environment identifier used to scope cache keys.
	pub environment_identifier: String,
	pub cluster_identifier: String,
	pub account_id: String,
	pub organization: String,
	pub project: String,
	pub project_identifier: String,
}

impl fmt::Debug for AuthInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthInfo")
			.field("bearer_token", &"[REDACTED]")
			.field("api_key", &"[REDACTED]")
			.field("environment", &self.environment)
			.field("environment_identifier", &self.environment_identifier)
			.field("cluster_identifier", &self.cluster_identifier)
			.field("account_id", &self.account_id)
			.field("organization", &self.organization)
			.field("project", &self.project)
			.field("project_identifier", &self.project_identifier)
			.finish()
	}
}
