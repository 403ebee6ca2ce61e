// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication handshake and token claim extraction.
//!
//! The bearer token is a JWT. Its claims are decoded without signature
//! verification: the token arrives over the same trusted transport as every
//! other response and the client never signs or verifies anything itself.

use ff_client_core::{AuthInfo, AuthenticationRequest, Target};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::api::ClientApi;
use crate::error::{FfClientError, Result};
use crate::sdk_codes;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
	#[serde(default)]
	environment: Option<String>,
	#[serde(default)]
	environment_identifier: Option<String>,
	#[serde(default)]
	cluster_identifier: Option<String>,
	#[serde(default, rename = "accountID")]
	account_id: Option<String>,
	#[serde(default)]
	organization: Option<String>,
	#[serde(default)]
	project: Option<String>,
	#[serde(default)]
	project_identifier: Option<String>,
}

/// Runs the authenticate call and builds the session from the returned token.
pub(crate) async fn authenticate(api: &dyn ClientApi, api_key: &str, target: &Target) -> Result<AuthInfo> {
	if api_key.trim().is_empty() {
		sdk_codes::missing_api_key();
		return Err(FfClientError::Auth("API key is missing or empty".to_string()));
	}

	let request = AuthenticationRequest::new(api_key, target);
	let token = api.authenticate(&request).await.map_err(|e| match e {
		FfClientError::ServerError { status: 401 | 403, message } => {
			FfClientError::Auth(format!("API key rejected: {message}"))
		}
		other => other,
	})?;

	auth_info_from_token(&token, api_key)
}

/// Decodes the session claims carried by `token`.
///
/// `environment` and `clusterIdentifier` are required. `environmentIdentifier`
/// falls back to `environment`; the remaining claims default to empty.
pub(crate) fn auth_info_from_token(token: &str, api_key: &str) -> Result<AuthInfo> {
	let mut validation = Validation::default();
	validation.insecure_disable_signature_validation();
	validation.validate_exp = false;
	validation.validate_aud = false;
	validation.required_spec_claims.clear();

	let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
		.map_err(|e| FfClientError::InvalidToken(e.to_string()))?
		.claims;

	let environment = required(claims.environment, "environment")?;
	let cluster_identifier = required(claims.cluster_identifier, "clusterIdentifier")?;
	let environment_identifier = claims
		.environment_identifier
		.filter(|id| !id.is_empty())
		.unwrap_or_else(|| environment.clone());

	Ok(AuthInfo {
		bearer_token: token.to_string(),
		api_key: api_key.to_string(),
		environment,
		environment_identifier,
		cluster_identifier,
		account_id: claims.account_id.unwrap_or_default(),
		organization: claims.organization.unwrap_or_default(),
		project: claims.project.unwrap_or_default(),
		project_identifier: claims.project_identifier.unwrap_or_default(),
	})
}

fn required(value: Option<String>, claim: &str) -> Result<String> {
	value
		.filter(|v| !v.is_empty())
		.ok_or_else(|| FfClientError::InvalidToken(format!("missing '{claim}' claim")))
}
