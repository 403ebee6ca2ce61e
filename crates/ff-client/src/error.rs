// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the feature flag client.

use ff_client_core::CoreError;
use thiserror::Error;

/// Feature flag client errors.
#[derive(Debug, Error)]
pub enum FfClientError {
	/// Invalid configuration, API key, target or URL.
	#[error("invalid configuration: {0}")]
	Config(String),

	/// Authentication handshake failed.
	#[error("authentication failed: {0}")]
	Auth(String),

	/// The network checker reported no connectivity.
	#[error("network is offline")]
	NetworkOffline,

	/// The event stream failed or could not be opened.
	#[error("stream error: {0}")]
	Stream(String),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// The bearer token could not be decoded.
	#[error("invalid auth token: {0}")]
	InvalidToken(String),

	/// Payload could not be decoded.
	#[error(transparent)]
	Core(#[from] CoreError),
}

impl FfClientError {
	/// Returns true if the operation may succeed when repeated later.
	pub fn is_retryable(&self) -> bool {
		match self {
			FfClientError::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
			FfClientError::ServerError { status, .. } => {
				matches!(*status, 429 | 408 | 500 | 502 | 503 | 504)
			}
			FfClientError::Stream(_) | FfClientError::NetworkOffline => true,
			_ => false,
		}
	}

	/// Returns true if the error is the explicit offline signal rather than a
	/// generic transport failure.
	pub fn is_network_offline(&self) -> bool {
		matches!(self, FfClientError::NetworkOffline)
	}
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, FfClientError>;
