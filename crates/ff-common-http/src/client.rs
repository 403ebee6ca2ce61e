// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent SDK identity headers.

use std::error::Error as _;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Certificate, Client, ClientBuilder};

use crate::headers;

/// SDK version reported to the backend.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SDK language reported to the backend.
pub const SDK_LANGUAGE: &str = "Rust";

/// Creates a new HTTP client builder with the SDK User-Agent and
/// `Harness-SDK-Info` headers.
///
/// # Example
/// ```ignore
/// let client = ff_common_http::builder()
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	let mut default_headers = HeaderMap::new();
	if let Ok(value) = HeaderValue::from_str(&sdk_info()) {
		default_headers.insert(HeaderName::from_static(headers::SDK_INFO), value);
	}

	Client::builder()
		.user_agent(user_agent())
		.default_headers(default_headers)
}

/// Creates a builder that additionally trusts the given CA certificates.
///
/// Use this when the config or event endpoints are signed by a private CA.
/// Intermediate certificates should be included so a full chain can be built.
pub fn builder_with_root_certificates(certificates: &[Certificate]) -> ClientBuilder {
	certificates
		.iter()
		.cloned()
		.fold(builder(), |builder, cert| builder.add_root_certificate(cert))
}

/// Returns the SDK User-Agent string.
///
/// Format: `Rust/{version}`
pub fn user_agent() -> String {
	format!("{SDK_LANGUAGE}/{SDK_VERSION}")
}

/// Returns the `Harness-SDK-Info` header value.
///
/// Format: `Rust {version} Client`
pub fn sdk_info() -> String {
	format!("{SDK_LANGUAGE} {SDK_VERSION} Client")
}

/// Returns true when a request failed because the server's certificate chain
/// was not trusted.
pub fn is_tls_failure(err: &reqwest::Error) -> bool {
	if !err.is_connect() {
		return false;
	}

	let mut source = err.source();
	while let Some(cause) = source {
		let text = cause.to_string().to_ascii_lowercase();
		if text.contains("certificate") || text.contains("tls") {
			return true;
		}
		source = cause.source();
	}
	false
}
