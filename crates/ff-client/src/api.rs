// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend transport.
//!
//! [`ClientApi`] is the seam between the engine and the network. The engine
//! only ever talks to the backend through it, so tests substitute fakes and
//! hosts can route traffic through their own stack.

use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use ff_client_core::{AuthInfo, AuthenticationRequest, AuthenticationResponse, Evaluation, Metrics};
use ff_common_http::headers;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::{Client, RequestBuilder, Response, Url};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

use crate::config::FfConfig;
use crate::error::{FfClientError, Result};
use crate::sdk_codes;

/// Timeout for ordinary (non-stream) requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest stream frame accepted before the stream is failed.
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Newline-framed text lines from the event stream, without terminators.
pub type LineStream = Pin<Box<dyn Stream<Item = io::Result<String>> + Send>>;

/// Backend operations used by the client.
#[async_trait]
pub trait ClientApi: Send + Sync {
	/// Exchanges the API key and target for a bearer token.
	async fn authenticate(&self, request: &AuthenticationRequest) -> Result<String>;

	/// Fetches every evaluation for the target.
	async fn get_evaluations(&self, auth: &AuthInfo, target_identifier: &str) -> Result<Vec<Evaluation>>;

	/// Fetches one flag's evaluation for the target.
	async fn get_evaluation(
		&self,
		auth: &AuthInfo,
		flag: &str,
		target_identifier: &str,
	) -> Result<Evaluation>;

	/// Opens the change notification stream.
	async fn open_stream(&self, auth: &AuthInfo) -> Result<LineStream>;

	/// Submits a usage report.
	async fn post_metrics(&self, auth: &AuthInfo, metrics: &Metrics) -> Result<()>;
}

/// [`ClientApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClientApi {
	api: Client,
	stream: Client,
	config_url: Url,
	event_url: Option<Url>,
}

impl HttpClientApi {
	/// Builds the HTTP clients, trusting any extra CA certificates in `config`.
	pub fn new(config: &FfConfig) -> Result<Self> {
		let api = ff_common_http::builder_with_root_certificates(&config.tls_trusted_cas)
			.timeout(REQUEST_TIMEOUT)
			.build()?;

		// The stream is long-lived; reads are bounded per line by the reader instead.
		let stream = ff_common_http::builder_with_root_certificates(&config.tls_trusted_cas)
			.connect_timeout(REQUEST_TIMEOUT)
			.build()?;

		let config_url = parse_base("config URL", &config.config_url)?;
		let event_url = if config.event_url.trim().is_empty() {
			None
		} else {
			Some(parse_base("event URL", &config.event_url)?)
		};

		Ok(Self {
			api,
			stream,
			config_url,
			event_url,
		})
	}
}

#[async_trait]
impl ClientApi for HttpClientApi {
	#[instrument(skip_all)]
	async fn authenticate(&self, request: &AuthenticationRequest) -> Result<String> {
		let url = endpoint(&self.config_url, &["client", "auth"])?;
		debug!(url = %url, "Authenticating");

		let response = self
			.api
			.post(url)
			.json(request)
			.send()
			.await
			.map_err(request_failed)?;

		let body: AuthenticationResponse = check_status(response).await?.json().await?;
		Ok(body.auth_token)
	}

	#[instrument(skip(self, auth), fields(environment = %auth.environment))]
	async fn get_evaluations(&self, auth: &AuthInfo, target_identifier: &str) -> Result<Vec<Evaluation>> {
		let url = endpoint(
			&self.config_url,
			&[
				"client",
				"env",
				&auth.environment,
				"target",
				target_identifier,
				"evaluations",
			],
		)?;

		let response = with_cluster(self.api.get(url), auth)
			.headers(auth_headers(auth))
			.send()
			.await
			.map_err(request_failed)?;

		Ok(check_status(response).await?.json().await?)
	}

	#[instrument(skip(self, auth), fields(environment = %auth.environment))]
	async fn get_evaluation(
		&self,
		auth: &AuthInfo,
		flag: &str,
		target_identifier: &str,
	) -> Result<Evaluation> {
		let url = endpoint(
			&self.config_url,
			&[
				"client",
				"env",
				&auth.environment,
				"target",
				target_identifier,
				"evaluations",
				flag,
			],
		)?;

		let response = with_cluster(self.api.get(url), auth)
			.headers(auth_headers(auth))
			.send()
			.await
			.map_err(request_failed)?;

		Ok(check_status(response).await?.json().await?)
	}

	#[instrument(skip_all)]
	async fn open_stream(&self, auth: &AuthInfo) -> Result<LineStream> {
		let url = endpoint(&self.config_url, &["stream"])?;
		debug!(url = %url, "Opening stream");

		let response = with_cluster(self.stream.get(url), auth)
			.headers(auth_headers(auth))
			.header(headers::API_KEY, &auth.api_key)
			.header(ACCEPT, "text/event-stream")
			.header(CACHE_CONTROL, "no-cache")
			.send()
			.await
			.map_err(request_failed)?;

		let response = check_status(response).await.map_err(|e| match e {
			FfClientError::ServerError { status, message } => {
				FfClientError::Stream(format!("stream rejected ({status}): {message}"))
			}
			other => other,
		})?;

		let bytes = response.bytes_stream().map_err(io::Error::other);
		let lines = FramedRead::new(
			StreamReader::new(bytes),
			LinesCodec::new_with_max_length(MAX_FRAME_LEN),
		)
		.map(|line| line.map_err(lines_error));

		Ok(Box::pin(lines))
	}

	#[instrument(skip_all, fields(rows = metrics.metrics_data.len()))]
	async fn post_metrics(&self, auth: &AuthInfo, metrics: &Metrics) -> Result<()> {
		let Some(event_url) = &self.event_url else {
			return Err(FfClientError::Config("event URL is not configured".to_string()));
		};
		let url = endpoint(event_url, &["metrics", &auth.environment])?;

		let response = with_cluster(self.api.post(url), auth)
			.headers(auth_headers(auth))
			.json(metrics)
			.send()
			.await
			.map_err(request_failed)?;

		check_status(response).await?;
		Ok(())
	}
}

fn parse_base(what: &str, value: &str) -> Result<Url> {
	let url = Url::parse(value)
		.map_err(|e| FfClientError::Config(format!("invalid {what} '{value}': {e}")))?;
	if url.cannot_be_a_base() {
		return Err(FfClientError::Config(format!("invalid {what} '{value}'")));
	}
	Ok(url)
}

/// Appends percent-encoded path segments to a base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
	let mut url = base.clone();
	url.path_segments_mut()
		.map_err(|_| FfClientError::Config(format!("URL cannot be a base: {base}")))?
		.pop_if_empty()
		.extend(segments);
	Ok(url)
}

fn with_cluster(request: RequestBuilder, auth: &AuthInfo) -> RequestBuilder {
	request.query(&[("cluster", auth.cluster_identifier.as_str())])
}

/// Per-session headers. SDK identity headers are set on the client itself.
fn auth_headers(auth: &AuthInfo) -> HeaderMap {
	let mut map = HeaderMap::new();
	if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", auth.bearer_token)) {
		map.insert(reqwest::header::AUTHORIZATION, value);
	}
	if !auth.account_id.is_empty() {
		if let Ok(value) = HeaderValue::from_str(&auth.account_id) {
			map.insert(HeaderName::from_static(headers::ACCOUNT_ID), value);
		}
	}
	if !auth.environment_identifier.is_empty() {
		if let Ok(value) = HeaderValue::from_str(&auth.environment_identifier) {
			map.insert(HeaderName::from_static(headers::ENVIRONMENT_ID), value);
		}
	}
	map
}

async fn check_status(response: Response) -> Result<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	Err(FfClientError::ServerError {
		status: status.as_u16(),
		message: response.text().await.unwrap_or_default(),
	})
}

fn request_failed(err: reqwest::Error) -> FfClientError {
	if ff_common_http::is_tls_failure(&err) {
		sdk_codes::invalid_certificate();
	}
	FfClientError::RequestFailed(err)
}

fn lines_error(err: LinesCodecError) -> io::Error {
	match err {
		LinesCodecError::Io(e) => e,
		LinesCodecError::MaxLineLengthExceeded => {
			io::Error::new(io::ErrorKind::InvalidData, "stream frame too long")
		}
	}
}
