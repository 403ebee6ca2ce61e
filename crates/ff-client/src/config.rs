// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Certificate, Url};

use crate::error::{FfClientError, Result};

/// Default config (evaluations and stream) base URL.
pub const DEFAULT_CONFIG_URL: &str = "https://config.ff.harness.io/api/1.0";

/// Default event (metrics) base URL.
pub const DEFAULT_EVENT_URL: &str = "https://events.ff.harness.io/api/1.0";

/// Poll and metrics intervals are never shorter than this.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of distinct metrics keys held between flushes.
pub const DEFAULT_METRICS_CAPACITY: usize = 2048;

/// Reports whether the host currently has network connectivity.
///
/// When this returns false the client skips polls and metrics flushes and
/// waits instead of generating failing requests.
pub trait NetworkChecker: Send + Sync {
	fn is_network_available(&self) -> bool;
}

/// A [`NetworkChecker`] that always reports the network as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl NetworkChecker for AlwaysOnline {
	fn is_network_available(&self) -> bool {
		true
	}
}

/// Configuration for [`FfClient`](crate::FfClient).
#[derive(Clone)]
pub struct FfConfig {
	pub config_url: String,
	pub event_url: String,
	pub poll_interval: Duration,
	pub metrics_interval: Duration,
	pub stream_enabled: bool,
	pub analytics_enabled: bool,
	pub metrics_capacity: usize,
	/// Promotes per-poll logs from debug to info.
	pub debug: bool,
	/// Extra CA certificates for backends signed by a private CA.
	pub tls_trusted_cas: Vec<Certificate>,
	pub network_checker: Arc<dyn NetworkChecker>,
}

impl FfConfig {
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}

	/// Checks that the configured URLs are usable.
	pub fn validate(&self) -> Result<()> {
		parse_url("config URL", &self.config_url)?;
		if self.analytics_enabled {
			if self.event_url.trim().is_empty() {
				return Err(FfClientError::Config(
					"event URL must be set when analytics are enabled".to_string(),
				));
			}
			parse_url("event URL", &self.event_url)?;
		}
		Ok(())
	}

	pub(crate) fn is_network_available(&self) -> bool {
		self.network_checker.is_network_available()
	}
}

impl Default for FfConfig {
	fn default() -> Self {
		ConfigBuilder::default().build()
	}
}

impl fmt::Debug for FfConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FfConfig")
			.field("config_url", &self.config_url)
			.field("event_url", &self.event_url)
			.field("poll_interval", &self.poll_interval)
			.field("metrics_interval", &self.metrics_interval)
			.field("stream_enabled", &self.stream_enabled)
			.field("analytics_enabled", &self.analytics_enabled)
			.field("metrics_capacity", &self.metrics_capacity)
			.field("debug", &self.debug)
			.field("tls_trusted_cas", &self.tls_trusted_cas.len())
			.finish_non_exhaustive()
	}
}

fn parse_url(what: &str, value: &str) -> Result<Url> {
	Url::parse(value).map_err(|e| FfClientError::Config(format!("invalid {what} '{value}': {e}")))
}

/// Builder for [`FfConfig`].
pub struct ConfigBuilder {
	config: FfConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self {
			config: FfConfig {
				config_url: DEFAULT_CONFIG_URL.to_string(),
				event_url: DEFAULT_EVENT_URL.to_string(),
				poll_interval: MIN_INTERVAL,
				metrics_interval: MIN_INTERVAL,
				stream_enabled: true,
				analytics_enabled: true,
				metrics_capacity: DEFAULT_METRICS_CAPACITY,
				debug: false,
				tls_trusted_cas: Vec::new(),
				network_checker: Arc::new(AlwaysOnline),
			},
		}
	}
}

impl ConfigBuilder {
	/// Starts from the defaults overlaid with `FF_*` environment variables.
	///
	/// | variable | field |
	/// |----------|-------|
	/// | `FF_CONFIG_URL` | config URL |
	/// | `FF_EVENT_URL` | event URL |
	/// | `FF_POLL_INTERVAL_SECS` | poll interval |
	/// | `FF_METRICS_INTERVAL_SECS` | metrics interval |
	/// | `FF_STREAM_ENABLED` | stream enabled |
	/// | `FF_ANALYTICS_ENABLED` | analytics enabled |
	/// | `FF_METRICS_CAPACITY` | metrics capacity |
	/// | `FF_DEBUG` | debug |
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut builder = Self::default();

		if let Some(url) = lookup("FF_CONFIG_URL") {
			builder = builder.config_url(url);
		}
		if let Some(url) = lookup("FF_EVENT_URL") {
			builder = builder.event_url(url);
		}
		if let Some(secs) = parse_var::<u64>(&lookup, "FF_POLL_INTERVAL_SECS")? {
			builder = builder.poll_interval(Duration::from_secs(secs));
		}
		if let Some(secs) = parse_var::<u64>(&lookup, "FF_METRICS_INTERVAL_SECS")? {
			builder = builder.metrics_interval(Duration::from_secs(secs));
		}
		if let Some(enabled) = parse_var::<bool>(&lookup, "FF_STREAM_ENABLED")? {
			builder = builder.stream_enabled(enabled);
		}
		if let Some(enabled) = parse_var::<bool>(&lookup, "FF_ANALYTICS_ENABLED")? {
			builder = builder.analytics_enabled(enabled);
		}
		if let Some(capacity) = parse_var::<usize>(&lookup, "FF_METRICS_CAPACITY")? {
			builder = builder.metrics_capacity(capacity);
		}
		if let Some(debug) = parse_var::<bool>(&lookup, "FF_DEBUG")? {
			builder = builder.debug(debug);
		}

		Ok(builder)
	}

	pub fn config_url(mut self, url: impl Into<String>) -> Self {
		self.config.config_url = url.into();
		self
	}

	pub fn event_url(mut self, url: impl Into<String>) -> Self {
		self.config.event_url = url.into();
		self
	}

	/// Sets the poll interval. Values below 60 seconds are raised to 60 seconds.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.config.poll_interval = interval.max(MIN_INTERVAL);
		self
	}

	/// Sets the metrics interval. Values below 60 seconds are raised to 60 seconds.
	pub fn metrics_interval(mut self, interval: Duration) -> Self {
		self.config.metrics_interval = interval.max(MIN_INTERVAL);
		self
	}

	pub fn stream_enabled(mut self, enabled: bool) -> Self {
		self.config.stream_enabled = enabled;
		self
	}

	pub fn analytics_enabled(mut self, enabled: bool) -> Self {
		self.config.analytics_enabled = enabled;
		self
	}

	pub fn metrics_capacity(mut self, capacity: usize) -> Self {
		self.config.metrics_capacity = capacity;
		self
	}

	pub fn debug(mut self, debug: bool) -> Self {
		self.config.debug = debug;
		self
	}

	/// Trusts the given CA certificates in addition to the system roots.
	/// Include intermediates so the full chain can be built.
	pub fn tls_trusted_cas(mut self, certs: Vec<Certificate>) -> Self {
		self.config.tls_trusted_cas = certs;
		self
	}

	pub fn network_checker(mut self, checker: Arc<dyn NetworkChecker>) -> Self {
		self.config.network_checker = checker;
		self
	}

	pub fn build(self) -> FfConfig {
		self.config
	}
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
	T: std::str::FromStr,
	T::Err: fmt::Display,
{
	match lookup(name) {
		None => Ok(None),
		Some(raw) => raw
			.trim()
			.parse::<T>()
			.map(Some)
			.map_err(|e| FfClientError::Config(format!("invalid {name} '{raw}': {e}"))),
	}
}
