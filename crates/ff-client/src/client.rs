// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public client facade.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use ff_client_core::{AuthInfo, Evaluation, Target};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ClientApi, HttpClientApi};
use crate::cache::EvaluationCache;
use crate::config::FfConfig;
use crate::error::{FfClientError, Result};
use crate::metrics::MetricsAggregator;
use crate::ready::ReadySignal;
use crate::sdk_codes;
use crate::supervisor::Supervisor;

/// Upper bound on how long [`FfClient::shutdown`] waits for each background task.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

/// Feature flag client.
///
/// Lookups are synchronous and served from the local cache; all network
/// activity happens on background tasks. Cloning yields another handle to
/// the same client. Dropping the last handle stops the background tasks.
#[derive(Clone)]
pub struct FfClient {
	inner: Arc<Inner>,
}

struct Inner {
	target: Target,
	cache: EvaluationCache,
	auth: Arc<ArcSwapOption<AuthInfo>>,
	ready: ReadySignal,
	metrics: Option<Arc<MetricsAggregator>>,
	cancel: CancellationToken,
	tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
	shut_down: AtomicBool,
}

impl Drop for Inner {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

impl FfClient {
	pub fn builder() -> FfClientBuilder {
		FfClientBuilder::default()
	}

	/// Waits until the first authentication and cache seed complete.
	///
	/// Returns false if that did not happen within `timeout`.
	pub async fn wait_for_initialization(&self, timeout: Duration) -> bool {
		self.inner.ready.wait_timeout(timeout).await
	}

	/// Returns true once the client has authenticated and seeded its cache.
	pub fn is_initialized(&self) -> bool {
		self.inner.ready.is_ready()
	}

	pub fn target(&self) -> &Target {
		&self.inner.target
	}

	/// Returns the cached evaluation for `flag` without recording usage.
	pub fn evaluation(&self, flag: &str) -> Option<Evaluation> {
		self.lookup(flag).ok()
	}

	pub fn bool_variation(&self, flag: &str, default: bool) -> bool {
		self.variation(flag, default, |value| match value.trim().to_ascii_lowercase().as_str() {
			"true" => Some(true),
			"false" => Some(false),
			_ => None,
		})
	}

	pub fn string_variation(&self, flag: &str, default: &str) -> String {
		self.variation(flag, default.to_string(), |value| Some(value.to_string()))
	}

	pub fn number_variation(&self, flag: &str, default: f64) -> f64 {
		self.variation(flag, default, |value| value.trim().parse().ok())
	}

	pub fn json_variation(&self, flag: &str, default: serde_json::Value) -> serde_json::Value {
		self.variation(flag, default, |value| serde_json::from_str(value).ok())
	}

	/// Stops both background tasks, waiting up to [`SHUTDOWN_TIMEOUT`] for
	/// each. Metrics still pending are flushed once. Calling this again is a
	/// no-op.
	pub async fn shutdown(&self) {
		if self.inner.shut_down.swap(true, Ordering::SeqCst) {
			return;
		}

		info!("Shutting down feature flag client");
		self.inner.cancel.cancel();

		let tasks = std::mem::take(&mut *self.inner.tasks.lock().await);
		for (name, handle) in tasks {
			match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
				Ok(Ok(())) => debug!(task = name, "Background task stopped"),
				Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
				Err(_) => warn!(
					task = name,
					timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
					"Background task did not stop in time"
				),
			}
		}
	}

	fn lookup(&self, flag: &str) -> std::result::Result<Evaluation, String> {
		if self.inner.shut_down.load(Ordering::SeqCst) {
			return Err("client shut down".to_string());
		}
		let session = self.inner.auth.load();
		let Some(auth) = &*session else {
			return Err("SDK not authenticated".to_string());
		};
		self.inner
			.cache
			.get(&auth.environment_identifier, flag)
			.ok_or_else(|| format!("{flag} not in cache"))
	}

	fn variation<T>(&self, flag: &str, default: T, convert: impl FnOnce(&str) -> Option<T>) -> T
	where
		T: fmt::Display,
	{
		let evaluation = match self.lookup(flag) {
			Ok(evaluation) => evaluation,
			Err(reason) => {
				sdk_codes::default_variation_served(flag, &default.to_string(), &reason);
				return default;
			}
		};

		match convert(&evaluation.value) {
			Some(value) => {
				if let Some(metrics) = &self.inner.metrics {
					metrics.record(flag, evaluation.variation(flag));
				}
				value
			}
			None => {
				let reason = format!("cannot convert {} value '{}'", evaluation.kind, evaluation.value);
				sdk_codes::default_variation_served(flag, &default.to_string(), &reason);
				default
			}
		}
	}
}

impl fmt::Debug for FfClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FfClient")
			.field("target", &self.inner.target.identifier())
			.field("initialized", &self.is_initialized())
			.field("cached", &self.inner.cache.len())
			.finish()
	}
}

/// Builder for [`FfClient`].
#[derive(Default)]
pub struct FfClientBuilder {
	api_key: Option<String>,
	config: Option<FfConfig>,
	target: Option<Target>,
	client_api: Option<Arc<dyn ClientApi>>,
}

impl FfClientBuilder {
	pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());
		self
	}

	pub fn config(mut self, config: FfConfig) -> Self {
		self.config = Some(config);
		self
	}

	pub fn target(mut self, target: Target) -> Self {
		self.target = Some(target);
		self
	}

	/// Routes backend traffic through a custom transport instead of HTTP.
	pub fn client_api(mut self, api: Arc<dyn ClientApi>) -> Self {
		self.client_api = Some(api);
		self
	}

	/// Validates the inputs and starts the background tasks on the current
	/// tokio runtime.
	///
	/// Fails with [`FfClientError::Config`] for a missing API key, an invalid
	/// target or URL, or when called outside a runtime.
	pub fn build(self) -> Result<FfClient> {
		let api_key = self.api_key.unwrap_or_default();
		if api_key.trim().is_empty() {
			sdk_codes::missing_api_key();
			return Err(FfClientError::Config("API key is missing or empty".to_string()));
		}

		let target = self
			.target
			.ok_or_else(|| FfClientError::Config("target is required".to_string()))?;
		target
			.validate()
			.map_err(|e| FfClientError::Config(e.to_string()))?;

		let config = self.config.unwrap_or_default();
		config.validate()?;

		let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
			FfClientError::Config("FfClient must be built inside a tokio runtime".to_string())
		})?;

		let api: Arc<dyn ClientApi> = match self.client_api {
			Some(api) => api,
			None => Arc::new(HttpClientApi::new(&config)?),
		};

		let cache = EvaluationCache::new();
		let auth = Arc::new(ArcSwapOption::empty());
		let ready = ReadySignal::new();
		let cancel = CancellationToken::new();
		let mut tasks = Vec::new();

		let metrics = config
			.analytics_enabled
			.then(|| Arc::new(MetricsAggregator::new(target.clone(), config.metrics_capacity)));

		if let Some(metrics) = &metrics {
			let metrics = Arc::clone(metrics);
			let api = Arc::clone(&api);
			let auth = Arc::clone(&auth);
			let ready = ready.clone();
			let cancel = cancel.clone();
			let interval = config.metrics_interval;
			let network = Arc::clone(&config.network_checker);

			tasks.push((
				"metrics",
				runtime.spawn(async move {
					// Metrics start with the first authenticated session.
					tokio::select! {
						biased;
						_ = cancel.cancelled() => {}
						_ = ready.wait() => {}
					}
					let Some(session) = auth.load_full() else {
						return;
					};
					metrics.run(api, session, interval, network, cancel).await;
				}),
			));
		}

		let supervisor = Supervisor::new(
			api,
			config,
			api_key,
			target.clone(),
			cache.clone(),
			Arc::clone(&auth),
			ready.clone(),
		);
		tasks.push(("supervisor", runtime.spawn(supervisor.run(cancel.clone()))));

		info!(identifier = %target.identifier(), "Feature flag client started");

		Ok(FfClient {
			inner: Arc::new(Inner {
				target,
				cache,
				auth,
				ready,
				metrics,
				cancel,
				tasks: Mutex::new(tasks),
				shut_down: AtomicBool::new(false),
			}),
		})
	}
}
