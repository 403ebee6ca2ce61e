// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection supervisor.
//!
//! Owns the evaluation lifecycle as an explicit state machine:
//!
//! ```text
//! Authenticating ──ok──> Streaming ──stream ended──> Reconnecting ──> Authenticating
//!       │          └──> Polling ──┐
//!       │ error                   │ offline
//!       ├──────────> Backoff ─────┼──────────────────────────────────> Authenticating
//!       └─ offline ─> NetworkWait <┘ ────────────────────────────────> Authenticating
//! ```
//!
//! A poll rejected with 401 or 403 goes straight back to `Authenticating`.
//!
//! Every state except `Terminated` eventually leads back to `Authenticating`,
//! so a stream disconnect always reseeds the cache from a fresh session.
//! Only cancellation reaches `Terminated`.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ff_client_core::{AuthInfo, Target};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ClientApi;
use crate::auth;
use crate::cache::EvaluationCache;
use crate::config::FfConfig;
use crate::error::{FfClientError, Result};
use crate::ready::ReadySignal;
use crate::sdk_codes;
use crate::stream::{EventStreamReader, StreamListener};

/// Pause after an unexpected failure before authenticating again.
pub const BACKOFF_DELAY: Duration = Duration::from_secs(60);

/// Interval between network checks while offline.
pub const NETWORK_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Network checks made before resuming regardless of connectivity.
pub const NETWORK_CHECK_ATTEMPTS: u32 = 30;

/// Base delay before re-authenticating after a stream ends.
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for the stream reconnect delay.
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum State {
	Authenticating,
	Streaming(Arc<AuthInfo>),
	Polling(Arc<AuthInfo>),
	/// A stream ended; wait before the next authentication.
	Reconnecting(Duration),
	Backoff,
	NetworkWait,
	Terminated,
}

/// Returns the pause before re-authenticating after `failures` consecutive
/// streams that never connected.
pub(crate) fn reconnect_delay(failures: u32) -> Duration {
	let factor = 2u64.saturating_pow(failures.min(10));
	let delay_ms = (RECONNECT_BASE_DELAY.as_millis() as u64).saturating_mul(factor);
	Duration::from_millis(delay_ms.min(RECONNECT_MAX_DELAY.as_millis() as u64))
}

pub(crate) struct Supervisor {
	api: Arc<dyn ClientApi>,
	config: FfConfig,
	api_key: String,
	target: Target,
	cache: EvaluationCache,
	auth: Arc<ArcSwapOption<AuthInfo>>,
	ready: ReadySignal,
	reader: EventStreamReader,
	stream_failures: u32,
}

impl Supervisor {
	pub fn new(
		api: Arc<dyn ClientApi>,
		config: FfConfig,
		api_key: String,
		target: Target,
		cache: EvaluationCache,
		auth: Arc<ArcSwapOption<AuthInfo>>,
		ready: ReadySignal,
	) -> Self {
		Self {
			api,
			config,
			api_key,
			target,
			cache,
			auth,
			ready,
			reader: EventStreamReader::default(),
			stream_failures: 0,
		}
	}

	/// Runs the state machine until `cancel` fires.
	///
	/// Cancellation drops whatever request, read or sleep is in flight.
	pub async fn run(mut self, cancel: CancellationToken) {
		info!(identifier = %self.target.identifier(), "Connection supervisor started");

		let mut state = State::Authenticating;
		while state != State::Terminated {
			let polling = matches!(state, State::Polling(_));
			state = tokio::select! {
				biased;
				_ = cancel.cancelled() => State::Terminated,
				next = self.step(state) => next,
			};
			if polling && state == State::Terminated {
				sdk_codes::polling_stopped();
			}
		}

		info!("Connection supervisor terminated");
	}

	/// Performs the work of `state` and returns the next state.
	pub(crate) async fn step(&mut self, state: State) -> State {
		match state {
			State::Authenticating => match self.authenticate().await {
				Ok(info) if self.config.stream_enabled => State::Streaming(info),
				Ok(info) => {
					sdk_codes::polling_started(self.config.poll_interval.as_secs());
					State::Polling(info)
				}
				Err(e) => self.failed("Authentication failed", e),
			},
			State::Streaming(info) => self.stream(info).await,
			State::Polling(info) => {
				tokio::time::sleep(self.config.poll_interval).await;
				match self.poll_once(&info).await {
					Ok(_) => State::Polling(info),
					Err(e) if e.is_retryable() && !e.is_network_offline() => {
						warn!(error = %e, "Poll failed, will retry next interval");
						State::Polling(info)
					}
					Err(e) => {
						sdk_codes::polling_stopped();
						self.poll_failed(e)
					}
				}
			}
			State::Reconnecting(delay) => {
				debug!(delay_ms = delay.as_millis() as u64, "Waiting before re-authenticating");
				tokio::time::sleep(delay).await;
				State::Authenticating
			}
			State::Backoff => {
				tokio::time::sleep(BACKOFF_DELAY).await;
				State::Authenticating
			}
			State::NetworkWait => {
				self.wait_for_network().await;
				State::Authenticating
			}
			State::Terminated => State::Terminated,
		}
	}

	fn failed(&self, context: &str, err: FfClientError) -> State {
		if err.is_network_offline() {
			info!("{context}: network offline, waiting for connectivity");
			return State::NetworkWait;
		}
		warn!(
			error = %sdk_codes::error_chain(&err),
			delay_secs = BACKOFF_DELAY.as_secs(),
			"{context}, backing off"
		);
		State::Backoff
	}

	/// Picks the state after a poll failure that leaves polling. A rejected
	/// token is replaced right away; anything else backs off first.
	fn poll_failed(&self, err: FfClientError) -> State {
		match err {
			FfClientError::ServerError {
				status: 401 | 403,
				..
			} => {
				info!(error = %err, "Session rejected, re-authenticating");
				State::Authenticating
			}
			err => self.failed("Poll failed", err),
		}
	}

	/// Authenticates, publishes the session, seeds the cache and signals ready.
	async fn authenticate(&self) -> Result<Arc<AuthInfo>> {
		if !self.config.is_network_available() {
			return Err(FfClientError::NetworkOffline);
		}

		let info = Arc::new(auth::authenticate(self.api.as_ref(), &self.api_key, &self.target).await?);
		sdk_codes::auth_ok(ff_common_http::SDK_VERSION);
		self.auth.store(Some(Arc::clone(&info)));

		self.poll_once(&info).await?;
		self.ready.signal();
		Ok(info)
	}

	/// Runs one stream to completion and picks the follow-up state.
	async fn stream(&mut self, info: Arc<AuthInfo>) -> State {
		let opened = self.api.open_stream(&info).await;

		let (outcome, offline) = {
			let mut handler = StreamHandler {
				supervisor: &*self,
				auth: &info,
				offline: false,
			};
			let outcome = self.reader.run(opened, &mut handler).await;
			(outcome, handler.offline)
		};

		debug!(
			events = outcome.events,
			connected = outcome.connected,
			"Stream finished"
		);

		if offline || !self.config.is_network_available() {
			return State::NetworkWait;
		}

		if outcome.connected {
			self.stream_failures = 0;
		} else {
			self.stream_failures = self.stream_failures.saturating_add(1);
		}
		State::Reconnecting(reconnect_delay(self.stream_failures))
	}

	/// Fetches every evaluation and merges it into the cache.
	///
	/// Fails with [`FfClientError::NetworkOffline`] before any I/O when the
	/// network checker reports no connectivity.
	pub(crate) async fn poll_once(&self, info: &AuthInfo) -> Result<usize> {
		if !self.config.is_network_available() {
			return Err(FfClientError::NetworkOffline);
		}

		let evaluations = self.api.get_evaluations(info, self.target.identifier()).await?;
		let received = evaluations.len();
		let stored = self.cache.set_many(&info.environment_identifier, evaluations);

		if self.config.debug {
			info!(received, stored, environment = %info.environment_identifier, "Poll complete");
		} else {
			debug!(received, stored, environment = %info.environment_identifier, "Poll complete");
		}
		Ok(stored)
	}

	async fn refresh_evaluation(&self, info: &AuthInfo, flag: &str) -> Result<()> {
		if !self.config.is_network_available() {
			return Err(FfClientError::NetworkOffline);
		}

		let evaluation = self
			.api
			.get_evaluation(info, flag, self.target.identifier())
			.await?;
		self.cache.set(&info.environment_identifier, evaluation);
		Ok(())
	}

	/// Waits for connectivity, giving up after a bounded number of checks.
	async fn wait_for_network(&self) {
		for attempt in 1..=NETWORK_CHECK_ATTEMPTS {
			if self.config.is_network_available() {
				debug!(attempt, "Network available again");
				return;
			}
			tokio::time::sleep(NETWORK_CHECK_INTERVAL).await;
		}
		info!(
			attempts = NETWORK_CHECK_ATTEMPTS,
			"Network still unavailable, retrying authentication anyway"
		);
	}
}

/// Applies stream notifications for one session.
struct StreamHandler<'a> {
	supervisor: &'a Supervisor,
	auth: &'a AuthInfo,
	offline: bool,
}

impl StreamHandler<'_> {
	fn note<T>(&mut self, result: Result<T>) -> Result<T> {
		if matches!(result, Err(FfClientError::NetworkOffline)) {
			self.offline = true;
		}
		result
	}
}

#[async_trait]
impl<'a> StreamListener for StreamHandler<'a> {
	async fn on_start(&mut self) -> Result<()> {
		// Catches anything that changed between the seeding poll and the stream opening.
		let result = self.supervisor.poll_once(self.auth).await;
		self.note(result).map(|_| ())
	}

	async fn on_end(&mut self, _cause: Option<&str>) {
		let result = self.supervisor.poll_once(self.auth).await;
		if let Err(e) = self.note(result) {
			warn!(error = %e, "Poll after stream end failed");
		}
	}

	async fn on_evaluation_changed(&mut self, flag: &str) -> Result<()> {
		let result = self.supervisor.refresh_evaluation(self.auth, flag).await;
		self.note(result)
	}

	async fn on_evaluation_removed(&mut self, flag: &str) -> Result<()> {
		self.supervisor
			.cache
			.remove(&self.auth.environment_identifier, flag);
		debug!(flag = %flag, "Evaluation removed");
		Ok(())
	}

	async fn on_evaluation_reload(&mut self) -> Result<()> {
		let result = self.supervisor.poll_once(self.auth).await;
		self.note(result).map(|_| ())
	}
}
