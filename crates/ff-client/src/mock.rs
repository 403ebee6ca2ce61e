// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scriptable in-memory [`ClientApi`] for unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ff_client_core::{AuthInfo, AuthenticationRequest, Evaluation, Metrics};
use futures::stream::{self, StreamExt};
use serde_json::json;

use crate::api::{ClientApi, LineStream};
use crate::error::{FfClientError, Result};

pub(crate) fn token() -> String {
	crate::auth::tests::token(json!({
		"environment": "env-uuid",
		"environmentIdentifier": "prod",
		"clusterIdentifier": "1",
		"accountID": "acct",
	}))
}

pub(crate) fn stream_frame(domain: &str, event: &str, identifier: &str) -> String {
	format!("data: {{\"domain\":\"{domain}\",\"event\":\"{event}\",\"identifier\":\"{identifier}\"}}")
}

pub(crate) struct MockApi {
	pub auth_calls: AtomicUsize,
	pub poll_calls: AtomicUsize,
	pub fetch_calls: AtomicUsize,
	pub stream_calls: AtomicUsize,
	pub metrics_calls: AtomicUsize,
	token: Mutex<Option<String>>,
	evaluations: Mutex<Vec<Evaluation>>,
	streams: Mutex<VecDeque<Vec<String>>>,
	hold_streams_open: AtomicBool,
	fail_metrics: AtomicBool,
	poll_failure: Mutex<Option<u16>>,
	posted: Mutex<Vec<Metrics>>,
}

impl MockApi {
	pub fn new() -> Self {
		Self {
			auth_calls: AtomicUsize::new(0),
			poll_calls: AtomicUsize::new(0),
			fetch_calls: AtomicUsize::new(0),
			stream_calls: AtomicUsize::new(0),
			metrics_calls: AtomicUsize::new(0),
			token: Mutex::new(Some(token())),
			evaluations: Mutex::new(Vec::new()),
			streams: Mutex::new(VecDeque::new()),
			hold_streams_open: AtomicBool::new(false),
			fail_metrics: AtomicBool::new(false),
			poll_failure: Mutex::new(None),
			posted: Mutex::new(Vec::new()),
		}
	}

	pub fn with_evaluations(self, evaluations: Vec<Evaluation>) -> Self {
		*self.evaluations.lock().unwrap() = evaluations;
		self
	}

	/// Rejects authentication with a 401.
	pub fn rejecting_auth(self) -> Self {
		*self.token.lock().unwrap() = None;
		self
	}

	/// Keeps scripted streams open after their frames instead of ending them.
	pub fn holding_streams_open(self) -> Self {
		self.hold_streams_open.store(true, Ordering::SeqCst);
		self
	}

	/// Queues the frames served by the next successful `open_stream`.
	/// With no script queued, opening a stream fails.
	pub fn push_stream(&self, frames: Vec<String>) {
		self.streams.lock().unwrap().push_back(frames);
	}

	pub fn set_evaluations(&self, evaluations: Vec<Evaluation>) {
		*self.evaluations.lock().unwrap() = evaluations;
	}

	pub fn set_fail_metrics(&self, fail: bool) {
		self.fail_metrics.store(fail, Ordering::SeqCst);
	}

	/// Fails every following full poll with `status`, or restores success.
	pub fn set_poll_failure(&self, status: Option<u16>) {
		*self.poll_failure.lock().unwrap() = status;
	}

	pub fn posted(&self) -> Vec<Metrics> {
		self.posted.lock().unwrap().clone()
	}

	pub fn calls(&self, counter: &AtomicUsize) -> usize {
		counter.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ClientApi for MockApi {
	async fn authenticate(&self, _request: &AuthenticationRequest) -> Result<String> {
		self.auth_calls.fetch_add(1, Ordering::SeqCst);
		self.token
			.lock()
			.unwrap()
			.clone()
			.ok_or_else(|| FfClientError::ServerError {
				status: 401,
				message: "invalid key".to_string(),
			})
	}

	async fn get_evaluations(&self, _auth: &AuthInfo, _target_identifier: &str) -> Result<Vec<Evaluation>> {
		self.poll_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(status) = *self.poll_failure.lock().unwrap() {
			return Err(FfClientError::ServerError {
				status,
				message: "poll rejected".to_string(),
			});
		}
		Ok(self.evaluations.lock().unwrap().clone())
	}

	async fn get_evaluation(&self, _auth: &AuthInfo, flag: &str, _target_identifier: &str) -> Result<Evaluation> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		self.evaluations
			.lock()
			.unwrap()
			.iter()
			.find(|e| e.flag == flag)
			.cloned()
			.ok_or_else(|| FfClientError::ServerError {
				status: 404,
				message: format!("{flag} not found"),
			})
	}

	async fn open_stream(&self, _auth: &AuthInfo) -> Result<LineStream> {
		self.stream_calls.fetch_add(1, Ordering::SeqCst);
		let frames = self
			.streams
			.lock()
			.unwrap()
			.pop_front()
			.ok_or_else(|| FfClientError::Stream("connection refused".to_string()))?;

		let lines = stream::iter(frames.into_iter().map(Ok::<_, io::Error>));
		if self.hold_streams_open.load(Ordering::SeqCst) {
			Ok(Box::pin(lines.chain(stream::pending())))
		} else {
			Ok(Box::pin(lines))
		}
	}

	async fn post_metrics(&self, _auth: &AuthInfo, metrics: &Metrics) -> Result<()> {
		self.metrics_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_metrics.load(Ordering::SeqCst) {
			return Err(FfClientError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			});
		}
		self.posted.lock().unwrap().push(metrics.clone());
		Ok(())
	}
}
