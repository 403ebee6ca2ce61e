// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-way "first authentication succeeded" signal.

use std::time::Duration;

use tokio::sync::watch;

/// Latch that flips once and stays set.
///
/// Signalling again after a re-authentication is a no-op, and any number of
/// callers may wait on it with a timeout.
#[derive(Debug, Clone)]
pub(crate) struct ReadySignal {
	tx: watch::Sender<bool>,
}

impl ReadySignal {
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(false);
		Self { tx }
	}

	pub fn signal(&self) {
		self.tx.send_replace(true);
	}

	pub fn is_ready(&self) -> bool {
		*self.tx.borrow()
	}

	/// Waits until signalled or until `timeout` elapses. Returns the ready state.
	pub async fn wait_timeout(&self, timeout: Duration) -> bool {
		let mut rx = self.tx.subscribe();
		let ready = matches!(
			tokio::time::timeout(timeout, rx.wait_for(|ready| *ready)).await,
			Ok(Ok(_))
		);
		ready
	}

	/// Waits until signalled with no deadline.
	pub async fn wait(&self) {
		let mut rx = self.tx.subscribe();
		let _ = rx.wait_for(|ready| *ready).await;
	}
}
