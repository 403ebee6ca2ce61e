// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature flag evaluation client.
//!
//! Authenticates against the flag backend, keeps a local cache of the
//! target's evaluations current through a change stream (or polling), and
//! reports evaluation usage back to the backend.
//!
//! # Features
//!
//! - **Non-blocking lookups**: typed variations are served from memory
//! - **Streaming updates**: flag and segment changes are applied as they happen
//! - **Polling fallback**: when streaming is disabled
//! - **Self-healing**: backoff, reconnect pacing and offline detection
//! - **Usage metrics**: bounded aggregation flushed on an interval
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ff_client::{FfClient, FfConfig, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = Target::builder()
//!         .identifier("ada")
//!         .name("Ada")
//!         .attribute("plan", "enterprise")
//!         .build()?;
//!
//!     let client = FfClient::builder()
//!         .api_key(std::env::var("FF_API_KEY")?)
//!         .config(FfConfig::builder().build())
//!         .target(target)
//!         .build()?;
//!
//!     if !client.wait_for_initialization(Duration::from_secs(30)).await {
//!         eprintln!("serving defaults until the backend is reachable");
//!     }
//!
//!     let enabled = client.bool_variation("dark-mode", false);
//!     let banner = client.string_variation("banner", "Welcome");
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

mod api;
mod auth;
mod cache;
mod client;
mod config;
mod error;
mod frequency;
mod metrics;
mod ready;
mod sdk_codes;
mod stream;
mod supervisor;

#[cfg(test)]
mod mock;

pub use api::{ClientApi, HttpClientApi, LineStream, REQUEST_TIMEOUT};
pub use cache::EvaluationCache;
pub use client::{FfClient, FfClientBuilder, SHUTDOWN_TIMEOUT};
pub use config::{
	AlwaysOnline, ConfigBuilder, FfConfig, NetworkChecker, DEFAULT_CONFIG_URL, DEFAULT_EVENT_URL,
	DEFAULT_METRICS_CAPACITY, MIN_INTERVAL,
};
pub use error::{FfClientError, Result};
pub use frequency::{MAX_CAPACITY as MAX_METRICS_CAPACITY, MIN_CAPACITY as MIN_METRICS_CAPACITY};
pub use stream::READ_TIMEOUT as STREAM_READ_TIMEOUT;

// Re-export core types for convenience
pub use ff_client_core::{
	AuthInfo, AuthenticationRequest, Evaluation, KeyValue, Metrics, MetricsData, MetricsType, Target,
	TargetBuilder, TargetData, Variation,
};
