// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minimal client walkthrough.
//!
//! ```text
//! FF_API_KEY=... RUST_LOG=ff_client=debug cargo run -p ff-client --example getting_started
//! ```
//!
//! Endpoints and intervals can be overridden with the `FF_*` environment
//! variables understood by [`ConfigBuilder::from_env`].

use std::time::Duration;

use ff_client::{ConfigBuilder, FfClient, Target};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let api_key = std::env::var("FF_API_KEY")?;
	let flag = std::env::var("FF_FLAG").unwrap_or_else(|_| "harnessappdemodarkmode".to_string());

	let target = Target::builder()
		.identifier("rust-example")
		.name("Rust Example")
		.attribute("location", "emea")
		.build()?;

	let client = FfClient::builder()
		.api_key(api_key)
		.config(ConfigBuilder::from_env()?.build())
		.target(target)
		.build()?;

	if !client.wait_for_initialization(Duration::from_secs(30)).await {
		tracing::warn!("client not initialized yet, serving defaults");
	}

	for _ in 0..10 {
		let enabled = client.bool_variation(&flag, false);
		tracing::info!(flag = %flag, enabled, "Evaluated flag");
		tokio::time::sleep(Duration::from_secs(10)).await;
	}

	client.shutdown().await;
	Ok(())
}
