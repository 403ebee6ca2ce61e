// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the feature flag evaluation client.
//!
//! This crate holds the data shapes shared by the client engine (`ff-client`)
//! and its transport: targets, evaluations, authentication results, stream
//! frames and metrics reports. It performs no I/O.
//!
//! # Example
//!
//! ```
//! use ff_client_core::{Evaluation, Target};
//!
//! let target = Target::builder()
//!     .identifier("user-42")
//!     .name("Ada")
//!     .attribute("plan", "enterprise")
//!     .build()
//!     .unwrap();
//! assert!(target.is_valid());
//!
//! let eval = Evaluation::new("dark-mode", "boolean", "true", "true");
//! assert!(eval.is_valid());
//! assert_eq!(ff_client_core::cache_key("env-1", &eval.flag), "env-1_dark-mode");
//! ```

pub mod auth;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod stream;
pub mod target;

pub use auth::{AuthInfo, AuthenticationRequest, AuthenticationResponse, AuthenticationTarget};
pub use error::{CoreError, Result};
pub use evaluation::{cache_key, Evaluation, Variation};
pub use metrics::{AnalyticsKey, KeyValue, Metrics, MetricsData, MetricsType, TargetData};
pub use stream::{parse_frame, StreamAction, StreamEvent, DOMAIN_MARKER};
pub use target::{Target, TargetBuilder};
