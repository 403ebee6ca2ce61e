// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the feature flag client.
//!
//! This crate provides:
//! - A pre-configured HTTP client builder carrying the SDK identity headers
//! - Extra TLS trust roots for backends signed by a private CA
//! - Header names used by the flag backend

mod client;
pub mod headers;

pub use client::{
	builder, builder_with_root_certificates, is_tls_failure, sdk_info, user_agent, SDK_LANGUAGE,
	SDK_VERSION,
};
