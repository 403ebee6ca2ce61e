// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP header names understood by the flag backend.
//!
//! Kept in lowercase so they can be used with `HeaderName::from_static`.

pub const SDK_INFO: &str = "harness-sdk-info";
pub const ACCOUNT_ID: &str = "harness-accountid";
pub const ENVIRONMENT_ID: &str = "harness-environmentid";
pub const API_KEY: &str = "api-key";
