// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the core crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating or decoding core types.
#[derive(Debug, Error)]
pub enum CoreError {
	/// Target is missing its identifier or name.
	#[error("invalid target: {0}")]
	InvalidTarget(String),

	/// A structured stream frame could not be decoded.
	#[error("invalid stream frame: {0}")]
	InvalidFrame(String),
}
