// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory evaluation cache.
//!
//! The cache is memory-only and unbounded; flag sets are operator-bounded so
//! growth is limited by what the backend serves. Entries are scoped by
//! environment identifier (see [`cache_key`]).

use std::sync::Arc;

use dashmap::DashMap;
use ff_client_core::{cache_key, Evaluation};
use tracing::{debug, warn};

/// Concurrent map from `(environment, flag)` to the last-known evaluation.
///
/// Reads never block writers. Writes are last-writer-wins and batches are
/// applied entry by entry, so a reader may observe a partially applied batch.
#[derive(Debug, Clone, Default)]
pub struct EvaluationCache {
	entries: Arc<DashMap<String, Evaluation>>,
}

impl EvaluationCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, environment: &str, flag: &str) -> Option<Evaluation> {
		self.entries
			.get(&cache_key(environment, flag))
			.map(|entry| entry.value().clone())
	}

	/// Inserts or replaces an evaluation. Invalid evaluations are rejected.
	pub fn set(&self, environment: &str, evaluation: Evaluation) -> bool {
		if !evaluation.is_valid() {
			warn!(flag = %evaluation.flag, "Ignoring invalid evaluation");
			return false;
		}
		let key = cache_key(environment, &evaluation.flag);
		debug!(key = %key, identifier = %evaluation.identifier, "Caching evaluation");
		self.entries.insert(key, evaluation);
		true
	}

	/// Applies [`set`](Self::set) to every evaluation. Returns how many were stored.
	pub fn set_many(&self, environment: &str, evaluations: impl IntoIterator<Item = Evaluation>) -> usize {
		evaluations
			.into_iter()
			.filter(|evaluation| self.set(environment, evaluation.clone()))
			.count()
	}

	pub fn remove(&self, environment: &str, flag: &str) -> Option<Evaluation> {
		self.entries
			.remove(&cache_key(environment, flag))
			.map(|(_, evaluation)| evaluation)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn eval(flag: &str, value: &str) -> Evaluation {
		Evaluation::new(flag, "boolean", value, value)
	}

	#[test]
	fn test_get_before_population_is_none() {
		let cache = EvaluationCache::new();
		assert!(cache.get("prod", "dark-mode").is_none());
		assert!(cache.is_empty());
	}

	#[test]
	fn test_set_then_get() {
		let cache = EvaluationCache::new();
		assert!(cache.set("prod", eval("dark-mode", "true")));
		assert_eq!(cache.get("prod", "dark-mode"), Some(eval("dark-mode", "true")));
	}

	#[test]
	fn test_last_writer_wins() {
		let cache = EvaluationCache::new();
		cache.set("prod", eval("dark-mode", "true"));
		cache.set("prod", eval("dark-mode", "false"));
		assert_eq!(cache.get("prod", "dark-mode").unwrap().value, "false");
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn test_invalid_evaluation_never_enters() {
		let cache = EvaluationCache::new();
		assert!(!cache.set("prod", Evaluation::new("dark-mode", "boolean", "", "v")));
		assert!(cache.get("prod", "dark-mode").is_none());
	}

	#[test]
	fn test_environments_do_not_bleed() {
		let cache = EvaluationCache::new();
		cache.set("prod", eval("dark-mode", "true"));
		assert!(cache.get("staging", "dark-mode").is_none());
	}

	#[test]
	fn test_remove() {
		let cache = EvaluationCache::new();
		cache.set("prod", eval("dark-mode", "true"));
		assert!(cache.remove("prod", "dark-mode").is_some());
		assert!(cache.get("prod", "dark-mode").is_none());
		assert!(cache.remove("prod", "dark-mode").is_none());
	}

	#[test]
	fn test_set_many_skips_invalid() {
		let cache = EvaluationCache::new();
		let stored = cache.set_many(
			"prod",
			vec![
				eval("a", "true"),
				Evaluation::new("b", "", "x", "x"),
				eval("c", "false"),
			],
		);
		assert_eq!(stored, 2);
		assert!(cache.get("prod", "b").is_none());
	}

	#[test]
	fn test_clones_share_entries() {
		let cache = EvaluationCache::new();
		let other = cache.clone();
		other.set("prod", eval("dark-mode", "true"));
		assert!(cache.get("prod", "dark-mode").is_some());
	}

	proptest! {
		#[test]
		fn valid_evaluations_read_back_exactly(
			flag in "[a-z][a-z0-9-]{0,15}",
			kind in "(boolean|string|int|json)",
			value in "[ -~]{1,32}",
			identifier in "[a-z0-9]{1,8}",
		) {
			let cache = EvaluationCache::new();
			let evaluation = Evaluation::new(flag.clone(), kind, value, identifier);
			prop_assert!(cache.set("env", evaluation.clone()));
			prop_assert_eq!(cache.get("env", &flag), Some(evaluation));
		}
	}
}
