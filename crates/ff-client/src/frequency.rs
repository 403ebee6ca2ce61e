// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded concurrent usage counter.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ff_client_core::{AnalyticsKey, Variation};

/// Lower bound for the number of distinct keys.
pub const MIN_CAPACITY: usize = 2048;

/// Upper bound for the number of distinct keys.
pub const MAX_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Entry {
	count: u64,
	variation: Variation,
}

/// One drained counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UsageCount {
	pub key: AnalyticsKey,
	pub count: u64,
	pub variation: Variation,
}

/// Counts evaluations per [`AnalyticsKey`] with a cap on distinct keys.
///
/// The cap bounds key cardinality, not per-key counts. Concurrent first
/// records for different keys can briefly push the map a few entries past
/// the cap.
#[derive(Debug)]
pub(crate) struct FrequencyMap {
	entries: DashMap<AnalyticsKey, Entry>,
	capacity: usize,
	dropped: AtomicU64,
}

impl FrequencyMap {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: DashMap::new(),
			capacity: capacity.clamp(MIN_CAPACITY, MAX_CAPACITY),
			dropped: AtomicU64::new(0),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Increments the counter for `key`, keeping the latest variation.
	///
	/// Returns false and bumps the drop counter when `key` is new and the map
	/// is full.
	pub fn record(&self, key: AnalyticsKey, variation: Variation) -> bool {
		if let Some(mut entry) = self.entries.get_mut(&key) {
			entry.count += 1;
			entry.variation = variation;
			return true;
		}

		if self.entries.len() >= self.capacity {
			self.dropped.fetch_add(1, Ordering::Relaxed);
			return false;
		}

		let mut entry = self.entries.entry(key).or_insert(Entry {
			count: 0,
			variation: variation.clone(),
		});
		entry.count += 1;
		entry.variation = variation;
		true
	}

	/// Snapshots every non-zero counter, resetting each to zero as it is
	/// copied, then prunes the entries still at zero.
	///
	/// A record that lands between the reset and the prune keeps its entry
	/// alive for the next drain.
	pub fn drain(&self) -> Vec<UsageCount> {
		let mut snapshot = Vec::new();
		for mut entry in self.entries.iter_mut() {
			let count = std::mem::take(&mut entry.count);
			if count > 0 {
				snapshot.push(UsageCount {
					key: entry.key().clone(),
					count,
					variation: entry.variation.clone(),
				});
			}
		}
		self.entries.retain(|_, entry| entry.count > 0);
		snapshot
	}

	/// Returns and resets the number of dropped records.
	pub fn take_dropped(&self) -> u64 {
		self.dropped.swap(0, Ordering::Relaxed)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[cfg(test)]
	pub fn count(&self, key: &AnalyticsKey) -> u64 {
		self.entries.get(key).map(|e| e.count).unwrap_or(0)
	}
}
