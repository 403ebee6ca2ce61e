// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The identity flags are evaluated for.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A user, device or service that flags are evaluated for.
///
/// Equality and hashing consider the identifier and the attribute contents
/// only; the display name is not part of a target's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
	identifier: String,
	name: String,
	#[serde(default)]
	attributes: BTreeMap<String, String>,
}

impl Target {
	/// Creates a target with no attributes.
	pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			identifier: identifier.into(),
			name: name.into(),
			attributes: BTreeMap::new(),
		}
	}

	/// Creates a new builder.
	pub fn builder() -> TargetBuilder {
		TargetBuilder::default()
	}

	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn attributes(&self) -> &BTreeMap<String, String> {
		&self.attributes
	}

	/// Returns true when both the identifier and the name are non-empty.
	pub fn is_valid(&self) -> bool {
		!self.identifier.is_empty() && !self.name.is_empty()
	}

	/// Returns an error describing why the target cannot be used.
	pub fn validate(&self) -> Result<()> {
		if self.identifier.is_empty() {
			return Err(CoreError::InvalidTarget("identifier must not be empty".to_string()));
		}
		if self.name.is_empty() {
			return Err(CoreError::InvalidTarget("name must not be empty".to_string()));
		}
		Ok(())
	}
}

impl PartialEq for Target {
	fn eq(&self, other: &Self) -> bool {
		self.identifier == other.identifier && self.attributes == other.attributes
	}
}

impl Eq for Target {}

impl Hash for Target {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.identifier.hash(state);
		self.attributes.hash(state);
	}
}

impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Identifier: {}, Name: {}", self.identifier, self.name)?;
		if !self.attributes.is_empty() {
			let attributes = self
				.attributes
				.iter()
				.map(|(k, v)| format!("{k}: {v}"))
				.collect::<Vec<_>>()
				.join(", ");
			write!(f, ", Attributes: {attributes}")?;
		}
		Ok(())
	}
}

/// Builder for [`Target`].
#[derive(Debug, Default)]
pub struct TargetBuilder {
	identifier: String,
	name: String,
	attributes: BTreeMap<String, String>,
}

impl TargetBuilder {
	pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
		self.identifier = identifier.into();
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Adds a single attribute, replacing any previous value for the key.
	pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	/// Replaces all attributes.
	pub fn attributes<I, K, V>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.attributes = attributes
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		self
	}

	/// Builds the target, rejecting an empty identifier or name.
	pub fn build(self) -> Result<Target> {
		let target = Target {
			identifier: self.identifier,
			name: self.name,
			attributes: self.attributes,
		};
		target.validate()?;
		Ok(target)
	}
}
