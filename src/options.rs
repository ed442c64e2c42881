// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

/// Bytes pulled per step by the generic transfer pump.
pub const TRANSFER_CHUNK_SIZE: usize = 1024;
/// Bytes pulled per chunk when a byte source is spread into a sequence.
pub const SOURCE_CHUNK_SIZE: usize = 4096;

pub const CHUNK_SIZE: &str = "chunk-size";
pub const DIRECT: &str = "direct";
pub const ENCODING: &str = "encoding";
pub const APPEND: &str = "append";

/// Hints threaded through every converter and transfer.
///
/// The record is schema-free: unknown keys are carried along and ignored, so
/// converters registered by downstream code can recognize their own options
/// without the built-in set knowing about them. The typed accessors fall back
/// to the documented defaults when a key is absent.
#[derive(Clone, Debug, Default)]
pub struct Options {
	entries: HashMap<String, OptionValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
	Bool(bool),
	Int(usize),
	Str(String),
}

impl From<bool> for OptionValue {
	fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<usize> for OptionValue {
	fn from(value: usize) -> Self { Self::Int(value) }
}

impl From<&str> for OptionValue {
	fn from(value: &str) -> Self { Self::Str(value.into()) }
}

impl From<String> for OptionValue {
	fn from(value: String) -> Self { Self::Str(value) }
}

impl Options {
	pub fn new() -> Self { Self::default() }

	/// Sets an arbitrary option.
	pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
		self.entries.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&OptionValue> {
		self.entries.get(key)
	}

	/// Sets the number of bytes pulled per step.
	pub fn set_chunk_size(self, value: usize) -> Self {
		self.set(CHUNK_SIZE, value)
	}

	/// Requests a freshly allocated buffer over a zero-copy wrap.
	pub fn set_direct(self, value: bool) -> Self {
		self.set(DIRECT, value)
	}

	/// Sets the character encoding for string↔bytes conversions.
	pub fn set_encoding(self, value: &str) -> Self {
		self.set(ENCODING, value)
	}

	/// Selects appending over truncating when opening a file's write side.
	pub fn set_append(self, value: bool) -> Self {
		self.set(APPEND, value)
	}

	/// The configured chunk size, if any. Call sites supply the default for
	/// their context ([`TRANSFER_CHUNK_SIZE`] or [`SOURCE_CHUNK_SIZE`]).
	pub fn chunk_size(&self) -> Option<usize> {
		match self.get(CHUNK_SIZE) {
			Some(&OptionValue::Int(value)) if value > 0 => Some(value),
			_ => None,
		}
	}

	pub fn direct(&self) -> bool {
		matches!(self.get(DIRECT), Some(OptionValue::Bool(true)))
	}

	pub fn encoding(&self) -> &str {
		match self.get(ENCODING) {
			Some(OptionValue::Str(value)) => value,
			_ => "utf-8",
		}
	}

	pub fn append(&self) -> bool {
		!matches!(self.get(APPEND), Some(OptionValue::Bool(false)))
	}
}
