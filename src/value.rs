// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::fmt;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};
use bytes::Bytes;
use crate::{Capability, Error, Kind, Result, TypeTag};
use crate::streams::{BoxSink, BoxSource, ByteChannel, Reader, Writer};

/// A type whose values can enter the conversion graph.
///
/// Implement this for a custom type, then wire it in with
/// [`register_conversion`](crate::register_conversion).
pub trait Carrier: Any + Send {
	fn tag() -> TypeTag where Self: Sized;
}

macro_rules! carriers {
	($($ty:ty => $name:literal,)+) => {$(
		impl Carrier for $ty {
			fn tag() -> TypeTag { TypeTag::new::<$ty>($name) }
		}

		impl IntoValue for $ty {
			fn into_value(self) -> Value { Value::new(self) }
		}

		impl FromValue for $ty {
			fn kind() -> Kind { Kind::of::<$ty>() }
			fn from_value(value: Value) -> Result<Self> { value.downcast() }
		}
	)+}
}

carriers! {
	Vec<u8> => "byte array",
	Bytes => "byte buffer",
	String => "string",
	PathBuf => "file path",
	Reader => "reader",
	Writer => "writer",
	ByteChannel => "byte channel",
}

/// A dynamically-kinded value traveling through the conversion graph.
pub struct Value {
	kind: Kind,
	data: Box<dyn Any + Send>,
}

impl Value {
	pub fn new<T: Carrier>(value: T) -> Self {
		Self { kind: Kind::of::<T>(), data: Box::new(value) }
	}

	pub fn many(seq: Many) -> Self {
		Self { kind: seq.kind(), data: Box::new(seq) }
	}

	pub(crate) fn source(source: BoxSource) -> Self {
		Self { kind: Kind::Cap(Capability::Source), data: Box::new(source) }
	}

	pub(crate) fn sink(sink: BoxSink) -> Self {
		Self { kind: Kind::Cap(Capability::Sink), data: Box::new(sink) }
	}

	pub fn kind(&self) -> &Kind {
		&self.kind
	}

	/// Takes the carrier back out of the value.
	pub fn downcast<T: Carrier>(self) -> Result<T> {
		let Self { kind, data } = self;
		match data.downcast::<T>() {
			Ok(value) => Ok(*value),
			Err(_) => Err(Error::KindMismatch { expected: Kind::of::<T>(), actual: kind }),
		}
	}

	/// Takes the sequence out of a `Many`-kinded value, handing the value
	/// back unchanged if it is not a sequence.
	pub(crate) fn try_into_many(self) -> std::result::Result<Many, Value> {
		let Self { kind, data } = self;
		match data.downcast::<Many>() {
			Ok(seq) => Ok(*seq),
			Err(data) => Err(Self { kind, data }),
		}
	}

	pub(crate) fn into_source(self) -> Result<BoxSource> {
		let Self { kind, data } = self;
		match data.downcast::<BoxSource>() {
			Ok(source) => Ok(*source),
			Err(_) => Err(Error::KindMismatch {
				expected: Kind::Cap(Capability::Source),
				actual: kind,
			}),
		}
	}

	pub(crate) fn into_sink(self) -> Result<BoxSink> {
		let Self { kind, data } = self;
		match data.downcast::<BoxSink>() {
			Ok(sink) => Ok(*sink),
			Err(_) => Err(Error::KindMismatch {
				expected: Kind::Cap(Capability::Sink),
				actual: kind,
			}),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Value").field("kind", &self.kind).finish_non_exhaustive()
	}
}

/// A lazy, forward-only sequence of values sharing one element kind.
///
/// Pulling an element may block on underlying I/O; errors surface on pull.
pub struct Many {
	elem: TypeTag,
	iter: Box<dyn Iterator<Item = Result<Value>> + Send>,
}

impl Many {
	/// Lifts an in-memory collection of carriers into a sequence value.
	pub fn new<T, I>(items: I) -> Self
	where
		T: Carrier,
		I: IntoIterator<Item = T>,
		I::IntoIter: Send + 'static,
	{
		Self::from_values(T::tag(), items.into_iter().map(|item| Ok(Value::new(item))))
	}

	pub(crate) fn from_values<I>(elem: TypeTag, iter: I) -> Self
	where
		I: Iterator<Item = Result<Value>> + Send + 'static,
	{
		Self { elem, iter: Box::new(iter) }
	}

	pub fn elem(&self) -> TypeTag {
		self.elem
	}

	pub fn kind(&self) -> Kind {
		Kind::many(Kind::Concrete(self.elem))
	}
}

impl Iterator for Many {
	type Item = Result<Value>;

	fn next(&mut self) -> Option<Self::Item> {
		self.iter.next()
	}
}

impl fmt::Debug for Many {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Many").field("elem", &self.elem).finish_non_exhaustive()
	}
}

/// The typed face of a byte-buffer sequence.
pub struct Chunks {
	inner: Many,
}

impl Iterator for Chunks {
	type Item = Result<Bytes>;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|item| item.and_then(Value::downcast))
	}
}

/// The typed face of a string sequence, as produced by
/// [`to_lines`](crate::to_lines).
pub struct Lines {
	inner: Many,
}

impl Iterator for Lines {
	type Item = Result<String>;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|item| item.and_then(Value::downcast))
	}
}

/// Converts some type into a [`Value`] at the API boundary.
pub trait IntoValue {
	fn into_value(self) -> Value;
}

/// Converts a [`Value`] back into a typed carrier at the API boundary.
pub trait FromValue: Sized {
	/// The destination kind requested from the planner.
	fn kind() -> Kind;
	fn from_value(value: Value) -> Result<Self>;
}

impl IntoValue for Value {
	fn into_value(self) -> Value { self }
}

impl IntoValue for &str {
	fn into_value(self) -> Value { Value::new(self.to_owned()) }
}

impl IntoValue for &[u8] {
	fn into_value(self) -> Value { Value::new(self.to_vec()) }
}

impl IntoValue for &Path {
	fn into_value(self) -> Value { Value::new(self.to_path_buf()) }
}

impl IntoValue for Many {
	fn into_value(self) -> Value { Value::many(self) }
}

impl IntoValue for Chunks {
	fn into_value(self) -> Value { Value::many(self.inner) }
}

impl IntoValue for Lines {
	fn into_value(self) -> Value { Value::many(self.inner) }
}

impl IntoValue for BoxSource {
	fn into_value(self) -> Value { Value::source(self) }
}

impl IntoValue for BoxSink {
	fn into_value(self) -> Value { Value::sink(self) }
}

impl IntoValue for Vec<Bytes> {
	fn into_value(self) -> Value { Value::many(Many::new(self)) }
}

impl IntoValue for Vec<Vec<u8>> {
	fn into_value(self) -> Value { Value::many(Many::new(self)) }
}

impl IntoValue for Vec<String> {
	fn into_value(self) -> Value { Value::many(Many::new(self)) }
}

pub(crate) fn from_sequence(value: Value, elem: TypeTag) -> Result<Many> {
	let expected = Kind::many(Kind::Concrete(elem));
	let seq = value.try_into_many().map_err(|v| Error::KindMismatch {
		expected: expected.clone(),
		actual: v.kind().clone(),
	})?;
	if seq.elem() != elem {
		return Err(Error::KindMismatch { expected, actual: seq.kind() });
	}
	Ok(seq)
}

impl FromValue for Chunks {
	fn kind() -> Kind { Kind::many(Kind::of::<Bytes>()) }

	fn from_value(value: Value) -> Result<Self> {
		Ok(Self { inner: from_sequence(value, Bytes::tag())? })
	}
}

impl FromValue for Lines {
	fn kind() -> Kind { Kind::many(Kind::of::<String>()) }

	fn from_value(value: Value) -> Result<Self> {
		Ok(Self { inner: from_sequence(value, String::tag())? })
	}
}

impl FromValue for BoxSource {
	fn kind() -> Kind { Kind::Cap(Capability::Source) }

	fn from_value(value: Value) -> Result<Self> {
		value.into_source()
	}
}

impl FromValue for BoxSink {
	fn kind() -> Kind { Kind::Cap(Capability::Sink) }

	fn from_value(value: Value) -> Result<Self> {
		value.into_sink()
	}
}
