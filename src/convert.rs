// SPDX-License-Identifier: Apache-2.0

//! The converter driver: resolves a path into executable steps and threads
//! a value through them.

use bytes::Bytes;
use crate::{Capability, Error, Kind, Options, Result, TypeTag};
use crate::planner;
use crate::registry::{registry, ConvertFn, Registry, SinkAdapter, SourceAdapter};
use crate::streams::{BoxSink, BoxSource, ByteChannel, Reader};
use crate::value::{Chunks, FromValue, IntoValue, Lines, Many, Value};

/// One executable edge of a resolved path.
#[derive(Clone)]
enum Step {
	/// A converter registered directly on the pair.
	Direct(ConvertFn),
	/// A converter registered on a capability the source kind implements;
	/// the value is boxed through the capability table first.
	ViaCap(Adapter, ConvertFn),
	/// An inner converter mapped lazily over a sequence.
	Lift { inner: Box<Step>, to_elem: TypeTag },
}

#[derive(Copy, Clone)]
enum Adapter {
	Source(SourceAdapter),
	Sink(SinkAdapter),
}

impl Adapter {
	fn adapt(self, value: Value) -> Result<Value> {
		match self {
			Self::Source(adapter) => adapter(value).map(Value::source),
			Self::Sink(adapter) => adapter(value).map(Value::sink),
		}
	}
}

impl Step {
	fn apply(&self, value: Value, options: &Options) -> Result<Value> {
		match self {
			Self::Direct(f) => f(value, options),
			Self::ViaCap(adapter, f) => f(adapter.adapt(value)?, options),
			Self::Lift { inner, to_elem } => {
				let to_elem = *to_elem;
				let seq = value.try_into_many().map_err(|v| Error::KindMismatch {
					expected: Kind::many(Kind::Concrete(to_elem)),
					actual: v.kind().clone(),
				})?;
				let step = (**inner).clone();
				let options = options.clone();
				let mapped = seq.map(move |item| item.and_then(|v| step.apply(v, &options)));
				Ok(Value::many(Many::from_values(to_elem, mapped)))
			}
		}
	}
}

fn resolve_step(registry: &Registry, from: &Kind, to: &Kind) -> Result<Step> {
	if let Some(f) = registry.conversion(from, to) {
		return Ok(Step::Direct(f));
	}
	if let Kind::Concrete(tag) = from {
		for cap in registry.capabilities(tag) {
			if let Some(f) = registry.conversion(&Kind::Cap(cap), to) {
				let adapter = resolve_adapter(registry, from, cap)?;
				return Ok(Step::ViaCap(adapter, f));
			}
		}
	}
	if let (Kind::Many(a), Kind::Many(b)) = (from, to) {
		if let Kind::Concrete(to_elem) = b.as_ref() {
			let inner = resolve_flat_step(registry, a, b)?;
			return Ok(Step::Lift { inner: Box::new(inner), to_elem: *to_elem });
		}
	}
	Err(Error::MissingStep { from: from.clone(), to: to.clone() })
}

/// Resolves an element-level step, without further lifting.
fn resolve_flat_step(registry: &Registry, from: &Kind, to: &Kind) -> Result<Step> {
	if let Some(f) = registry.conversion(from, to) {
		return Ok(Step::Direct(f));
	}
	if let Kind::Concrete(tag) = from {
		for cap in registry.capabilities(tag) {
			if let Some(f) = registry.conversion(&Kind::Cap(cap), to) {
				let adapter = resolve_adapter(registry, from, cap)?;
				return Ok(Step::ViaCap(adapter, f));
			}
		}
	}
	Err(Error::MissingStep { from: from.clone(), to: to.clone() })
}

fn resolve_adapter(registry: &Registry, kind: &Kind, cap: Capability) -> Result<Adapter> {
	let missing = || Error::MissingStep { from: kind.clone(), to: Kind::Cap(cap) };
	let Kind::Concrete(tag) = kind else { return Err(missing()) };
	match cap {
		Capability::Source => registry.source_adapter(tag).map(Adapter::Source).ok_or_else(missing),
		Capability::Sink => registry.sink_adapter(tag).map(Adapter::Sink).ok_or_else(missing),
	}
}

/// Drives a dynamic value to the destination kind through the planner's
/// path. This is the untyped core behind [`convert`].
pub fn convert_value(value: Value, dst: &Kind, options: &Options) -> Result<Value> {
	let src = value.kind().clone();
	let (steps, finish) = {
		let registry = registry();
		let path = planner::plan(&registry, &src, dst)
			.ok_or_else(|| Error::NoPath { from: src.clone(), to: dst.clone() })?;
		let steps = path
			.windows(2)
			.map(|pair| resolve_step(&registry, &pair[0], &pair[1]))
			.collect::<Result<Vec<_>>>()?;
		// A capability destination ends on a concrete implementer; box it
		// through the capability table as the final step.
		let finish = match (dst, path.last()) {
			(Kind::Cap(cap), Some(last)) if last != dst => {
				Some(resolve_adapter(&registry, last, *cap)?)
			}
			_ => None,
		};
		(steps, finish)
	};
	let mut value = value;
	for step in &steps {
		value = step.apply(value, options)?;
	}
	match finish {
		Some(adapter) => adapter.adapt(value),
		None => Ok(value),
	}
}

/// Converts a byte-carrying value into the requested carrier, composing
/// registered conversions as needed.
///
/// An already-acceptable value is returned as-is, without copying.
pub fn convert<T: FromValue>(value: impl IntoValue) -> Result<T> {
	convert_with(value, &Options::default())
}

/// [`convert`] with an explicit options record.
pub fn convert_with<T: FromValue>(value: impl IntoValue, options: &Options) -> Result<T> {
	T::from_value(convert_value(value.into_value(), &T::kind(), options)?)
}

/// Whether a value of kind `from` is accepted wherever `to` is expected.
pub fn assignable(from: &Kind, to: &Kind) -> bool {
	registry().assignable(from, to)
}

/// Every kind reachable from `kind` through registered conversions,
/// including `kind` itself.
pub fn possible_conversions(kind: &Kind) -> Vec<Kind> {
	planner::reachable(&registry(), kind)
}

/// The node path the planner would use from `src` to `dst`. Diagnostic.
pub fn conversion_path(src: &Kind, dst: &Kind) -> Option<Vec<Kind>> {
	planner::plan(&registry(), src, dst)
}

pub fn to_byte_buffer(value: impl IntoValue) -> Result<Bytes> {
	convert(value)
}

pub fn to_byte_array(value: impl IntoValue) -> Result<Vec<u8>> {
	convert(value)
}

pub fn to_reader(value: impl IntoValue) -> Result<Reader> {
	convert(value)
}

pub fn to_channel(value: impl IntoValue) -> Result<ByteChannel> {
	convert(value)
}

pub fn to_source(value: impl IntoValue) -> Result<BoxSource> {
	convert(value)
}

pub fn to_sink(value: impl IntoValue) -> Result<BoxSink> {
	convert(value)
}

/// Materializes a value as a lazy sequence of newline-delimited strings.
pub fn to_lines(value: impl IntoValue) -> Result<Lines> {
	convert(value)
}

/// Materializes a value as a lazy sequence of byte buffers.
pub fn to_chunks(value: impl IntoValue) -> Result<Chunks> {
	convert(value)
}
