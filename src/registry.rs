// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use log::debug;
use once_cell::sync::Lazy;
use crate::{Capability, Kind, Options, Result, TypeTag};
use crate::builtins;
use crate::streams::{BoxSink, BoxSource, Sink, Source};
use crate::value::{Carrier, Value};

/// A registered single-step converter.
pub type ConvertFn = Arc<dyn Fn(Value, &Options) -> Result<Value> + Send + Sync>;
/// A registered specialized transfer, returning the bytes moved.
pub type TransferFn = Arc<dyn Fn(Value, Value, &Options) -> Result<u64> + Send + Sync>;

pub(crate) type SourceAdapter = fn(Value) -> Result<BoxSource>;
pub(crate) type SinkAdapter = fn(Value) -> Result<BoxSink>;

/// The process-wide conversion fabric: direct converters keyed by
/// (source kind, destination kind), specialized transfers keyed the same
/// way, and the capability tables mapping concrete tags to their boxed
/// source/sink forms.
///
/// The registry is populated once with the built-in seed set and is
/// effectively frozen afterwards; dynamic registration takes the write lock
/// and bumps the version, which invalidates the planner's memo cache.
pub(crate) struct Registry {
	conversions: HashMap<Kind, HashMap<Kind, ConvertFn>>,
	transfers: HashMap<Kind, HashMap<Kind, TransferFn>>,
	sources: Vec<(TypeTag, SourceAdapter)>,
	sinks: Vec<(TypeTag, SinkAdapter)>,
	version: u64,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::seeded()));

pub(crate) fn registry() -> RwLockReadGuard<'static, Registry> {
	REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

fn registry_mut() -> RwLockWriteGuard<'static, Registry> {
	REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
	fn seeded() -> Self {
		let mut registry = Self {
			conversions: HashMap::new(),
			transfers: HashMap::new(),
			sources: Vec::new(),
			sinks: Vec::new(),
			version: 0,
		};
		builtins::install(&mut registry);
		registry
	}

	pub(crate) fn version(&self) -> u64 {
		self.version
	}

	pub(crate) fn insert_conversion(&mut self, from: Kind, to: Kind, converter: ConvertFn) {
		self.conversions.entry(from).or_default().insert(to, converter);
		self.version += 1;
	}

	pub(crate) fn insert_transfer(&mut self, from: Kind, to: Kind, transfer: TransferFn) {
		self.transfers.entry(from).or_default().insert(to, transfer);
		self.version += 1;
	}

	pub(crate) fn source_impl<T: Carrier + Source>(&mut self) {
		self.sources.push((T::tag(), |value| Ok(BoxSource::new(value.downcast::<T>()?))));
		self.version += 1;
	}

	pub(crate) fn sink_impl<T: Carrier + Sink>(&mut self) {
		self.sinks.push((T::tag(), |value| Ok(BoxSink::new(value.downcast::<T>()?))));
		self.version += 1;
	}

	pub(crate) fn conversion(&self, from: &Kind, to: &Kind) -> Option<ConvertFn> {
		self.conversions.get(from)?.get(to).cloned()
	}

	pub(crate) fn destinations_from<'a>(&'a self, from: &Kind) -> impl Iterator<Item = &'a Kind> + 'a {
		self.conversions.get(from).into_iter().flat_map(HashMap::keys)
	}

	pub(crate) fn transfer_entries(&self) -> impl Iterator<Item = (&Kind, &Kind, &TransferFn)> {
		self.transfers
			.iter()
			.flat_map(|(from, entries)| entries.iter().map(move |(to, f)| (from, to, f)))
	}

	pub(crate) fn implements(&self, tag: &TypeTag, cap: Capability) -> bool {
		match cap {
			Capability::Source => self.sources.iter().any(|(t, _)| t == tag),
			Capability::Sink => self.sinks.iter().any(|(t, _)| t == tag),
		}
	}

	/// Concrete tags implementing a capability, in registration order.
	pub(crate) fn implementers(&self, cap: Capability) -> Vec<TypeTag> {
		match cap {
			Capability::Source => self.sources.iter().map(|(t, _)| *t).collect(),
			Capability::Sink => self.sinks.iter().map(|(t, _)| *t).collect(),
		}
	}

	pub(crate) fn capabilities(&self, tag: &TypeTag) -> Vec<Capability> {
		[Capability::Source, Capability::Sink]
			.into_iter()
			.filter(|&cap| self.implements(tag, cap))
			.collect()
	}

	pub(crate) fn source_adapter(&self, tag: &TypeTag) -> Option<SourceAdapter> {
		self.sources.iter().find(|(t, _)| t == tag).map(|(_, adapter)| *adapter)
	}

	pub(crate) fn sink_adapter(&self, tag: &TypeTag) -> Option<SinkAdapter> {
		self.sinks.iter().find(|(t, _)| t == tag).map(|(_, adapter)| *adapter)
	}

	/// The kinds a value of `kind` is accepted as: the kind itself, plus
	/// every capability kind its tag implements.
	pub(crate) fn effective_sources(&self, kind: &Kind) -> Vec<Kind> {
		let mut out = vec![kind.clone()];
		if let Kind::Concrete(tag) = kind {
			out.extend(self.capabilities(tag).into_iter().map(Kind::Cap));
		}
		out
	}

	/// The concrete kinds a conversion targeting `kind` may end on.
	pub(crate) fn valid_destinations(&self, kind: &Kind) -> Vec<Kind> {
		match kind {
			Kind::Concrete(_) => vec![kind.clone()],
			Kind::Cap(cap) => self.implementers(*cap).into_iter().map(Kind::Concrete).collect(),
			Kind::Many(inner) => self
				.valid_destinations(inner)
				.into_iter()
				.filter(|k| !k.is_many())
				.map(Kind::many)
				.collect(),
		}
	}

	pub(crate) fn assignable(&self, from: &Kind, to: &Kind) -> bool {
		match (from, to) {
			_ if from == to => true,
			(Kind::Concrete(tag), Kind::Cap(cap)) => self.implements(tag, *cap),
			(Kind::Many(a), Kind::Many(b)) => self.assignable(a, b),
			_ => false,
		}
	}
}

/// Registers a direct converter from `from` to `to`, extending the graph.
/// Re-registering a pair replaces the earlier entry.
pub fn register_conversion<F>(from: Kind, to: Kind, converter: F)
where
	F: Fn(Value, &Options) -> Result<Value> + Send + Sync + 'static,
{
	debug!("registering conversion {from} -> {to}");
	registry_mut().insert_conversion(from, to, Arc::new(converter));
}

/// Registers a specialized transfer from `from` to `to`.
pub fn register_transfer<F>(from: Kind, to: Kind, transfer: F)
where
	F: Fn(Value, Value, &Options) -> Result<u64> + Send + Sync + 'static,
{
	debug!("registering transfer {from} -> {to}");
	registry_mut().insert_transfer(from, to, Arc::new(transfer));
}

/// Marks a carrier as implementing the byte-source capability, letting the
/// transfer pump and source-generic conversions pull from it.
pub fn register_source_impl<T: Carrier + Source>() {
	registry_mut().source_impl::<T>();
}

/// Marks a carrier as implementing the byte-sink capability.
pub fn register_sink_impl<T: Carrier + Sink>() {
	registry_mut().sink_impl::<T>();
}
