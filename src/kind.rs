// SPDX-License-Identifier: Apache-2.0

use std::any::{Any, TypeId};
use std::fmt;
use std::fmt::Formatter;
use amplify_derive::Display;
use crate::value::Carrier;

/// A tag identifying a participant in the conversion graph: a concrete
/// carrier type, a behavioral capability, or a lazy sequence of either.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
	Concrete(TypeTag),
	Cap(Capability),
	/// A lazy, forward-only sequence of values of the inner kind. Sequences
	/// never nest; `many` rejects a sequence kind as its element.
	Many(Box<Kind>),
}

impl Kind {
	/// The kind values of the carrier `T` belong to.
	pub fn of<T: Carrier>() -> Self {
		Self::Concrete(T::tag())
	}

	/// The sequence kind over `inner`.
	pub fn many(inner: Kind) -> Self {
		debug_assert!(!inner.is_many(), "sequence kinds do not nest");
		Self::Many(Box::new(inner))
	}

	pub fn is_many(&self) -> bool {
		matches!(self, Self::Many(_))
	}
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Concrete(tag) => f.write_str(tag.name()),
			Self::Cap(cap) => write!(f, "{cap}"),
			Self::Many(inner) => write!(f, "sequence of {inner}"),
		}
	}
}

/// Couples a carrier's `TypeId` with the name it is displayed under in paths
/// and errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
	id: TypeId,
	name: &'static str,
}

impl TypeTag {
	pub fn new<T: Any>(name: &'static str) -> Self {
		Self { id: TypeId::of::<T>(), name }
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

/// A behavioral contract one or more concrete carriers implement. A value
/// whose kind implements a capability is accepted wherever the capability
/// kind is expected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Capability {
	#[display("byte source")]
	Source,
	#[display("byte sink")]
	Sink,
}
