// SPDX-License-Identifier: Apache-2.0

use std::{io, result};
use thiserror::Error;
use crate::Kind;

pub type Result<T = (), E = Error> = result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// No chain of registered converters leads from one kind to the other.
	#[error("don't know how to convert {from} into {to}")]
	NoPath { from: Kind, to: Kind },
	/// No specialized transfer is reachable, and the endpoints cannot be
	/// turned into a byte source and a byte sink for the generic pump.
	#[error("don't know how to transfer {from} into {to}")]
	NoTransfer { from: Kind, to: Kind },
	/// The planner proposed an edge the registry cannot satisfy. Indicates a
	/// bug in the planner or a registry mutated mid-flight.
	#[error("planned conversion step {from} to {to} has no registered converter")]
	MissingStep { from: Kind, to: Kind },
	/// A dynamic value did not hold the carrier a typed accessor demanded.
	#[error("expected a value of kind {expected}, found {actual}")]
	KindMismatch { expected: Kind, actual: Kind },
	#[error(transparent)]
	Io(#[from] io::Error),
	/// The byte sequence is malformed under the requested character encoding.
	#[error("byte sequence is not valid {encoding}")]
	Decode { encoding: &'static str },
	/// The text contains characters the requested encoding cannot represent.
	#[error("text cannot be encoded as {encoding}")]
	Encode { encoding: &'static str },
	#[error("unknown encoding label {0:?}")]
	UnknownEncoding(String),
}

impl From<Error> for io::Error {
	fn from(value: Error) -> Self {
		match value {
			Error::Io(inner) => inner,
			other => io::Error::other(other),
		}
	}
}
