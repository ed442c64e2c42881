// SPDX-License-Identifier: Apache-2.0

//! Bulk byte movement between a source-like and a sink-like value.
//!
//! A transfer first looks for a specialized source→sink function whose
//! endpoint kinds are reachable with the least conversion work; failing
//! that, both endpoints are converted to the byte-source and byte-sink
//! capabilities and pumped chunk by chunk.

use log::{debug, trace};
use crate::{Capability, Error, Kind, Options, Result, TRANSFER_CHUNK_SIZE};
use crate::convert::convert_value;
use crate::planner;
use crate::registry::{registry, TransferFn};
use crate::streams::{BoxSink, BoxSource, Sink, Source};
use crate::value::IntoValue;

/// Moves every byte from `source` into `sink`, returning the number moved.
///
/// Both endpoints are closed on completion; on a mid-transfer error the
/// first failure is surfaced after both ends have been given their close.
pub fn transfer(source: impl IntoValue, sink: impl IntoValue) -> Result<u64> {
	transfer_with(source, sink, &Options::default())
}

/// [`transfer`] with an explicit options record.
pub fn transfer_with(
	source: impl IntoValue,
	sink: impl IntoValue,
	options: &Options,
) -> Result<u64> {
	let source = source.into_value();
	let sink = sink.into_value();
	let src_kind = source.kind().clone();
	let dst_kind = sink.kind().clone();

	if let Some((f, from, to)) = specialized(&src_kind, &dst_kind) {
		debug!("transferring {src_kind} -> {dst_kind} via {from} -> {to}");
		let source = convert_value(source, &from, options)?;
		let sink = convert_value(sink, &to, options)?;
		return f(source, sink, options);
	}

	let no_transfer = |e| match e {
		Error::NoPath { .. } => Error::NoTransfer { from: src_kind.clone(), to: dst_kind.clone() },
		other => other,
	};
	let boxed_source = convert_value(source, &Kind::Cap(Capability::Source), options)
		.map_err(no_transfer)?
		.into_source()?;
	let boxed_sink = convert_value(sink, &Kind::Cap(Capability::Sink), options)
		.map_err(no_transfer)?
		.into_sink()?;
	pump(boxed_source, boxed_sink, options)
}

/// The registered transfer whose endpoints minimize the combined conversion
/// distance, if any is reachable from both sides.
fn specialized(src: &Kind, dst: &Kind) -> Option<(TransferFn, Kind, Kind)> {
	let registry = registry();
	let mut best: Option<(usize, TransferFn, Kind, Kind)> = None;
	for (from, to, f) in registry.transfer_entries() {
		let Some(src_path) = planner::plan(&registry, src, from) else { continue };
		let Some(dst_path) = planner::plan(&registry, dst, to) else { continue };
		let cost = (src_path.len() - 1) + (dst_path.len() - 1);
		if best.as_ref().map_or(true, |(c, ..)| cost < *c) {
			best = Some((cost, f.clone(), from.clone(), to.clone()));
		}
	}
	best.map(|(_, f, from, to)| (f, from, to))
}

/// The generic pull/push loop: `take_bytes` until `None`, pushing each
/// chunk, then close both ends.
fn pump(mut source: BoxSource, mut sink: BoxSink, options: &Options) -> Result<u64> {
	let count = options.chunk_size().unwrap_or(TRANSFER_CHUNK_SIZE);
	let mut moved = 0u64;
	let mut outcome = Ok(());
	loop {
		match source.take_bytes(count, options) {
			Ok(Some(chunk)) => {
				trace!("pumping {} bytes", chunk.len());
				moved += chunk.len() as u64;
				if let Err(e) = sink.send_bytes(chunk, options) {
					outcome = Err(e);
					break;
				}
			}
			Ok(None) => break,
			Err(e) => {
				outcome = Err(e);
				break;
			}
		}
	}
	// Both ends get their close before the first error is surfaced.
	let source_closed = source.close_source();
	let sink_closed = sink.close_sink();
	outcome?;
	source_closed?;
	sink_closed?;
	debug!("pumped {moved} bytes");
	Ok(moved)
}
