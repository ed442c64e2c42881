// SPDX-License-Identifier: Apache-2.0

//! ## How it works
//!
//! Anything that carries bytes (a buffer, a string, a file path, a stream,
//! a channel of chunks, a lazy sequence of any of those) belongs to a *kind*
//! in a process-wide conversion graph. Direct converters are the edges;
//! [`convert`] asks the planner for the shortest chain between two kinds and
//! threads the value through it, so registering a single edge makes a type
//! reachable from everything already connected.
//!
//! Sequences get the same treatment without per-edge duplication: any
//! element-level converter lifts to a lazy sequence-to-sequence conversion,
//! and pulling `k` elements of the output forces at most `k` elements of the
//! input. Two behavioral contracts tie the graph to real I/O: [`Source`]
//! (pull a chunk, `None` at end-of-stream) and [`Sink`] (push a chunk).
//! Kinds implementing them participate in edges registered on the
//! capability itself, and power [`transfer`]: bulk movement that prefers a
//! registered specialized transfer and otherwise pumps chunk by chunk,
//! closing both ends when it is done.
//!
//! ### Options
//!
//! Every converter receives an [`Options`] record: a schema-free map with
//! typed accessors for the keys the built-ins recognize (`chunk-size`,
//! `direct`, `encoding`, `append`). Unknown keys are carried along
//! untouched, so custom converters can define their own.
//!
//! ```no_run
//! use byteflux::{convert, to_lines, Result};
//! use std::path::Path;
//!
//! fn main() -> Result {
//! 	let text: String = convert(Path::new("notes.txt"))?;
//! 	for line in to_lines(text)? {
//! 		println!("{}", line?);
//! 	}
//! 	Ok(())
//! }
//! ```

mod builtins;
mod convert;
mod encoding;
mod error;
mod kind;
mod options;
mod planner;
mod registry;
mod streams;
mod transfer;
mod value;

pub use convert::*;
pub use error::*;
pub use kind::*;
pub use options::*;
pub use registry::{register_conversion, register_sink_impl, register_source_impl, register_transfer, ConvertFn, TransferFn};
pub use streams::{BoxSink, BoxSource, ByteChannel, Reader, Sink, Source, Writer};
pub use transfer::*;
pub use value::{Carrier, Chunks, FromValue, IntoValue, Lines, Many, Value};
