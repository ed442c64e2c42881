// SPDX-License-Identifier: Apache-2.0

//! The seed set of direct converters establishing the graph's connectivity.

use std::fs;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Cursor, Read};
use std::iter;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use bytes::{Buf, Bytes, BytesMut};
use encoding_rs::Decoder;
use crate::{Capability, Error, Kind, Result, SOURCE_CHUNK_SIZE};
use crate::encoding;
use crate::registry::Registry;
use crate::streams::{spawn_pipe, ByteChannel, ChunkReader, Reader, Source, Writer};
use crate::value::{from_sequence, Carrier, Many, Value};

/// Characters pulled per step while splitting a decoded stream into lines.
const LINE_CHUNK: usize = 1024;

pub(crate) fn install(registry: &mut Registry) {
	registry.source_impl::<Reader>();
	registry.source_impl::<ByteChannel>();
	registry.source_impl::<Bytes>();
	registry.sink_impl::<Writer>();

	let byte_array = Kind::of::<Vec<u8>>();
	let buffer = Kind::of::<Bytes>();
	let string = Kind::of::<String>();
	let reader = Kind::of::<Reader>();
	let writer = Kind::of::<Writer>();
	let channel = Kind::of::<ByteChannel>();
	let path = Kind::of::<PathBuf>();
	let chunk_seq = Kind::many(buffer.clone());
	let line_seq = Kind::many(string.clone());

	registry.insert_conversion(byte_array.clone(), buffer.clone(), Arc::new(|value, options| {
		let data: Vec<u8> = value.downcast()?;
		let wrapped = if options.direct() {
			Bytes::copy_from_slice(&data)
		} else {
			Bytes::from(data)
		};
		Ok(Value::new(wrapped))
	}));

	registry.insert_conversion(buffer.clone(), byte_array.clone(), Arc::new(|value, _options| {
		// Reuses the allocation when this view is the sole owner.
		Ok(Value::new(Vec::from(value.downcast::<Bytes>()?)))
	}));

	registry.insert_conversion(byte_array.clone(), reader.clone(), Arc::new(|value, _options| {
		Ok(Value::new(Reader::new(Cursor::new(value.downcast::<Vec<u8>>()?))))
	}));

	registry.insert_conversion(buffer.clone(), reader.clone(), Arc::new(|value, _options| {
		Ok(Value::new(Reader::new(value.downcast::<Bytes>()?.reader())))
	}));

	registry.insert_conversion(string.clone(), byte_array.clone(), Arc::new(|value, options| {
		let text: String = value.downcast()?;
		Ok(Value::new(encoding::encode(text, options.encoding())?))
	}));

	registry.insert_conversion(byte_array.clone(), string.clone(), Arc::new(|value, options| {
		let data: Vec<u8> = value.downcast()?;
		Ok(Value::new(encoding::decode(data, options.encoding())?))
	}));

	registry.insert_conversion(chunk_seq.clone(), buffer.clone(), Arc::new(|value, options| {
		let mut chunks = Vec::new();
		for item in from_sequence(value, Bytes::tag())? {
			chunks.push(item?.downcast::<Bytes>()?);
		}
		Ok(Value::new(collapse(chunks, options.direct())))
	}));

	registry.insert_conversion(Kind::Cap(Capability::Source), chunk_seq.clone(), Arc::new(|value, options| {
		let mut source = value.into_source()?;
		let count = options.chunk_size().unwrap_or(SOURCE_CHUNK_SIZE);
		let options = options.clone();
		let mut done = false;
		let chunks = iter::from_fn(move || {
			if done {
				return None;
			}
			match source.take_bytes(count, &options) {
				Ok(Some(chunk)) => Some(Ok(Value::new(chunk))),
				Ok(None) => {
					done = true;
					None
				}
				Err(e) => {
					done = true;
					Some(Err(e))
				}
			}
		});
		Ok(Value::many(Many::from_values(Bytes::tag(), chunks)))
	}));

	registry.insert_conversion(chunk_seq.clone(), reader.clone(), Arc::new(|value, _options| {
		let seq = from_sequence(value, Bytes::tag())?;
		Ok(Value::new(Reader::new(ChunkReader::new(seq))))
	}));

	registry.insert_conversion(chunk_seq.clone(), channel.clone(), Arc::new(|value, _options| {
		let seq = from_sequence(value, Bytes::tag())?;
		let chunks = seq.map(|item| item.and_then(|v| v.downcast::<Bytes>()));
		Ok(Value::new(spawn_pipe(chunks)?))
	}));

	registry.insert_conversion(reader.clone(), string.clone(), Arc::new(|value, options| {
		let mut reader: Reader = value.downcast()?;
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Ok(Value::new(encoding::decode(data, options.encoding())?))
	}));

	registry.insert_conversion(reader.clone(), line_seq.clone(), Arc::new(|value, options| {
		let lines = LineIter::new(value.downcast()?, options.encoding())?;
		Ok(Value::many(Many::from_values(
			String::tag(),
			lines.map(|line| line.map(Value::new)),
		)))
	}));

	registry.insert_conversion(path.clone(), reader.clone(), Arc::new(|value, _options| {
		let source: PathBuf = value.downcast()?;
		Ok(Value::new(Reader::new(File::open(source)?)))
	}));

	registry.insert_conversion(path, writer, Arc::new(|value, options| {
		let target: PathBuf = value.downcast()?;
		if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		let mut open = OpenOptions::new();
		open.write(true).create(true);
		if options.append() {
			open.append(true);
		} else {
			open.truncate(true);
		}
		Ok(Value::new(Writer::new(open.open(target)?)))
	}));
}

/// Flattens an ordered run of buffers into one, reserving once. A lone
/// buffer passes through unless a fresh allocation was requested.
fn collapse(chunks: Vec<Bytes>, direct: bool) -> Bytes {
	if !direct {
		if let [only] = chunks.as_slice() {
			return only.clone();
		}
	}
	let total = chunks.iter().map(Bytes::len).sum();
	let mut out = BytesMut::with_capacity(total);
	for chunk in &chunks {
		out.extend_from_slice(chunk);
	}
	out.freeze()
}

/// Decodes a byte stream incrementally and yields its newline-delimited
/// lines. The terminator is stripped, along with a preceding carriage
/// return; an unterminated final line is yielded at end-of-stream.
struct LineIter {
	reader: Reader,
	decoder: Decoder,
	carry: String,
	done: bool,
}

impl LineIter {
	fn new(reader: Reader, label: &str) -> Result<Self> {
		Ok(Self {
			reader,
			decoder: encoding::lookup(label)?.new_decoder_without_bom_handling(),
			carry: String::new(),
			done: false,
		})
	}

	fn fill(&mut self) -> Result {
		let mut buf = [0u8; LINE_CHUNK];
		let read = loop {
			match self.reader.read(&mut buf) {
				Ok(n) => break n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			}
		};
		let last = read == 0;
		let needed = self.decoder
			.max_utf8_buffer_length(read)
			.unwrap_or(LINE_CHUNK * 4);
		self.carry.reserve(needed);
		let (_, _, had_errors) = self.decoder.decode_to_string(&buf[..read], &mut self.carry, last);
		if had_errors {
			return Err(Error::Decode { encoding: self.decoder.encoding().name() });
		}
		if last {
			self.done = true;
		}
		Ok(())
	}
}

impl Iterator for LineIter {
	type Item = Result<String>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(pos) = self.carry.find('\n') {
				let mut line: String = self.carry.drain(..=pos).collect();
				line.pop();
				if line.ends_with('\r') {
					line.pop();
				}
				return Some(Ok(line));
			}
			if self.done {
				if self.carry.is_empty() {
					return None;
				}
				return Some(Ok(mem::take(&mut self.carry)));
			}
			if let Err(e) = self.fill() {
				self.done = true;
				self.carry.clear();
				return Some(Err(e));
			}
		}
	}
}
