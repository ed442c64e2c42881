// SPDX-License-Identifier: Apache-2.0

//! The streaming capabilities behind the conversion graph: pull-based byte
//! sources, push-based byte sinks, and the carriers implementing them.

use std::cmp::min;
use std::io;
use std::io::Read;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread;
use bytes::Bytes;
use crate::{Options, Result};
use crate::value::Many;

/// Chunks buffered by the channel a sequence is bridged into before the
/// producer blocks.
pub(crate) const PIPE_CAPACITY: usize = 16;

/// A pull-based source of byte chunks.
///
/// End-of-stream is signaled in two stages: a short (non-empty) chunk is
/// still data, and only `None` terminates. Consumers must treat a chunk
/// smaller than `count` as ordinary progress.
pub trait Source {
	/// Pulls a chunk of up to `count` bytes, or `None` at end-of-stream.
	fn take_bytes(&mut self, count: usize, options: &Options) -> Result<Option<Bytes>>;

	/// Closes the source, releasing the underlying resource. Closing is
	/// idempotent; all built-in sources also release on drop.
	fn close_source(&mut self) -> Result {
		Ok(())
	}
}

/// A push-based sink of byte chunks.
pub trait Sink {
	/// Sends one chunk into the sink.
	fn send_bytes(&mut self, chunk: Bytes, options: &Options) -> Result;

	/// Writes any buffered data through to the final target.
	fn flush(&mut self) -> Result {
		Ok(())
	}

	/// Flushes and closes the sink. Closing is idempotent; all built-in
	/// sinks also release on drop.
	fn close_sink(&mut self) -> Result {
		self.flush()
	}
}

/// A boxed [`Source`], the runtime face of the byte-source capability.
pub struct BoxSource(Box<dyn Source + Send>);

impl BoxSource {
	pub fn new(source: impl Source + Send + 'static) -> Self {
		Self(Box::new(source))
	}
}

impl Source for BoxSource {
	fn take_bytes(&mut self, count: usize, options: &Options) -> Result<Option<Bytes>> {
		self.0.take_bytes(count, options)
	}

	fn close_source(&mut self) -> Result {
		self.0.close_source()
	}
}

/// A boxed [`Sink`], the runtime face of the byte-sink capability.
pub struct BoxSink(Box<dyn Sink + Send>);

impl BoxSink {
	pub fn new(sink: impl Sink + Send + 'static) -> Self {
		Self(Box::new(sink))
	}
}

impl Sink for BoxSink {
	fn send_bytes(&mut self, chunk: Bytes, options: &Options) -> Result {
		self.0.send_bytes(chunk, options)
	}

	fn flush(&mut self) -> Result {
		self.0.flush()
	}

	fn close_sink(&mut self) -> Result {
		self.0.close_sink()
	}
}

/// An owned byte stream, wrapping any [`io::Read`].
pub struct Reader {
	inner: Option<Box<dyn Read + Send>>,
}

impl Reader {
	pub fn new(read: impl Read + Send + 'static) -> Self {
		Self { inner: Some(Box::new(read)) }
	}
}

impl Read for Reader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		match self.inner.as_mut() {
			Some(inner) => inner.read(buf),
			None => Ok(0),
		}
	}
}

impl Source for Reader {
	/// Fills a `count`-byte chunk by looping `read` until full or
	/// end-of-stream; the final non-empty read yields a short, tight chunk.
	fn take_bytes(&mut self, count: usize, _options: &Options) -> Result<Option<Bytes>> {
		let Some(inner) = self.inner.as_mut() else { return Ok(None) };
		let mut buf = vec![0u8; count];
		let mut filled = 0;
		while filled < count {
			match inner.read(&mut buf[filled..]) {
				Ok(0) => break,
				Ok(n) => filled += n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			}
		}
		if filled == 0 {
			return Ok(None);
		}
		buf.truncate(filled);
		Ok(Some(Bytes::from(buf)))
	}

	fn close_source(&mut self) -> Result {
		self.inner = None;
		Ok(())
	}
}

/// An owned byte sink, wrapping any [`io::Write`].
pub struct Writer {
	inner: Option<Box<dyn io::Write + Send>>,
}

impl Writer {
	pub fn new(write: impl io::Write + Send + 'static) -> Self {
		Self { inner: Some(Box::new(write)) }
	}
}

impl Sink for Writer {
	fn send_bytes(&mut self, chunk: Bytes, _options: &Options) -> Result {
		let Some(inner) = self.inner.as_mut() else {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "writer is closed").into());
		};
		inner.write_all(&chunk)?;
		Ok(())
	}

	fn flush(&mut self) -> Result {
		if let Some(inner) = self.inner.as_mut() {
			inner.flush()?;
		}
		Ok(())
	}

	fn close_sink(&mut self) -> Result {
		let flushed = self.flush();
		self.inner = None;
		flushed
	}
}

/// The receiving side of a bounded in-process byte pipe.
///
/// A channel is how a sequence crosses into pull-at-your-own-pace territory:
/// a background producer feeds chunks into the bounded buffer and the
/// consumer drains them here. Dropping or closing the channel hangs up on
/// the producer.
pub struct ByteChannel {
	receiver: Option<Receiver<io::Result<Bytes>>>,
	pending: Option<Bytes>,
}

impl ByteChannel {
	pub fn new(receiver: Receiver<io::Result<Bytes>>) -> Self {
		Self { receiver: Some(receiver), pending: None }
	}
}

impl Source for ByteChannel {
	/// Yields one queued chunk per call, splitting when a chunk exceeds
	/// `count` and keeping the remainder pending. Hangup reads as
	/// end-of-stream.
	fn take_bytes(&mut self, count: usize, _options: &Options) -> Result<Option<Bytes>> {
		loop {
			let mut chunk = match self.pending.take() {
				Some(chunk) => chunk,
				None => {
					let Some(receiver) = self.receiver.as_ref() else { return Ok(None) };
					match receiver.recv() {
						Ok(Ok(chunk)) => chunk,
						Ok(Err(e)) => return Err(e.into()),
						Err(_) => {
							self.receiver = None;
							return Ok(None);
						}
					}
				}
			};
			if chunk.is_empty() {
				continue;
			}
			if chunk.len() > count {
				self.pending = Some(chunk.split_off(count));
			}
			return Ok(Some(chunk));
		}
	}

	fn close_source(&mut self) -> Result {
		self.receiver = None;
		self.pending = None;
		Ok(())
	}
}

impl Source for Bytes {
	fn take_bytes(&mut self, count: usize, _options: &Options) -> Result<Option<Bytes>> {
		if self.is_empty() {
			return Ok(None);
		}
		let n = min(count, self.len());
		Ok(Some(self.split_to(n)))
	}
}

/// Concatenates a byte-buffer sequence into one continuous stream.
pub(crate) struct ChunkReader {
	chunks: Many,
	current: Bytes,
}

impl ChunkReader {
	pub(crate) fn new(chunks: Many) -> Self {
		Self { chunks, current: Bytes::new() }
	}
}

impl Read for ChunkReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		while self.current.is_empty() {
			match self.chunks.next() {
				None => return Ok(0),
				Some(Ok(value)) => self.current = value.downcast().map_err(io::Error::from)?,
				Some(Err(e)) => return Err(e.into()),
			}
		}
		let n = min(buf.len(), self.current.len());
		buf[..n].copy_from_slice(&self.current.split_to(n));
		Ok(n)
	}
}

/// Bridges a chunk sequence into a [`ByteChannel`] through a bounded pipe.
///
/// The producer runs until the sequence is exhausted or the receiver hangs
/// up, then drops its sender, which the consumer observes as end-of-stream.
pub(crate) fn spawn_pipe<I>(chunks: I) -> Result<ByteChannel>
where
	I: Iterator<Item = Result<Bytes>> + Send + 'static,
{
	let (sender, receiver) = mpsc::sync_channel(PIPE_CAPACITY);
	thread::Builder::new()
		.name("byteflux-pipe".into())
		.spawn(move || produce(chunks, sender))?;
	Ok(ByteChannel::new(receiver))
}

fn produce<I>(chunks: I, sender: SyncSender<io::Result<Bytes>>)
where
	I: Iterator<Item = Result<Bytes>>,
{
	for item in chunks {
		let (chunk, fatal) = match item {
			Ok(chunk) => (Ok(chunk), false),
			Err(e) => (Err(e.into()), true),
		};
		if sender.send(chunk).is_err() || fatal {
			break;
		}
	}
}
