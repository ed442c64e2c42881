// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;
use byteflux::{
	convert, convert_with, conversion_path, possible_conversions, register_conversion,
	to_chunks, to_lines, to_source, ByteChannel, Carrier, Chunks, Error, Kind, Many, Options,
	Reader, Result, Source, TypeTag, Value, Writer,
};

#[test]
fn utf8_bytes_decode_to_a_string() -> Result {
	let text: String = convert(vec![0x48u8, 0x69])?;
	assert_eq!(text, "Hi");
	Ok(())
}

#[test]
fn strings_encode_to_utf8_bytes() -> Result {
	let bytes: Vec<u8> = convert("Hi")?;
	assert_eq!(bytes, [0x48, 0x69]);
	Ok(())
}

#[test]
fn identity_returns_the_value_itself() -> Result {
	let data = vec![1u8, 2, 3];
	let before = data.as_ptr();
	let after: Vec<u8> = convert(data)?;
	assert_eq!(after.as_ptr(), before);
	Ok(())
}

#[test]
fn registered_edges_are_single_steps() {
	let path = conversion_path(&Kind::of::<Vec<u8>>(), &Kind::of::<Bytes>()).unwrap();
	assert_eq!(path, [Kind::of::<Vec<u8>>(), Kind::of::<Bytes>()]);
}

#[test]
fn composed_paths_are_minimal() {
	let path = conversion_path(&Kind::of::<String>(), &Kind::of::<Bytes>()).unwrap();
	assert_eq!(
		path,
		[Kind::of::<String>(), Kind::of::<Vec<u8>>(), Kind::of::<Bytes>()],
	);
}

#[test]
fn buffer_sequences_collapse_in_order() -> Result {
	let merged: Bytes = convert(vec![
		Bytes::from_static(b"AB"),
		Bytes::from_static(b"CD"),
		Bytes::from_static(b"E"),
	])?;
	assert_eq!(merged.as_ref(), b"ABCDE");
	Ok(())
}

#[test]
fn channel_chunks_have_the_requested_granularity() -> Result {
	let options = Options::new().set_chunk_size(4096);
	let reader = Reader::new(Cursor::new(vec![0xA5u8; 10_000]));
	let channel: ByteChannel = convert_with(reader, &options)?;
	let chunks: Chunks = convert_with(channel, &options)?;
	let sizes = chunks
		.map(|chunk| chunk.map(|b| b.len()))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(sizes, [4096, 4096, 1808]);
	Ok(())
}

#[test]
fn strings_reach_every_byte_carrier() {
	let reachable = possible_conversions(&Kind::of::<String>());
	let expected = [
		Kind::of::<Vec<u8>>(),
		Kind::of::<Bytes>(),
		Kind::of::<Reader>(),
		Kind::of::<ByteChannel>(),
		Kind::many(Kind::of::<Bytes>()),
		Kind::many(Kind::of::<String>()),
	];
	for kind in expected {
		assert!(reachable.contains(&kind), "{kind} is not reachable from a string");
	}
}

struct Counted {
	remaining: usize,
	pulls: Arc<AtomicUsize>,
}

impl Iterator for Counted {
	type Item = Vec<u8>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.remaining == 0 {
			return None;
		}
		self.remaining -= 1;
		self.pulls.fetch_add(1, Ordering::SeqCst);
		Some(vec![0xAB; 8])
	}
}

#[test]
fn lifted_sequence_conversions_stay_lazy() -> Result {
	let pulls = Arc::new(AtomicUsize::new(0));
	let seq = Many::new(Counted { remaining: 100, pulls: pulls.clone() });
	let mut chunks: Chunks = convert(seq)?;
	chunks.next().unwrap()?;
	chunks.next().unwrap()?;
	assert_eq!(pulls.load(Ordering::SeqCst), 2);
	Ok(())
}

#[test]
fn channel_conversions_pull_on_demand() -> Result {
	let (sender, receiver) = mpsc::sync_channel(4);
	sender.send(Ok(Bytes::from_static(b"first"))).unwrap();
	sender.send(Ok(Bytes::from_static(b"second"))).unwrap();
	let mut chunks = to_chunks(ByteChannel::new(receiver))?;
	assert_eq!(chunks.next().unwrap()?, Bytes::from_static(b"first"));
	assert_eq!(chunks.next().unwrap()?, Bytes::from_static(b"second"));
	drop(sender);
	assert!(chunks.next().is_none());
	Ok(())
}

#[test]
fn readers_materialize_as_strings() -> Result {
	let text: String = convert(Reader::new(Cursor::new(b"hello world".to_vec())))?;
	assert_eq!(text, "hello world");
	Ok(())
}

#[test]
fn line_sequences_split_on_newlines() -> Result {
	let lines = to_lines("alpha\r\nbeta\ngamma")?.collect::<Result<Vec<_>>>()?;
	assert_eq!(lines, ["alpha", "beta", "gamma"]);
	Ok(())
}

#[test]
fn buffer_sources_advance_through_the_view() -> Result {
	let options = Options::default();
	let mut source = to_source(Bytes::from_static(b"abcdef"))?;
	assert_eq!(source.take_bytes(4, &options)?.unwrap().as_ref(), b"abcd");
	assert_eq!(source.take_bytes(4, &options)?.unwrap().as_ref(), b"ef");
	assert!(source.take_bytes(4, &options)?.is_none());
	Ok(())
}

#[test]
fn readers_signal_eof_in_two_stages() -> Result {
	let options = Options::default();
	let mut source = to_source(Reader::new(Cursor::new(vec![7u8; 2500])))?;
	assert_eq!(source.take_bytes(1024, &options)?.unwrap().len(), 1024);
	assert_eq!(source.take_bytes(1024, &options)?.unwrap().len(), 1024);
	assert_eq!(source.take_bytes(1024, &options)?.unwrap().len(), 452);
	assert!(source.take_bytes(1024, &options)?.is_none());
	Ok(())
}

#[test]
fn unknown_options_are_ignored() -> Result {
	let buffer: Bytes = convert_with(vec![1u8, 2], &Options::new().set("color", "blue"))?;
	assert_eq!(buffer.as_ref(), [1, 2]);
	Ok(())
}

#[test]
fn direct_buffers_do_not_share_the_input_allocation() -> Result {
	let data = vec![9u8; 64];
	let before = data.as_ptr();
	let buffer: Bytes = convert_with(data, &Options::new().set_direct(true))?;
	assert_ne!(buffer.as_ptr(), before);
	assert_eq!(buffer.as_ref(), [9u8; 64]);
	Ok(())
}

#[test]
fn alternate_encodings_round_trip() -> Result {
	let options = Options::new().set_encoding("latin1");
	let bytes: Vec<u8> = convert_with("café", &options)?;
	assert_eq!(bytes, b"caf\xe9");
	let text: String = convert_with(bytes, &options)?;
	assert_eq!(text, "café");
	Ok(())
}

#[test]
fn malformed_text_is_an_error() {
	let err = convert::<String>(vec![0xFFu8, 0xFE, 0x48]).unwrap_err();
	assert!(matches!(err, Error::Decode { .. }), "unexpected error: {err}");
}

#[test]
fn unknown_encoding_labels_are_an_error() {
	let err = convert_with::<Vec<u8>>("x", &Options::new().set_encoding("klingon")).unwrap_err();
	assert!(matches!(err, Error::UnknownEncoding(_)), "unexpected error: {err}");
}

#[test]
fn unconvertible_kinds_name_both_ends() {
	let err = convert::<Vec<u8>>(Writer::new(io::sink())).unwrap_err();
	assert!(matches!(err, Error::NoPath { .. }), "unexpected error: {err}");
	assert_eq!(err.to_string(), "don't know how to convert writer into byte array");
}

struct Hex(String);

impl Carrier for Hex {
	fn tag() -> TypeTag {
		TypeTag::new::<Hex>("hex string")
	}
}

#[test]
fn registered_kinds_join_the_graph() -> Result {
	register_conversion(Kind::of::<Hex>(), Kind::of::<Vec<u8>>(), |value, _options| {
		let Hex(text) = value.downcast::<Hex>()?;
		let data = text
			.as_bytes()
			.chunks(2)
			.map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
			.collect::<Vec<_>>();
		Ok(Value::new(data))
	});
	// One registered edge, then composition reaches the rest of the graph.
	let buffer: Bytes = convert(Value::new(Hex("48692121".into())))?;
	assert_eq!(buffer.as_ref(), b"Hi!!");
	Ok(())
}

struct Token;

impl Carrier for Token {
	fn tag() -> TypeTag {
		TypeTag::new::<Token>("token")
	}
}

#[test]
fn later_registrations_replace_earlier_ones() -> Result {
	register_conversion(Kind::of::<Token>(), Kind::of::<Vec<u8>>(), |_value, _options| {
		Ok(Value::new(vec![1u8]))
	});
	let first: Vec<u8> = convert(Value::new(Token))?;
	assert_eq!(first, [1]);
	register_conversion(Kind::of::<Token>(), Kind::of::<Vec<u8>>(), |_value, _options| {
		Ok(Value::new(vec![2u8]))
	});
	let second: Vec<u8> = convert(Value::new(Token))?;
	assert_eq!(second, [2]);
	Ok(())
}

#[quickcheck]
fn utf8_string_round_trip(text: String) -> bool {
	let bytes: Vec<u8> = convert(text.clone()).unwrap();
	let back: String = convert(bytes).unwrap();
	back == text
}

#[quickcheck]
fn byte_buffer_round_trip(data: Vec<u8>) -> bool {
	let buffer: Bytes = convert(data.clone()).unwrap();
	let back: Vec<u8> = convert(buffer).unwrap();
	back == data
}
