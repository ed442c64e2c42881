// SPDX-License-Identifier: Apache-2.0

use std::io::Cursor;
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use byteflux::{convert, transfer, BoxSink, Options, Reader, Sink};

const CHUNK: usize = 64 * 1024;
const TOTAL: usize = 1024 * 1024;

fn data() -> Vec<u8> {
	(0..TOTAL).map(|i| (i % 251) as u8).collect()
}

fn wrap_buffer(c: &mut Criterion) {
	let mut group = c.benchmark_group("wrap_buffer");
	group.throughput(Throughput::Bytes(TOTAL as u64));
	group.bench_function("byte_array", |b| b.iter(|| {
		convert::<Bytes>(black_box(data())).unwrap()
	}));
	group.finish();
}

fn collapse_chunks(c: &mut Criterion) {
	let chunks = data()
		.chunks(CHUNK)
		.map(Bytes::copy_from_slice)
		.collect::<Vec<_>>();
	let mut group = c.benchmark_group("collapse_chunks");
	group.throughput(Throughput::Bytes(TOTAL as u64));
	group.bench_function("chunk_seq", |b| b.iter(|| {
		convert::<Bytes>(black_box(chunks.clone())).unwrap()
	}));
	group.finish();
}

struct Discard;

impl Sink for Discard {
	fn send_bytes(&mut self, chunk: Bytes, _options: &Options) -> byteflux::Result {
		black_box(chunk);
		Ok(())
	}
}

fn pump(c: &mut Criterion) {
	let payload = data();
	let mut group = c.benchmark_group("pump");
	group.throughput(Throughput::Bytes(TOTAL as u64));
	group.bench_function("reader_to_sink", |b| b.iter(|| {
		let reader = Reader::new(Cursor::new(payload.clone()));
		transfer(reader, BoxSink::new(Discard)).unwrap()
	}));
	group.finish();
}

criterion_group!(benches, wrap_buffer, collapse_chunks, pump);
criterion_main!(benches);
