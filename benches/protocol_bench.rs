//! Benchmarks for cinnabar protocol encoding and decoding

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cinnabar::protocol::{encode_bulk, encode_inline, read_reply};

fn protocol_benchmarks(c: &mut Criterion) {
    c.bench_function("encode_inline_small", |b| {
        b.iter(|| encode_inline(black_box("GET"), black_box(&["some:key"])))
    });

    let value = vec![0xabu8; 4096];
    c.bench_function("encode_bulk_4k", |b| {
        b.iter(|| encode_bulk(black_box("SET"), black_box(&["some:key"]), black_box(&value)))
    });

    let mut bulk_wire = b"$4096\r\n".to_vec();
    bulk_wire.extend_from_slice(&value);
    bulk_wire.extend_from_slice(b"\r\n");
    c.bench_function("decode_bulk_4k", |b| {
        b.iter(|| read_reply(&mut Cursor::new(black_box(&bulk_wire[..]))).unwrap())
    });

    let mut multi_wire = b"*64\r\n".to_vec();
    for i in 0..64 {
        let item = format!("member-{}", i);
        multi_wire.extend_from_slice(format!("${}\r\n{}\r\n", item.len(), item).as_bytes());
    }
    c.bench_function("decode_multi_bulk_64", |b| {
        b.iter(|| read_reply(&mut Cursor::new(black_box(&multi_wire[..]))).unwrap())
    });
}

criterion_group!(benches, protocol_benchmarks);
criterion_main!(benches);
