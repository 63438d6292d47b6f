//! Codec benchmarks for eio-parser.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use eio_parser::{codec, payload, Packet};

fn bench_encode_packet(c: &mut Criterion) {
    let packet = Packet::message("x".repeat(64));

    let mut group = c.benchmark_group("encode_packet");
    group.throughput(Throughput::Bytes(64));
    group.bench_function("text_64B", |b| {
        b.iter(|| codec::encode_packet(black_box(&packet), false, false))
    });
    group.finish();
}

fn bench_decode_packet(c: &mut Criterion) {
    let packet = Packet::message("x".repeat(64));
    let encoded = codec::encode_packet(&packet, false, false).unwrap();
    let text = encoded.as_text().unwrap();

    let mut group = c.benchmark_group("decode_packet");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("text_64B", |b| {
        b.iter(|| codec::decode_packet(black_box(text), false))
    });
    group.finish();
}

fn bench_utf8_roundtrip(c: &mut Criterion) {
    let packet = Packet::message("€".repeat(32));
    let encoded = codec::encode_packet(&packet, true, true).unwrap();
    let text = encoded.as_text().unwrap().to_owned();

    c.bench_function("decode_packet_utf8_32ch", |b| {
        b.iter(|| codec::decode_packet(black_box(&text), true))
    });
}

fn bench_payload_roundtrip(c: &mut Criterion) {
    let packets: Vec<Packet> = (0..16).map(|i| Packet::message(format!("m{i}"))).collect();
    let encoded = payload::encode_payload(&packets).unwrap();

    c.bench_function("payload_roundtrip_16", |b| {
        b.iter(|| {
            let text = payload::encode_payload(black_box(&packets)).unwrap();
            let mut count = 0;
            payload::decode_payload(&text, |_, _, _| {
                count += 1;
                true
            });
            count
        })
    });

    let mut group = c.benchmark_group("decode_payload");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("16_packets", |b| {
        b.iter(|| {
            payload::decode_payload(black_box(&encoded), |packet, _, _| {
                black_box(&packet);
                true
            })
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_packet,
    bench_decode_packet,
    bench_utf8_roundtrip,
    bench_payload_roundtrip
);
criterion_main!(benches);
