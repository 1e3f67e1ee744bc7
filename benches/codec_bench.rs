//! Benchmarks for SensorCodec.
//!
//! Run with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

use fingate_core::{FeatureBuffer, SlotId};
use fingate_protocol::{Instruction, Packet, PacketKind, SensorCodec};

const ADDR: u32 = 0xFFFF_FFFF;

fn bench_encode_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_instruction");
    group.throughput(Throughput::Elements(1));

    let store = Instruction::StoreModel {
        buffer: FeatureBuffer::One,
        slot: SlotId::new(150).unwrap(),
    }
    .to_packet(ADDR);

    group.bench_function("store_model", |b| {
        b.iter(|| {
            let mut codec = SensorCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(store.clone()), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

fn bench_decode_payload_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_payload");

    for size in [1usize, 32, 128, 256] {
        let bytes = Packet::new(ADDR, PacketKind::Data, vec![0xA5; size]).to_bytes();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| {
                let mut codec = SensorCodec::new();
                let mut buffer = BytesMut::from(bytes.as_ref());
                black_box(codec.decode(&mut buffer).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_decode_with_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_resync");
    group.throughput(Throughput::Elements(1));

    let mut stream = vec![0x55; 64];
    stream.extend_from_slice(&Instruction::CaptureImage.to_packet(ADDR).to_bytes());

    group.bench_function("skip_64_bytes", |b| {
        b.iter(|| {
            let mut codec = SensorCodec::new();
            let mut buffer = BytesMut::from(stream.as_slice());
            black_box(codec.decode(&mut buffer).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_instruction,
    bench_decode_payload_sizes,
    bench_decode_with_noise
);
criterion_main!(benches);
