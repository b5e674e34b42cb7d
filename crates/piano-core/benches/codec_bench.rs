//! Criterion benchmarks for the recording codec.
//!
//! Measures save (encode) and load (decode + validation) latency for
//! recordings of increasing length.  A long improvised take is a few thousand
//! notes, so loading must stay well under a frame even at that size.
//!
//! Run with:
//! ```bash
//! cargo bench --package piano-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use piano_core::{decode_recording, encode_recording, KeyId, NoteEvent, Recording};

const SIZES: &[usize] = &[16, 256, 4096];

fn make_recording(len: usize) -> Recording {
    (0..len)
        .map(|i| NoteEvent::new(KeyId::ALL[i % KeyId::ALL.len()], i as u64 * 90))
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_recording");
    for &len in SIZES {
        let rec = make_recording(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &rec, |b, rec| {
            b.iter(|| encode_recording(black_box(rec)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_recording");
    for &len in SIZES {
        let text = encode_recording(&make_recording(len)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            b.iter(|| decode_recording(black_box(text.as_bytes())).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
