//! Criterion benchmarks for boundary detection.
//!
//! The boundary pattern is re-tested against the whole buffer after every
//! keystroke, so the cost of one scan grows with its length.  These benches
//! measure a full scan of increasing size to keep that growth visible.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench scan_buffer_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use regex::Regex;
use relay_core::ScanBuffer;

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_buffer");
    let boundary = Regex::new(r"^.*\n$").expect("valid pattern");

    for len in [8usize, 13, 32, 128] {
        let keys: Vec<String> = (0..len)
            .map(|i| ((b'0' + (i % 10) as u8) as char).to_string())
            .chain(std::iter::once("\n".to_string()))
            .collect();

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(BenchmarkId::new("line_terminated", len), &keys, |b, keys| {
            b.iter(|| {
                let mut buffer = ScanBuffer::new(boundary.clone());
                let mut emitted = None;
                for key in keys {
                    if let Some(content) = buffer.push(black_box(key)) {
                        emitted = Some(content);
                    }
                }
                emitted
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_scan);
criterion_main!(benches);
