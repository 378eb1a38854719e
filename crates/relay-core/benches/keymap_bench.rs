//! Criterion benchmarks for the key code → scan text table.
//!
//! Every keystroke from every scanner goes through this lookup, so it should
//! stay a constant-time array index.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::keymap::KeyMapper;

/// Key codes of a typical EAN-13 scan: Shift noise, digits, and Enter.
const BENCH_SCAN_CODES: &[u16] = &[
    42, // KEY_LEFTSHIFT
    5,  // '4'
    2,  // '1'
    11, // '0'
    7,  // '6'
    3,  // '2'
    4,  // '3'
    9,  // '8'
    6,  // '5'
    10, // '9'
    8,  // '7'
    2,  // '1'
    3,  // '2'
    4,  // '3'
    28, // KEY_ENTER
];

fn bench_key_to_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_evdev");

    for (label, code) in [("digit", 2u16), ("enter", 28), ("modifier", 42), ("unmapped", 0xFFFF)] {
        group.bench_with_input(BenchmarkId::new("key_to_text", label), &code, |b, &code| {
            b.iter(|| KeyMapper::key_to_text(black_box(code)))
        });
    }

    group.bench_function("key_to_text_scan_15", |b| {
        b.iter(|| {
            BENCH_SCAN_CODES
                .iter()
                .map(|&code| KeyMapper::key_to_text(black_box(code)))
                .collect::<String>()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_key_to_text);
criterion_main!(benches);
