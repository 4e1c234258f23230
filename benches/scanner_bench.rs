//! Benchmarks for file-verifier
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io::Cursor;

const MIB: usize = 1024 * 1024;

fn benchmark_zero_compare(c: &mut Criterion) {
    use file_verifier::content::is_all_zeros;

    let zeros = vec![0u8; 4 * MIB];
    let mut late = vec![0u8; 4 * MIB];
    late[4 * MIB - 1] = 1;

    let mut group = c.benchmark_group("is_all_zeros");
    group.throughput(Throughput::Bytes(zeros.len() as u64));
    group.bench_function("all_zero_4m", |b| {
        b.iter(|| black_box(is_all_zeros(black_box(&zeros))))
    });
    group.bench_function("last_byte_set_4m", |b| {
        b.iter(|| black_box(is_all_zeros(black_box(&late))))
    });
    group.finish();
}

fn benchmark_scanner(c: &mut Criterion) {
    use file_verifier::content::{BlockGeometry, ZeroBlockScanner};

    let geometry = BlockGeometry::default();
    let len = 64 * MIB;

    // Alternate zero and data blocks so both paths are exercised
    let block = geometry.block() as usize;
    let mut data = vec![0u8; len];
    for (i, chunk) in data.chunks_mut(block).enumerate() {
        if i % 2 == 1 {
            chunk.fill(0xa5);
        }
    }

    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(len as u64));

    group.bench_function("mixed_64m", |b| {
        let mut scanner = ZeroBlockScanner::new(geometry);
        b.iter(|| {
            let mut cursor = Cursor::new(&data[..]);
            let report = scanner.scan(&mut cursor, len as u64, || {}).unwrap();
            black_box(report);
        })
    });

    let dense = vec![0xffu8; len];
    group.bench_function("no_zeros_64m", |b| {
        let mut scanner = ZeroBlockScanner::new(geometry);
        b.iter(|| {
            let mut cursor = Cursor::new(&dense[..]);
            let report = scanner.scan(&mut cursor, len as u64, || {}).unwrap();
            black_box(report);
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_zero_compare, benchmark_scanner);
criterion_main!(benches);
