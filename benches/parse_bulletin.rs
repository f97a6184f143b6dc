//! Benchmarks for bulletin parsing and alignment.
//!
//! Run with: cargo bench --bench parse_bulletin

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use mosobs::decoder::decode_row;
use mosobs::{Aligner, BulletinParser, Model, MosConfig};
use std::path::Path;
use std::sync::Arc;

const GFS_18Z: &str = include_str!("../tests/data/KAUS/GFS/KAUS.01012009.GFS-MAV.18Z");
const GFS_00Z: &str = include_str!("../tests/data/KAUS/GFS/KAUS.01012009.GFS-MAV.00Z");

fn bench_decode_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_row");
    let width = " HR   00 03 06 09 12 15 18 21 00 03 06 09 12 15 18 21 00 03 06 09 12 15 18"
        .trim()
        .len();

    group.bench_function("integer_row", |b| {
        b.iter(|| {
            decode_row(
                black_box(" TMP  44 51 58 40 47 54 61 43 50 57 64 46 53 60 42 49 56 63 45 52 59 41 48"),
                width,
            )
        })
    });

    group.bench_function("sparse_probability_row", |b| {
        b.iter(|| {
            decode_row(
                black_box(" P12              56           8          60          12          64"),
                width,
            )
        })
    });
}

fn bench_parse_bulletin(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_bulletin");
    let parser = BulletinParser::new(Arc::new(MosConfig::default()));

    group.throughput(Throughput::Bytes(GFS_18Z.len() as u64));
    group.bench_function("gfs_18z", |b| {
        b.iter(|| parser.parse_str(black_box(GFS_18Z)))
    });

    group.bench_function("gfs_00z", |b| {
        b.iter(|| parser.parse_str(black_box(GFS_00Z)))
    });
}

fn bench_align(c: &mut Criterion) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
    let aligner = Aligner::new(Arc::new(MosConfig::default().with_data_root(root)));
    let date = chrono::NaiveDate::from_ymd_opt(2009, 1, 2).unwrap_or_default();

    c.bench_function("align_gfs_nam", |b| {
        b.iter(|| aligner.align("KAUS", black_box(date), &[Model::Gfs, Model::Nam]))
    });
}

criterion_group!(benches, bench_decode_row, bench_parse_bulletin, bench_align);
criterion_main!(benches);
