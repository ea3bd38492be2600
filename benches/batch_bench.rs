use atlas_files::fileops::{hash_file, FileOps};
use atlas_files::scanner::{scan, ScanOptions};
use atlas_files::types::{FileDescriptor, RenameRequest};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::TempDir;

const MP4_HEADER: [u8; 12] = [0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];

fn write_clip(path: &Path, len: usize) {
    let mut bytes = MP4_HEADER.to_vec();
    bytes.resize(len, 0x5A);
    fs::write(path, bytes).unwrap();
}

fn create_library(seasons: usize, episodes: usize, clip_len: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for s in 0..seasons {
        let season = temp_dir.path().join(format!("season_{}", s));
        fs::create_dir(&season).unwrap();
        for e in 0..episodes {
            write_clip(&season.join(format!("episode_{}.mp4", e)), clip_len);
            fs::write(season.join(format!("episode_{}.srt", e)), "1\n00:00:01,000 --> 00:00:02,000\nHi\n")
                .unwrap();
        }
    }
    temp_dir
}

fn benchmark_scan(c: &mut Criterion) {
    let library = create_library(10, 20, 64 * 1024);
    let mut group = c.benchmark_group("scan");

    for (label, hashes) in [("metadata", false), ("with_hashes", true)] {
        let options = ScanOptions { include_subtitles: true, calculate_hashes: hashes, ..ScanOptions::default() };
        group.bench_function(label, |b| b.iter(|| black_box(scan(library.path(), &options).unwrap())));
    }
    group.finish();
}

fn benchmark_hash(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clip.mp4");
    let len = 16 * 1024 * 1024;
    write_clip(&path, len);

    let mut group = c.benchmark_group("hash_file");
    group.throughput(Throughput::Bytes(len as u64));
    for block_size in [64 * 1024u64, 1024 * 1024, 128 * 1024 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, &bs| {
            b.iter(|| black_box(hash_file(&path, bs)))
        });
    }
    group.finish();
}

fn benchmark_rename_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("rename_all");
    group.sample_size(20);

    for threads in [1usize, 4, 8] {
        let ops = FileOps::new(1024 * 1024, threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &ops, |b, ops| {
            b.iter_batched(
                || {
                    let dir = TempDir::new().unwrap();
                    let requests: Vec<RenameRequest> = (0..200)
                        .map(|i| {
                            let name = format!("clip_{}.mp4", i);
                            write_clip(&dir.path().join(&name), 256 * 1024);
                            let mut file = FileDescriptor::new(name, dir.path().to_str().unwrap());
                            file.size = Some(256 * 1024);
                            RenameRequest { file, new_name: format!("renamed_{}.mp4", i) }
                        })
                        .collect();
                    (dir, requests)
                },
                |(dir, requests)| {
                    black_box(ops.rename_all(requests));
                    dir
                },
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_scan, benchmark_hash, benchmark_rename_batch);
criterion_main!(benches);
