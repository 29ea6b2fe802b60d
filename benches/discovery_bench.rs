use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use tempfile::TempDir;
use video2mp3::discovery::Discoverer;

fn create_test_library(size: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for i in 0..size {
        let dir = root.join(format!("Season {:02}/Disc {}", i % 10, i % 3));
        fs::create_dir_all(&dir).unwrap();

        // Mix of videos and files that must be skipped
        let name = match i % 5 {
            0 => format!("episode_{i}.mp4"),
            1 => format!("episode_{i}.MKV"),
            2 => format!("episode_{i}.avi"),
            3 => format!("episode_{i}.mov"),
            _ => format!("episode_{i}.srt"),
        };
        fs::write(dir.join(name), "").unwrap();
    }

    temp_dir
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    for size in [100, 1000] {
        let library = create_test_library(size);
        let discoverer = Discoverer::new(library.path().to_path_buf(), &[]).unwrap();

        group.bench_function(format!("count_{size}"), |b| {
            b.iter(|| black_box(discoverer.count().unwrap()))
        });

        let excluding =
            Discoverer::new(library.path().to_path_buf(), &["Season 0[0-4]/*".to_string()])
                .unwrap();
        group.bench_function(format!("count_with_exclude_{size}"), |b| {
            b.iter(|| black_box(excluding.count().unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_discovery);
criterion_main!(benches);
