use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use sable::buffer::Buffer;
use sable::point::Point;

fn setup_buffer(lines: usize) -> Buffer {
    let mut buffer = Buffer::new("bench");
    for i in 0..lines {
        buffer.append_line(&format!("line number {} with some padding text", i));
    }
    buffer
}

fn buffer_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_insertion");

    group.bench_function("insert_char_mid_line", |b| {
        b.iter_batched(
            || setup_buffer(100),
            |mut buffer| {
                for i in 0..100 {
                    buffer.insert_char(Point::new(5, i), black_box('x'));
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    static TEXT: &str = "The quick brown fox\njumps over\nthe lazy dog.\n";
    group.throughput(Throughput::Bytes(TEXT.len() as u64));
    group.bench_function("insert_multi_line_string", |b| {
        b.iter_batched(
            || setup_buffer(100),
            |mut buffer| {
                buffer.insert_string(Point::new(3, 50), black_box(TEXT));
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn buffer_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_removal");

    group.bench_function("remove_across_lines", |b| {
        b.iter_batched(
            || setup_buffer(200),
            |mut buffer| {
                // eat five lines' worth of bytes
                buffer.remove_string(Point::new(0, 10), black_box(180));
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("remove_char_sweep", |b| {
        b.iter_batched(
            || setup_buffer(10),
            |mut buffer| {
                for _ in 0..20 {
                    buffer.remove_char(Point::new(0, 0));
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn buffer_duplication(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_duplication");

    let buffer = setup_buffer(1000);
    group.bench_function("dupe_string_span", |b| {
        b.iter(|| {
            black_box(buffer.dupe_string(Point::new(2, 10), Point::new(5, 900)));
        })
    });

    group.bench_function("compute_length_span", |b| {
        b.iter(|| {
            black_box(buffer.compute_length(Point::new(2, 10), Point::new(5, 900)));
        })
    });

    group.finish();
}

criterion_group!(benches, buffer_insertion, buffer_removal, buffer_duplication);
criterion_main!(benches);
