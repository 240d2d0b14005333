use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use regex::Regex;
use sable::buffer::Buffer;
use sable::point::{Direction, Point};

fn setup_buffer() -> Buffer {
    let mut buffer = Buffer::new("bench");
    for i in 0..1000 {
        buffer.append_line(&format!("prefix match_{} suffix", i));
    }
    for _ in 0..1000 {
        buffer.append_line("noise line with no target in it");
    }
    buffer.append_line("needle at the very end");
    buffer
}

fn regex_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex_search");

    let buffer = setup_buffer();
    let tail = Regex::new("needle").unwrap();
    let word = Regex::new(r"match_\d+").unwrap();

    group.bench_function("find_regex_downward_far", |b| {
        b.iter(|| {
            black_box(buffer.find_regex(Point::new(0, 0), &tail, Direction::Down));
        })
    });

    group.bench_function("find_regex_upward", |b| {
        b.iter(|| {
            black_box(buffer.find_regex(Point::new(10, 999), &word, Direction::Up));
        })
    });

    group.finish();
}

fn literal_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("literal_search");

    let buffer = setup_buffer();
    group.bench_function("find_string_downward", |b| {
        b.iter(|| {
            black_box(buffer.find_string(Point::new(0, 0), "match_500", Direction::Down));
        })
    });

    group.finish();
}

fn matching_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_pair");

    let mut buffer = Buffer::new("bench");
    buffer.append_line("int main() {");
    for _ in 0..500 {
        buffer.append_line("    call(arg); // with a comment");
    }
    buffer.append_line("}");

    group.bench_function("brace_across_buffer", |b| {
        b.iter(|| {
            black_box(buffer.matching_pair(Point::new(11, 0), '{'));
        })
    });

    group.finish();
}

criterion_group!(benches, regex_search, literal_search, matching_pair);
criterion_main!(benches);
