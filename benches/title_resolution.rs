//! Benchmarks for title resolution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tm_catalog::text::{count_non_empty_lines, meaningful_line, trimmed_lines};
use tm_catalog::titles::{TitleMapping, TitlePipeline};

const BO: &str = "༄༅། །\n\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nའདི་སྐད་བདག་གིས་ཐོས་པ་དུས་གཅིག་ན།\n";
const EN: &str = "\n\nThe Blessed One\nThus did I hear at one time.\nEnd.";

fn reference_mapping(n: usize) -> TitleMapping {
    TitleMapping::build((1..=n).map(|i| format!("Toh_{i}-Work_Number_{i}-v1.tmx")))
}

fn bench_mapping_lookup(c: &mut Criterion) {
    let mapping = reference_mapping(5_000);
    c.bench_function("mapping_lookup_5k", |bench| {
        bench.iter(|| black_box(mapping.lookup(black_box("TMtoh4999_84000"))))
    });
}

fn bench_pipeline_mapped(c: &mut Criterion) {
    let mut mapping = reference_mapping(5_000);
    mapping.insert("toh9999", "The Blessed One");
    let mut pipeline = TitlePipeline::new(mapping, None);
    c.bench_function("resolve_mapped", |bench| {
        bench.iter(|| black_box(pipeline.resolve("TMtoh9999_84000", BO, EN)))
    });
}

fn bench_pipeline_fallback(c: &mut Criterion) {
    let mut pipeline = TitlePipeline::new(TitleMapping::default(), None);
    c.bench_function("resolve_position_fallback", |bench| {
        bench.iter(|| black_box(pipeline.resolve("TMICD6_LH", BO, EN)))
    });
}

fn bench_text_scan(c: &mut Criterion) {
    let big = BO.repeat(2_000);
    c.bench_function("count_non_empty_8k_lines", |bench| {
        bench.iter(|| black_box(count_non_empty_lines(&big)))
    });
    let lines = trimmed_lines(&big);
    c.bench_function("meaningful_line_8k_lines", |bench| {
        bench.iter(|| black_box(meaningful_line(&lines)))
    });
}

criterion_group!(
    benches,
    bench_mapping_lookup,
    bench_pipeline_mapped,
    bench_pipeline_fallback,
    bench_text_scan
);
criterion_main!(benches);
