//! Benchmarks for alignment building and streaming merge.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata::{
    build_vocabulary, chunk_documents, process_corpus, process_stream, Level, PipelineConfig,
};

fn sample_text(size: usize) -> String {
    let sentences = [
        "The quick brown fox jumps over the lazy dog. ",
        "Pack my box with five dozen liquor jugs. ",
        "How vexingly quick daft zebras jump! ",
        "The five boxing wizards jump quickly. ",
        "Sphinx of black quartz, judge my vow. ",
    ];
    let mut text = String::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text.truncate(size);
    while !text.is_char_boundary(text.len()) {
        text.pop();
    }
    text
}

fn bench_one_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_shot");

    for size in [1_000, 10_000, 100_000] {
        let docs = [sample_text(size)];
        let config = PipelineConfig::default().with_levels(&[Level::Byte, Level::Word]);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("byte_word", size), &docs, |b, docs| {
            b.iter(|| process_corpus(black_box(docs), &config).unwrap())
        });
    }

    group.finish();
}

fn bench_streaming_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_merge");

    for size in [10_000, 100_000] {
        let docs = [sample_text(size)];
        let config = PipelineConfig::default();
        let vocab = build_vocabulary(&docs, &config);
        let chunks = chunk_documents(&docs, 4096);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("word", size), &chunks, |b, chunks| {
            b.iter(|| process_stream(black_box(chunks.clone()), &vocab, &config).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_one_shot, bench_streaming_merge);
criterion_main!(benches);
