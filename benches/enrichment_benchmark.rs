// Enrichment Pipeline Benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;
use waste_incident_platform::ml::{
    rank_by_similarity, HashingEmbedder, KeywordExtractor, WasteClassifier,
};

const REPORT: &str = "Overflowing bins behind the night market, plastic bags and food \
                      containers spilling onto the pavement next to broken glass bottles";

fn embedding_encode(c: &mut Criterion) {
    let embedder = HashingEmbedder::new(384);
    let mut group = c.benchmark_group("hashing_embedder");

    for words in [8usize, 32, 128].iter() {
        let text = REPORT
            .split_whitespace()
            .cycle()
            .take(*words)
            .collect::<Vec<_>>()
            .join(" ");

        group.throughput(Throughput::Elements(*words as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| embedder.encode(black_box(text)));
        });
    }

    group.finish();
}

fn keyword_extraction(c: &mut Criterion) {
    let extractor = KeywordExtractor::new();

    c.bench_function("keyword_extract_top5", |b| {
        b.iter(|| extractor.extract(black_box(REPORT), 5));
    });
}

fn classification(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let classifier = rt
        .block_on(WasteClassifier::new(Arc::new(HashingEmbedder::new(384))))
        .unwrap();

    c.bench_function("classify_description", |b| {
        b.to_async(&rt)
            .iter(|| async { classifier.classify(black_box(REPORT)).await });
    });

    c.bench_function("classify_by_keywords", |b| {
        b.iter(|| WasteClassifier::classify_by_keywords(black_box(REPORT)));
    });
}

fn similarity_ranking(c: &mut Criterion) {
    let embedder = HashingEmbedder::new(384);
    let query = embedder.encode(REPORT);
    let mut group = c.benchmark_group("rank_by_similarity");

    for size in [100usize, 1_000, 10_000].iter() {
        let corpus: Vec<(usize, Vec<f32>)> = (0..*size)
            .map(|i| (i, embedder.encode(&format!("{} report {}", REPORT, i % 97))))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            b.iter(|| {
                rank_by_similarity(
                    black_box(&query),
                    corpus.iter().map(|(id, v)| (*id, v.as_slice())),
                    0.75,
                    5,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    embedding_encode,
    keyword_extraction,
    classification,
    similarity_ranking
);
criterion_main!(benches);
