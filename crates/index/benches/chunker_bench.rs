//! Benchmarks for paragraph chunking
//!
//! Run with: cargo bench -p index

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use index::{Chunker, ChunkerConfig};

fn generate_document(paragraphs: usize, paragraph_chars: usize) -> String {
  let sentence = "Retrieval quality depends on how documents are chunked before embedding. ";
  (0..paragraphs)
    .map(|_| sentence.repeat(paragraph_chars / sentence.len() + 1)[..paragraph_chars].to_string())
    .collect::<Vec<_>>()
    .join("\n\n")
}

fn bench_short_paragraphs(c: &mut Criterion) {
  let mut group = c.benchmark_group("chunk_short_paragraphs");
  let chunker = Chunker::new(ChunkerConfig::default()).unwrap();

  for paragraphs in [10, 100, 1000].iter() {
    let doc = generate_document(*paragraphs, 400);
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &doc, |b, doc| {
      b.iter(|| chunker.chunk(black_box(doc)));
    });
  }

  group.finish();
}

fn bench_long_paragraph_windows(c: &mut Criterion) {
  let mut group = c.benchmark_group("chunk_long_paragraph");
  let chunker = Chunker::new(ChunkerConfig::default()).unwrap();

  for chars in [5_000, 50_000, 500_000].iter() {
    let doc = generate_document(1, *chars);
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(chars), &doc, |b, doc| {
      b.iter(|| chunker.chunk(black_box(doc)));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_short_paragraphs, bench_long_paragraph_windows);
criterion_main!(benches);
