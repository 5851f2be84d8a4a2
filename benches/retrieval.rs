use criterion::{Criterion, criterion_group, criterion_main};

use docask::document::Passage;
use docask::index::Bm25Index;

fn synthetic_corpus(n: usize) -> Vec<Passage> {
    let vocab = [
        "retrieval", "ranking", "passage", "corpus", "query", "lexical", "score", "document",
        "context", "citation", "answer", "keyword", "page", "index", "term",
    ];
    (0..n)
        .map(|i| {
            let words: Vec<&str> = (0..24).map(|j| vocab[(i * 7 + j * 3) % vocab.len()]).collect();
            Passage {
                text: words.join(" "),
                document: format!("doc{}.pdf", i % 8),
                page: Some((i % 12) as u32 + 1),
            }
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let passages = synthetic_corpus(2000);
    c.bench_function("bm25_build_2k", |b| {
        b.iter(|| {
            let _ = Bm25Index::build(std::hint::black_box(&passages));
        })
    });
}

fn bench_retrieve(c: &mut Criterion) {
    let passages = synthetic_corpus(2000);
    let index = Bm25Index::build(&passages).unwrap();
    c.bench_function("bm25_retrieve_2k", |b| {
        b.iter(|| {
            let _ = index.retrieve(
                std::hint::black_box(&passages),
                std::hint::black_box("lexical ranking of cited passages"),
                6,
            );
        })
    });
}

criterion_group! {
    name = retrieval_benches;
    config = Criterion::default().sample_size(20);
    targets = bench_build, bench_retrieve
}
criterion_main!(retrieval_benches);
