use biosearch_core::snippet::match_snippet;
use biosearch_core::tokenizer::tokenize;
use criterion::{criterion_group, criterion_main, Criterion};

const PARAGRAPH: &str = "Spaceflight-induced microgravity alters gene expression in \
murine osteoblasts, reducing mineralization and shifting the balance between bone \
formation and resorption. Transcriptomic profiling across 28 days of exposure \
identified 1,247 differentially expressed genes, with enrichment in oxidative \
phosphorylation, cytoskeletal remodeling, and apoptosis pathways. ";

fn bench_tokenize(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(50);
    c.bench_function("tokenize_article", |b| b.iter(|| tokenize(&text)));
}

fn bench_snippet(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(50);
    let terms = vec!["apoptosis".to_string(), "osteoblasts".to_string()];
    c.bench_function("match_snippet", |b| b.iter(|| match_snippet(&text, &terms)));
}

criterion_group!(benches, bench_tokenize, bench_snippet);
criterion_main!(benches);
