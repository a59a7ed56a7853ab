// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Key metrics:
//   1. Store round-trip — write + read of one definition, per backend
//   2. Warm resolution — get_token_script served from the store
//   3. Definition digest throughput

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use tsengine::core::completion::Dispatcher;
use tsengine::core::engine::Engine;
use tsengine::core::response::ResponseContext;
use tsengine::core::token::TokenContext;
use tsengine::core::types::{DefinitionBlob, Identifier, Metadata};
use tsengine::infra::errors::EngineError;
use tsengine::metadata::MetadataFetcher;
use tsengine::repo::SourceChain;
use tsengine::storage::{
    DefinitionStore, FileDefinitionStore, MemoryDefinitionStore, SqliteDefinitionStore,
};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A definition of roughly the size seen in the wild.
fn sample_definition(kb: usize) -> DefinitionBlob {
    let mut text = String::from("<ts:token xmlns:ts=\"http://tokenscript.org/2020/06/tokenscript\">");
    while text.len() < kb * 1024 {
        text.push_str("<ts:attribute name=\"balance\"><ts:origins/></ts:attribute>");
    }
    text.push_str("</ts:token>");
    DefinitionBlob::from_text(text)
}

fn stores(dir: &TempDir) -> Vec<Arc<dyn DefinitionStore>> {
    vec![
        Arc::new(MemoryDefinitionStore::new()),
        Arc::new(FileDefinitionStore::open(dir.path().join("files"), "bench").expect("file store")),
        Arc::new(
            SqliteDefinitionStore::open(&dir.path().join("bench.db"), "bench").expect("sqlite store"),
        ),
    ]
}

struct NoMetadata;

#[async_trait::async_trait]
impl MetadataFetcher for NoMetadata {
    fn id(&self) -> &str {
        "none"
    }

    async fn fetch(&self, _token: &TokenContext) -> Result<Metadata, EngineError> {
        Err(EngineError::fetch("none", "not used in benchmarks"))
    }
}

// ─── Benchmark: Store round-trip ────────────────────────────────────────────

fn bench_store_roundtrip(c: &mut Criterion) {
    let dir = TempDir::new().expect("tempdir");
    let blob = sample_definition(16);
    let id = Identifier::parse("0xd0d0b327f63a523eed41751e6344dc574b874e02").expect("id");

    let mut group = c.benchmark_group("store_roundtrip");
    for store in stores(&dir) {
        group.bench_with_input(
            BenchmarkId::from_parameter(store.backend()),
            &store,
            |b, store| {
                b.iter(|| {
                    store.write(black_box(&id), black_box(&blob)).expect("write");
                    store.read(black_box(&id)).expect("read")
                })
            },
        );
    }
    group.finish();
}

// ─── Benchmark: Warm resolution ─────────────────────────────────────────────

fn bench_warm_resolution(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let (response, _response_loop) = ResponseContext::channel("bench");
    let store = Arc::new(MemoryDefinitionStore::new());
    let id = Identifier::parse("0x0000").expect("id");
    store.write(&id, &sample_definition(16)).expect("seed");

    let engine = Engine::new(
        store,
        Arc::new(SourceChain::new(Vec::new())),
        Arc::new(NoMetadata),
        Dispatcher::new(runtime.handle().clone(), response),
    );

    c.bench_function("resolve_from_store", |b| {
        b.iter(|| {
            runtime
                .block_on(engine.token_script(black_box(id.clone())))
                .expect("resolve")
        })
    });
}

// ─── Benchmark: Digest ──────────────────────────────────────────────────────

fn bench_digest(c: &mut Criterion) {
    let blob = sample_definition(64);
    c.bench_function("digest_64kb", |b| b.iter(|| black_box(&blob).digest()));
}

criterion_group!(benches, bench_store_roundtrip, bench_warm_resolution, bench_digest);
criterion_main!(benches);
