use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use lookups::{CacheStore, EntityKind, InMemorySessionStore, LookupResolver};
use record_store::InMemoryRecordService;

fn bench_cached_name_map(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = Arc::new(InMemoryRecordService::with_sample_farm());
    let resolver = LookupResolver::new(service, Arc::new(CacheStore::in_memory()));
    rt.block_on(resolver.collection(EntityKind::FieldsAndBeds))
        .unwrap();

    c.bench_function("lookups/cached_field_or_bed_name_map", |b| {
        b.iter(|| {
            rt.block_on(async {
                resolver.field_or_bed_name_map().await.unwrap();
            });
        });
    });
}

fn bench_cold_fetch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = Arc::new(InMemoryRecordService::with_sample_farm());

    c.bench_function("lookups/cold_fetch_all_kinds", |b| {
        b.iter(|| {
            rt.block_on(async {
                let resolver =
                    LookupResolver::new(service.clone(), Arc::new(CacheStore::in_memory()));
                for kind in EntityKind::ALL {
                    resolver.collection(kind).await.unwrap();
                }
            });
        });
    });
}

fn bench_session_rehydrate(c: &mut Criterion) {
    let session = Arc::new(InMemorySessionStore::new());
    let records = record_store::sample::sample_farm();
    CacheStore::new(session.clone())
        .set("fields_and_beds", records)
        .unwrap();

    c.bench_function("lookups/session_rehydrate", |b| {
        b.iter(|| {
            let cache = CacheStore::new(session.clone());
            cache
                .get::<Vec<record_store::Record>>("fields_and_beds")
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_cached_name_map,
    bench_cold_fetch,
    bench_session_rehydrate
);
criterion_main!(benches);
