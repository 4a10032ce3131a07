//! Integration tests for the catalog sync engine.
//!
//! Every test writes the embedded catalog into a fresh in-memory store and
//! checks what the store holds afterwards.

use std::sync::{Arc, Mutex};

use electroshop_catalog::{FullImportOptions, MemoryStore, ProductQuery, SyncOptions};
use electroshop_core::{Category, ProductId};
use electroshop_integration_tests::TestContext;

fn context() -> TestContext {
    TestContext::new().expect("embedded catalog should load")
}

fn batched_context(batch_size: usize) -> TestContext {
    TestContext::with_store(MemoryStore::new(), SyncOptions { batch_size })
        .expect("embedded catalog should load")
}

fn id(raw: &str) -> ProductId {
    ProductId::parse(raw).expect("valid product id")
}

// =============================================================================
// Import Tests
// =============================================================================

#[tokio::test]
async fn test_category_import_writes_exact_records() {
    for category in Category::ALL {
        let ctx = context();
        let canonical = ctx.catalog.by_category(category);

        let result = ctx.engine.import_by_category(category).await;
        assert!(result.success, "{category}: {}", result.message);
        assert_eq!(result.count, canonical.len(), "{category}");
        assert_eq!(ctx.store.len(), canonical.len(), "{category}");

        for product in canonical {
            let stored = ctx
                .store
                .document(&product.id)
                .unwrap_or_else(|| panic!("{} should be stored", product.id));
            assert_eq!(&stored.product, product);
        }
    }
}

#[tokio::test]
async fn test_full_import_with_clear_then_verify() {
    let ctx = context();
    // Stale data from a previous run
    assert!(ctx.engine.import_by_category(Category::Pc).await.success);

    let result = ctx.engine.full_import(true).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.count, ctx.canonical_len());

    let verify = ctx.engine.verify().await;
    assert!(verify.success);
    let stats = verify.stats.expect("verify should report stats");
    assert_eq!(stats.total, ctx.canonical_len());
}

#[tokio::test]
async fn test_imported_price_is_exact() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);

    let result = ctx
        .gateway
        .query(&ProductQuery::new().category(Category::Cameras))
        .await;
    assert!(!result.using_fallback);
    let kit = result
        .records
        .iter()
        .find(|p| p.id.as_str() == "hik-001")
        .expect("hik-001 should be listed");
    assert_eq!(kit.price.to_string(), "1899.99");
}

#[tokio::test]
async fn test_full_import_records_provenance() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);

    let docs = ctx.store.snapshot();
    assert_eq!(docs.len(), ctx.canonical_len());
    let run = docs.first().and_then(|d| d.provenance.sync_run_id);
    assert!(run.is_some());
    assert!(docs.iter().all(|d| d.provenance.sync_run_id == run));
    assert!(docs.iter().all(|d| d.provenance.imported_at.is_some()));
}

// =============================================================================
// Clear Tests
// =============================================================================

#[tokio::test]
async fn test_clear_all_is_idempotent() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);

    let first = ctx.engine.clear_all().await;
    assert!(first.success);
    assert_eq!(first.count, ctx.canonical_len());

    let second = ctx.engine.clear_all().await;
    assert!(second.success);
    assert_eq!(second.count, 0);
    assert!(ctx.store.is_empty());
}

// =============================================================================
// Update Tests
// =============================================================================

#[tokio::test]
async fn test_update_covers_every_record() {
    let ctx = context();
    assert!(ctx.engine.import_by_category(Category::Solaire).await.success);
    let solaire = ctx.catalog.by_category(Category::Solaire).len();

    let result = ctx.engine.update_changed().await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.added + result.updated, ctx.canonical_len());
    assert_eq!(result.updated, solaire);
    assert_eq!(ctx.store.len(), ctx.canonical_len());
}

#[tokio::test]
async fn test_update_overwrites_remote_edits() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);

    let kit = id("hik-001");
    let mut edited = ctx.store.document(&kit).expect("stored");
    edited.product.name = "Edited remotely".to_string();
    ctx.store.insert_raw(edited);

    let result = ctx.engine.update_changed().await;
    assert!(result.success);
    assert_eq!(result.added, 0);
    assert_eq!(result.unchanged, ctx.canonical_len() - 1);

    let restored = ctx.store.document(&kit).expect("stored");
    let canonical = ctx.catalog.get(&kit).expect("canonical");
    assert_eq!(restored.product.name, canonical.name);
    assert!(restored.provenance.last_modified.is_some());
}

// =============================================================================
// Batching Tests
// =============================================================================

#[tokio::test]
async fn test_import_splits_into_batches() {
    let ctx = batched_context(5);
    let before = ctx.store.commit_count();

    let result = ctx.engine.full_import(false).await;
    assert!(result.success);
    assert_eq!(
        ctx.store.commit_count() - before,
        ctx.canonical_len().div_ceil(5)
    );
}

#[tokio::test]
async fn test_partial_failure_reports_committed_count() {
    let ctx = batched_context(5);
    ctx.store.fail_after_commits(2);

    let result = ctx.engine.full_import(false).await;
    assert!(!result.success);
    assert_eq!(result.count, 10);
    assert_eq!(ctx.store.len(), 10);
}

#[tokio::test]
async fn test_unreachable_store_fails_without_writes() {
    let ctx = context();
    ctx.store.set_available(false);

    let result = ctx.engine.full_import(true).await;
    assert!(!result.success);
    assert_eq!(result.count, 0);

    ctx.store.set_available(true);
    assert!(ctx.store.is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test]
async fn test_concurrent_writers_are_serialized() {
    let ctx = batched_context(2);

    let imports: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&ctx.engine);
            tokio::spawn(async move { engine.full_import(true).await })
        })
        .collect();
    let clear = {
        let engine = Arc::clone(&ctx.engine);
        tokio::spawn(async move { engine.clear_all().await })
    };

    for handle in imports {
        let result = handle.await.expect("task should not panic");
        assert!(result.success);
        assert_eq!(result.count, ctx.canonical_len());
    }
    assert!(clear.await.expect("task should not panic").success);

    // Whatever ran last, the store holds a whole run, never a mix.
    let held = ctx.store.len();
    assert!(held == 0 || held == ctx.canonical_len(), "held {held}");
}

#[tokio::test]
async fn test_concurrent_import_and_update() {
    let ctx = batched_context(3);

    let (imported, updated) =
        tokio::join!(ctx.engine.full_import(true), ctx.engine.update_changed());
    assert!(imported.success);
    assert!(updated.success);
    assert_eq!(updated.added + updated.updated, ctx.canonical_len());
    assert_eq!(ctx.store.len(), ctx.canonical_len());
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_pipeline_heals_empty_store() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);
    assert!(ctx.engine.clear_all().await.success);

    let phases = Mutex::new(Vec::new());
    let result = ctx
        .engine
        .perform_full_import(
            FullImportOptions {
                clear_existing: true,
                category: None,
            },
            |phase| {
                phases
                    .lock()
                    .expect("phase log")
                    .push(phase.to_string());
            },
        )
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.cleared, 0);
    assert_eq!(result.imported, ctx.canonical_len());
    assert_eq!(
        result.stats.expect("pipeline stats").total,
        ctx.canonical_len()
    );
    let phases = phases.into_inner().expect("phase log");
    assert_eq!(phases.first().map(String::as_str), Some("Clearing remote store"));
    assert_eq!(phases.last().map(String::as_str), Some("Done"));
}

#[tokio::test]
async fn test_pipeline_single_category() {
    let ctx = context();
    assert!(ctx.engine.full_import(false).await.success);

    let result = ctx
        .engine
        .perform_full_import(
            FullImportOptions {
                clear_existing: true,
                category: Some(Category::Incendie),
            },
            |_| {},
        )
        .await;

    let incendie = ctx.catalog.by_category(Category::Incendie).len();
    assert!(result.success, "{}", result.message);
    assert_eq!(result.cleared, ctx.canonical_len());
    assert_eq!(result.imported, incendie);
    assert_eq!(ctx.store.len(), incendie);
}
