//! Contracts: mode resolution precedence and persistence.

use optimizecx_core::constants::STORAGE_KEY;
use optimizecx_core::resolver::{ModeResolver, ResolutionSource, ResolverState};
use optimizecx_core::OptimizationMode;
use optimizecx_testkit::{signal, SharedStorage};

fn resolve(query: &str, storage: &SharedStorage) -> (OptimizationMode, ResolutionSource) {
    let mut resolver = ModeResolver::new(STORAGE_KEY);
    let mut context = storage.context();
    let r = resolver.resolve(&signal(query), &mut context);
    assert_eq!(resolver.state(), ResolverState::Hydrated(r.mode));
    (r.mode, r.source)
}

#[test]
fn every_mode_name_is_accepted_as_override() {
    for mode in OptimizationMode::ALL {
        let storage = SharedStorage::new();
        let (resolved, source) = resolve(&format!("?optimization={mode}"), &storage);
        assert_eq!(resolved, mode);
        assert_eq!(source, ResolutionSource::Override);
        assert_eq!(storage.value(STORAGE_KEY).as_deref(), Some(mode.as_str()));
        assert_eq!(storage.writes(), 1, "exactly one write for override {mode}");
    }
}

#[test]
fn legacy_true_resolves_prerender_and_persists() {
    let storage = SharedStorage::new();
    assert_eq!(
        resolve("?optimized=true", &storage),
        (OptimizationMode::Prerender, ResolutionSource::Override)
    );
    assert_eq!(storage.value(STORAGE_KEY).as_deref(), Some("prerender"));
}

#[test]
fn legacy_false_resolves_none_and_persists() {
    let storage = SharedStorage::new();
    storage.seed(STORAGE_KEY, "prefetch");
    assert_eq!(
        resolve("?optimized=false", &storage),
        (OptimizationMode::None, ResolutionSource::Override)
    );
    assert_eq!(storage.value(STORAGE_KEY).as_deref(), Some("none"));
}

#[test]
fn unrecognized_override_falls_through_to_persisted() {
    let storage = SharedStorage::new();
    storage.seed(STORAGE_KEY, "preload");
    assert_eq!(
        resolve("?optimization=turbo", &storage),
        (OptimizationMode::Preload, ResolutionSource::Persisted)
    );
    assert_eq!(storage.writes(), 0);
}

#[test]
fn unrecognized_override_with_empty_storage_is_none() {
    let storage = SharedStorage::new();
    assert_eq!(
        resolve("?optimization=turbo", &storage),
        (OptimizationMode::None, ResolutionSource::Default)
    );
    assert_eq!(storage.writes(), 0);
    assert_eq!(storage.value(STORAGE_KEY), None);
}

#[test]
fn corrupted_persisted_record_is_ignored() {
    let storage = SharedStorage::new();
    storage.seed(STORAGE_KEY, "PRERENDER");
    assert_eq!(
        resolve("", &storage),
        (OptimizationMode::None, ResolutionSource::Default)
    );
}

#[test]
fn failed_write_keeps_override_for_this_page_view() {
    let storage = SharedStorage::new();
    storage.fail_writes(true);
    assert_eq!(
        resolve("?optimization=prefetch", &storage),
        (OptimizationMode::Prefetch, ResolutionSource::Override)
    );
    assert_eq!(storage.value(STORAGE_KEY), None);
}
