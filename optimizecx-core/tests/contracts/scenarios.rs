//! End-to-end page-view scenarios through a mounted runtime.

use optimizecx_core::constants::{PRELOAD_ATTRIBUTE, SCRIPT_ID, SPECULATION_RULES_TYPE, STORAGE_KEY};
use optimizecx_core::directive::DirectiveOutcome;
use optimizecx_core::resolver::ResolutionSource;
use optimizecx_core::{OptimizationMode, SpeculationSettings};
use optimizecx_testkit::{page, signal, FakeProbe, SharedStorage, Tab};

fn hydrated(mode: OptimizationMode) -> SpeculationSettings {
    SpeculationSettings {
        optimization_mode: mode,
        has_hydrated: true,
    }
}

/// No override, no persisted record: `none`, hydrated, empty head.
#[test]
fn scenario_a_cold_start_defaults_to_none() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage);
    let runtime = tab.mount();

    let report = runtime.navigate(page("/"), signal(""));
    assert_eq!(*runtime.current(), hydrated(OptimizationMode::None));
    assert_eq!(report.resolution.map(|r| r.source), Some(ResolutionSource::Default));
    assert!(tab.document.scripts().is_empty());
    assert_eq!(storage.writes(), 0);
}

/// `?optimization=prefetch` on first load: persisted, one rules node.
#[test]
fn scenario_b_prefetch_override_installs_rules() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage);
    let runtime = tab.mount();

    runtime.navigate(page("/"), signal("?optimization=prefetch"));
    assert_eq!(runtime.current().optimization_mode, OptimizationMode::Prefetch);
    assert_eq!(storage.value(STORAGE_KEY).as_deref(), Some("prefetch"));

    let scripts = tab.document.scripts();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].id, SCRIPT_ID);
    assert_eq!(scripts[0].script_type, SPECULATION_RULES_TYPE);
    assert!(scripts[0].text.contains(r#"{"source":"document","where":{"href_matches":"/products/.*"},"eagerness":"moderate"}"#));
    assert!(scripts[0].text.contains(r#"{"source":"list","urls":["/cart"]}"#));
}

/// `?optimized=true` alone: `prerender`, persisted.
#[test]
fn scenario_c_legacy_override() {
    let storage = SharedStorage::new();
    let runtime = Tab::open(&storage).mount();

    runtime.navigate(page("/"), signal("?optimized=true"));
    assert_eq!(runtime.current().optimization_mode, OptimizationMode::Prerender);
    assert_eq!(storage.value(STORAGE_KEY).as_deref(), Some("prerender"));
}

/// Preload with same-path/different-query links and an external link.
#[test]
fn scenario_d_preload_hints() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage);
    tab.document
        .set_anchors(["/products/7", "/products/7?ref=x", "https://other.example/"]);
    let runtime = tab.mount();

    runtime.navigate(page("/"), signal("?optimization=preload"));
    assert_eq!(tab.document.hints(PRELOAD_ATTRIBUTE).len(), 2);
    assert!(tab.document.scripts().is_empty(), "preload installs no rules node");
}

/// Another context persists `prerender` while this one runs `none`.
#[test]
fn scenario_e_cross_tab_adoption() {
    let storage = SharedStorage::new();
    let first = Tab::open(&storage);
    let second = Tab::open(&storage);
    let first_runtime = first.mount();
    let second_runtime = second.mount();

    first_runtime.navigate(page("/"), signal(""));
    second_runtime.navigate(page("/cart"), signal(""));
    assert_eq!(first_runtime.current().optimization_mode, OptimizationMode::None);

    second_runtime.navigate(page("/"), signal("?optimization=prerender"));
    assert_eq!(first_runtime.current().optimization_mode, OptimizationMode::Prerender);
    assert!(first.document.script(SCRIPT_ID).is_some());
    assert_eq!(storage.writes(), 1);
}

/// An override persists across loads once removed from the URL.
#[test]
fn override_round_trips_through_storage() {
    let storage = SharedStorage::new();
    {
        let runtime = Tab::open(&storage).mount();
        runtime.navigate(page("/"), signal("?optimization=prerender"));
    }

    let runtime = Tab::open(&storage).mount();
    let report = runtime.navigate(page("/"), signal(""));
    assert_eq!(runtime.current().optimization_mode, OptimizationMode::Prerender);
    assert_eq!(report.resolution.map(|r| r.persisted), Some(false));
    assert_eq!(storage.writes(), 1);
}

/// Unrecognized override leaves the persisted mode and writes nothing.
#[test]
fn unrecognized_override_boundary() {
    let storage = SharedStorage::new();
    storage.seed(STORAGE_KEY, "prefetch");
    let runtime = Tab::open(&storage).mount();
    runtime.navigate(page("/"), signal("?optimization=turbo"));
    assert_eq!(runtime.current().optimization_mode, OptimizationMode::Prefetch);
    assert_eq!(storage.writes(), 0);

    let storage = SharedStorage::new();
    let runtime = Tab::open(&storage).mount();
    runtime.navigate(page("/"), signal("?optimization=turbo"));
    assert_eq!(runtime.current().optimization_mode, OptimizationMode::None);
    assert_eq!(storage.writes(), 0);
}

/// Route changes without a new override skip resolution and the
/// directive sync, but rebuild preload hints for the new page.
#[test]
fn plain_route_change_only_rebuilds_hints() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage);
    tab.document.set_anchors(["/products/1", "/products/2"]);
    let runtime = tab.mount();

    runtime.navigate(page("/"), signal(""));
    runtime.navigate(page("/"), signal("?optimization=preload"));
    assert_eq!(tab.document.hints(PRELOAD_ATTRIBUTE).len(), 2);

    runtime.navigate(page("/products/1"), signal(""));
    tab.document.set_anchors(["/cart"]);
    let report = runtime.navigate(page("/products/2"), signal(""));
    assert!(report.resolution.is_none());
    assert!(report.directive.is_none());
    let hints: Vec<_> = tab
        .document
        .hints(PRELOAD_ATTRIBUTE)
        .into_iter()
        .map(|h| h.href)
        .collect();
    assert_eq!(hints, vec!["/cart"]);
    assert_eq!(storage.writes(), 1);
}

/// A runtime without speculation-rules support still resolves and
/// broadcasts; only the rules node is skipped.
#[test]
fn unsupported_runtime_still_broadcasts() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage).with_probe(FakeProbe::Unsupported);
    let runtime = tab.mount();

    let report = runtime.navigate(page("/"), signal("?optimization=prerender"));
    assert_eq!(report.directive, Some(DirectiveOutcome::Unsupported));
    assert!(runtime.settings().should_prefetch_links());
    assert!(tab.document.scripts().is_empty());
}

/// Walking through every mode keeps at most one rules node and never
/// leaves hints behind outside preload.
#[test]
fn mode_rotation_preserves_head_invariants() {
    let storage = SharedStorage::new();
    let tab = Tab::open(&storage);
    tab.document.set_anchors(["/products/1", "/cart"]);
    let runtime = tab.mount();

    for run in 0..8 {
        let mode = OptimizationMode::for_run(run);
        runtime.navigate(page("/"), signal(&format!("?optimization={mode}")));
        assert!(tab.document.scripts().len() <= 1);
        let hints = tab.document.hints(PRELOAD_ATTRIBUTE).len();
        match mode {
            OptimizationMode::Preload => assert_eq!(hints, 2),
            _ => assert_eq!(hints, 0, "{mode} must not own hints"),
        }
    }
}
