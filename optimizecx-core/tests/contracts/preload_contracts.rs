//! Contracts: preload hint teardown-and-rebuild.

use optimizecx_core::constants::PRELOAD_ATTRIBUTE;
use optimizecx_core::preload::PreloadReconciler;
use optimizecx_core::{OptimizationMode, SpeculationConfig, SpeculationSettings};
use optimizecx_testkit::{page, FakeDocument, FakeNavigation};

fn hydrated(mode: OptimizationMode) -> SpeculationSettings {
    SpeculationSettings {
        optimization_mode: mode,
        has_hydrated: true,
    }
}

struct Fixture {
    reconciler: PreloadReconciler,
    document: FakeDocument,
    navigation: FakeNavigation,
}

impl Fixture {
    fn new() -> Self {
        Self {
            reconciler: PreloadReconciler::new(&SpeculationConfig::default()),
            document: FakeDocument::new(),
            navigation: FakeNavigation::default(),
        }
    }

    fn run(&self, settings: SpeculationSettings, path: &str) -> optimizecx_core::preload::PreloadOutcome {
        let mut document = self.document.clone();
        self.reconciler
            .reconcile(settings, &page(path), &mut document, &self.navigation)
    }

    fn hinted_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .document
            .hints(PRELOAD_ATTRIBUTE)
            .into_iter()
            .map(|h| h.href)
            .collect();
        paths.sort();
        paths
    }
}

#[test]
fn same_path_different_query_yields_two_hints() {
    let fx = Fixture::new();
    fx.document
        .set_anchors(["/products/7", "/products/7?ref=x", "https://other.example/"]);
    fx.run(hydrated(OptimizationMode::Preload), "/");
    assert_eq!(fx.hinted_paths(), vec!["/products/7", "/products/7?ref=x"]);
}

#[test]
fn hint_count_equals_distinct_internal_paths() {
    let fx = Fixture::new();
    fx.document.set_anchors([
        "/products/1",
        "https://shop.example/products/1",
        "/products/1#reviews",
        "products/2",
        "//shop.example/cart",
        "#top",
        "mailto:help@shop.example",
        "javascript:void(0)",
        "http://[::1",
        "https://cdn.example/img.png",
    ]);
    let outcome = fx.run(hydrated(OptimizationMode::Preload), "/");
    assert_eq!(fx.hinted_paths(), vec!["/cart", "/products/1", "/products/2"]);
    assert_eq!(outcome.hinted.len(), 3);

    let mut warmed = fx.navigation.warmed();
    warmed.sort();
    assert_eq!(warmed, fx.hinted_paths(), "every hinted path is warmed once");
}

#[test]
fn hints_carry_fetch_attributes() {
    let fx = Fixture::new();
    fx.document.set_anchors(["/cart"]);
    fx.run(hydrated(OptimizationMode::Preload), "/");
    let hints = fx.document.hints(PRELOAD_ATTRIBUTE);
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].rel, "preload");
    assert_eq!(hints[0].destination, "fetch");
    assert_eq!(hints[0].cross_origin, "anonymous");
    assert_eq!(hints[0].fetch_priority, "high");
}

#[test]
fn page_change_leaves_no_orphans() {
    let fx = Fixture::new();
    fx.document.set_anchors(["/products/1", "/products/2", "/cart"]);
    fx.run(hydrated(OptimizationMode::Preload), "/");

    fx.document.set_anchors(["/checkout"]);
    let outcome = fx.run(hydrated(OptimizationMode::Preload), "/cart");
    assert_eq!(outcome.removed, 3);
    assert_eq!(fx.hinted_paths(), vec!["/checkout"]);
}

#[test]
fn leaving_preload_tears_everything_down() {
    let fx = Fixture::new();
    fx.document.set_anchors(["/products/1", "/cart"]);
    fx.run(hydrated(OptimizationMode::Preload), "/");

    for mode in [OptimizationMode::None, OptimizationMode::Prefetch, OptimizationMode::Prerender] {
        fx.run(hydrated(OptimizationMode::Preload), "/");
        let outcome = fx.run(hydrated(mode), "/");
        assert_eq!(outcome.removed, 2);
        assert!(fx.hinted_paths().is_empty(), "{mode} must own no hints");
    }
}

#[test]
fn unhydrated_pass_only_cleans_up() {
    let fx = Fixture::new();
    fx.document.set_anchors(["/cart"]);
    let pending = SpeculationSettings {
        optimization_mode: OptimizationMode::Preload,
        has_hydrated: false,
    };
    let outcome = fx.run(pending, "/");
    assert!(outcome.hinted.is_empty());
    assert!(fx.navigation.warmed().is_empty());
}

#[test]
fn page_without_internal_links_is_a_no_op() {
    let fx = Fixture::new();
    fx.document.set_anchors(["https://other.example/", "tel:+15550100"]);
    let outcome = fx.run(hydrated(OptimizationMode::Preload), "/");
    assert_eq!(outcome, Default::default());
    assert_eq!(fx.document.mutations(), 0);
    assert!(fx.navigation.warmed().is_empty());
}

#[test]
fn router_rejection_still_installs_hint() {
    let fx = Fixture::new();
    fx.navigation.reject(true);
    fx.document.set_anchors(["/products/3", "/cart"]);
    let outcome = fx.run(hydrated(OptimizationMode::Preload), "/");
    assert_eq!(outcome.warm_failures, 2);
    assert_eq!(fx.hinted_paths(), vec!["/cart", "/products/3"]);
}

#[test]
fn scan_failure_yields_no_hints() {
    let fx = Fixture::new();
    fx.document.set_anchors(["/cart"]);
    fx.document.fail_scan(true);
    let outcome = fx.run(hydrated(OptimizationMode::Preload), "/");
    assert!(outcome.hinted.is_empty());
}
