//! Contracts: speculation-rules node reconciliation.

use optimizecx_core::constants::{SCRIPT_ID, SPECULATION_RULES_TYPE, TELEMETRY_TAG};
use optimizecx_core::directive::{DirectiveOutcome, DirectiveSynchronizer};
use optimizecx_core::{OptimizationMode, SpeculationConfig, SpeculationSettings};
use optimizecx_testkit::{FakeDocument, FakeProbe, RecordingTelemetry};

struct Fixture {
    sync: DirectiveSynchronizer,
    document: FakeDocument,
    telemetry: RecordingTelemetry,
}

impl Fixture {
    fn new() -> Self {
        Self {
            sync: DirectiveSynchronizer::new(SpeculationConfig::default()),
            document: FakeDocument::new(),
            telemetry: RecordingTelemetry::default(),
        }
    }

    fn run(&self, mode: OptimizationMode, probe: FakeProbe) -> DirectiveOutcome {
        let mut document = self.document.clone();
        self.sync.sync_mode(mode, &mut document, &probe, &self.telemetry)
    }
}

#[test]
fn repeated_sync_mutates_head_once() {
    let fx = Fixture::new();
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Supported), DirectiveOutcome::Created);
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Supported), DirectiveOutcome::Unchanged);
    assert_eq!(fx.document.mutations(), 1);
}

#[test]
fn created_node_carries_identity_and_type() {
    let fx = Fixture::new();
    fx.run(OptimizationMode::Prerender, FakeProbe::Supported);
    let node = fx.document.script(SCRIPT_ID).expect("rules node installed");
    assert_eq!(node.script_type, SPECULATION_RULES_TYPE);
    assert!(node.text.starts_with(r#"{"prerender":"#));
    assert!(node.text.contains(r#""eagerness":"immediate""#));
}

#[test]
fn mode_switch_updates_in_place() {
    let fx = Fixture::new();
    fx.run(OptimizationMode::Prefetch, FakeProbe::Supported);
    assert_eq!(fx.run(OptimizationMode::Prerender, FakeProbe::Supported), DirectiveOutcome::Updated);

    let scripts = fx.document.scripts();
    assert_eq!(scripts.len(), 1, "at most one rules node");
    assert!(scripts[0].text.starts_with(r#"{"prerender":"#));
}

#[test]
fn non_declarative_modes_remove_the_node() {
    for mode in [OptimizationMode::None, OptimizationMode::Preload] {
        let fx = Fixture::new();
        fx.run(OptimizationMode::Prefetch, FakeProbe::Supported);
        assert_eq!(fx.run(mode, FakeProbe::Supported), DirectiveOutcome::Removed);
        assert!(fx.document.scripts().is_empty(), "{mode} must leave no rules node");
        assert_eq!(fx.run(mode, FakeProbe::Supported), DirectiveOutcome::Absent);
    }
}

#[test]
fn unsupported_runtime_installs_nothing() {
    let fx = Fixture::new();
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Unsupported), DirectiveOutcome::Unsupported);
    assert!(fx.document.scripts().is_empty());
    assert_eq!(fx.document.mutations(), 0);
}

#[test]
fn unsupported_runtime_removes_stale_node() {
    let fx = Fixture::new();
    fx.run(OptimizationMode::Prefetch, FakeProbe::Supported);
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Unsupported), DirectiveOutcome::Removed);
    assert!(fx.document.scripts().is_empty());
}

#[test]
fn broken_capability_detection_degrades_to_unsupported() {
    let fx = Fixture::new();
    assert_eq!(fx.run(OptimizationMode::Prerender, FakeProbe::Broken), DirectiveOutcome::Unsupported);
    assert!(fx.document.scripts().is_empty());
}

#[test]
fn pending_settings_touch_nothing() {
    let fx = Fixture::new();
    let mut document = fx.document.clone();
    let pending = SpeculationSettings {
        optimization_mode: OptimizationMode::Prefetch,
        has_hydrated: false,
    };
    let outcome = fx.sync.sync(pending, &mut document, &FakeProbe::Supported, &fx.telemetry);
    assert_eq!(outcome, DirectiveOutcome::Pending);
    assert_eq!(fx.document.mutations(), 0);
    assert!(fx.telemetry.tags().is_empty());
}

#[test]
fn mode_is_tagged_on_every_pass() {
    let fx = Fixture::new();
    fx.run(OptimizationMode::None, FakeProbe::Supported);
    fx.run(OptimizationMode::Preload, FakeProbe::Supported);
    assert_eq!(
        fx.telemetry.tags(),
        vec![
            (TELEMETRY_TAG.to_string(), "none".to_string()),
            (TELEMETRY_TAG.to_string(), "preload".to_string()),
        ]
    );
}

#[test]
fn telemetry_failure_does_not_block_install() {
    let fx = Fixture::new();
    fx.telemetry.fail(true);
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Supported), DirectiveOutcome::Created);
}

#[test]
fn mutation_failure_is_swallowed() {
    let fx = Fixture::new();
    fx.document.fail_mutations(true);
    assert_eq!(fx.run(OptimizationMode::Prefetch, FakeProbe::Supported), DirectiveOutcome::Failed);
    assert!(fx.document.scripts().is_empty());
}
