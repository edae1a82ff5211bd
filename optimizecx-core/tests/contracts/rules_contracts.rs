//! Contracts: rule compiler purity and document shape.

use optimizecx_core::rules::{compile, SpeculationAction, SpeculationRule};
use optimizecx_core::{OptimizationMode, SpeculationConfig};

/// Compiling twice yields byte-identical documents for every mode.
#[test]
fn compile_is_deterministic_for_all_modes() {
    let config = SpeculationConfig::default();
    for mode in OptimizationMode::ALL {
        let first = compile(mode, &config).map(|r| r.to_json().unwrap());
        let second = compile(mode, &config).map(|r| r.to_json().unwrap());
        assert_eq!(first, second, "compile must be deterministic for {mode}");
    }
}

/// Only prefetch and prerender produce a declarative document.
#[test]
fn only_declarative_modes_compile() {
    let config = SpeculationConfig::default();
    let compiled: Vec<_> = OptimizationMode::ALL
        .into_iter()
        .map(|mode| compile(mode, &config).map(|r| r.action))
        .collect();
    assert_eq!(
        compiled,
        vec![
            None,
            Some(SpeculationAction::Prefetch),
            None,
            Some(SpeculationAction::Prerender),
        ]
    );
}

/// Document rule first, list rule second, one populated kind.
#[test]
fn document_rule_precedes_list_rule() {
    let rules = compile(OptimizationMode::Prefetch, &SpeculationConfig::default()).unwrap();
    assert!(matches!(rules.rules[0], SpeculationRule::Document { .. }));
    assert_eq!(
        rules.rules[1],
        SpeculationRule::List {
            urls: vec!["/cart".into()]
        }
    );

    let json: serde_json::Value = serde_json::from_str(&rules.to_json().unwrap()).unwrap();
    let kinds: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    assert_eq!(kinds, vec!["prefetch".to_string()]);
}
