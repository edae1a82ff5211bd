//! OptimizeCX WASM bindings.
//!
//! Exposes one [`SpeculationHandle`] per document. The storefront creates
//! it once at startup and calls `navigate()` on initial load and after
//! every client-side route change; link components read
//! `shouldPrefetchLinks()` to decide whether to request eager navigation.
//!
//! ```js
//! const handle = new SpeculationHandle(null, (path) => router.prefetch(path));
//! handle.navigate();
//! ```
//!
//! No tracing subscriber is installed here. The core's `tracing` events,
//! including the settings-reader warning and the telemetry fallback used
//! when `Sentry` is absent, are dropped in the browser.

mod browser;

use optimizecx_core::ports::{Environment, PageContext};
use optimizecx_core::rules;
use optimizecx_core::{OverrideSignal, SpeculationConfig, SpeculationOptimizer, SpeculationRuntime};
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::browser::{BrowserDocument, LocalStorage, RouterPrefetch, ScriptSupportProbe, SentryTags, WindowStorageEvents};

fn to_js(err: optimizecx_core::OptimizeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

/// Mounted optimizer bound to the current document.
#[wasm_bindgen]
pub struct SpeculationHandle {
    runtime: SpeculationRuntime,
    config: SpeculationConfig,
    window: Window,
}

#[wasm_bindgen]
impl SpeculationHandle {
    /// Mount the optimizer.
    ///
    /// `config_json` overrides any subset of the defaults; `prefetch` is
    /// the router's `prefetch(path)` used to warm preload targets.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, prefetch: Option<js_sys::Function>) -> Result<SpeculationHandle, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) => SpeculationConfig::from_json(&json).map_err(to_js)?,
            None => SpeculationConfig::default(),
        };
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;

        let env = Environment {
            store: Box::new(LocalStorage::new(window.clone())),
            document: Box::new(BrowserDocument::new(document)),
            probe: Box::new(ScriptSupportProbe),
            navigation: Box::new(RouterPrefetch::new(prefetch)),
            telemetry: Box::new(SentryTags),
        };
        let optimizer = SpeculationOptimizer::new(config.clone(), env);
        let runtime = SpeculationRuntime::mount(optimizer, &WindowStorageEvents::new(window.clone()));

        Ok(Self {
            runtime,
            config,
            window,
        })
    }

    /// Run the optimizer for the current `window.location`.
    pub fn navigate(&self) -> Result<(), JsValue> {
        let location = self.window.location();
        let href = location.href()?;
        let search = location.search()?;
        let page = PageContext::from_location(&href).map_err(to_js)?;
        let signal = OverrideSignal::from_query(&search, &self.config);
        self.runtime.navigate(page, signal);
        Ok(())
    }

    /// Active mode name (`"none"` until hydrated).
    #[wasm_bindgen(getter, js_name = optimizationMode)]
    pub fn optimization_mode(&self) -> String {
        self.runtime.current().optimization_mode.as_str().to_string()
    }

    /// Whether the first resolution pass has completed.
    #[wasm_bindgen(getter, js_name = hasHydrated)]
    pub fn has_hydrated(&self) -> bool {
        self.runtime.current().has_hydrated
    }

    /// Should ordinary links request eager navigation?
    #[wasm_bindgen(js_name = shouldPrefetchLinks)]
    pub fn should_prefetch_links(&self) -> bool {
        self.runtime.current().should_prefetch_links()
    }

    /// Badge label, e.g. `"Optimization: Prefetch"`.
    pub fn label(&self) -> String {
        self.runtime.current().label()
    }
}

/// Rules JSON for `mode`, for inlining into server-rendered pages.
/// `undefined` for modes without a declarative document.
#[wasm_bindgen(js_name = speculationRulesJson)]
pub fn speculation_rules_json(mode: &str) -> Result<Option<String>, JsValue> {
    rules::compile_named(mode, &SpeculationConfig::default())
        .map(|rules| rules.to_json())
        .transpose()
        .map_err(to_js)
}
