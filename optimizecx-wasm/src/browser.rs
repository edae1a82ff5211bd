//! Browser implementations of the optimizer ports.
//!
//! Every JS exception is converted into an `OptimizeError`; the core
//! decides whether to log or drop it.

use js_sys::{Function, Promise, Reflect};
use optimizecx_core::errors::OptimizeError;
use optimizecx_core::ports::{
    CapabilityProbe, Document, KeyValueStore, NavigationLayer, PreloadHint, StorageChange,
    StorageEvents, StorageListener, Subscription, TelemetrySink, TracingTelemetry,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, StorageEvent, Window};

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// ── Storage ─────────────────────────────────────────────────────────────

/// `window.localStorage`.
pub struct LocalStorage {
    window: Window,
}

impl LocalStorage {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn storage(&self) -> Result<web_sys::Storage, OptimizeError> {
        self.window
            .local_storage()
            .map_err(|e| OptimizeError::Storage(describe(&e)))?
            .ok_or_else(|| OptimizeError::Storage("localStorage unavailable".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, OptimizeError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| OptimizeError::Storage(describe(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), OptimizeError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| OptimizeError::Storage(describe(&e)))
    }
}

/// `storage` events on `window`.
pub struct WindowStorageEvents {
    window: Window,
}

impl WindowStorageEvents {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl StorageEvents for WindowStorageEvents {
    fn subscribe(&self, mut listener: StorageListener) -> Subscription {
        let closure = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
            listener(StorageChange {
                key: event.key(),
                new_value: event.new_value(),
            });
        });

        if let Err(e) = self
            .window
            .add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(error = %describe(&e), "could not subscribe to storage events");
            return Subscription::inert();
        }

        let window = self.window.clone();
        Subscription::new(move || {
            if let Err(e) = window.remove_event_listener_with_callback("storage", closure.as_ref().unchecked_ref()) {
                tracing::debug!(error = %describe(&e), "could not remove storage listener");
            }
            drop(closure);
        })
    }
}

// ── Document ────────────────────────────────────────────────────────────

/// The live `document`.
pub struct BrowserDocument {
    document: web_sys::Document,
}

impl BrowserDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    fn head(&self) -> Result<web_sys::HtmlHeadElement, OptimizeError> {
        self.document
            .head()
            .ok_or_else(|| OptimizeError::Document("document has no <head>".into()))
    }

    fn owned_script(&self, id: &str) -> Result<Option<Element>, OptimizeError> {
        let Some(element) = self.document.get_element_by_id(id) else {
            return Ok(None);
        };
        let in_head = element
            .parent_element()
            .is_some_and(|parent| parent.tag_name().eq_ignore_ascii_case("head"));
        Ok(in_head.then_some(element))
    }

    fn elements(&self, selector: &str) -> Result<Vec<Element>, OptimizeError> {
        let list = self
            .document
            .query_selector_all(selector)
            .map_err(|e| OptimizeError::Document(describe(&e)))?;
        Ok((0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn create(&self, tag: &str, attributes: &[(&str, &str)]) -> Result<Element, OptimizeError> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|e| OptimizeError::Document(describe(&e)))?;
        for (name, value) in attributes {
            element
                .set_attribute(name, value)
                .map_err(|e| OptimizeError::Document(describe(&e)))?;
        }
        Ok(element)
    }
}

impl Document for BrowserDocument {
    fn script_text(&self, id: &str) -> Result<Option<String>, OptimizeError> {
        Ok(self
            .owned_script(id)?
            .map(|script| script.text_content().unwrap_or_default()))
    }

    fn set_script_text(&mut self, id: &str, text: &str) -> Result<(), OptimizeError> {
        let script = self
            .owned_script(id)?
            .ok_or_else(|| OptimizeError::Document(format!("#{id} vanished before update")))?;
        script.set_text_content(Some(text));
        Ok(())
    }

    fn append_script(&mut self, id: &str, script_type: &str, text: &str) -> Result<(), OptimizeError> {
        let script = self.create("script", &[("id", id), ("type", script_type)])?;
        script.set_text_content(Some(text));
        self.head()?
            .append_child(&script)
            .map_err(|e| OptimizeError::Document(describe(&e)))?;
        Ok(())
    }

    fn remove_script(&mut self, id: &str) -> Result<(), OptimizeError> {
        if let Some(script) = self.owned_script(id)? {
            script.remove();
        }
        Ok(())
    }

    fn remove_tagged(&mut self, attribute: &str) -> Result<usize, OptimizeError> {
        let tagged = self.elements(&format!("link[{attribute}]"))?;
        for element in &tagged {
            element.remove();
        }
        Ok(tagged.len())
    }

    fn append_hint(&mut self, attribute: &str, hint: &PreloadHint) -> Result<(), OptimizeError> {
        let link = self.create(
            "link",
            &[
                (attribute, "true"),
                ("rel", hint.rel),
                ("as", hint.destination),
                ("href", &hint.href),
                ("type", hint.mime),
                ("crossorigin", hint.cross_origin),
                ("fetchpriority", hint.fetch_priority),
            ],
        )?;
        self.head()?
            .append_child(&link)
            .map_err(|e| OptimizeError::Document(describe(&e)))?;
        Ok(())
    }

    fn anchor_hrefs(&self) -> Result<Vec<String>, OptimizeError> {
        Ok(self
            .elements("a[href]")?
            .into_iter()
            .filter_map(|anchor| anchor.get_attribute("href"))
            .collect())
    }
}

// ── Capability / navigation / telemetry ─────────────────────────────────

fn global_function(target: &JsValue, name: &str) -> Result<Option<Function>, JsValue> {
    if target.is_undefined() || target.is_null() {
        return Ok(None);
    }
    let value = Reflect::get(target, &JsValue::from_str(name))?;
    Ok(value.dyn_into::<Function>().ok())
}

/// `HTMLScriptElement.supports(type)`, looked up dynamically so older
/// engines without the static method answer `false`.
pub struct ScriptSupportProbe;

impl CapabilityProbe for ScriptSupportProbe {
    fn supports(&self, directive_type: &str) -> Result<bool, OptimizeError> {
        let detect = || -> Result<bool, JsValue> {
            let ctor = Reflect::get(&js_sys::global(), &JsValue::from_str("HTMLScriptElement"))?;
            let Some(supports) = global_function(&ctor, "supports")? else {
                return Ok(false);
            };
            let answer = supports.call1(&ctor, &JsValue::from_str(directive_type))?;
            Ok(answer.as_bool().unwrap_or(false))
        };
        detect().map_err(|e| OptimizeError::Capability(describe(&e)))
    }
}

/// Host router's `prefetch(path)`, supplied from JS.
pub struct RouterPrefetch {
    prefetch: Option<Function>,
    swallow: Closure<dyn FnMut(JsValue)>,
}

impl RouterPrefetch {
    pub fn new(prefetch: Option<Function>) -> Self {
        Self {
            prefetch,
            swallow: Closure::new(|_rejection: JsValue| {}),
        }
    }
}

impl NavigationLayer for RouterPrefetch {
    fn warm(&self, path: &str) -> Result<(), OptimizeError> {
        let Some(prefetch) = &self.prefetch else {
            return Ok(());
        };
        let result = prefetch
            .call1(&JsValue::NULL, &JsValue::from_str(path))
            .map_err(|e| OptimizeError::Navigation(describe(&e)))?;
        // Async routers return a promise; an unhandled rejection would
        // surface in the console, so attach a no-op handler.
        if let Ok(promise) = result.dyn_into::<Promise>() {
            let _ = promise.catch(&self.swallow);
        }
        Ok(())
    }
}

/// `Sentry.setTag` when the Sentry SDK is on the page, tracing otherwise.
pub struct SentryTags;

impl TelemetrySink for SentryTags {
    fn set_tag(&self, key: &str, value: &str) -> Result<(), OptimizeError> {
        let sentry = Reflect::get(&js_sys::global(), &JsValue::from_str("Sentry"))
            .map_err(|e| OptimizeError::Telemetry(describe(&e)))?;
        match global_function(&sentry, "setTag").map_err(|e| OptimizeError::Telemetry(describe(&e)))? {
            Some(set_tag) => set_tag
                .call2(&sentry, &JsValue::from_str(key), &JsValue::from_str(value))
                .map(|_| ())
                .map_err(|e| OptimizeError::Telemetry(describe(&e))),
            None => TracingTelemetry.set_tag(key, value),
        }
    }
}
