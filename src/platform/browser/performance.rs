//! `web-sys` backed [`PerformanceEnvironment`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{
    Document, Event, HtmlScriptElement, Performance, PerformanceObserver,
    PerformanceObserverEntryList, PerformanceObserverInit, Window,
};

use crate::metrics::entry::PerformanceEntry;
use crate::metrics::error::{
    environment_unavailable, internal_error, unsupported_entry_type, MetricsResult,
};
use crate::platform::performance::{
    EntryCallback, EntryObservation, ListenerId, PerformanceEnvironment, ScriptElement,
    VisibilityCallback, VisibilityEvent, VisibilityState,
};

const VISIBILITY_CHANGE: &str = "visibilitychange";
const ENTRY_SCRIPT_ATTRIBUTE: &str = "data-entry";

type ListenerClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(PerformanceObserverEntryList, JsValue)>;

pub struct WebPerformanceEnvironment {
    window: Window,
    listeners: RefCell<HashMap<ListenerId, ListenerClosure>>,
    next_listener: Cell<u64>,
}

impl WebPerformanceEnvironment {
    pub fn new() -> MetricsResult<Self> {
        let window = web_sys::window().ok_or_else(|| environment_unavailable("window unavailable"))?;
        Ok(Self {
            window,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    fn performance(&self) -> Option<Performance> {
        self.window.performance()
    }

    fn document(&self) -> Option<Document> {
        self.window.document()
    }
}

impl PerformanceEnvironment for WebPerformanceEnvironment {
    fn time_origin(&self) -> Option<f64> {
        self.performance().map(|performance| performance.time_origin())
    }

    fn entries(&self) -> Option<Vec<PerformanceEntry>> {
        let performance = self.performance()?;
        Some(decode_entries(&performance.get_entries()))
    }

    fn entry_count(&self) -> Option<usize> {
        let performance = self.performance()?;
        Some(performance.get_entries().length() as usize)
    }

    fn mark(&self, name: &str) {
        if let Some(performance) = self.performance() {
            if let Err(err) = performance.mark(name) {
                log::debug!("performance.mark({name}) failed: {err:?}");
            }
        }
    }

    fn location_origin(&self) -> Option<String> {
        self.window.location().origin().ok()
    }

    fn scripts(&self) -> Vec<ScriptElement> {
        let Some(document) = self.document() else {
            return Vec::new();
        };
        let scripts = document.scripts();
        (0..scripts.length())
            .filter_map(|index| scripts.item(index))
            .map(|element| {
                let entry = element.get_attribute(ENTRY_SCRIPT_ATTRIBUTE).as_deref() == Some("true");
                let src = element
                    .dyn_ref::<HtmlScriptElement>()
                    .map(|script| script.src())
                    .filter(|src| !src.is_empty());
                ScriptElement { src, entry }
            })
            .collect()
    }

    fn visibility_state(&self) -> VisibilityState {
        self.document()
            .map(|document| visibility_of(&document))
            .unwrap_or(VisibilityState::Visible)
    }

    fn add_visibility_listener(&self, callback: VisibilityCallback) -> MetricsResult<ListenerId> {
        let document = self
            .document()
            .ok_or_else(|| environment_unavailable("document unavailable"))?;
        let target = document.clone();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            callback(&VisibilityEvent {
                state: visibility_of(&target),
                timestamp: event.time_stamp(),
            });
        }) as Box<dyn FnMut(Event)>);

        document
            .add_event_listener_with_callback_and_bool(
                VISIBILITY_CHANGE,
                closure.as_ref().unchecked_ref(),
                true,
            )
            .map_err(|err| internal_error(format!("visibility listener: {err:?}")))?;

        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, closure);
        Ok(id)
    }

    fn remove_visibility_listener(&self, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        if let Some(document) = self.document() {
            let _ = document.remove_event_listener_with_callback_and_bool(
                VISIBILITY_CHANGE,
                closure.as_ref().unchecked_ref(),
                true,
            );
        }
    }

    fn observe(
        &self,
        entry_type: &str,
        callback: EntryCallback,
    ) -> MetricsResult<Rc<dyn EntryObservation>> {
        if !supports_entry_type(entry_type) {
            return Err(unsupported_entry_type(entry_type));
        }

        let closure = Closure::wrap(Box::new(
            move |list: PerformanceObserverEntryList, _: JsValue| {
                for entry in decode_entries(&list.get_entries()) {
                    callback(&entry);
                }
            },
        ) as Box<dyn FnMut(PerformanceObserverEntryList, JsValue)>);

        let observer = PerformanceObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|err| internal_error(format!("observer init: {err:?}")))?;

        let init = js_sys::Object::new();
        js_sys::Reflect::set(&init, &JsValue::from_str("type"), &JsValue::from_str(entry_type))
            .map_err(|err| internal_error(format!("observer options: {err:?}")))?;
        js_sys::Reflect::set(&init, &JsValue::from_str("buffered"), &JsValue::TRUE)
            .map_err(|err| internal_error(format!("observer options: {err:?}")))?;
        observer.observe(init.unchecked_ref::<PerformanceObserverInit>());

        Ok(Rc::new(WebObservation {
            observer,
            _callback: closure,
        }))
    }
}

impl Drop for WebPerformanceEnvironment {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.borrow().keys().copied().collect();
        for id in ids {
            self.remove_visibility_listener(id);
        }
    }
}

struct WebObservation {
    observer: PerformanceObserver,
    _callback: ObserverClosure,
}

impl EntryObservation for WebObservation {
    fn take_records(&self) -> Vec<PerformanceEntry> {
        decode_entries(&self.observer.take_records())
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

fn visibility_of(document: &Document) -> VisibilityState {
    match document.visibility_state() {
        web_sys::VisibilityState::Hidden => VisibilityState::Hidden,
        _ => VisibilityState::Visible,
    }
}

fn supports_entry_type(entry_type: &str) -> bool {
    let global = js_sys::global();
    let Ok(constructor) = js_sys::Reflect::get(&global, &JsValue::from_str("PerformanceObserver")) else {
        return false;
    };
    if constructor.is_undefined() || constructor.is_null() {
        return false;
    }
    js_sys::Reflect::get(&constructor, &JsValue::from_str("supportedEntryTypes"))
        .ok()
        .and_then(|types| types.dyn_into::<js_sys::Array>().ok())
        .map(|types| types.includes(&JsValue::from_str(entry_type), 0))
        .unwrap_or(false)
}

fn decode_entries(values: &js_sys::Array) -> Vec<PerformanceEntry> {
    values.iter().filter_map(|value| decode_entry(&value)).collect()
}

fn decode_entry(value: &JsValue) -> Option<PerformanceEntry> {
    let entry = value.dyn_ref::<web_sys::PerformanceEntry>()?;
    let json: String = js_sys::JSON::stringify(&entry.to_json()).ok()?.into();
    match serde_json::from_str(&json) {
        Ok(entry) => Some(entry),
        Err(err) => {
            log::debug!("skipping undecodable performance entry: {err}");
            None
        }
    }
}
