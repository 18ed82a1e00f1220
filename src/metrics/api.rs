use std::rc::Rc;

use crate::metrics::constants::{
    FIRST_CONTENTFUL_PAINT, FIRST_PAINT, MEASUREMENT_FCP, MEASUREMENT_FP, MEASUREMENT_MARK_FCP,
    MEASUREMENT_MARK_FP, TRACING_INIT_MARK,
};
use crate::metrics::entry::{EntryKind, PerformanceEntry};
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
use crate::metrics::error::MetricsResult;
use crate::metrics::measurements::{MeasurementStore, Measurements};
use crate::metrics::observers::{FidObserver, LcpObserver};
use crate::metrics::settings::MetricsSettings;
use crate::metrics::spans::{
    evaluation_span, measure_span, navigation_spans, resource_name, resource_span,
};
use crate::metrics::timing::ms_to_sec;
use crate::metrics::visibility::FirstHidden;
use crate::platform::performance::{ListenerId, PerformanceEnvironment};
use crate::trace::{start_child, TracedTransaction, OP_NAVIGATION, OP_PAGELOAD};

/// Builds spans and web-vital measurements from the Performance Timeline.
///
/// One instance lives for the whole page session. Each call to
/// [`add_performance_entries`](Self::add_performance_entries) converts the timeline entries
/// recorded since the previous call into child spans of the given transaction, while the LCP
/// and FID observers keep collecting measurements in the background.
pub struct MetricsInstrumentation {
    env: Rc<dyn PerformanceEnvironment>,
    settings: MetricsSettings,
    measurements: MeasurementStore,
    cursor: usize,
    first_hidden: Option<FirstHidden>,
    first_hidden_listener: Option<ListenerId>,
    lcp: Option<LcpObserver>,
    fid: Option<FidObserver>,
}

/// Per-pass state picked up while walking the timeline.
#[derive(Default)]
struct PassState {
    entry_script_src: Option<String>,
    location_origin: Option<String>,
    entry_script_end: Option<f64>,
    tracing_init_start: Option<f64>,
}

impl MetricsInstrumentation {
    pub fn new(env: Rc<dyn PerformanceEnvironment>) -> Self {
        Self::with_settings(env, MetricsSettings::default())
    }

    pub fn with_settings(env: Rc<dyn PerformanceEnvironment>, settings: MetricsSettings) -> Self {
        let mut instrumentation = Self {
            env,
            settings,
            measurements: MeasurementStore::new(),
            cursor: 0,
            first_hidden: None,
            first_hidden_listener: None,
            lcp: None,
            fid: None,
        };
        instrumentation.start();
        instrumentation
    }

    /// Instrumentation over the current page, configured from `__WEB_VITALS_DEFAULTS__`.
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub fn for_browser() -> MetricsResult<Self> {
        let env = crate::platform::browser::WebPerformanceEnvironment::new()?;
        Ok(Self::with_settings(Rc::new(env), MetricsSettings::from_defaults()))
    }

    fn start(&mut self) {
        if !self.settings.instrumentation_enabled {
            log::debug!("browser metrics instrumentation disabled by settings");
            return;
        }
        let Some(time_origin) = self.env.time_origin() else {
            log::debug!("performance API unavailable, browser metrics disabled");
            return;
        };
        let env = Rc::clone(&self.env);
        if self.settings.record_init_mark {
            env.mark(TRACING_INIT_MARK);
        }

        let (first_hidden, listener) = FirstHidden::install(env.as_ref());
        let time_origin = ms_to_sec(time_origin);
        if self.settings.track_lcp {
            self.lcp = Some(LcpObserver::install(
                env.as_ref(),
                time_origin,
                first_hidden.clone(),
                self.measurements.sender(),
            ));
        }
        if self.settings.track_fid {
            self.fid = Some(FidObserver::install(
                env.as_ref(),
                time_origin,
                first_hidden.clone(),
                self.measurements.sender(),
            ));
        }
        self.first_hidden = Some(first_hidden);
        self.first_hidden_listener = listener;
    }

    /// Number of timeline entries already folded into spans.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn settings(&self) -> &MetricsSettings {
        &self.settings
    }

    pub fn first_hidden(&self) -> Option<&FirstHidden> {
        self.first_hidden.as_ref()
    }

    pub fn lcp_observer(&self) -> Option<&LcpObserver> {
        self.lcp.as_ref()
    }

    pub fn fid_observer(&self) -> Option<&FidObserver> {
        self.fid.as_ref()
    }

    /// Snapshot of the measurements collected so far.
    pub fn measurements(&mut self) -> Measurements {
        self.measurements.snapshot()
    }

    /// Adds spans for every timeline entry not processed yet and, for page loads, attaches the
    /// collected measurements.
    pub fn add_performance_entries(&mut self, transaction: &mut dyn TracedTransaction) {
        if !self.settings.instrumentation_enabled {
            return;
        }
        let (Some(time_origin), Some(entries)) = (self.env.time_origin(), self.env.entries()) else {
            return;
        };
        log::debug!("[Tracing] Adding & adjusting spans using Performance API");

        let is_pageload = transaction.op() == OP_PAGELOAD;
        if is_pageload {
            if let Some(lcp) = &self.lcp {
                lcp.force_flush();
            }
        }

        let time_origin = ms_to_sec(time_origin);
        let mut pass = PassState {
            entry_script_src: self
                .env
                .scripts()
                .into_iter()
                .find(|script| script.entry)
                .and_then(|script| script.src),
            location_origin: self.env.location_origin(),
            ..Default::default()
        };

        for entry in entries.iter().skip(self.cursor) {
            if transaction.op() == OP_NAVIGATION
                && time_origin + ms_to_sec(entry.start_time) < transaction.start_timestamp()
            {
                continue;
            }
            self.add_entry(transaction, entry, time_origin, &mut pass);
        }

        if let (Some(script_end), Some(init_start)) = (pass.entry_script_end, pass.tracing_init_start) {
            log::debug!("[Tracing] Adding evaluation span");
            start_child(transaction, evaluation_span(script_end, init_start));
        }

        let total = self.env.entry_count().unwrap_or(entries.len());
        self.cursor = self.cursor.max(total.saturating_sub(1));

        if is_pageload {
            transaction.set_measurements(self.measurements.snapshot());
        }
    }

    fn add_entry(
        &mut self,
        transaction: &mut dyn TracedTransaction,
        entry: &PerformanceEntry,
        time_origin: f64,
        pass: &mut PassState,
    ) {
        match entry.kind() {
            EntryKind::Navigation => {
                for context in navigation_spans(entry, time_origin) {
                    start_child(transaction, context);
                }
            }
            EntryKind::Mark | EntryKind::Paint | EntryKind::Measure => {
                let context = measure_span(entry, time_origin);
                let start_timestamp = context.start_timestamp;
                start_child(transaction, context);

                if pass.tracing_init_start.is_none() && entry.name == TRACING_INIT_MARK {
                    pass.tracing_init_start = Some(start_timestamp);
                }
                if entry.name == FIRST_PAINT {
                    log::debug!("[Measurements] Adding FP");
                    self.measurements.record(MEASUREMENT_FP, entry.start_time);
                    self.measurements.record(MEASUREMENT_MARK_FP, start_timestamp);
                }
                if entry.name == FIRST_CONTENTFUL_PAINT {
                    log::debug!("[Measurements] Adding FCP");
                    self.measurements.record(MEASUREMENT_FCP, entry.start_time);
                    self.measurements.record(MEASUREMENT_MARK_FCP, start_timestamp);
                }
            }
            EntryKind::Resource => {
                let name = resource_name(&entry.name, pass.location_origin.as_deref());
                let Some(context) = resource_span(entry, &name, time_origin) else {
                    return;
                };
                let end_timestamp = context.end_timestamp;
                start_child(transaction, context);

                let is_entry_script = !name.is_empty()
                    && pass
                        .entry_script_src
                        .as_deref()
                        .is_some_and(|src| src.contains(name.as_str()));
                if pass.entry_script_end.is_none() && is_entry_script {
                    pass.entry_script_end = Some(end_timestamp);
                }
            }
            _ => {}
        }
    }
}

impl Drop for MetricsInstrumentation {
    fn drop(&mut self) {
        let env = Rc::clone(&self.env);
        if let Some(listener) = self.first_hidden_listener.take() {
            env.remove_visibility_listener(listener);
        }
        if let Some(lcp) = self.lcp.as_mut() {
            lcp.teardown(env.as_ref());
        }
        if let Some(fid) = self.fid.as_mut() {
            fid.teardown();
        }
    }
}

/// Whether the current process looks like a browser page.
pub fn is_supported() -> bool {
    crate::platform::environment::is_browser()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::constants::{
        ENTRY_TYPE_FIRST_INPUT, ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, ENTRY_TYPE_MARK,
        ENTRY_TYPE_PAINT, MEASUREMENT_FID, MEASUREMENT_LCP,
    };
    use crate::platform::memory::InMemoryEnvironment;
    use crate::platform::performance::{ScriptElement, VisibilityState};
    use crate::test_support::{assert_close, navigation_entry, resource_entry};
    use crate::trace::Transaction;
    use serde_json::json;

    fn setup(settings: MetricsSettings) -> (Rc<InMemoryEnvironment>, MetricsInstrumentation) {
        let env = Rc::new(
            InMemoryEnvironment::new(1_000_000.0).with_location_origin("https://example.com"),
        );
        let instrumentation = MetricsInstrumentation::with_settings(env.clone(), settings);
        (env, instrumentation)
    }

    fn without_init_mark() -> MetricsSettings {
        MetricsSettings {
            record_init_mark: false,
            ..Default::default()
        }
    }

    #[test]
    fn construction_marks_tracing_init() {
        let (env, instrumentation) = setup(MetricsSettings::default());
        let entries = env.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, TRACING_INIT_MARK);
        assert!(instrumentation.lcp_observer().unwrap().is_enabled());
        assert!(instrumentation.fid_observer().unwrap().is_connected());
    }

    #[test]
    fn domain_lookup_only_navigation() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.push_entry(navigation_entry(json!({
            "domainLookupStart": 1,
            "domainLookupEnd": 5,
            "unloadEventStart": 0,
            "unloadEventEnd": 0,
        })));
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.5);
        instrumentation.add_performance_entries(&mut transaction);

        assert_eq!(transaction.spans().len(), 1);
        let span = transaction.find_span("domainLookup").unwrap();
        assert_close(span.start_timestamp, 1000.001);
        assert_close(span.end_timestamp, 1000.005);
        assert_close(transaction.start_timestamp(), 1000.001);
    }

    #[test]
    fn resource_script_span() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.push_entry(resource_entry("https://example.com/app.js", "script", 10.0, 5.0));
        let mut transaction = Transaction::new("ui.action", 1000.0);
        instrumentation.add_performance_entries(&mut transaction);

        let span = &transaction.spans()[0];
        assert_eq!(span.description, "/app.js");
        assert_eq!(span.op, "resource.script");
        assert_close(span.start_timestamp, 1000.010);
        assert_close(span.end_timestamp, 1000.015);
        assert!(transaction.measurements().is_none());
    }

    #[test]
    fn first_contentful_paint_records_measurements() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.push_entry(PerformanceEntry::new(FIRST_CONTENTFUL_PAINT, ENTRY_TYPE_PAINT, 250.0, 0.0));
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);

        let measurements = transaction.measurements().unwrap();
        assert_eq!(measurements[MEASUREMENT_FCP].value, 250.0);
        assert_close(measurements[MEASUREMENT_MARK_FCP].value, 1000.25);
        assert!(!measurements.contains_key(MEASUREMENT_FP));
    }

    #[test]
    fn cursor_stops_one_short_of_the_end() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.push_entries([
            PerformanceEntry::new("a", ENTRY_TYPE_MARK, 1.0, 0.0),
            PerformanceEntry::new("b", ENTRY_TYPE_MARK, 2.0, 0.0),
            PerformanceEntry::new("c", ENTRY_TYPE_MARK, 3.0, 0.0),
        ]);
        let mut first = Transaction::new("custom", 1000.0);
        instrumentation.add_performance_entries(&mut first);
        assert_eq!(first.spans().len(), 3);
        assert_eq!(instrumentation.cursor(), 2);

        env.push_entry(PerformanceEntry::new("d", ENTRY_TYPE_MARK, 4.0, 0.0));
        let mut second = Transaction::new("custom", 1000.0);
        instrumentation.add_performance_entries(&mut second);
        let names: Vec<_> = second.spans().iter().map(|span| span.description.as_str()).collect();
        assert_eq!(names, ["c", "d"]);
        assert_eq!(instrumentation.cursor(), 3);
    }

    #[test]
    fn empty_timeline_keeps_cursor_at_zero() {
        let (_env, mut instrumentation) = setup(without_init_mark());
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);
        assert_eq!(instrumentation.cursor(), 0);
        assert!(transaction.spans().is_empty());
        assert_eq!(transaction.measurements(), Some(&Measurements::new()));
    }

    #[test]
    fn navigation_skips_entries_from_before_its_start() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.push_entries([
            PerformanceEntry::new("old", ENTRY_TYPE_MARK, 100.0, 0.0),
            PerformanceEntry::new("new", ENTRY_TYPE_MARK, 3_000.0, 0.0),
        ]);
        let mut transaction = Transaction::new(OP_NAVIGATION, 1002.0);
        instrumentation.add_performance_entries(&mut transaction);
        assert_eq!(transaction.spans().len(), 1);
        assert_eq!(transaction.spans()[0].description, "new");
        assert!(transaction.measurements().is_none());
    }

    #[test]
    fn evaluation_span_links_entry_script_to_init_mark() {
        let env = Rc::new(
            InMemoryEnvironment::new(1_000_000.0)
                .with_location_origin("https://example.com")
                .with_scripts(vec![
                    ScriptElement::new("https://example.com/vendor.js", false),
                    ScriptElement::new("https://example.com/main.js", true),
                ]),
        );
        env.push_entry(resource_entry("https://example.com/main.js", "script", 20.0, 30.0));
        env.advance_to(120.0);
        let mut instrumentation = MetricsInstrumentation::new(env.clone());

        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);

        let evaluation = transaction.find_span("evaluation").unwrap();
        assert_eq!(evaluation.op, "script");
        assert_close(evaluation.start_timestamp, 1000.05);
        assert_close(evaluation.end_timestamp, 1000.12);
    }

    #[test]
    fn pageload_flushes_buffered_lcp_first() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.queue_observed(PerformanceEntry::new("", ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, 900.0, 0.0));
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);
        assert_eq!(transaction.measurements().unwrap()[MEASUREMENT_LCP].value, 900.0);
    }

    #[test]
    fn lcp_after_hidden_never_recorded() {
        let (env, mut instrumentation) = setup(without_init_mark());
        env.set_visibility(VisibilityState::Hidden, 500.0);
        env.emit_observed(PerformanceEntry::new("", ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, 800.0, 0.0));

        let mut first = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut first);
        env.queue_observed(PerformanceEntry::new("", ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, 850.0, 0.0));
        let mut second = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut second);

        assert!(!first.measurements().unwrap().contains_key(MEASUREMENT_LCP));
        assert!(!second.measurements().unwrap().contains_key(MEASUREMENT_LCP));
    }

    #[test]
    fn unsupported_first_input_leaves_the_pass_intact() {
        let env = Rc::new(
            InMemoryEnvironment::new(1_000_000.0)
                .with_supported_entry_types(&[ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT]),
        );
        let mut instrumentation =
            MetricsInstrumentation::with_settings(env.clone(), without_init_mark());
        let fid = instrumentation.fid_observer().unwrap();
        assert!(!fid.is_connected());
        assert!(!fid.is_recorded());
        assert!(instrumentation.lcp_observer().unwrap().is_enabled());

        env.push_entry(PerformanceEntry::new(FIRST_CONTENTFUL_PAINT, ENTRY_TYPE_PAINT, 250.0, 0.0));
        env.emit_observed(PerformanceEntry {
            processing_start: Some(220.0),
            ..PerformanceEntry::new("click", ENTRY_TYPE_FIRST_INPUT, 200.0, 0.0)
        });
        env.queue_observed(PerformanceEntry::new("", ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, 400.0, 0.0));
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);

        assert!(transaction.find_span(FIRST_CONTENTFUL_PAINT).is_some());
        let measurements = transaction.measurements().unwrap();
        assert_eq!(measurements[MEASUREMENT_FCP].value, 250.0);
        assert_eq!(measurements[MEASUREMENT_LCP].value, 400.0);
        assert!(!measurements.contains_key(MEASUREMENT_FID));
        assert_eq!(env.connected_observer_count(), 1);
    }

    #[test]
    fn unavailable_environment_is_a_no_op() {
        let env = Rc::new(InMemoryEnvironment::unavailable());
        let mut instrumentation = MetricsInstrumentation::new(env.clone());
        assert!(instrumentation.lcp_observer().is_none());
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);
        assert!(transaction.spans().is_empty());
        assert!(transaction.measurements().is_none());
        assert_eq!(env.listener_count(), 0);
    }

    #[test]
    fn disabled_settings_register_nothing() {
        let (env, mut instrumentation) = setup(MetricsSettings {
            instrumentation_enabled: false,
            ..Default::default()
        });
        env.push_entry(PerformanceEntry::new("a", ENTRY_TYPE_MARK, 1.0, 0.0));
        let mut transaction = Transaction::new(OP_PAGELOAD, 1000.0);
        instrumentation.add_performance_entries(&mut transaction);
        assert!(transaction.spans().is_empty());
        assert_eq!(env.entry_count(), Some(1));
        assert_eq!(env.connected_observer_count(), 0);
    }

    #[test]
    fn drop_releases_listeners_and_observers() {
        let (env, instrumentation) = setup(MetricsSettings::default());
        assert_eq!(env.listener_count(), 2);
        assert_eq!(env.connected_observer_count(), 2);
        drop(instrumentation);
        assert_eq!(env.listener_count(), 0);
        assert_eq!(env.connected_observer_count(), 0);
    }
}
