//! Fire-and-forget analytics seam.
//!
//! Components take an injected sink instead of calling a concrete
//! analytics backend, so tests can record calls and production can swap
//! backends without touching the callers. Payloads carry counts and
//! modes, never message content.

use std::sync::{Arc, Mutex};

pub trait TelemetrySink: Send + Sync {
    fn track(&self, event: &str, data: serde_json::Value);
}

/// Default sink: forwards events to the tracing pipeline.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn track(&self, event: &str, data: serde_json::Value) {
        tracing::info!(target: "fitfi::telemetry", %event, %data, "track");
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn track(&self, _event: &str, _data: serde_json::Value) {}
}

/// Sink that records calls for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.lock().expect("telemetry lock poisoned").clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn track(&self, event: &str, data: serde_json::Value) {
        self.events
            .lock()
            .expect("telemetry lock poisoned")
            .push((event.to_string(), data));
    }
}
