//! Analytics reporting: events emitted by the layout and the sinks that
//! receive them.
//!
//! Transport is not handled here. A [`ReportingSink`] receives fire-and-forget
//! [`ReportRecord`]s and an [`AttributeSink`] receives the attribute updates
//! collected by a submitted form.

mod form_data;

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::event::EventKind;

pub use form_data::{
    AttributeName, AttributeValue, Attributes, FormInput, FormType, FormValue,
};

/// Form part of a reporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormContext {
    pub identifier: String,
    pub form_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    pub is_submitted: bool,
}

/// Pager part of a reporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerContext {
    pub identifier: String,
    pub page_index: usize,
    pub page_count: usize,
}

/// Button part of a reporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonContext {
    pub identifier: String,
}

/// Where in the layout a reported event happened.
///
/// Filled in while the event bubbles: the emitting form sets `form`, the
/// nearest pager on the way up sets `pager`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<PagerContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<ButtonContext>,
}

impl LayoutContext {
    pub fn for_form(form: FormContext) -> Self {
        Self {
            form: Some(form),
            ..Self::default()
        }
    }

    pub fn with_button(mut self, identifier: Option<String>) -> Self {
        self.button = identifier.map(|identifier| ButtonContext { identifier });
        self
    }
}

/// Analytics event emitted by the layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportingEvent {
    /// A form had at least one input on screen for the first time.
    FormDisplay,
    /// A form was submitted.
    FormResult { data: FormInput, attributes: Attributes },
    /// The layout was dismissed by a button.
    Dismiss {
        button_identifier: Option<String>,
        cancel: bool,
    },
}

impl ReportingEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ReportingEvent::FormDisplay => EventKind::FormDisplay,
            ReportingEvent::FormResult { .. } => EventKind::FormResult,
            ReportingEvent::Dismiss { .. } => EventKind::Dismiss,
        }
    }
}

/// A reported event with its context, as handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: Uuid,
    pub event: ReportingEvent,
    pub context: LayoutContext,
    pub timestamp: SystemTime,
}

impl ReportRecord {
    pub fn new(event: ReportingEvent, context: LayoutContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            context,
            timestamp: SystemTime::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn to_json(&self) -> Value {
        let timestamp_ms = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut body = json!({
            "id": self.id,
            "kind": self.kind().as_str(),
            "context": self.context,
            "timestamp_ms": timestamp_ms,
        });
        match &self.event {
            ReportingEvent::FormDisplay => {}
            ReportingEvent::FormResult { data, attributes } => {
                body["forms"] = data.to_json();
                body["attributes"] = attributes
                    .iter()
                    .map(|(name, value)| json!({ "name": name, "value": value }))
                    .collect();
            }
            ReportingEvent::Dismiss {
                button_identifier,
                cancel,
            } => {
                body["button_identifier"] = json!(button_identifier);
                body["cancel"] = json!(cancel);
            }
        }
        body
    }
}

/// Receives reported events. Fire-and-forget.
pub trait ReportingSink: Send + Sync {
    fn report(&self, record: ReportRecord);
}

/// Receives the attribute updates of a submitted form.
pub trait AttributeSink: Send + Sync {
    fn apply(&self, attributes: &Attributes);
}

/// Keeps everything it receives in memory.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<ReportRecord>>,
    attribute_updates: Mutex<Vec<Attributes>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().clone()
    }

    pub fn records_of(&self, kind: EventKind) -> Vec<ReportRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.records.lock().iter().filter(|r| r.kind() == kind).count()
    }

    pub fn attribute_updates(&self) -> Vec<Attributes> {
        self.attribute_updates.lock().clone()
    }
}

impl ReportingSink for RecordingSink {
    fn report(&self, record: ReportRecord) {
        self.records.lock().push(record);
    }
}

impl AttributeSink for RecordingSink {
    fn apply(&self, attributes: &Attributes) {
        self.attribute_updates.lock().push(attributes.clone());
    }
}

/// Writes reports and attribute updates to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportingSink for TracingSink {
    fn report(&self, record: ReportRecord) {
        tracing::info!(
            kind = record.kind().as_str(),
            id = %record.id,
            payload = %record.to_json(),
            "Layout event reported"
        );
    }
}

impl AttributeSink for TracingSink {
    fn apply(&self, attributes: &Attributes) {
        tracing::info!(count = attributes.len(), "Applying form attributes");
    }
}
