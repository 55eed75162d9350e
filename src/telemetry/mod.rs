//! Interaction telemetry: events and the sessions that group them.
//! Producers do not guarantee ordering; consumers sort when order matters.

mod records;

use serde::{Deserialize, Serialize};

pub use records::{group_sessions, PointerRecord, CLICK_CODE, MOVE_CODE};

/// One observed user-interface action. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    #[serde(alias = "KEYSTROKE")]
    KeyDown { key: String },
    Paste {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field_id: Option<String>,
    },
    DeviceChange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_ip: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_ip: Option<String>,
    },
    PointerMove { x: f64, y: f64 },
    PointerClick { x: f64, y: f64 },
}

impl Event {
    pub fn new(timestamp: i64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn key_down(timestamp: i64, key: impl Into<String>) -> Self {
        Self::new(timestamp, EventKind::KeyDown { key: key.into() })
    }

    pub fn pointer_move(timestamp: i64, x: f64, y: f64) -> Self {
        Self::new(timestamp, EventKind::PointerMove { x, y })
    }

    pub fn pointer_click(timestamp: i64, x: f64, y: f64) -> Self {
        Self::new(timestamp, EventKind::PointerClick { x, y })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind,
            EventKind::PointerMove { .. } | EventKind::PointerClick { .. }
        )
    }
}

/// Events attributed to one identity/attempt. Duration is derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    events: Vec<Event>,
}

impl Session {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn start(&self) -> Option<i64> {
        self.events.iter().map(|e| e.timestamp).min()
    }

    pub fn end(&self) -> Option<i64> {
        self.events.iter().map(|e| e.timestamp).max()
    }

    /// Saturates at `i64::MAX` for spans wider than `i64` can hold.
    pub fn duration_ms(&self) -> i64 {
        match (self.start(), self.end()) {
            (Some(s), Some(e)) => e.saturating_sub(s),
            _ => 0,
        }
    }
}

/// Everything the pipeline needs to assess one identity/attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub identity_id: String,
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub events: Session,
}

impl From<Vec<Event>> for Session {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

impl FromIterator<Event> for Session {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
