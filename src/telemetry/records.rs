//! Raw pointer-log rows and grouping into per-session telemetry.

use super::{Event, EventKind, Session};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `event_type` code of a pointer move in raw logs
pub const MOVE_CODE: u8 = 2;
/// `event_type` code of a pointer click in raw logs
pub const CLICK_CODE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerRecord {
    pub uid: String,
    pub session_id: String,
    pub timestamp: i64,
    pub event_type: u8,
    pub screen_x: f64,
    pub screen_y: f64,
}

impl PointerRecord {
    /// Codes other than move/click (wheel, drag, ...) carry no kinematic meaning here.
    pub fn to_event(&self) -> Option<Event> {
        let kind = match self.event_type {
            MOVE_CODE => EventKind::PointerMove {
                x: self.screen_x,
                y: self.screen_y,
            },
            CLICK_CODE => EventKind::PointerClick {
                x: self.screen_x,
                y: self.screen_y,
            },
            _ => return None,
        };
        Some(Event::new(self.timestamp, kind))
    }
}

/// Group rows by `(uid, session_id)`, so one identity may own several sessions.
pub fn group_sessions<'a, I>(records: I) -> BTreeMap<(String, String), Session>
where
    I: IntoIterator<Item = &'a PointerRecord>,
{
    let mut sessions: BTreeMap<(String, String), Session> = BTreeMap::new();
    let mut ignored = 0usize;
    for r in records {
        match r.to_event() {
            Some(ev) => sessions
                .entry((r.uid.clone(), r.session_id.clone()))
                .or_default()
                .push(ev),
            None => ignored += 1,
        }
    }
    if ignored > 0 {
        tracing::debug!(ignored, "pointer records with unknown event_type skipped");
    }
    sessions
}
