//! Typing-speed and correction-rate features, plus paste and device-change signals.

use super::{round4, span_seconds, FeatureValue, FeatureVector};
use crate::config::KeystrokeConfig;
use crate::telemetry::{EventKind, Session};

pub const KEYSTROKE_FEATURES: [&str; 7] = [
    "total_keystrokes",
    "total_time_seconds",
    "avg_typing_speed_cpm",
    "error_rate",
    "has_paste_action",
    "device_change_count",
    "is_new_device",
];

pub struct KeystrokeExtractor {
    backspace_key: String,
}

impl KeystrokeExtractor {
    pub fn new(config: &KeystrokeConfig) -> Self {
        Self {
            backspace_key: config.backspace_key.clone(),
        }
    }

    /// Always returns the full key set; a session without key-downs zeroes the typing features.
    pub fn extract(&self, session: &Session) -> FeatureVector {
        let mut keystrokes = 0i64;
        let mut backspaces = 0i64;
        let mut first_ts = i64::MAX;
        let mut last_ts = i64::MIN;
        let mut has_paste = false;
        let mut device_changes = 0i64;

        for e in session.events() {
            match &e.kind {
                EventKind::KeyDown { key } => {
                    keystrokes += 1;
                    if key.eq_ignore_ascii_case(&self.backspace_key) {
                        backspaces += 1;
                    }
                    first_ts = first_ts.min(e.timestamp);
                    last_ts = last_ts.max(e.timestamp);
                }
                EventKind::Paste { .. } => has_paste = true,
                EventKind::DeviceChange { .. } => device_changes += 1,
                EventKind::PointerMove { .. } | EventKind::PointerClick { .. } => {}
            }
        }

        let (total_time_seconds, cpm, error_rate) = if keystrokes > 0 {
            let secs = span_seconds(first_ts, last_ts);
            let cpm = if secs > 0.0 {
                keystrokes as f64 / secs * 60.0
            } else {
                0.0
            };
            (secs, cpm, backspaces as f64 / keystrokes as f64)
        } else {
            (0.0, 0.0, 0.0)
        };

        let mut fv = FeatureVector::new();
        fv.insert("total_keystrokes", keystrokes);
        fv.insert("total_time_seconds", round4(total_time_seconds));
        fv.insert("avg_typing_speed_cpm", round4(cpm));
        fv.insert("error_rate", round4(error_rate));
        fv.insert("has_paste_action", FeatureValue::flag(has_paste));
        fv.insert("device_change_count", device_changes);
        fv.insert("is_new_device", FeatureValue::flag(device_changes > 0));
        fv
    }
}
