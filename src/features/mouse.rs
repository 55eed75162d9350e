//! Pointer kinematics: path length, velocity profile and straightness.

use super::{round4, span_seconds, FeatureVector};
use crate::telemetry::{Event, EventKind, Session};
use std::borrow::Cow;
use std::cmp::Ordering;

pub const MOUSE_FEATURES: [&str; 7] = [
    "duration_seconds",
    "num_clicks",
    "num_moves",
    "total_distance",
    "avg_velocity_pixels_per_sec",
    "std_dev_velocity",
    "straightness",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MouseExtractor;

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

/// Mean and population standard deviation; `(0, 0)` for no samples.
fn mean_std(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Total order over pointer events: time, then moves before clicks, then position.
/// Events sharing a timestamp therefore land in the same order whatever the producer sent.
fn pointer_order(a: &Event, b: &Event) -> Ordering {
    fn rank(e: &Event) -> (u8, f64, f64) {
        match e.kind {
            EventKind::PointerMove { x, y } => (0, x, y),
            EventKind::PointerClick { x, y } => (1, x, y),
            _ => (2, 0.0, 0.0),
        }
    }
    let (ka, xa, ya) = rank(a);
    let (kb, xb, yb) = rank(b);
    a.timestamp
        .cmp(&b.timestamp)
        .then(ka.cmp(&kb))
        .then(xa.total_cmp(&xb))
        .then(ya.total_cmp(&yb))
}

impl MouseExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns an empty vector when the session has no pointer events.
    ///
    /// `sorted_by_time` only skips the sort when the events really are in order.
    pub fn extract(&self, session: &Session, sorted_by_time: bool) -> FeatureVector {
        let pointer: Vec<&Event> = session.events().iter().filter(|e| e.is_pointer()).collect();
        if pointer.is_empty() {
            return FeatureVector::new();
        }

        let in_order = pointer
            .windows(2)
            .all(|w| pointer_order(w[0], w[1]) != Ordering::Greater);
        let events: Cow<'_, [&Event]> = if sorted_by_time && in_order {
            Cow::Borrowed(pointer.as_slice())
        } else {
            let mut sorted = pointer.clone();
            sorted.sort_by(|a, b| pointer_order(a, b));
            Cow::Owned(sorted)
        };

        let duration = span_seconds(events[0].timestamp, events[events.len() - 1].timestamp);
        let mut num_clicks = 0i64;
        let mut moves: Vec<(i64, (f64, f64))> = Vec::new();
        for e in events.iter() {
            match e.kind {
                EventKind::PointerMove { x, y } => moves.push((e.timestamp, (x, y))),
                EventKind::PointerClick { .. } => num_clicks += 1,
                _ => {}
            }
        }

        let mut total_distance = 0.0;
        let mut velocities = Vec::with_capacity(moves.len().saturating_sub(1));
        for pair in moves.windows(2) {
            let (t0, p0) = pair[0];
            let (t1, p1) = pair[1];
            let dt = span_seconds(t0, t1);
            if dt > 0.0 {
                let d = distance(p0, p1);
                total_distance += d;
                velocities.push(d / dt);
            }
        }
        let (avg_velocity, std_velocity) = mean_std(&velocities);

        let straightness = match (moves.first(), moves.last()) {
            (Some(first), Some(last)) if moves.len() > 1 && total_distance > 0.0 => {
                (distance(first.1, last.1) / total_distance).min(1.0)
            }
            _ => 1.0,
        };

        let mut fv = FeatureVector::new();
        fv.insert("duration_seconds", round4(duration));
        fv.insert("num_clicks", num_clicks);
        fv.insert("num_moves", moves.len() as i64);
        fv.insert("total_distance", round4(total_distance));
        fv.insert("avg_velocity_pixels_per_sec", round4(avg_velocity));
        fv.insert("std_dev_velocity", round4(std_velocity));
        fv.insert("straightness", round4(straightness));
        fv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;

    /// Ten events: eight moves, clicks at positions 2 and 6.
    fn sample_session() -> Session {
        let ts = [1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700, 1800, 1900];
        let kinds = [2, 2, 5, 2, 2, 2, 5, 2, 2, 2];
        let xs = [10.0, 25.0, 25.0, 40.0, 60.0, 85.0, 85.0, 110.0, 140.0, 175.0];
        let ys = [10.0, 20.0, 20.0, 30.0, 45.0, 65.0, 65.0, 90.0, 120.0, 155.0];
        (0..10)
            .map(|i| {
                if kinds[i] == 5 {
                    Event::pointer_click(ts[i], xs[i], ys[i])
                } else {
                    Event::pointer_move(ts[i], xs[i], ys[i])
                }
            })
            .collect()
    }

    #[test]
    fn test_sample_session() {
        let fv = MouseExtractor.extract(&sample_session(), false);
        assert_eq!(fv.len(), MOUSE_FEATURES.len());
        assert_eq!(fv.get("num_clicks"), Some(FeatureValue::Int(2)));
        assert_eq!(fv.get("num_moves"), Some(FeatureValue::Int(8)));
        assert_eq!(fv.get_f64("duration_seconds"), Some(0.9));
        let s = fv.get_f64("straightness").unwrap();
        assert!((0.0..=1.0).contains(&s), "straightness {s}");
        assert!(fv.get_f64("total_distance").unwrap() > 0.0);
        assert!(fv.get_f64("avg_velocity_pixels_per_sec").unwrap() > 0.0);
    }

    #[test]
    fn test_shuffled_input_is_sorted_first() {
        let mut events = sample_session().events().to_vec();
        events.swap(0, 9);
        events.swap(3, 7);
        let shuffled = Session::new(events);
        assert_eq!(
            MouseExtractor.extract(&shuffled, false),
            MouseExtractor.extract(&sample_session(), false)
        );
        // A false "already sorted" claim is not trusted.
        assert_eq!(
            MouseExtractor.extract(&shuffled, true),
            MouseExtractor.extract(&sample_session(), true)
        );
    }

    #[test]
    fn test_single_move_is_straight() {
        let session = Session::new(vec![Event::pointer_move(0, 5.0, 5.0), Event::pointer_click(50, 5.0, 5.0)]);
        let fv = MouseExtractor.extract(&session, false);
        assert_eq!(fv.get_f64("straightness"), Some(1.0));
        assert_eq!(fv.get_f64("total_distance"), Some(0.0));
        assert_eq!(fv.get_f64("avg_velocity_pixels_per_sec"), Some(0.0));
        assert_eq!(fv.get_f64("std_dev_velocity"), Some(0.0));
    }

    #[test]
    fn test_constant_speed_line() {
        let session: Session = (0..5)
            .map(|i| Event::pointer_move(i * 100, i as f64 * 30.0, i as f64 * 40.0))
            .collect();
        let fv = MouseExtractor.extract(&session, true);
        assert_eq!(fv.get_f64("total_distance"), Some(200.0));
        assert_eq!(fv.get_f64("avg_velocity_pixels_per_sec"), Some(500.0));
        assert_eq!(fv.get_f64("std_dev_velocity"), Some(0.0));
        assert_eq!(fv.get_f64("straightness"), Some(1.0));
    }

    #[test]
    fn test_duplicate_timestamps_contribute_nothing() {
        let session = Session::new(vec![
            Event::pointer_move(0, 0.0, 0.0),
            Event::pointer_move(0, 300.0, 400.0),
            Event::pointer_move(1000, 300.0, 400.0),
        ]);
        let fv = MouseExtractor.extract(&session, false);
        assert_eq!(fv.get_f64("total_distance"), Some(0.0));
        assert_eq!(fv.get_f64("straightness"), Some(1.0));
        assert_eq!(fv.get_f64("avg_velocity_pixels_per_sec"), Some(0.0));
    }

    #[test]
    fn test_tied_timestamps_do_not_depend_on_producer_order() {
        let a = Session::new(vec![
            Event::pointer_move(0, 0.0, 0.0),
            Event::pointer_move(0, 50.0, 0.0),
            Event::pointer_move(100, 60.0, 0.0),
            Event::pointer_click(100, 60.0, 0.0),
        ]);
        let mut swapped = a.events().to_vec();
        swapped.swap(0, 1);
        swapped.swap(2, 3);
        let b = Session::new(swapped);
        for sorted_hint in [false, true] {
            assert_eq!(
                MouseExtractor.extract(&a, sorted_hint),
                MouseExtractor.extract(&b, sorted_hint)
            );
        }
        let fv = MouseExtractor.extract(&b, true);
        assert_eq!(fv.get_f64("total_distance"), Some(10.0));
        assert_eq!(fv.get_f64("avg_velocity_pixels_per_sec"), Some(100.0));
    }

    #[test]
    fn test_straightness_stays_within_unit_interval() {
        // The zero-duration hop is left out of the path, not of the direct distance.
        let session = Session::new(vec![
            Event::pointer_move(0, 0.0, 0.0),
            Event::pointer_move(0, 100.0, 0.0),
            Event::pointer_move(1000, 101.0, 0.0),
        ]);
        let fv = MouseExtractor.extract(&session, false);
        assert_eq!(fv.get_f64("total_distance"), Some(1.0));
        assert_eq!(fv.get_f64("straightness"), Some(1.0));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let session = Session::new(vec![
            Event::pointer_move(i64::MIN, 0.0, 0.0),
            Event::pointer_move(i64::MAX, 3.0, 4.0),
        ]);
        let fv = MouseExtractor.extract(&session, false);
        let duration = fv.get_f64("duration_seconds").unwrap();
        assert!(duration.is_finite() && duration > 1.8e16);
        assert_eq!(fv.get_f64("total_distance"), Some(5.0));
        assert!(fv.get_f64("avg_velocity_pixels_per_sec").unwrap().is_finite());
    }

    #[test]
    fn test_no_pointer_events_is_empty() {
        assert!(MouseExtractor.extract(&Session::default(), false).is_empty());
        let keys_only = Session::new(vec![Event::key_down(1, "a")]);
        assert!(MouseExtractor.extract(&keys_only, false).is_empty());
    }

    #[test]
    fn test_population_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(m, 5.0);
        assert_eq!(s, 2.0);
    }
}
