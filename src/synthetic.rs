//! Seeded generators for labelled sessions: human-like applicants and scripted bots.
//! Used to bootstrap a training corpus and to exercise the pipeline end to end.

use crate::telemetry::{AssessmentRequest, Event, EventKind, Session};
use rand::seq::SliceRandom;
use rand::Rng;

const DESKTOP_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:118.0) Gecko/20100101 Firefox/118.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:119.0) Gecko/20100101 Firefox/119.0",
];

const HEADLESS_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) HeadlessChrome/119.0 Safari/537.36";

const EPOCH_MS: i64 = 1_700_000_000_000;

fn typing<R: Rng + ?Sized>(rng: &mut R, start: i64, keys: usize, cpm: f64, error_rate: f64, jitter: f64) -> (Vec<Event>, i64) {
    let interval = 60_000.0 / cpm;
    let mut t = start as f64;
    let mut events = Vec::with_capacity(keys);
    for _ in 0..keys {
        let key = if error_rate > 0.0 && rng.gen_bool(error_rate) {
            "BACKSPACE".to_string()
        } else {
            char::from(rng.gen_range(b'a'..=b'z')).to_string()
        };
        events.push(Event::key_down(t.round() as i64, key));
        let wobble = if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
        t += (interval * (1.0 + wobble)).max(1.0);
    }
    (events, t.round() as i64)
}

fn side_signals<R: Rng + ?Sized>(rng: &mut R, at: i64, paste_p: f64, change_p: f64, ip: &str) -> Vec<Event> {
    let mut events = Vec::new();
    if rng.gen_bool(paste_p) {
        events.push(Event::new(
            at,
            EventKind::Paste {
                field_id: Some("income_field".into()),
            },
        ));
    }
    if rng.gen_bool(change_p) {
        events.push(Event::new(
            at + 1,
            EventKind::DeviceChange {
                old_ip: Some(ip.to_string()),
                new_ip: Some(format!("198.51.100.{}", rng.gen_range(1..255))),
            },
        ));
    }
    events
}

/// A human-paced applicant on a desktop browser behind a private address.
pub fn genuine_request<R: Rng + ?Sized>(rng: &mut R, identity_id: &str) -> AssessmentRequest {
    let ip = format!("192.168.{}.{}", rng.gen_range(0..255), rng.gen_range(1..255));
    let start = EPOCH_MS + rng.gen_range(0..86_400_000);
    let cpm = rng.gen_range(250.0..650.0);
    let error_rate = rng.gen_range(0.05..0.2);
    let keys = rng.gen_range(40..120);
    let (mut events, typed_until) = typing(rng, start, keys, cpm, error_rate, 0.35);

    // Curved path with hand tremor and uneven sampling.
    let moves = rng.gen_range(20..60);
    let (x0, y0) = (rng.gen_range(50.0..400.0), rng.gen_range(50.0..400.0));
    let (x1, y1) = (rng.gen_range(600.0..1200.0), rng.gen_range(300.0..700.0));
    let bow = rng.gen_range(40.0..160.0);
    let mut t = typed_until + rng.gen_range(200..1500);
    for i in 0..moves {
        let s = i as f64 / (moves - 1) as f64;
        let arc = bow * (std::f64::consts::PI * s).sin();
        let x = x0 + (x1 - x0) * s + rng.gen_range(-3.0..3.0);
        let y = y0 + (y1 - y0) * s - arc + rng.gen_range(-3.0..3.0);
        events.push(Event::pointer_move(t, x, y));
        t += rng.gen_range(12..45);
    }
    for _ in 0..rng.gen_range(1..4) {
        t += rng.gen_range(80..400);
        events.push(Event::pointer_click(t, x1, y1));
    }

    events.extend(side_signals(rng, start + 10, 0.05, 0.10, &ip));
    events.shuffle(rng);

    AssessmentRequest {
        identity_id: identity_id.to_string(),
        ip,
        user_agent: DESKTOP_AGENTS.choose(rng).copied().unwrap_or(DESKTOP_AGENTS[0]).to_string(),
        events: Session::new(events),
    }
}

/// A scripted client: machine-speed typing, straight constant-speed pointer path, headless browser.
pub fn bot_request<R: Rng + ?Sized>(rng: &mut R, identity_id: &str, ip: &str) -> AssessmentRequest {
    let start = EPOCH_MS + rng.gen_range(0..86_400_000);
    let cpm = rng.gen_range(2000.0..6000.0);
    let keys = rng.gen_range(40..120);
    let (mut events, typed_until) = typing(rng, start, keys, cpm, 0.0, 0.0);

    let moves = rng.gen_range(5..15);
    let step = rng.gen_range(40.0..80.0);
    let mut t = typed_until + 10;
    for i in 0..moves {
        let d = step * i as f64;
        events.push(Event::pointer_move(t, 100.0 + d, 100.0 + d * 0.5));
        t += 10;
    }
    events.push(Event::pointer_click(t, 100.0 + step * (moves - 1) as f64, 100.0));

    events.extend(side_signals(rng, start + 10, 0.8, 0.6, ip));

    AssessmentRequest {
        identity_id: identity_id.to_string(),
        ip: ip.to_string(),
        user_agent: HEADLESS_AGENT.to_string(),
        events: Session::new(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeystrokeConfig;
    use crate::features::{KeystrokeExtractor, MouseExtractor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generators_are_seeded() {
        let a = genuine_request(&mut StdRng::seed_from_u64(1), "g");
        let b = genuine_request(&mut StdRng::seed_from_u64(1), "g");
        assert_eq!(a, b);
    }

    #[test]
    fn test_genuine_profile() {
        let mut rng = StdRng::seed_from_u64(11);
        let keystroke = KeystrokeExtractor::new(&KeystrokeConfig::default());
        for i in 0..20 {
            let r = genuine_request(&mut rng, &format!("g{i}"));
            let fv = keystroke.extract(&r.events);
            let cpm = fv.get_f64("avg_typing_speed_cpm").unwrap();
            assert!((150.0..1100.0).contains(&cpm), "cpm {cpm}");
            assert!(r.ip.starts_with("192.168."));
            let mouse = MouseExtractor::new().extract(&r.events, false);
            assert!(mouse.get_f64("straightness").unwrap() < 1.0);
        }
    }

    #[test]
    fn test_bot_profile() {
        let mut rng = StdRng::seed_from_u64(5);
        let r = bot_request(&mut rng, "b", "203.0.113.9");
        assert_eq!(r.ip, "203.0.113.9");
        assert!(r.user_agent.to_lowercase().contains("headless"));

        let fv = KeystrokeExtractor::new(&KeystrokeConfig::default()).extract(&r.events);
        assert!(fv.get_f64("avg_typing_speed_cpm").unwrap() > 1500.0);
        assert_eq!(fv.get_f64("error_rate"), Some(0.0));

        let mouse = MouseExtractor::new().extract(&r.events, true);
        assert_eq!(mouse.get_f64("straightness"), Some(1.0));
        assert_eq!(mouse.get_f64("std_dev_velocity"), Some(0.0));
    }
}
