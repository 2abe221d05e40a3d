// Snapshot publisher tests: placeholder, state transitions and torn-read freedom

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use sysmon::publisher::{NOT_READY_DOCUMENT, NOT_READY_HISTORY, PublisherState, SnapshotPublisher};

#[test]
fn test_not_ready_placeholder_verbatim() {
    let publisher = SnapshotPublisher::new();
    let snapshot = publisher.read();
    assert_eq!(
        &snapshot.document[..],
        br#"{"error":"Data not ready yet","timestamp":0}"#
    );
    assert_eq!(&snapshot.history[..], NOT_READY_HISTORY.as_bytes());
    assert_eq!(snapshot.cycle, 0);
    assert!(!snapshot.is_ready());
    assert_eq!(publisher.state(), PublisherState::NotReady);
}

#[test]
fn test_placeholders_are_valid_json() {
    for text in [NOT_READY_DOCUMENT, NOT_READY_HISTORY] {
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(value["timestamp"], 0);
    }
}

#[test]
fn test_publish_transitions_to_ready() {
    let publisher = SnapshotPublisher::default();
    assert_eq!(publisher.publish("{\"a\":1}", "{\"count\":0}"), 1);
    assert_eq!(publisher.state(), PublisherState::Ready);
    assert_eq!(publisher.publish("{\"a\":2}", "{\"count\":1}"), 2);

    let snapshot = publisher.read();
    assert_eq!(&snapshot.document[..], b"{\"a\":2}");
    assert_eq!(&snapshot.history[..], b"{\"count\":1}");
    assert_eq!(snapshot.cycle, 2);
}

#[test]
fn test_held_snapshot_is_unaffected_by_later_publish() {
    let publisher = SnapshotPublisher::new();
    publisher.publish("first", "h1");
    let held = publisher.read();
    publisher.publish("second", "h2");
    assert_eq!(&held.document[..], b"first");
    assert_eq!(&publisher.read().document[..], b"second");
}

fn pair(i: usize) -> (String, String) {
    let fill = char::from(b'a' + (i % 26) as u8);
    let document = format!("{{\"cycle\":{i},\"fill\":\"{}\"}}", fill.to_string().repeat(4096));
    let history = format!("{{\"count\":{i}}}");
    (document, history)
}

#[test]
fn test_concurrent_readers_never_see_torn_pairs() {
    let publisher = Arc::new(SnapshotPublisher::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let publisher = publisher.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut last_cycle = 0;
                while !done.load(Ordering::Relaxed) {
                    let snapshot = publisher.read();
                    assert!(snapshot.cycle >= last_cycle, "cycles never go backwards");
                    last_cycle = snapshot.cycle;
                    if !snapshot.is_ready() {
                        assert_eq!(&snapshot.document[..], NOT_READY_DOCUMENT.as_bytes());
                        continue;
                    }
                    let doc: serde_json::Value =
                        serde_json::from_slice(&snapshot.document).expect("complete document");
                    let hist: serde_json::Value =
                        serde_json::from_slice(&snapshot.history).expect("complete history");
                    // Both halves come from the same publish.
                    assert_eq!(doc["cycle"], hist["count"]);
                    let (expected, _) = pair(doc["cycle"].as_u64().unwrap() as usize);
                    assert_eq!(&snapshot.document[..], expected.as_bytes());
                }
            })
        })
        .collect();

    for i in 1..=2000 {
        let (document, history) = pair(i);
        publisher.publish(document, history);
    }
    done.store(true, Ordering::Relaxed);
    for r in readers {
        r.join().expect("reader thread");
    }
    assert_eq!(publisher.read().cycle, 2000);
}
