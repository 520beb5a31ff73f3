//! Integration tests for tracing and event monitoring.
//!
//! These tests demonstrate how to use the tracing callback to monitor lookup
//! operations, which is useful for debugging and auditing.

use dual_key_registry::{define_lookup, Identifiable, LookupKey, RegistryEvent};
use std::sync::{Arc, Mutex};

pub struct Tile {
    id: u64,
    index: i32,
}

impl Identifiable<u64, i32> for Tile {
    fn identity(&self) -> u64 {
        self.id
    }

    fn index(&self) -> i32 {
        self.index
    }
}

fn tile(id: u64, index: i32) -> Arc<Tile> {
    Arc::new(Tile { id, index })
}

type Captured = Arc<Mutex<Vec<String>>>;

fn capture(set: impl FnOnce(Box<dyn Fn(&RegistryEvent<u64, i32>) + Send + Sync>)) -> Captured {
    let events: Captured = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    set(Box::new(move |event| {
        events_clone.lock().unwrap().push(event.to_string());
    }));
    events
}

define_lookup!(traced1, u64, i32, Tile);
define_lookup!(traced2, u64, i32, Tile);
define_lookup!(traced3, u64, i32, Tile);
define_lookup!(traced4, u64, i32, Tile);
define_lookup!(traced5, u64, i32, Tile);
define_lookup!(traced6, u64, i32, Tile);

#[test]
fn test_basic_tracing() {
    let events = capture(|callback| traced1::set_trace_callback(callback));

    traced1::insert(tile(1, 0));
    let _ = traced1::get(1);
    traced1::delete_at(0);
    traced1::clear();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "insert { identity: 1, index: 0, overwrite: false, accepted: true }",
            "get { key: identity 1, found: true }",
            "delete { key: index 0, removed: true }",
            "clear { removed: 0 }",
        ]
    );
}

#[test]
fn test_trace_rejected_insert() {
    let events = capture(|callback| traced2::set_trace_callback(callback));

    assert!(traced2::insert(tile(1, 0)));
    assert!(!traced2::insert(tile(2, 0)));
    assert!(!traced2::insert(tile(0, 5)));

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 3);
    assert!(captured[1].contains("accepted: false"));
    assert!(captured[2].contains("identity: 0"));
    assert!(captured[2].contains("accepted: false"));
}

#[test]
fn test_trace_eviction_on_overwrite() {
    let events: Arc<Mutex<Vec<RegistryEvent<u64, i32>>>> = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);

    assert!(traced3::insert(tile(1, 0)));
    assert!(traced3::insert(tile(2, 1)));

    traced3::set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.clone());
    });
    traced3::set(1, tile(1, 1)).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            RegistryEvent::Evict {
                identity: 1,
                index: 0
            },
            RegistryEvent::Evict {
                identity: 2,
                index: 1
            },
            RegistryEvent::Insert {
                identity: 1,
                index: 1,
                overwrite: true,
                accepted: true
            },
        ]
    );
}

#[test]
fn test_trace_get_found_and_not_found() {
    let events = capture(|callback| traced4::set_trace_callback(callback));

    traced4::insert(tile(7, 3));
    let _ = traced4::get_at(3);
    let _ = traced4::get_at(4);
    let _ = traced4::get_at(-1);

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 4);
    assert!(captured[1].contains("found: true"));
    assert!(captured[2].contains("found: false"));
    assert_eq!(captured[3], "get { key: index -1, found: false }");
}

#[test]
fn test_clear_trace_callback() {
    let events = capture(|callback| traced5::set_trace_callback(callback));

    traced5::insert(tile(1, 0));
    traced5::clear_trace_callback();
    traced5::insert(tile(2, 1));
    let _ = traced5::get(2);

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 1);
}

#[test]
fn test_trace_event_carries_lookup_key() {
    let keys: Arc<Mutex<Vec<LookupKey<u64, i32>>>> = Arc::new(Mutex::new(Vec::new()));
    let keys_clone = Arc::clone(&keys);

    traced6::set_trace_callback(move |event| {
        if let RegistryEvent::Delete { key, .. } = event {
            keys_clone.lock().unwrap().push(*key);
        }
    });

    traced6::insert(tile(1, 0));
    traced6::delete(1);
    traced6::delete_at(9);

    assert_eq!(
        *keys.lock().unwrap(),
        vec![LookupKey::Identity(1), LookupKey::Index(9)]
    );
}
