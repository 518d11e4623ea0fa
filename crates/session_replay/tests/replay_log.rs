use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use session_replay::{run, ReplayError, ReplayOptions};
use session_runtime::{TabId, WindowId};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}_{}_{}", process::id(), nanos));
    fs::create_dir_all(&path).expect("create temp dir");
    path
}

fn write_json(path: &PathBuf, value: &Value) {
    fs::write(path, serde_json::to_string(value).expect("encode")).expect("write file");
}

#[test]
fn replays_log_with_custom_config_and_capture() {
    let root = temp_dir("session_replay_custom");
    let events = root.join("events.json");
    let config = root.join("session.toml");
    write_json(
        &events,
        &json!([
            { "type": "windowOpened", "window": "main", "initialURL": "app://home" },
            { "type": "evolveTab", "window": "main", "tab": "home", "resource": "lists/7" },
            { "type": "tabDataFetched", "window": "main", "tab": "home",
              "data": { "games": { "g1": 1 } } },
            { "type": "tabDataFetched", "window": "main", "tab": "home",
              "data": { "games": { "g2": 2 } } }
        ]),
    );
    fs::write(
        &config,
        "deep_fields = [\"web\"]\ninternal_scheme = \"app\"\ncollection_prefix = \"lists/\"\nbootstrap_tab = \"home\"\n",
    )
    .expect("write config");

    let report = run(&ReplayOptions {
        events,
        config: Some(config),
        capture: Some(WindowId::new("main")),
    })
    .expect("replay");

    assert_eq!(report.applied, 4);
    let home = report
        .windows
        .tab(&WindowId::new("main"), &TabId::new("home"))
        .expect("bootstrap tab");
    assert_eq!(home.current_url(), "app://lists/7");
    assert_eq!(home.history().len(), 2);
    // `games` is not a deep field under this config, so the second fetch replaces it.
    assert_eq!(home.data().get("games"), Some(&json!({ "g2": 2 })));

    let snapshot = report.snapshot.as_ref().expect("captured snapshot");
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0]["id"], json!("home"));
    assert_eq!(snapshot.items[0].get("data"), None);

    let rendered: Value = serde_json::from_str(&report.to_json().expect("render")).expect("json");
    assert_eq!(rendered["applied"], json!(4));
    assert_eq!(
        rendered["windows"]["main"]["tabInstances"]["home"]["currentIndex"],
        json!(1)
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn missing_log_and_bad_events_are_reported() {
    let root = temp_dir("session_replay_errors");

    let missing = run(&ReplayOptions {
        events: root.join("absent.json"),
        config: None,
        capture: None,
    })
    .expect_err("missing log");
    assert!(matches!(missing, ReplayError::Io { .. }));

    let events = root.join("events.json");
    write_json(&events, &json!([{ "type": "teleportTab", "window": "main" }]));
    let bad = run(&ReplayOptions {
        events,
        config: None,
        capture: None,
    })
    .expect_err("unknown event");
    assert!(matches!(bad, ReplayError::Events { .. }));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn invalid_config_is_rejected_before_replay() {
    let root = temp_dir("session_replay_config");
    let events = root.join("events.json");
    let config = root.join("session.toml");
    write_json(&events, &json!([]));
    fs::write(&config, "internal_scheme = \"\"\n").expect("write config");

    let err = run(&ReplayOptions {
        events,
        config: Some(config),
        capture: None,
    })
    .expect_err("invalid config");
    assert!(matches!(err, ReplayError::Config(_)));

    let _ = fs::remove_dir_all(root);
}
