//! Record log round trips and controller properties

use display_area::app::Config;
use display_area::core::{DisplayTree, KernelMessage, Metadata, MimeData, OutputRecord};
use display_area::render::FnRenderer;
use display_area::{AppendOutcome, OutputArea};
use proptest::prelude::*;
use serde_json::{json, Value};

fn area() -> OutputArea {
    OutputArea::default()
}

fn data(value: Value) -> MimeData {
    value.as_object().cloned().unwrap_or_default()
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z \n]{0,12}",
        "[a-z]{1,6}\r[a-z]{0,6}\n",
        "[a-z]{0,6}\r",
        "\x1b\\[3[0-7]m[a-z]{1,4}\r[a-z]{0,4}\x1b\\[0m",
        "\x1b\\[3[0-7]m[a-z]{1,6}\x1b\\[0m",
    ]
}

fn arb_record() -> impl Strategy<Value = OutputRecord> {
    prop_oneof![
        (prop_oneof![Just("stdout"), Just("stderr")], arb_text())
            .prop_map(|(name, text)| OutputRecord::stream(name, text)),
        arb_text().prop_map(|text| OutputRecord::display_data(
            data(json!({"text/plain": text})),
            Metadata::new()
        )),
        ("[a-z<>&]{0,10}", any::<Option<u32>>()).prop_map(|(html, count)| {
            OutputRecord::execute_result(
                data(json!({"text/html": html, "text/plain": "x"})),
                Metadata::new(),
                count.map(u64::from),
            )
        }),
        prop::collection::vec("[A-Za-z:' ]{0,10}", 0..3)
            .prop_map(|traceback| OutputRecord::error("E", "v", traceback)),
    ]
}

proptest! {
    #[test]
    fn prop_replay_matches_direct_rendering(records in prop::collection::vec(arb_record(), 0..12)) {
        let mut direct = area();
        for record in records {
            let _ = direct.append(record);
        }

        let json = direct.to_json_string().unwrap();
        let mut replayed = area();
        prop_assert!(replayed.from_json_str(&json).unwrap().is_empty());

        prop_assert_eq!(replayed.to_json(), direct.to_json());
        prop_assert_eq!(replayed.snapshot(), direct.snapshot());
        prop_assert_eq!(replayed.to_json_string().unwrap(), json);
    }

    #[test]
    fn prop_clear_is_idempotent(records in prop::collection::vec(arb_record(), 0..6)) {
        let mut area = area();
        for record in records {
            let _ = area.append(record);
        }
        area.clear_output(false);
        let once = area.snapshot();
        area.clear_output(false);
        prop_assert_eq!(area.snapshot(), once);
        prop_assert!(area.outputs().is_empty());
        prop_assert!(area.target().is_empty());
    }

    #[test]
    fn prop_consecutive_chunks_merge(chunks in prop::collection::vec("[a-z ]{1,8}", 1..8)) {
        let mut area = area();
        for chunk in &chunks {
            let _ = area.append(OutputRecord::stream("stdout", chunk.as_str()));
        }
        prop_assert_eq!(area.outputs(), &[OutputRecord::stream("stdout", chunks.concat())]);
        prop_assert_eq!(area.target().len(), 1);
    }
}

#[test]
fn test_alternating_streams_never_merge() {
    let mut area = area();
    for (name, text) in [("stdout", "a"), ("stderr", "b"), ("stdout", "c")] {
        let _ = area.append(OutputRecord::stream(name, text));
    }
    assert_eq!(area.outputs().len(), 3);
    assert_eq!(area.target().len(), 3);
}

#[test]
fn test_stream_overwritten_to_empty_replays_empty() {
    let mut direct = area();
    let _ = direct.append(OutputRecord::stream("stdout", "abc"));
    let _ = direct.append(OutputRecord::stream("stdout", "\r"));

    let json = direct.to_json_string().unwrap();
    let mut replayed = area();
    assert!(replayed.from_json_str(&json).unwrap().is_empty());
    assert!(direct.target().is_empty());
    assert_eq!(replayed.snapshot(), direct.snapshot());
}

#[test]
fn test_deferred_clear_then_display() {
    let mut area = area();
    let _ = area.handle(&KernelMessage::new("stream", json!({"name": "stdout", "text": "old"})));
    let _ = area.handle(&KernelMessage::new("clear_output", json!({"wait": true})));
    let _ = area.handle(&KernelMessage::new(
        "display_data",
        json!({"data": {"text/plain": "new"}, "metadata": {}}),
    ));
    assert_eq!(area.outputs().len(), 1);
    assert_eq!(area.target().len(), 1);
    assert!(!area.to_html().contains("old"));
}

#[test]
fn test_deferred_render_survives_roundtrip() {
    let config = Config {
        defer_images: true,
        ..Config::default()
    };
    let mut area = OutputArea::builder(DisplayTree::new())
        .config(config.clone())
        .build();
    let outcome = area.append(OutputRecord::display_data(
        data(json!({"image/png": "aGk=", "text/plain": "img"})),
        Metadata::new(),
    ));
    let AppendOutcome::Pending(pending) = outcome else {
        panic!("expected a pending render");
    };
    assert!(area.complete(pending));

    let json = area.to_json_string().unwrap();
    let mut replayed = OutputArea::builder(DisplayTree::new()).config(config).build();
    let pending = replayed.from_json_str(&json).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(replayed.target().pending(), 1);
    for render in pending {
        assert!(replayed.complete(render));
    }
    assert_eq!(replayed.snapshot(), area.snapshot());
}

#[test]
fn test_bundle_validation_keeps_json() {
    let mut area = area();
    let _ = area.append(OutputRecord::display_data(
        data(json!({
            "application/json": {"nested": true},
            "text/plain": "shown",
            "text/html": ["not", "a", "string"]
        })),
        Metadata::new(),
    ));
    assert_eq!(area.snapshot().kinds(), vec!["output_text"]);
    let json = area.to_json_string().unwrap();
    let saved: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(saved[0]["data"]["application/json"], json!({"nested": true}));
    assert!(saved[0]["data"].get("text/html").is_none());
}

#[test]
fn test_panicking_renderer_is_isolated() {
    let mut area = area();
    area.register_renderer(FnRenderer::new("text/plain", |_: &Value, _: &Metadata| {
        panic!("renderer exploded")
    }));
    let _ = area.append(OutputRecord::display_data(
        data(json!({"text/plain": "x"})),
        Metadata::new(),
    ));
    assert_eq!(area.snapshot().kinds(), vec!["output_failure"]);
    assert!(area.to_html().contains("renderer exploded"));
    assert_eq!(area.outputs().len(), 1);
}

#[test]
fn test_fallback_renders_unknown_type() {
    let mut area = area();
    area.set_fallback_renderer(FnRenderer::new("*", |payload: &Value, _: &Metadata| {
        Ok(display_area::core::Fragment::subarea("output_fallback")
            .with_text(payload.as_str().unwrap_or_default()))
    }));
    let _ = area.append(OutputRecord::display_data(
        data(json!({"application/x-thing": "thing"})),
        Metadata::new(),
    ));
    assert_eq!(area.snapshot().kinds(), vec!["output_fallback"]);
    assert!(area.to_html().contains("thing"));
}
