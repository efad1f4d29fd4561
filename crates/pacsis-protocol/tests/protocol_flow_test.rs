//! Integration tests for the command/update exchange.
//!
//! A mock receiver decodes frames exactly as the controller would and checks
//! that nothing beyond the documented fields travels on the wire.

use pacsis_protocol::{Command, Inbound, ProtocolCodec, ProtocolError, Target, Update};
use serde_json::Value;

/// Decode a frame on the device side and return the payload object.
fn receive(frame: &str, expected_key: &str) -> serde_json::Map<String, Value> {
    let value: Value = serde_json::from_str(frame).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1, "frame must have exactly one top-level key");
    object
        .get(expected_key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(|| panic!("frame {frame} has no {expected_key} object"))
}

#[test]
fn test_open_door_roundtrip_carries_only_ids() {
    let codec = ProtocolCodec::new();
    let frame = codec.encode(&Command::open_door("D1", "M1")).unwrap();

    let payload = receive(&frame, "OpenDoor");
    assert_eq!(payload.len(), 2);
    assert_eq!(payload["DoorId"], "D1");
    assert_eq!(payload["Id"], "M1");

    let decoded = codec.decode_command(&frame).unwrap();
    assert_eq!(decoded, Command::OpenDoor(Target::new("D1", "M1")));
}

#[test]
fn test_swipe_card_payload_fields() {
    let codec = ProtocolCodec::new();
    let frame = codec
        .encode(&Command::swipe_card("D1", "R1", 101, 23456))
        .unwrap();

    let payload = receive(&frame, "SwipeCard");
    assert_eq!(payload.len(), 4);
    assert_eq!(payload["FacilityCode"], 101);
    assert_eq!(payload["CardNumber"], 23456);
}

#[test]
fn test_request_update_payload_is_empty() {
    let codec = ProtocolCodec::new();
    let frame = codec.encode(&Command::request_update()).unwrap();
    assert!(receive(&frame, "RequestUpdate").is_empty());
}

#[test]
fn test_empty_pin_is_never_encoded() {
    let codec = ProtocolCodec::new();
    for command in [
        Command::enter_pin("D1", "R1", ""),
        Command::enter_pin("", "R1", "1234"),
        Command::enter_pin("D1", "", "1234"),
    ] {
        let err = codec.encode(&command).unwrap_err();
        let ProtocolError::MissingField { command, .. } = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(command, "EnterPIN");
    }
}

#[test]
fn test_device_rejects_extra_fields() {
    let codec = ProtocolCodec::new();
    let frame = r#"{"OpenDoor":{"DoorId":"D1","Id":"M1","Force":true}}"#;
    assert!(codec.decode_command(frame).is_err());
}

#[test]
fn test_resync_stream_is_individual_updates() {
    let codec = ProtocolCodec::new();
    let frames = [
        r#"{"Update":{"DoorId":"D1","Id":"M1","IsActive":false}}"#,
        r#"{"Update":{"DoorId":"D1","Id":"L1","IsActive":true}}"#,
        r#"{"Update":{"DoorId":"D1","Id":"L2","IsActive":true}}"#,
    ];

    let decoded: Vec<Inbound> = frames.iter().map(|f| codec.decode(f).unwrap()).collect();
    assert_eq!(
        decoded,
        vec![
            Inbound::Update(Update::new("D1", "M1", false)),
            Inbound::Update(Update::new("D1", "L1", true)),
            Inbound::Update(Update::new("D1", "L2", true)),
        ]
    );
}
