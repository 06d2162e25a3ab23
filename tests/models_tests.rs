use serde_json::json;

use matchsync::{ClientMessage, MatchLookup, MatchStatus, PushMessage, StatusLookup};

#[test]
fn status_maps_wire_values() {
    assert_eq!(MatchStatus::from("idle".to_string()), MatchStatus::Idle);
    assert_eq!(
        MatchStatus::from("in_lobby".to_string()),
        MatchStatus::InLobby
    );
    assert_eq!(
        MatchStatus::from("navigating".to_string()),
        MatchStatus::Navigating
    );
    assert_eq!(
        MatchStatus::from("completed".to_string()),
        MatchStatus::Completed
    );

    assert_eq!(MatchStatus::Idle.as_str(), "idle");
    assert_eq!(MatchStatus::InLobby.as_str(), "in_lobby");
    assert_eq!(MatchStatus::Navigating.as_str(), "navigating");
    assert_eq!(MatchStatus::Completed.as_str(), "completed");
}

#[test]
fn unknown_status_is_preserved_verbatim() {
    let status = MatchStatus::from("waiting_for_driver".to_string());
    assert_eq!(
        status,
        MatchStatus::Unknown("waiting_for_driver".to_string())
    );
    assert_eq!(status.as_str(), "waiting_for_driver");
    assert!(!status.requires_match());

    // Serde carries the original string through untouched.
    let parsed: MatchStatus = serde_json::from_value(json!("waiting_for_driver")).unwrap();
    assert_eq!(parsed, status);
    assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("waiting_for_driver"));
}

#[test]
fn only_known_non_idle_statuses_require_a_match() {
    assert!(!MatchStatus::Idle.requires_match());
    assert!(MatchStatus::InLobby.requires_match());
    assert!(MatchStatus::Navigating.requires_match());
    assert!(MatchStatus::Completed.requires_match());
}

#[test]
fn lookup_responses_deserialize() {
    let lookup: MatchLookup = serde_json::from_value(json!({ "match_id": "77" })).unwrap();
    assert_eq!(lookup.match_id.as_deref(), Some("77"));

    let lookup: MatchLookup = serde_json::from_value(json!({ "match_id": null })).unwrap();
    assert_eq!(lookup.match_id, None);

    let lookup: StatusLookup = serde_json::from_value(json!({ "status": "navigating" })).unwrap();
    assert_eq!(lookup.status, MatchStatus::Navigating);
}

#[test]
fn push_messages_dispatch_on_type_tag() {
    assert_eq!(
        PushMessage::parse(r#"{"type":"status_update"}"#).unwrap(),
        PushMessage::StatusUpdate
    );

    // Extra payload fields are allowed and ignored.
    assert_eq!(
        PushMessage::parse(r#"{"type":"status_update","match_id":"77"}"#).unwrap(),
        PushMessage::StatusUpdate
    );

    // Future message kinds fail safe into Unknown.
    assert_eq!(
        PushMessage::parse(r#"{"type":"driver_nearby","eta":120}"#).unwrap(),
        PushMessage::Unknown("driver_nearby".to_string())
    );
}

#[test]
fn malformed_push_messages_are_parse_errors() {
    assert!(PushMessage::parse("not json").is_err());
    assert!(PushMessage::parse(r#"{"no_tag":true}"#).is_err());
    assert!(PushMessage::parse(r#"{"type":42}"#).is_err());
}

#[test]
fn client_messages_serialize_with_type_tags() {
    let confirm = serde_json::to_value(ClientMessage::confirm_match("77")).unwrap();
    assert_eq!(
        confirm,
        json!({ "type": "confirm_match", "match_id": "77" })
    );

    let join = serde_json::to_value(ClientMessage::join_pool()).unwrap();
    assert_eq!(
        join,
        json!({ "type": "join_pool", "skill_level": 1000, "preferences": {} })
    );

    let join_with_location = serde_json::to_value(ClientMessage::JoinPool {
        skill_level: 1200,
        preferences: json!({ "mode": "ranked" }),
        location: Some(json!([35.68, 139.76])),
    })
    .unwrap();
    assert_eq!(
        join_with_location,
        json!({
            "type": "join_pool",
            "skill_level": 1200,
            "preferences": { "mode": "ranked" },
            "location": [35.68, 139.76]
        })
    );
}
