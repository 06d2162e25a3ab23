use matchsync::SyncError;

#[test]
fn error_messages_are_descriptive() {
    assert_eq!(
        SyncError::InvalidResponse("missing match_id".to_string()).to_string(),
        "Invalid response: missing match_id"
    );
    assert_eq!(
        SyncError::InvariantViolation("in_lobby without a match".to_string()).to_string(),
        "Server state violates session invariant: in_lobby without a match"
    );
    assert_eq!(
        SyncError::RetriesExhausted(5).to_string(),
        "Connection abandoned after 5 failed attempts"
    );
    assert_eq!(
        SyncError::ConnectionClosed.to_string(),
        "Connection explicitly closed"
    );
    assert_eq!(SyncError::NotConnected.to_string(), "Not connected");
}

#[test]
fn json_errors_convert_automatically() {
    let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let err: SyncError = parse_err.into();
    assert!(matches!(err, SyncError::ParseFailed(_)));
    assert!(err.to_string().starts_with("JSON parsing failed:"));
}

#[test]
fn only_connection_ending_errors_are_terminal() {
    assert!(SyncError::RetriesExhausted(5).is_terminal());
    assert!(SyncError::ConnectionClosed.is_terminal());

    assert!(!SyncError::NotConnected.is_terminal());
    assert!(!SyncError::InvalidResponse("bad".to_string()).is_terminal());
    assert!(!SyncError::InvariantViolation("bad".to_string()).is_terminal());
}
