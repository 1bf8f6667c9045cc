#![allow(clippy::unwrap_used, clippy::expect_used)]

use chatwire_core::*;

// ---------------------------------------------------------------------------
// 1. Error display and categorisation
// ---------------------------------------------------------------------------

#[test]
fn error_messages_name_the_stage() {
    let err = ChatwireError::Transport("connection refused".into());
    assert_eq!(err.to_string(), "Transport error: connection refused");

    let err = ChatwireError::Application("quota exceeded".into());
    assert_eq!(err.to_string(), "Application error: quota exceeded");

    let err = ChatwireError::InvalidInput("question is empty".into());
    assert_eq!(err.to_string(), "Invalid input: question is empty");
}

#[test]
fn every_terminal_error_has_a_category() {
    let terminal = [
        ChatwireError::Transport("x".into()),
        ChatwireError::Disconnected,
        ChatwireError::Decode("x".into()),
        ChatwireError::Application("x".into()),
        ChatwireError::Config("x".into()),
        ChatwireError::Io(std::io::Error::other("x")),
    ];
    for err in &terminal {
        assert!(err.category().is_some(), "{err} should be categorised");
    }
}

// ---------------------------------------------------------------------------
// 2. Message serialization keeps ids stable
// ---------------------------------------------------------------------------

#[test]
fn message_serialization_keeps_id() {
    let msg = Message::assistant("partial reply");
    let json = serde_json::to_string(&msg).unwrap();
    let back: Message = serde_json::from_str(&json).unwrap();

    assert_eq!(back.id, msg.id);
    assert_eq!(back.role, Role::Assistant);
    assert_eq!(back.content, "partial reply");
    assert_eq!(back.timestamp, msg.timestamp);
}

// ---------------------------------------------------------------------------
// 3. StreamEvent wire form
// ---------------------------------------------------------------------------

#[test]
fn control_event_serializes_kind() {
    let ev = StreamEvent::Control {
        kind: ControlKind::End,
    };
    let json = serde_json::to_value(&ev).unwrap();
    assert_eq!(json, serde_json::json!({"type": "control", "kind": "end"}));
}
