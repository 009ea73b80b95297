use motor_telemetry::{new_message_id, new_request_ids};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn message_ids_are_unique() {
    assert_ne!(new_message_id(), new_message_id());
}
