use super::*;

#[test]
fn lifecycle_error_messages_are_human_readable() {
    let err = LifecycleError::Config("bad field".to_string());
    assert_eq!(err.to_string(), "config error: bad field");
}
