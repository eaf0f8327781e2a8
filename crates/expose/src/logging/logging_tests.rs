#![allow(non_snake_case)]

use super::*;

#[test]
fn init_logging___second_call___is_noop() {
    let _ = init_logging("info");

    assert!(!init_logging("debug"));
}

#[test]
fn set_log_level___after_init___reloads_filter() {
    let _ = init_logging("info");

    assert!(set_log_level("expose=debug").is_ok());
}

#[test]
fn set_log_level___invalid_directive___fails() {
    let err = set_log_level("expose=loud").unwrap_err();

    assert!(err.to_string().contains("invalid log level"));
}
