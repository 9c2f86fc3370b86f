use mple_logger::{Logger, LoggerError};
use serial_test::serial;

#[test]
#[serial]
fn second_install_reports_subscriber_error() {
    let _logger = Logger::builder("integration-init-twice").init().expect("first init succeeds");

    let err = Logger::builder("integration-init-twice-second")
        .init()
        .expect_err("second init should fail");

    assert!(
        matches!(err, LoggerError::Subscriber { .. }),
        "expected subscriber error for second init, got {err}"
    );
}
