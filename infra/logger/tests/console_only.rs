use mple_logger::{LevelFilter, Logger};

#[test]
fn console_only_logger_keeps_no_file_writer() {
    let logger = Logger::builder("integration-console-only")
        .level(LevelFilter::WARN)
        .init()
        .expect("logger should initialize");

    assert!(!logger.writes_file(), "console-only logger should not own a file writer");
    tracing::warn!("console only");
}
