use mple_logger::{LogFormat, Logger, Rotation};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_events() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder("publish-run")
        .console(false)
        .format(LogFormat::Json)
        .rotation(Rotation::NEVER)
        .directory(&log_dir)
        .init()?;

    assert!(logger.writes_file());
    tracing::info!(path = "src/ic_mple_pocket_ic", "publishing");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let content = fs::read_to_string(&log_file)?;
    let first = content.lines().next().expect("at least one event");
    assert!(first.starts_with('{'), "expected a JSON line, got: {first}");
    assert!(content.contains("publishing"));

    Ok(())
}
