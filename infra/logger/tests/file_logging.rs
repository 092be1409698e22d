use fc_logger::Logger;
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn log_files(dir: &Path) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
                .collect()
        })
        .unwrap_or_default()
}

// One global subscriber per process, so this binary holds a single init.
#[test]
#[serial]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("nested").join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .console(false)
        .json(true)
        .env_filter("info")
        .path(&log_dir)
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(char_id = "507f1f77bcf86cd799439011", "stored image");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let files = log_files(&log_dir);
    let log_file = files.first().expect("log file should be created");
    assert!(
        log_file.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with("integration-file-logging")),
        "log file should carry the logger name"
    );

    let contents = fs::read_to_string(log_file)?;
    let line = contents.lines().find(|l| l.contains("stored image")).expect("event should be logged");
    assert!(line.starts_with('{'), "expected a JSON line, got {line}");
    assert!(line.contains("507f1f77bcf86cd799439011"));

    Ok(())
}
