use std::error::Error;
use std::io::Write;

use leadpilot_config::{CONFIG_PATH_ENV, ConfigError, load_with};

#[test]
fn file_values_are_overridden_by_environment() -> Result<(), Box<dyn Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"api": {{"base_url": "https://file.example", "api_key": "from-file"}},
            "sync": {{"page_size": 10, "debounce_ms": 400}}}}"#
    )?;
    let path = file.path().to_string_lossy().into_owned();

    let config = load_with(|key| match key {
        CONFIG_PATH_ENV => Some(path.clone()),
        "LEADPILOT_API_KEY" => Some("from-env".to_string()),
        _ => None,
    })?;

    assert_eq!(config.api.base_url, "https://file.example");
    assert_eq!(config.api.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.sync.page_size, 10);
    assert_eq!(config.sync.debounce_ms, 400);
    assert_eq!(config.sync.poll_interval_ms, 5_000);
    Ok(())
}

#[test]
fn unreadable_file_reports_io_error() {
    let result = load_with(|key| {
        (key == CONFIG_PATH_ENV).then(|| "/nonexistent/leadpilot.json".to_string())
    });
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn malformed_file_reports_parse_error() -> Result<(), Box<dyn Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "{{ not json")?;
    let path = file.path().to_string_lossy().into_owned();
    let result = load_with(|key| (key == CONFIG_PATH_ENV).then(|| path.clone()));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
    Ok(())
}

#[test]
fn file_values_still_pass_through_validation() -> Result<(), Box<dyn Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"sync": {{"page_size": 0}}}}"#)?;
    let path = file.path().to_string_lossy().into_owned();
    let result = load_with(|key| (key == CONFIG_PATH_ENV).then(|| path.clone()));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidField { field: "page_size", .. })
    ));
    Ok(())
}
