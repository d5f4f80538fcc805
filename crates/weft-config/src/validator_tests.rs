use super::*;

#[test]
fn test_default_config_is_valid() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_zero_resume_deadline() {
    let mut config = Config::default();
    config.coroutine.resume_deadline_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert_eq!(result.errors[0].path, "coroutine.resume_deadline_ms");
}

#[test]
fn test_long_resume_deadline_warns() {
    let mut config = Config::default();
    config.coroutine.resume_deadline_ms = 120_000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_empty_sqlite_path() {
    let mut config = Config::default();
    config.backend.sqlite_path = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "backend.sqlite_path"));
}

#[test]
fn test_zero_lease() {
    let mut config = Config::default();
    config.backend.lease_secs = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "backend.lease_secs"));
}

#[test]
fn test_zero_poll_interval() {
    let mut config = Config::default();
    config.worker.poll_interval_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "worker.poll_interval_ms"));
}

#[test]
fn test_unknown_log_level_warns() {
    let mut config = Config::default();
    config.logging.level = "loud".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "logging.level"));
}

#[test]
fn test_filter_directive_is_accepted() {
    let mut config = Config::default();
    config.logging.level = "weft_sync=debug,info".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_multiple_errors_are_collected() {
    let mut config = Config::default();
    config.coroutine.resume_deadline_ms = 0;
    config.backend.lease_secs = 0;
    config.worker.poll_interval_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert_eq!(result.errors.len(), 3);
}
