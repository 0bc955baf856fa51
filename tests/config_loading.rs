use std::io::Write;

use filterdag::config::{load_and_validate, ConfigFile};
use filterdag::errors::FilterdagError;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded() {
    let file = config_file(
        r#"
[engine]
reuse_current_task = false
require_all_fields_written = false

[demo]
user_id = 1
anchor_id = 2
name = "liSi"
age = 17
relation = 1
load_delay_ms = 0
filters = ["age_filter", "relation_filter"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert!(!cfg.engine.reuse_current_task);
    assert!(!cfg.engine.options().require_all_fields_written);
    assert_eq!(cfg.demo.user_id, 1);
    assert_eq!(cfg.demo.anchor_id, 2);
    assert_eq!(cfg.demo.name, "liSi");
    assert_eq!(cfg.demo.age, 17);
    assert_eq!(cfg.demo.relation, 1);
    assert_eq!(cfg.demo.load_delay_ms, 0);
    assert_eq!(cfg.demo.filters, vec!["age_filter", "relation_filter"]);
}

#[test]
fn test_empty_config_uses_defaults() {
    let file = config_file("");

    let cfg = load_and_validate(file.path()).unwrap();
    let defaults = ConfigFile::default();

    assert!(cfg.engine.reuse_current_task);
    assert!(cfg.engine.require_all_fields_written);
    assert_eq!(cfg.demo.name, defaults.demo.name);
    assert_eq!(cfg.demo.age, 21);
    assert!(cfg.demo.filters.is_empty());
}

#[test]
fn test_delay_above_bound_is_rejected() {
    let file = config_file("[demo]\nload_delay_ms = 60001\n");

    match load_and_validate(file.path()) {
        Err(FilterdagError::ConfigError(msg)) => assert!(msg.contains("load_delay_ms")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_duplicate_filter_name_is_rejected() {
    let file = config_file("[demo]\nfilters = [\"age_filter\", \"age_filter\"]\n");

    match load_and_validate(file.path()) {
        Err(FilterdagError::ConfigError(msg)) => assert!(msg.contains("age_filter")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_blank_filter_name_is_rejected() {
    let file = config_file("[demo]\nfilters = [\"  \"]\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FilterdagError::ConfigError(_))
    ));
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    let file = config_file("[demo\nage = 3\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FilterdagError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        load_and_validate(&path),
        Err(FilterdagError::IoError(_))
    ));
}

#[tokio::test]
async fn test_dry_run_accepts_a_config_file() {
    let file = config_file("[demo]\nfilters = [\"relation_filter\"]\nload_delay_ms = 0\n");

    let args = filterdag::cli::CliArgs {
        config: Some(file.path().display().to_string()),
        filters: Vec::new(),
        repeat: 1,
        log_level: None,
        dry_run: true,
    };
    filterdag::run(args).await.unwrap();
}

#[tokio::test]
async fn test_run_executes_repeated_invocations() {
    let file = config_file("[demo]\nload_delay_ms = 1\n");

    let args = filterdag::cli::CliArgs {
        config: Some(file.path().display().to_string()),
        filters: vec!["age_filter".to_string()],
        repeat: 4,
        log_level: None,
        dry_run: false,
    };
    filterdag::run(args).await.unwrap();
}

#[tokio::test]
async fn test_run_rejects_unknown_filter() {
    let file = config_file("[demo]\nload_delay_ms = 0\n");

    let args = filterdag::cli::CliArgs {
        config: Some(file.path().display().to_string()),
        filters: vec!["no_such_filter".to_string()],
        repeat: 1,
        log_level: None,
        dry_run: false,
    };
    assert!(filterdag::run(args).await.is_err());
}
