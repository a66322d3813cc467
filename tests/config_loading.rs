// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use rundag::config::{ConfigFile, load_and_validate, parse_duration};
use rundag::errors::RundagError;
use rundag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_task_file_is_loaded_with_durations() -> TestResult {
    let file = write_config(
        r#"
[config]
workers = 4
queue_capacity = 8
poll_interval = "250ms"
task_timeout = "30s"

[task.fetch]
cmd = "echo fetch"

[task.build]
cmd = "echo build"
after = ["fetch"]
timeout = "5m"
"#,
    );

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.scheduler.workers, 4);
    assert_eq!(cfg.scheduler.effective_queue_capacity(), 8);
    assert_eq!(cfg.scheduler.poll_interval, Duration::from_millis(250));
    assert_eq!(cfg.scheduler.task_timeout, Some(Duration::from_secs(30)));

    let build = &cfg.task["build"];
    assert_eq!(build.after, vec!["fetch"]);
    assert_eq!(build.timeout, Some(Duration::from_secs(300)));
    assert_eq!(cfg.task["fetch"].timeout, None);
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_absent() -> TestResult {
    let file = write_config(
        r#"
[task.only]
cmd = "true"
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.scheduler.workers, 2);
    assert_eq!(cfg.scheduler.effective_queue_capacity(), 2);
    assert_eq!(cfg.scheduler.poll_interval, Duration::from_millis(100));
    assert_eq!(cfg.scheduler.task_timeout, None);
    Ok(())
}

#[test]
fn empty_task_file_is_rejected() {
    let file = write_config("[config]\nworkers = 1\n");

    match load_and_validate(file.path()) {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_workers_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_workers(0)
        .with_task("A", TaskConfigBuilder::new("true").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("workers")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_queue_capacity_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_queue_capacity(0)
        .with_task("A", TaskConfigBuilder::new("true").build())
        .raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(RundagError::ConfigError(_))
    ));
}

#[test]
fn self_dependency_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("true").after("A").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn bad_duration_names_the_field() {
    let raw = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("true").timeout("10 parsecs").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(RundagError::ConfigError(msg)) => {
            assert!(msg.contains("[task.A].timeout"));
            assert!(msg.contains("unsupported duration unit"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_dependencies_and_cycles_are_left_to_the_scheduler() {
    let cfg = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("true").after("B").build())
        .with_task("B", TaskConfigBuilder::new("true").after("A").build())
        .with_task("X", TaskConfigBuilder::new("true").after("Y").build())
        .build();

    let graph = cfg.dependency_graph();
    assert_eq!(
        graph.missing_dependencies(),
        &[("X".to_string(), "Y".to_string())]
    );
    assert!(graph.topological_order().is_err());
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let file = write_config("[task.A\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(RundagError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Rundag.toml"),
        Err(RundagError::IoError(_))
    ));
}

#[test]
fn to_tasks_carries_dependencies_and_timeouts() {
    let cfg = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("true").build())
        .with_task(
            "B",
            TaskConfigBuilder::new("true").after("A").timeout("2s").build(),
        )
        .build();

    let tasks = cfg.to_tasks();
    assert_eq!(tasks.len(), 2);

    let b = tasks.iter().find(|t| t.id() == "B").unwrap();
    assert!(b.dependencies().contains("A"));
    assert_eq!(b.timeout(), Some(Duration::from_secs(2)));
}

#[test]
fn durations_accept_all_supported_units() {
    assert_eq!(parse_duration("15ms"), Ok(Duration::from_millis(15)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("ms").is_err());
}

#[test]
fn oversized_duration_is_an_error_not_an_overflow() {
    assert!(parse_duration("9999999999999999h").is_err());
    assert!(parse_duration("18446744073709551615m").is_err());

    let raw = ConfigFileBuilder::new()
        .with_task_timeout("9999999999999999h")
        .with_task("A", TaskConfigBuilder::new("true").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(RundagError::ConfigError(msg)) => {
            assert!(msg.contains("[config].task_timeout"));
            assert!(msg.contains("too large"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}
