// tests/cli_args.rs

use clap::Parser;
use tracing::level_filters::LevelFilter;

use rundag::cli::{CliArgs, LogLevel};
use rundag::logging::build_filter;

#[test]
fn defaults_when_no_flags_are_given() {
    let args = CliArgs::try_parse_from(["rundag"]).unwrap();
    assert_eq!(args.config, "Rundag.toml");
    assert_eq!(args.workers, None);
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
}

#[test]
fn all_flags_are_parsed() {
    let args = CliArgs::try_parse_from([
        "rundag",
        "--config",
        "ci/tasks.toml",
        "--workers",
        "6",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.config, "ci/tasks.toml");
    assert_eq!(args.workers, Some(6));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn zero_workers_is_rejected_by_the_parser() {
    assert!(CliArgs::try_parse_from(["rundag", "--workers", "0"]).is_err());
}

#[test]
fn log_level_flag_wins_over_environment() {
    let filter = build_filter(Some(LogLevel::Trace), Some("rundag=notalevel")).unwrap();
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
}

#[test]
fn environment_directives_are_used_without_flag() {
    let filter = build_filter(None, Some("warn")).unwrap();
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

    let filter = build_filter(None, Some("   ")).unwrap();
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

    assert!(build_filter(None, Some("rundag=notalevel")).is_err());
}
