// tests/cli_args.rs
use std::path::PathBuf;

use clap::Parser;
use pancake::cli::{CliArgs, Command, LogLevel, MakeArgs};
use pancake::config::DEFAULT_SCRIPT_FILE;
use pancake::errors::PancakeError;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("arguments parse")
}

#[test]
fn bare_invocation_makes_the_default_target() {
    let args = parse(&["pancake"]);
    assert_eq!(args.file, PathBuf::from(DEFAULT_SCRIPT_FILE));
    assert_eq!(DEFAULT_SCRIPT_FILE, "Pancake.toml");
    assert!(args.directory.is_none());
    assert!(args.command.is_none());
}

#[test]
fn global_options() {
    let args = parse(&["pancake", "-F", "build/Other.toml", "-C", "project", "--log-level", "debug", "list", "-a"]);
    assert_eq!(args.file, PathBuf::from("build/Other.toml"));
    assert_eq!(args.directory, Some(PathBuf::from("project")));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(matches!(args.command, Some(Command::List { all: true })));
}

#[test]
fn make_subcommand_flags() {
    let args = parse(&["pancake", "make", "pack.zip", "--watch"]);
    let Some(Command::Make(make)) = args.command else {
        panic!("expected make");
    };
    assert_eq!(make.target.as_deref(), Some("pack.zip"));
    assert!(make.watch);
    assert!(!make.dry_run);

    let args = parse(&["pancake", "make", "-n"]);
    let make = args.command.expect("command").make_args().expect("make args").expect("make");
    assert!(make.target.is_none());
    assert!(make.dry_run);
}

#[test]
fn any_other_word_is_a_target() {
    let args = parse(&["pancake", "clean", "-n", "-w"]);
    let command = args.command.expect("command");
    assert!(matches!(command, Command::Target(_)));

    let make: MakeArgs = command.make_args().expect("make args").expect("make");
    assert_eq!(make.target.as_deref(), Some("clean"));
    assert!(make.dry_run);
    assert!(make.watch);
}

#[test]
fn list_is_not_a_make_request() {
    let args = parse(&["pancake", "list"]);
    assert!(args.command.expect("command").make_args().expect("parse").is_none());
}

#[test]
fn unexpected_flag_after_target_is_reported() {
    let args = parse(&["pancake", "clean", "--bogus"]);
    let err = args.command.expect("command").make_args().unwrap_err();
    assert!(matches!(err, PancakeError::ConfigError(_)));
}
