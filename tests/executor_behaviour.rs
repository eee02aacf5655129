// tests/executor_behaviour.rs
mod common;
use crate::common::{init_tracing, mock_engine, producing_action, recorded_phony, Recorder, RecordingReporter, ReportEvent};

use std::error::Error;
use std::path::Path;

use anyhow::{anyhow, bail};
use pancake::errors::{ActionPanic, PancakeError};
use pancake::exec::Progress;
use pancake::fs::FileSystem;
use pancake::rule::{Action, Context, Param, Rule};
use pancake::types::TargetConflictPolicy;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn reporter_sees_every_step_of_a_run() -> TestResult {
    init_tracing();
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    fs.add_file("in.txt", "");
    let recorder = Recorder::new();

    engine.add_rule(
        Rule::file(["out.txt"], producing_action(&recorder, fs.clone(), "out")).with_deps(["in.txt"]),
    )?;
    engine.add_rule(Rule::phony("all", Action::noop()).with_deps(["out.txt"]))?;

    let mut reporter = RecordingReporter::new();
    let summary = engine.make("all", &mut reporter)?;

    assert_eq!(
        reporter.events,
        vec![
            ReportEvent::RunStarted { target: "all".into(), total: 2 },
            ReportEvent::RuleStarted { index: 1, total: 2, target: "out.txt".into() },
            ReportEvent::RuleStarted { index: 2, total: 2, target: "all".into() },
            ReportEvent::RunFinished(2),
        ]
    );
    assert_eq!(summary.executed.len(), 2);
    assert!(!summary.is_noop());
    Ok(())
}

#[test]
fn second_run_without_changes_does_nothing() -> TestResult {
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    fs.add_file("in.txt", "");
    let recorder = Recorder::new();
    engine.add_rule(
        Rule::file(["out.txt"], producing_action(&recorder, fs.clone(), "out")).with_deps(["in.txt"]),
    )?;

    assert!(!engine.make("out.txt", &mut RecordingReporter::new())?.is_noop());
    assert!(engine.make("out.txt", &mut RecordingReporter::new())?.is_noop());
    assert!(engine.plan("out.txt")?.is_empty());
    assert_eq!(recorder.take(), vec!["out"]);
    Ok(())
}

#[test]
fn failing_action_aborts_the_run_with_detail() -> TestResult {
    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    let recorder = Recorder::new();

    engine.phony(
        "boom",
        Action::new(&[], |_| {
            Err(anyhow!("disk on fire").context("writing the pack"))
        }),
    )?;
    recorded_phony(&mut engine, &recorder, "all", &["boom"])?;

    let mut reporter = RecordingReporter::new();
    let err = engine.make("all", &mut reporter).unwrap_err();

    assert!(!err.is_diagnostic());
    let PancakeError::RuleExecution(failure) = err else {
        panic!("expected a rule execution error");
    };
    assert_eq!(failure.label, "boom");
    assert_eq!(failure.targets, vec!["boom".to_string()]);

    let detail = failure.detail();
    assert_eq!(detail[0], "an error occurred while making boom:");
    assert_eq!(detail[1], "  writing the pack");
    assert_eq!(detail[2], "  caused by: disk on fire");

    assert!(recorder.snapshot().is_empty());
    assert!(reporter.events.contains(&ReportEvent::RuleFailed("boom".into())));
    assert!(!reporter.events.iter().any(|e| matches!(e, ReportEvent::RunFinished(_))));
    Ok(())
}

#[test]
fn panicking_action_becomes_a_rule_failure() -> TestResult {
    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    engine.phony("explode", Action::new(&[], |_| panic!("oops")))?;

    let err = engine.make("explode", &mut RecordingReporter::new()).unwrap_err();
    let PancakeError::RuleExecution(failure) = err else {
        panic!("expected a rule execution error");
    };
    assert_eq!(failure.source.to_string(), "action panicked: oops");
    Ok(())
}

#[test]
fn panic_failures_point_at_the_panicking_line() -> TestResult {
    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    engine.phony("explode", Action::new(&[], |_| panic!("oops")))?;

    let err = engine.make("explode", &mut RecordingReporter::new()).unwrap_err();
    let PancakeError::RuleExecution(failure) = err else {
        panic!("expected a rule execution error");
    };
    let panic = failure
        .source
        .downcast_ref::<ActionPanic>()
        .ok_or_else(|| anyhow!("panic was not recorded as such"))?;
    let location = panic.location.as_deref().unwrap_or_default();
    assert!(location.contains("executor_behaviour.rs"), "location: {location}");
    assert!(failure.detail().contains(&format!("  panicked at {location}")));
    Ok(())
}

#[test]
fn actions_receive_the_engine_root_as_their_directory() -> TestResult {
    let (_fs, engine) = mock_engine(TargetConflictPolicy::Error);
    let mut engine = engine.with_root("project");
    let seen = Recorder::new();
    let rec = seen.clone();
    engine.phony(
        "where",
        Action::new(&[], move |ctx| {
            rec.push(&ctx.dir().to_string_lossy());
            Ok(())
        }),
    )?;

    engine.make("where", &mut RecordingReporter::new())?;
    assert_eq!(seen.take(), vec!["project"]);
    Ok(())
}

#[test]
fn file_rules_get_their_parent_directories() -> TestResult {
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    let seen_dir = Recorder::new();

    let check = fs.clone();
    let rec = seen_dir.clone();
    engine.file(
        ["build/deep/out.bin"],
        Action::new(&[Param::Target], move |ctx| {
            let target = ctx.target().ok_or_else(|| anyhow!("no target"))?;
            let parent = Path::new(target).parent().ok_or_else(|| anyhow!("no parent"))?;
            if !check.is_dir(parent) {
                bail!("{parent:?} was not created");
            }
            rec.push(target);
            Ok(())
        }),
    )?;

    engine.make("build/deep/out.bin", &mut RecordingReporter::new())?;
    assert_eq!(seen_dir.take(), vec!["build/deep/out.bin"]);
    assert!(fs.is_dir(Path::new("build/deep")));
    Ok(())
}

#[test]
fn actions_only_see_declared_context_fields() -> TestResult {
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    fs.add_file("a.in", "");
    fs.add_file("b.in", "");
    let seen = Recorder::new();

    let rec = seen.clone();
    engine.add_rule(
        Rule::file(
            ["x.out", "y.out"],
            Action::new(&[Param::Target, Param::Deps], move |ctx| {
                rec.push(&format!("target={:?}", ctx.target()));
                rec.push(&format!("targets={:?}", ctx.targets()));
                rec.push(&format!("dep={:?}", ctx.dep()));
                rec.push(&format!("deps={:?}", ctx.deps()));
                rec.push(&format!("title={:?}", ctx.param("title")));
                Ok(())
            })
            .bind("title", "demo"),
        )
        .with_deps(["a.in", "b.in"]),
    )?;

    engine.make("x.out", &mut RecordingReporter::new())?;
    assert_eq!(
        seen.take(),
        vec![
            r#"target=Some("x.out")"#,
            "targets=None",
            "dep=None",
            r#"deps=Some(["a.in", "b.in"])"#,
            r#"title=Some("demo")"#,
        ]
    );
    Ok(())
}

#[test]
fn context_lookup_joins_list_fields() {
    let targets = vec!["a".to_string(), "b".to_string()];
    let deps = vec!["c".to_string()];
    let ctx = Context::project(&targets, &deps, &Param::ALL, &Default::default(), Path::new("."));

    assert_eq!(ctx.lookup("target").as_deref(), Some("a"));
    assert_eq!(ctx.lookup("targets").as_deref(), Some("a b"));
    assert_eq!(ctx.lookup("dep").as_deref(), Some("c"));
    assert_eq!(ctx.lookup("deps").as_deref(), Some("c"));
    assert_eq!(ctx.lookup("title"), None);
}

#[test]
fn progress_estimates_after_the_first_rule() {
    use std::time::Duration;

    let first = Progress::new(1, 4, Duration::from_secs(0));
    assert_eq!(first.estimate, None);

    let third = Progress::new(3, 4, Duration::from_secs(4));
    assert_eq!(third.estimate, Some(Duration::from_secs(4)));
}

#[test]
fn conflicting_target_is_an_error_by_default() -> TestResult {
    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    engine.add_rule(Rule::file(["x", "y"], Action::noop()).with_name("first"))?;

    let err = engine.file(["x"], Action::noop()).unwrap_err();
    assert!(matches!(
        &err,
        PancakeError::TargetConflict { target, existing } if target == "x" && existing == "first"
    ));
    // Nothing of the rejected rule was registered.
    assert_eq!(engine.registry().len(), 1);
    Ok(())
}

#[test]
fn replace_policy_moves_only_the_contested_target() -> TestResult {
    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Replace);
    let first = engine.file(["x", "y"], Action::noop())?;
    let second = engine.file(["x"], Action::noop())?;

    assert_eq!(engine.registry().get("x"), Some(second));
    assert_eq!(engine.registry().get("y"), Some(first));

    let targets: Vec<&str> = engine.registry().targets().map(|(t, _)| t).collect();
    assert_eq!(targets, vec!["x", "y"]);
    Ok(())
}

#[test]
fn implicit_source_is_replaced_by_a_declared_rule() -> TestResult {
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    fs.add_file("gen.txt", "");

    let source = engine.registry_mut().lookup("gen.txt")?;
    let declared = engine.file(["gen.txt"], Action::noop())?;

    assert_ne!(source, declared);
    assert_eq!(engine.registry().get("gen.txt"), Some(declared));
    Ok(())
}

#[cfg(unix)]
#[test]
fn shell_command_action_renders_placeholders() -> TestResult {
    use std::collections::BTreeMap;

    use pancake::engine::Engine;
    use pancake::exec::command::shell_action;

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    std::fs::write(&input, "hello\n")?;

    let mut params = BTreeMap::new();
    params.insert("suffix".to_string(), "world".to_string());
    let action = shell_action("cat {dep} > {target} && echo {suffix} >> {target}", &params)?;
    assert_eq!(action.params(), [Param::Target, Param::Dep]);

    let mut engine = Engine::on_disk(TargetConflictPolicy::Error);
    engine.add_rule(
        Rule::file([output.to_string_lossy().into_owned()], action)
            .with_deps([input.to_string_lossy().into_owned()]),
    )?;
    engine.make(&output.to_string_lossy(), &mut RecordingReporter::new())?;

    assert_eq!(std::fs::read_to_string(&output)?, "hello\nworld\n");
    Ok(())
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_a_rule_failure() -> TestResult {
    use std::collections::BTreeMap;

    use pancake::exec::command::shell_action;

    let (_fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    engine.phony("fail", shell_action("exit 3", &BTreeMap::new())?)?;

    let err = engine.make("fail", &mut RecordingReporter::new()).unwrap_err();
    let PancakeError::RuleExecution(failure) = err else {
        panic!("expected a rule execution error");
    };
    assert_eq!(failure.source.to_string(), "command `exit 3` exited with status 3");
    Ok(())
}

#[test]
fn unknown_command_placeholder_is_rejected() {
    let err = pancake::exec::command::shell_action("cp {src} {target}", &Default::default())
        .unwrap_err();
    assert!(matches!(err, PancakeError::ConfigError(_)));
}
