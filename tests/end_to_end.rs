// tests/end_to_end.rs
mod common;
use crate::common::{init_tracing, mock_engine, Recorder, RecordingReporter};

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Context as _};
use pancake::config::{build_engine, load_and_validate};
use pancake::engine::Engine;
use pancake::fs::{FileSystem, RealFileSystem};
use pancake::rule::{Action, Param, Rule};
use pancake::types::TargetConflictPolicy;
use pancake::{list_lines, plan_lines};

type TestResult = Result<(), Box<dyn Error>>;

fn set_mtime(path: &Path, time: SystemTime) -> std::io::Result<()> {
    fs::File::options().write(true).open(path)?.set_modified(time)
}

fn copy_action(recorder: &Recorder) -> Action {
    let recorder = recorder.clone();
    Action::new(&[Param::Target, Param::Dep], move |ctx| {
        let target = ctx.target().ok_or_else(|| anyhow!("no target"))?;
        let dep = ctx.dep().ok_or_else(|| anyhow!("no dependency"))?;
        fs::copy(dep, target).with_context(|| format!("copying {dep} to {target}"))?;
        recorder.push(target);
        Ok(())
    })
}

#[test]
fn copy_rule_builds_then_idles_then_rebuilds_after_touch() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "first")?;
    let out_name = output.to_string_lossy().into_owned();
    let in_name = input.to_string_lossy().into_owned();

    let recorder = Recorder::new();
    let mut engine = Engine::new(Arc::new(RealFileSystem), TargetConflictPolicy::Error)
        .with_root(dir.path());
    engine.add_rule(Rule::file([out_name.clone()], copy_action(&recorder)).with_deps([in_name]))?;

    engine.make(&out_name, &mut RecordingReporter::new())?;
    assert_eq!(fs::read_to_string(&output)?, "first");
    assert_eq!(recorder.take(), vec![out_name.clone()]);

    let mut reporter = RecordingReporter::new();
    assert!(engine.make(&out_name, &mut reporter)?.is_noop());
    assert!(recorder.take().is_empty());

    fs::write(&input, "second")?;
    set_mtime(&input, SystemTime::now() + Duration::from_secs(10))?;
    engine.make(&out_name, &mut RecordingReporter::new())?;
    assert_eq!(fs::read_to_string(&output)?, "second");
    assert_eq!(recorder.take(), vec![out_name]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn build_script_with_shell_commands_runs_end_to_end() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::write(root.join("in.txt"), "payload")?;

    let input = root.join("in.txt").to_string_lossy().into_owned();
    let output = root.join("build/out.txt").to_string_lossy().into_owned();
    let stamp = root.join("build/stamp").to_string_lossy().into_owned();
    let script = format!(
        r#"
[[rule]]
name = "all"
deps = ["{output}", "{stamp}"]

[[rule]]
targets = ["{output}"]
deps = ["{input}"]
cmd = "cp {{dep}} {{target}}"

[[rule]]
targets = ["{stamp}"]
deps = ["{output}"]
cmd = "echo {{tag}} > {{target}}"
params = {{ tag = "done" }}
"#
    );
    let script_path = root.join("Pancake.toml");
    fs::write(&script_path, script)?;

    let script = load_and_validate(&script_path)?;
    let mut engine = build_engine(&script, Arc::new(RealFileSystem), root)?;

    let plan = plan_lines(&mut engine, "default")?;
    assert_eq!(plan, vec![format!("{output} (file)"), format!("{stamp} (file)"), "all (phony)".to_string()]);

    let mut reporter = RecordingReporter::new();
    engine.make("default", &mut reporter)?;
    assert_eq!(fs::read_to_string(&output)?, "payload");
    assert_eq!(fs::read_to_string(&stamp)?, "done\n");
    assert_eq!(reporter.started(), vec![output.clone(), stamp.clone(), "all".to_string()]);

    assert_eq!(plan_lines(&mut engine, "all")?, vec!["nothing to do for all"]);
    Ok(())
}

/// `all` copies every file under `assets/` into `build/`.
#[cfg(unix)]
const ASSET_SCRIPT: &str = r#"
[[rule]]
name = "all"

[[match]]
name = "assets"
pattern = "assets/*"
targets = ["build/{path}"]
deps = ["{path}"]
required_by = ["all"]
cmd = "cp {dep} {target}"
"#;

#[cfg(unix)]
#[test]
fn matcher_script_builds_under_a_root_other_than_the_working_directory() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::create_dir_all(root.join("assets"))?;
    fs::write(root.join("assets/a.txt"), "alpha")?;
    fs::write(root.join("Pancake.toml"), ASSET_SCRIPT)?;

    let script = load_and_validate(root.join("Pancake.toml"))?;
    let mut engine = build_engine(&script, Arc::new(RealFileSystem), root)?;
    assert!(engine.registry().get("build/assets/a.txt").is_some());

    engine.make("all", &mut RecordingReporter::new())?;
    assert_eq!(fs::read_to_string(root.join("build/assets/a.txt"))?, "alpha");
    assert!(!Path::new("build/assets/a.txt").exists());

    assert_eq!(plan_lines(&mut engine, "all")?, vec!["nothing to do for all"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn matched_file_names_with_spaces_reach_the_command_intact() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::create_dir_all(root.join("assets"))?;
    fs::write(root.join("assets/my file.txt"), "spaced")?;
    fs::write(root.join("assets/$(touch injected).txt"), "odd")?;
    fs::write(root.join("Pancake.toml"), ASSET_SCRIPT)?;

    let script = load_and_validate(root.join("Pancake.toml"))?;
    let mut engine = build_engine(&script, Arc::new(RealFileSystem), root)?;
    engine.make("all", &mut RecordingReporter::new())?;

    assert_eq!(fs::read_to_string(root.join("build/assets/my file.txt"))?, "spaced");
    assert_eq!(fs::read_to_string(root.join("build/assets/$(touch injected).txt"))?, "odd");
    assert!(!root.join("injected").exists());
    Ok(())
}

#[test]
fn rooted_engine_finds_sources_and_outputs_under_its_root() -> TestResult {
    init_tracing();
    let (fs, engine) = mock_engine(TargetConflictPolicy::Error);
    let mut engine = engine.with_root("project");
    fs.add_file("project/in.txt", "");
    let recorder = Recorder::new();

    let rec = recorder.clone();
    let out = fs.clone();
    engine.add_rule(
        Rule::file(
            ["build/out.txt"],
            Action::new(&[Param::Target], move |ctx| {
                let target = ctx.target().ok_or_else(|| anyhow!("no target"))?;
                out.write(&ctx.dir().join(target), b"built")?;
                rec.push(target);
                Ok(())
            }),
        )
        .with_deps(["in.txt"]),
    )?;

    engine.make("build/out.txt", &mut RecordingReporter::new())?;
    assert_eq!(recorder.take(), vec!["build/out.txt"]);
    assert!(fs.is_dir(Path::new("project/build")));
    assert!(fs.exists(Path::new("project/build/out.txt")));

    assert!(engine.make("build/out.txt", &mut RecordingReporter::new())?.is_noop());
    fs.touch("project/in.txt");
    engine.make("build/out.txt", &mut RecordingReporter::new())?;
    assert_eq!(recorder.take(), vec!["build/out.txt"]);
    Ok(())
}

#[test]
fn listing_marks_the_default_and_hides_generated_targets() -> TestResult {
    let (fs, mut engine) = mock_engine(TargetConflictPolicy::Error);
    fs.add_file("src/a.txt", "");
    fs.add_file("in.txt", "");

    engine.phony("build", Action::noop())?;
    engine.file(["out.txt"], Action::noop())?;
    engine.deps(["in.txt"])?;
    engine.add_matcher(pancake::watch::Matcher::new(
        "texts",
        "src/*.txt",
        &[],
        Box::new(|registry: &mut pancake::graph::Registry, path: &str| {
            registry.add_rule(
                Rule::file([format!("gen/{path}")], Action::noop())
                    .with_origin(pancake::types::RuleOrigin::Matcher("texts".into())),
            )?;
            Ok(())
        }),
    )?)?;

    // Materialise the implicit source; it must never be listed.
    engine.resolve("out.txt")?;
    assert!(engine.registry().get("in.txt").is_some());

    assert_eq!(list_lines(&engine, false), vec!["* build", "  out.txt"]);
    assert_eq!(
        list_lines(&engine, true),
        vec!["* build", "  out.txt", "  gen/src/a.txt"]
    );
    Ok(())
}
