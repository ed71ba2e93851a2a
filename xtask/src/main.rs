// Workspace automation, invoked as `cargo x <command>`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x", about = "lcd-compositor workspace tasks")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// fmt check, clippy, build and the full test run
    Ci {
        /// Stop after fmt and clippy
        #[arg(long)]
        quick: bool,
    },
    /// Format the workspace
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Lint every target, warnings denied
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests, optionally restricted to some suites
    Test {
        /// Suites to run (repeatable); all tests when omitted
        #[arg(long, value_enum)]
        suite: Vec<Suite>,
        /// Doc tests only
        #[arg(long, conflicts_with = "suite")]
        doc: bool,
    },
    /// Criterion benchmarks
    Bench {
        /// Only benchmarks whose name contains this
        filter: Option<String>,
    },
    /// Open the demo window
    Demo {
        #[arg(long)]
        release: bool,
    },
    /// Write a pre-commit hook running `cargo x ci --quick`
    InstallHooks,
}

/// Test groups, each covering unit tests and the matching integration file
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Suite {
    /// Palette, shade matrices, raster and frame composition
    Compositor,
    /// Signal, surfaces and the repaint scheduler
    Scheduler,
    /// TOML display configuration
    Config,
}

impl Suite {
    fn label(self) -> &'static str {
        match self {
            Suite::Compositor => "compositor",
            Suite::Scheduler => "scheduler",
            Suite::Config => "config",
        }
    }

    /// Module paths passed as libtest filters for `--lib`
    fn unit_filters(self) -> &'static [&'static str] {
        match self {
            Suite::Compositor => &[
                "display::compositor",
                "display::palette",
                "display::raster",
                "display::shade",
            ],
            Suite::Scheduler => &["display::scheduler", "display::signal", "display::surface"],
            Suite::Config => &["config::"],
        }
    }

    /// Files under tests/ that belong to the suite
    fn integration_targets(self) -> &'static [&'static str] {
        match self {
            Suite::Compositor => &["compositor_tests"],
            Suite::Scheduler => &["scheduler_tests"],
            Suite::Config => &[],
        }
    }

    /// One cargo argument list per test binary
    fn invocations(self) -> Vec<Vec<&'static str>> {
        let mut unit = vec!["test", "--lib", "--"];
        unit.extend_from_slice(self.unit_filters());

        let mut runs = vec![unit];
        runs.extend(
            self.integration_targets()
                .iter()
                .map(|&target| vec!["test", "--test", target]),
        );
        runs
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Task::Ci { quick } => ci(quick),
        Task::Fmt { check } => fmt(check),
        Task::Clippy { fix } => clippy(fix),
        Task::Test { suite, doc } => test(&suite, doc),
        Task::Bench { filter } => bench(filter.as_deref()),
        Task::Demo { release } => demo(release),
        Task::InstallHooks => install_hooks(),
    }
}

fn ci(quick: bool) -> Result<()> {
    println!("{}", "== ci ==".bold().blue());
    let start = Instant::now();

    step("fmt --check", || fmt(true))?;
    step("clippy", || clippy(false))?;
    if !quick {
        step("build", || cargo(&["build", "--all-targets"]))?;
        step("test", || test(&[], false))?;
    }

    println!(
        "{} {}",
        "ci passed in".green().bold(),
        format!("{:.1}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn fmt(check: bool) -> Result<()> {
    if check {
        cargo(&["fmt", "--all", "--", "--check"])
    } else {
        cargo(&["fmt", "--all"])
    }
}

fn clippy(fix: bool) -> Result<()> {
    if fix {
        cargo(&["clippy", "--all-targets", "--fix", "--allow-dirty"])
    } else {
        cargo(&["clippy", "--all-targets", "--", "-D", "warnings"])
    }
}

fn test(suites: &[Suite], doc: bool) -> Result<()> {
    if doc {
        return cargo(&["test", "--doc"]);
    }
    if suites.is_empty() {
        return cargo(&["test", "--workspace"]);
    }

    let mut failed = Vec::new();
    for &suite in suites {
        println!("{} {} suite", "->".blue(), suite.label().bold());
        let result = suite
            .invocations()
            .iter()
            .try_for_each(|args| cargo(args));
        if let Err(err) = result {
            println!("{} {}: {:#}", "failed".red().bold(), suite.label(), err);
            failed.push(suite.label());
        }
    }

    if !failed.is_empty() {
        bail!("failing suites: {}", failed.join(", "));
    }
    Ok(())
}

fn bench(filter: Option<&str>) -> Result<()> {
    match filter {
        Some(filter) => cargo(&["bench", "--bench", "compositor_bench", "--", filter]),
        None => cargo(&["bench"]),
    }
}

fn demo(release: bool) -> Result<()> {
    let mut args = vec!["run", "--bin", "lcd-compositor"];
    if release {
        args.push("--release");
    }

    if std::path::Path::new("lcd_config.toml").exists() {
        println!("{} using lcd_config.toml", "->".blue());
    } else {
        println!("{} lcd_config.toml missing, defaults are written on start", "->".blue());
    }

    let mut cmd = Command::new("cargo");
    cmd.args(&args);
    if std::env::var_os("RUST_LOG").is_none() {
        cmd.env("RUST_LOG", "info");
    }
    run(&mut cmd)
}

fn install_hooks() -> Result<()> {
    const HOOK: &str = "#!/bin/sh\nset -e\ncargo x ci --quick\n";
    let path = std::path::Path::new(".git/hooks/pre-commit");

    std::fs::write(path, HOOK).with_context(|| format!("writing {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    println!("{} pre-commit hook installed", "ok".green().bold());
    Ok(())
}

/// Run one named pipeline stage and report how long it took
fn step(name: &str, task: impl FnOnce() -> Result<()>) -> Result<()> {
    println!("{} {}", "->".blue(), name);
    let start = Instant::now();
    task().with_context(|| format!("{} failed", name))?;
    println!(
        "   {} ({:.1}s)",
        "ok".green(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    run(&mut cmd)
}

fn run(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("spawning {:?}", cmd))?;

    if !status.success() {
        bail!("{:?} exited with {}", cmd, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_suite_runs_its_integration_file() {
        let compositor = Suite::Compositor.invocations();
        assert!(compositor.contains(&vec!["test", "--test", "compositor_tests"]));

        let scheduler = Suite::Scheduler.invocations();
        assert!(scheduler.contains(&vec!["test", "--test", "scheduler_tests"]));
    }

    #[test]
    fn test_scheduler_suite_covers_signal() {
        let unit = &Suite::Scheduler.invocations()[0];
        assert_eq!(&unit[..3], &["test", "--lib", "--"]);
        assert!(unit.contains(&"display::signal"));
        assert!(unit.contains(&"display::scheduler"));
    }

    #[test]
    fn test_integration_targets_exist() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        for suite in [Suite::Compositor, Suite::Scheduler, Suite::Config] {
            for target in suite.integration_targets() {
                let file = root.join("tests").join(format!("{}.rs", target));
                assert!(file.exists(), "missing {}", file.display());
            }
        }
    }

    #[test]
    fn test_cli_parses_repeated_suites() {
        let cli = Cli::try_parse_from(["x", "test", "--suite", "compositor", "--suite", "scheduler"])
            .unwrap();
        match cli.command {
            Task::Test { suite, doc } => {
                assert!(!doc);
                assert!(suite == vec![Suite::Compositor, Suite::Scheduler]);
            }
            _ => panic!("expected test task"),
        }
    }
}
