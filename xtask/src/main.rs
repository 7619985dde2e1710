use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for scenescript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the CLI demo scene with post-processing and a context loss
    Demo {
        /// Frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
    },
}

/// One cargo invocation with a label for progress and failure messages.
struct Step {
    label: &'static str,
    args: Vec<String>,
}

impl Step {
    fn new(label: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn run(&self) -> Result<()> {
        println!("==> Running cargo {}", self.label);
        let status = Command::new("cargo").args(&self.args).status()?;
        if !status.success() {
            anyhow::bail!("cargo {} failed", self.label);
        }
        Ok(())
    }
}

fn fmt() -> Step {
    Step::new("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Step {
    Step::new(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn test() -> Step {
    Step::new("test", &["test", "--workspace"])
}

fn doc() -> Step {
    Step::new("doc", &["doc", "--workspace", "--no-deps"])
}

fn build() -> Step {
    Step::new("build", &["build", "--workspace"])
}

fn demo(frames: u32) -> Step {
    let lose_at = (frames / 3).max(1).to_string();
    let frames = frames.to_string();
    Step::new(
        "run (demo)",
        &[
            "run",
            "-p",
            "scenescript-cli",
            "--",
            "run",
            "--frames",
            &frames,
            "--effect",
            "bloom",
            "--lose-context-at",
            &lose_at,
            "--resize",
            "1920x1080",
        ],
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let steps = match cli.command {
        Commands::Check => vec![fmt(), clippy(), test(), doc()],
        Commands::Fmt => vec![fmt()],
        Commands::Clippy => vec![clippy()],
        Commands::Test => vec![test()],
        Commands::Doc => vec![doc()],
        Commands::Build => vec![build()],
        Commands::Demo { frames } => vec![build(), demo(frames)],
    };
    for step in &steps {
        step.run()?;
    }

    Ok(())
}
