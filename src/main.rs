//! strata CLI
//!
//! Inspect the resolved project settings and bump the project version.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use strata_config::{Overrides, Part, bump_at_project_root, find_project_root, init_settings};

/// Layered project settings and version bumping
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pretty-print the resolved settings
    Env {
        /// Print as shell export lines instead of TOML
        #[arg(short, long)]
        export: bool,
    },

    /// Show project root and repository metadata
    Info,

    /// Bump the version in pyproject.toml and src/<package>/__init__.py
    ///
    /// Examples:
    ///   strata bump-version patch
    ///   strata bump-version minor --pre rc.1
    ///   strata bump-version major -n
    BumpVersion {
        /// Which segment to bump
        part: PartArg,

        /// Prerelease identifier (e.g. 'alpha', 'beta.1')
        #[arg(long = "pre")]
        prerelease: Option<String>,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PartArg {
    Major,
    Minor,
    Patch,
}

impl From<PartArg> for Part {
    fn from(part: PartArg) -> Self {
        match part {
            PartArg::Major => Part::Major,
            PartArg::Minor => Part::Minor,
            PartArg::Patch => Part::Patch,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Env { export } => cmd_env(export),
        Commands::Info => cmd_info(),
        Commands::BumpVersion {
            part,
            prerelease,
            dry_run,
        } => cmd_bump_version(part.into(), prerelease.as_deref(), dry_run),
    }
}

fn cmd_env(export: bool) -> anyhow::Result<()> {
    let settings = init_settings(Overrides::new()).context("Failed to resolve settings")?;
    if export {
        for (key, value) in settings.entries() {
            println!("export {key}={}", serde_json::to_string(&value)?);
        }
    } else {
        print!("{}", settings.to_toml_pretty()?);
    }
    Ok(())
}

fn cmd_info() -> anyhow::Result<()> {
    let settings = init_settings(Overrides::new()).context("Failed to resolve settings")?;
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("project_root:    {}", settings.project_root.display());
    println!("package_version: {}", show(&settings.package_version));
    println!("git_commit:      {}", show(&settings.git_commit));
    println!("git_branch:      {}", show(&settings.git_branch));
    Ok(())
}

fn cmd_bump_version(part: Part, prerelease: Option<&str>, dry_run: bool) -> anyhow::Result<()> {
    let root = find_project_root(None);
    let version = bump_at_project_root(&root, part, prerelease, dry_run)?;
    if dry_run {
        println!("DRY-RUN: would set version -> {version}");
    } else {
        println!("Version bumped to {version}");
    }
    Ok(())
}
