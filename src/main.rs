use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use wads::config::{CiConfig, Platform};
use wads::diagnostics::Diagnostics;
use wads::logscan;
use wads::migration::{self, ApplyOutcome};

#[derive(Parser, Debug)]
#[command(name = "wads", version, about = "CI configuration and PEP 725 dependency tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a project's external-dependency declarations
    Analyze(AnalyzeArgs),
    /// Print step-by-step migration instructions for a project
    Instructions(ProjectArgs),
    /// Print the TOML that an automatic migration would add
    Preview(ProjectArgs),
    /// Rewrite pyproject.toml to the PEP 725 format
    Apply(ApplyArgs),
    /// Print the migration quick-reference guide
    Quickref,
    /// Show the CI fragments generated from a project's configuration
    Config(ConfigArgs),
    /// Diagnose a failed CI run from its log
    Diagnose(DiagnoseArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project directory or pyproject.toml path
    #[arg(default_value = ".")]
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Project directory or pyproject.toml path
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Emit the analysis as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Project directory or pyproject.toml path
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Skip writing a pyproject.toml.bak backup
    #[arg(long)]
    no_backup: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Project directory or pyproject.toml path
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Platform to generate install steps for
    #[arg(long, value_enum, default_value = "linux")]
    platform: Platform,

    /// Override the project name used in generated fragments
    #[arg(long)]
    project_name: Option<String>,

    /// Emit all template substitutions as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct DiagnoseArgs {
    /// Path to the CI log file
    #[arg(long)]
    log: PathBuf,

    /// Also print fix instructions
    #[arg(long)]
    fix: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Instructions(args) => run_instructions(&args),
        Commands::Preview(args) => run_preview(&args),
        Commands::Apply(args) => run_apply(&args),
        Commands::Quickref => {
            println!("{}", migration::quick_reference());
            Ok(())
        }
        Commands::Config(args) => run_config(&args),
        Commands::Diagnose(args) => run_diagnose(&args),
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let analysis = migration::analyze(&args.path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Legacy system_dependencies: {}", analysis.has_legacy_system_deps);
    println!("Legacy env.install:         {}", analysis.has_legacy_env_install);
    println!("[external] section:         {}", analysis.has_external_section);
    println!("Operational metadata:       {}", analysis.has_external_ops);
    if !analysis.legacy_packages.is_empty() {
        println!("Legacy packages:            {}", analysis.legacy_packages.join(", "));
    }
    if !analysis.current_depurls.is_empty() {
        println!("Declared DepURLs:           {}", analysis.current_depurls.join(", "));
    }
    println!();
    println!("Recommendations:");
    for recommendation in &analysis.recommendations {
        println!("  - {recommendation}");
    }
    println!();
    println!("Auto-migratable: {}", analysis.can_auto_migrate);
    Ok(())
}

fn run_instructions(args: &ProjectArgs) -> Result<()> {
    let analysis = migration::analyze(&args.path)?;
    println!("{}", migration::migration_instructions(&analysis));
    Ok(())
}

fn run_preview(args: &ProjectArgs) -> Result<()> {
    let analysis = migration::analyze(&args.path)?;
    println!("{}", migration::migration_preview(&analysis));
    Ok(())
}

fn run_apply(args: &ApplyArgs) -> Result<()> {
    match migration::apply_migration(&args.path, !args.no_backup, args.dry_run)? {
        ApplyOutcome::Applied { migrated, backup } => {
            println!("Migrated {migrated} dependencies to PEP 725 format");
            if let Some(backup) = backup {
                println!("Backup written to {}", backup.display());
            }
            println!("Note: legacy sections were left in place; remove them once verified");
            Ok(())
        }
        ApplyOutcome::DryRun { preview } => {
            println!("Dry run; would add:");
            println!();
            println!("{preview}");
            Ok(())
        }
        ApplyOutcome::NotMigratable { reasons } => {
            eprintln!("Cannot auto-migrate:");
            for reason in &reasons {
                eprintln!("  - {reason}");
            }
            std::process::exit(1);
        }
    }
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let cfg = CiConfig::from_file(&args.path)?;
    let cfg = match &args.project_name {
        Some(name) => CiConfig::new(cfg.data().clone(), Some(name)),
        None => cfg,
    };

    let mut diagnostics = Diagnostics::new();
    if args.json {
        let substitutions = cfg.template_substitutions(&mut diagnostics);
        println!("{}", serde_json::to_string_pretty(&substitutions)?);
        return Ok(());
    }

    println!("# Project: {}", cfg.project_name());
    println!();
    println!("{}", cfg.generate_env_block());

    let steps = cfg.generate_pre_test_steps(args.platform, &mut diagnostics);
    if !steps.is_empty() {
        println!();
        println!("# Pre-test steps ({})", args.platform.key());
        println!("{steps}");
    }

    let windows_job = cfg.generate_windows_validation_job(&mut diagnostics);
    if !windows_job.is_empty() {
        println!("{windows_job}");
    }

    let pages_job = cfg.generate_github_pages_job();
    if !pages_job.is_empty() {
        println!("{pages_job}");
    }

    if !diagnostics.is_empty() {
        eprintln!();
        for diagnostic in diagnostics.iter() {
            eprintln!("warning: {}", diagnostic.message);
        }
    }
    Ok(())
}

fn run_diagnose(args: &DiagnoseArgs) -> Result<()> {
    let logs = std::fs::read_to_string(&args.log)
        .map_err(|e| anyhow!("read {}: {e}", args.log.display()))?;
    let diagnosis = logscan::diagnose(&logs);
    println!("{}", logscan::render_diagnosis(&diagnosis));
    if args.fix {
        println!();
        println!("{}", logscan::fix_instructions(&diagnosis));
    }
    Ok(())
}
