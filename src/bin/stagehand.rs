//! # Stagehand CLI - staging database management
//!
//! Command-line interface for the stagehand staging workflow.
//!
//! ## Features
//! - Create manual backups of the local database
//! - Roll back to the previous backup and roll forward again
//! - Pull the production database down over SSH and import it locally
//! - Restore any backup from a numbered listing
//!
//! ## Usage
//! ```bash
//! # Back up the local database
//! stagehand backup
//!
//! # Undo whatever happened since the last backup
//! stagehand rollback
//!
//! # Step forward again after a rollback
//! stagehand rollforward
//!
//! # Pull production down into the local environment
//! stagehand import
//!
//! # Pick a backup from the listing
//! stagehand restore
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use stagehand::{Result, Snapshot, Staging, StagingError, SystemRunner};

/// Stagehand CLI - staging database workflows with navigable backup history
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version)]
#[command(about = "Pull production databases into staging and navigate backup history")]
#[command(long_about = None)]
struct Cli {
    /// Base directory for backups, imports, and options
    #[arg(short, long, global = true, default_value = ".stagehand")]
    base: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a backup of the current local database
    Backup,

    /// Rollback the database to the last known backup
    Rollback,

    /// Rollforward the database to the next backup after a rollback
    Rollforward,

    /// Import the database from the remote production server
    Import,

    /// Restore the local database from a backup in the backups folder
    Restore {
        /// Number of the backup to restore (from the listing); prompts if omitted
        selection: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let mut staging = Staging::open(&cli.base, Box::new(SystemRunner))?;

    match cli.command {
        Commands::Backup => cmd_backup(&mut staging),
        Commands::Rollback => cmd_rollback(&mut staging),
        Commands::Rollforward => cmd_rollforward(&mut staging),
        Commands::Import => cmd_import(&mut staging),
        Commands::Restore { selection } => cmd_restore(&mut staging, selection),
    }
}

/// Create a manual backup and report the resulting rollback point
fn cmd_backup(staging: &mut Staging) -> Result<()> {
    println!("{}", "Backing up local database...".blue().bold());

    let snapshot = staging.backup()?;
    println!(
        "{} Local database backed up to {}",
        "✓".green().bold(),
        snapshot.file_name().yellow()
    );

    if let Some(rollback) = staging.pointer_state().rollback_point {
        println!(
            "  Rollback point: {}",
            rollback.display().to_string().cyan()
        );
    }

    Ok(())
}

/// Roll back to the stored rollback point (with confirmation)
fn cmd_rollback(staging: &mut Staging) -> Result<()> {
    let step = staging.preview_rollback()?;
    println!(
        "{} {}",
        "Rollback point found:".blue().bold(),
        step.import_target.display().to_string().yellow()
    );

    if !confirm("Are you sure you want to rollback to this backup?")? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    let imported = staging.rollback()?;
    println!(
        "{} Database rolled backward to {}",
        "✓".green().bold(),
        imported.display().to_string().yellow()
    );
    report_pointers(staging);

    Ok(())
}

/// Roll forward to the stored roll-forward point (with confirmation)
fn cmd_rollforward(staging: &mut Staging) -> Result<()> {
    let step = staging.preview_rollforward()?;
    println!(
        "{} {}",
        "Rollforward point found:".blue().bold(),
        step.import_target.display().to_string().yellow()
    );

    if !confirm("Are you sure you want to roll forward to this backup?")? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    let imported = staging.rollforward()?;
    println!(
        "{} Database rolled forward to {}",
        "✓".green().bold(),
        imported.display().to_string().yellow()
    );
    report_pointers(staging);

    Ok(())
}

/// Run the full production import workflow
fn cmd_import(staging: &mut Staging) -> Result<()> {
    println!("{}", "Importing production database...".blue().bold());

    let outcome = staging.import_production()?;

    println!("{} Import process complete", "✓".green().bold());
    println!(
        "  Fetched: {}",
        outcome.fetched_artifact.display().to_string().cyan()
    );
    println!(
        "  Pre-import backup: {}",
        outcome.pre_import_backup.file_name().cyan()
    );
    println!(
        "  Time: {}",
        format_duration(Duration::from_millis(outcome.duration_ms))
            .to_string()
            .cyan()
    );

    Ok(())
}

/// Restore a backup chosen from the numbered listing
fn cmd_restore(staging: &mut Staging, selection: Option<usize>) -> Result<()> {
    let backups = staging.list_backups()?;
    if backups.is_empty() {
        return Err(StagingError::NoBackupsFound);
    }

    println!("{}", "Available backups:".blue().bold());
    for (index, backup) in backups.iter().enumerate() {
        println!("  {}. {}", index + 1, backup.display_format());
    }

    let selection = match selection {
        Some(n) => n,
        None => prompt_selection()?,
    };
    let chosen = preview_selection(&backups, selection)?;

    println!("You've selected: {}", chosen.file_name().yellow());
    if !confirm("Do you want to restore this backup?")? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    println!("Importing backup. This may take a moment.");
    let restored = staging.restore(selection)?;

    println!(
        "{} Local database restored from {}",
        "✓".green().bold(),
        restored.file_name().yellow()
    );
    report_pointers(staging);

    Ok(())
}

/// Resolve a 1-based selection against the listing without side effects
fn preview_selection(backups: &[Snapshot], selection: usize) -> Result<&Snapshot> {
    if selection == 0 || selection > backups.len() {
        return Err(StagingError::InvalidSelection(format!(
            "{} (choose 1-{})",
            selection,
            backups.len()
        )));
    }
    Ok(&backups[selection - 1])
}

/// Read a backup number from stdin
fn prompt_selection() -> Result<usize> {
    print!("Type the number of the backup you want to restore: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    line.trim()
        .parse()
        .map_err(|_| StagingError::InvalidSelection(line.trim().to_string()))
}

/// Ask the operator to confirm a destructive step
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/n] ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Show where the pointers ended up after a navigation command
fn report_pointers(staging: &Staging) {
    let state = staging.pointer_state();
    match state.rollback_point {
        Some(path) => println!("  Rollback point: {}", path.display().to_string().cyan()),
        None => println!("  Rollback point: {}", "none".dimmed()),
    }
    match state.rollforward_point {
        Some(path) => println!(
            "  Rollforward point: {}",
            path.display().to_string().cyan()
        ),
        None => println!("  Rollforward point: {}", "none".dimmed()),
    }
}
