use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::atlas::paths::PathOverrides;
use crate::commands::{self, CommandReport};
use crate::logging;

#[derive(Debug, Parser)]
#[command(name = "atlas-import")]
#[command(about = "Reconcile vase photo, depth and part assets into a web manifest")]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (overridden by ATLAS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args, Default)]
struct PathArgs {
    /// Root containing Photos_NoBG/, Depth/, Parts/ and web_database.csv
    #[arg(long, value_name = "DIR")]
    source_root: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    original_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    depth_dir: Option<PathBuf>,

    /// Directory holding neck/, body/ and base/ crops
    #[arg(long, value_name = "DIR")]
    parts_dir: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    spreadsheet: Option<PathBuf>,

    /// Destination for original/, depth/ and parts/
    #[arg(long, value_name = "DIR")]
    assets_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,
}

impl PathArgs {
    fn into_overrides(self) -> PathOverrides {
        PathOverrides {
            source_root: self.source_root,
            original_dir: self.original_dir,
            depth_dir: self.depth_dir,
            parts_dir: self.parts_dir,
            spreadsheet: self.spreadsheet,
            assets_dir: self.assets_dir,
            manifest_path: self.manifest,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild the destination tree and manifest from the source trees
    Import {
        #[command(flatten)]
        paths: PathArgs,

        /// Resolve everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Fail on spreadsheet rows with no filename or bad coordinates
        #[arg(long)]
        strict_rows: bool,

        /// Stop the run on the first failed copy
        #[arg(long)]
        abort_on_copy_error: bool,
    },
    /// Show resolved paths and settings
    Status {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Check a manifest against the destination tree
    Verify {
        #[command(flatten)]
        paths: PathArgs,
    },
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

/// Parse arguments and dispatch. `Ok(false)` means the command completed
/// but reported issues.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = match cli.command {
        Command::Import {
            paths,
            dry_run,
            strict_rows,
            abort_on_copy_error,
        } => commands::import::run(&commands::import::ImportCommandOptions {
            paths: paths.into_overrides(),
            dry_run,
            strict_rows,
            abort_on_copy_error,
        })?,
        Command::Status { paths } => commands::status::run(&paths.into_overrides())?,
        Command::Verify { paths } => commands::verify::run(&paths.into_overrides())?,
    };

    print_report(&report, cli.json)?;
    Ok(report.ok)
}
