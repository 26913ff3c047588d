use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs;

use crate::atlas::audit;
use crate::atlas::config::load_config;
use crate::atlas::engine::{ImportOptions, ImportOutcome, run_import};
use crate::atlas::paths::{AtlasPaths, PathOverrides, resolve_paths};
use crate::commands::CommandReport;
use crate::error::AtlasErrorCode;

#[derive(Debug, Clone, Default)]
pub struct ImportCommandOptions {
    pub paths: PathOverrides,
    pub dry_run: bool,
    pub strict_rows: bool,
    pub abort_on_copy_error: bool,
}

fn summary_line(outcome: &ImportOutcome) -> String {
    let s = &outcome.stats;
    format!(
        "scanned={} accepted={} rejected_no_depth={} rejected_duplicate={} copy_failures={} metadata_matched={} metadata_folder_fallback={}",
        s.scanned,
        s.accepted,
        s.rejected_no_depth,
        s.rejected_duplicate,
        s.copy_failures,
        s.metadata_matched(),
        s.metadata_folder_fallback,
    )
}

fn fill_report(report: &mut CommandReport, paths: &AtlasPaths, outcome: &ImportOutcome) {
    let s = &outcome.stats;
    let idx = &outcome.indexes;
    report.detail(format!("index.depth={}", idx.depth));
    report.detail(format!("index.neck={}", idx.neck));
    report.detail(format!("index.body={}", idx.body));
    report.detail(format!("index.base={}", idx.base));
    report.detail(format!("index.shadowed={}", idx.shadowed));
    report.detail(format!("metadata.stems={}", idx.metadata_stems));
    report.detail(format!("metadata.rows={}", idx.metadata_rows));
    report.detail(format!("metadata.rows_skipped={}", idx.metadata_rows_skipped));
    report.detail(format!("metadata.rows_degraded={}", idx.metadata_rows_degraded));
    report.detail(format!("scanned={}", s.scanned));
    report.detail(format!("rejected_no_depth={}", s.rejected_no_depth));
    report.detail(format!("rejected_duplicate={}", s.rejected_duplicate));
    report.detail(format!("accepted={}", s.accepted));
    report.detail(format!("copy_failures={}", s.copy_failures));
    report.detail(format!("metadata.matched={}", s.metadata_matched()));
    report.detail(format!("metadata.single_match={}", s.metadata_single_match));
    report.detail(format!("metadata.folder_tiebreak={}", s.metadata_folder_tiebreak));
    report.detail(format!("metadata.first_candidate={}", s.metadata_first_candidate));
    report.detail(format!("metadata.folder_fallback={}", s.metadata_folder_fallback));
    report.detail(format!("parts.neck={}", s.parts_neck));
    report.detail(format!("parts.body={}", s.parts_body));
    report.detail(format!("parts.base={}", s.parts_base));
    if outcome.manifest_written {
        report.detail(format!("manifest={}", paths.manifest_path.display()));
        report.detail(format!("assets_dir={}", paths.assets_dir.display()));
    } else {
        report.detail("dry-run: destination and manifest left untouched");
    }
    for failure in &outcome.copy_failures {
        report.issue(format!("copy failed: {failure}"));
    }
}

pub fn run(opts: &ImportCommandOptions) -> Result<CommandReport> {
    let paths = resolve_paths(&opts.paths)?;
    let mut cfg = load_config()?;
    if opts.strict_rows {
        cfg.import.row_policy = "strict".to_string();
    }
    if opts.abort_on_copy_error {
        cfg.import.on_copy_error = "abort".to_string();
    }

    let mut report = CommandReport::new("import");
    report.detail(format!("original_dir={}", paths.original_dir.display()));
    report.detail(format!("spreadsheet={}", paths.spreadsheet.display()));

    let import_opts = ImportOptions {
        dry_run: opts.dry_run,
    };

    if opts.dry_run {
        let outcome = run_import(&paths, &cfg, &import_opts)?;
        fill_report(&mut report, &paths, &outcome);
        return Ok(report);
    }

    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let lock_path = paths.lock_path();
    let lock = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    if lock.try_lock_exclusive().is_err() {
        report.issue(format!(
            "{}: another import holds {}",
            AtlasErrorCode::E001Locked.as_str(),
            lock_path.display()
        ));
        return Ok(report);
    }

    let result = run_import(&paths, &cfg, &import_opts);
    let _ = FileExt::unlock(&lock);

    match result {
        Ok(outcome) => {
            let status = if outcome.copy_failures.is_empty() {
                "ok"
            } else {
                "issues"
            };
            audit::append_event(&paths.logs_dir, "import", status, &summary_line(&outcome))?;
            fill_report(&mut report, &paths, &outcome);
            Ok(report)
        }
        Err(err) => {
            let _ = audit::append_event(&paths.logs_dir, "import", "failed", &format!("{err:#}"));
            Err(err)
        }
    }
}
