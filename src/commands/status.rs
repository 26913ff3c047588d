use anyhow::Result;
use std::env;

use crate::atlas::config::load_config;
use crate::atlas::paths::{PART_NAMES, PathOverrides, resolve_paths};
use crate::commands::CommandReport;
use crate::error::AtlasErrorCode;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/atlas_env_keys.rs"));
}

fn env_overrides_in_effect() -> Vec<&'static str> {
    generated::ATLAS_ENV_KEYS
        .iter()
        .copied()
        .filter(|key| env::var(key).is_ok_and(|v| !v.trim().is_empty()))
        .collect()
}

pub fn run(overrides: &PathOverrides) -> Result<CommandReport> {
    let paths = resolve_paths(overrides)?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("source_root={}", paths.source_root.display()));
    report.detail(format!("original_dir={}", paths.original_dir.display()));
    report.detail(format!("depth_dir={}", paths.depth_dir.display()));
    report.detail(format!("parts_dir={}", paths.parts_dir.display()));
    report.detail(format!("spreadsheet={}", paths.spreadsheet.display()));
    report.detail(format!("project_root={}", paths.project_root.display()));
    report.detail(format!("assets_dir={}", paths.assets_dir.display()));
    report.detail(format!("manifest_path={}", paths.manifest_path.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("extensions={}", cfg.import.extensions.join(",")));
    report.detail(format!(
        "exclude_dir_keywords={}",
        cfg.import.exclude_dir_keywords.join(",")
    ));
    report.detail(format!("row_policy={}", cfg.import.row_policy));
    report.detail(format!("on_copy_error={}", cfg.import.on_copy_error));
    report.detail(format!("url_prefix={}", cfg.output.url_prefix));
    report.detail(format!("env_overrides={}", env_overrides_in_effect().join(",")));

    if !paths.original_dir.is_dir() {
        report.issue(format!(
            "{}: missing original image dir (Photos_NoBG or ATLAS_ORIGINAL_DIR)",
            AtlasErrorCode::E002SourceMissing.as_str()
        ));
    }
    if !paths.spreadsheet.is_file() {
        report.issue(format!(
            "{}: missing metadata spreadsheet (web_database.csv or ATLAS_SPREADSHEET)",
            AtlasErrorCode::E003SpreadsheetMissing.as_str()
        ));
    }
    if !paths.depth_dir.is_dir() {
        report.detail("depth dir missing: every image will be rejected");
    }
    for part in PART_NAMES {
        if !paths.part_source_dir(part).is_dir() {
            report.detail(format!("parts.{part} dir missing: {part} urls will be empty"));
        }
    }

    Ok(report)
}
