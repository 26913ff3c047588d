use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::atlas::config::load_config;
use crate::atlas::manifest::{self, AssetRecord};
use crate::atlas::paths::{PathOverrides, resolve_paths};
use crate::commands::CommandReport;
use crate::error::AtlasErrorCode;

fn url_to_path(assets_dir: &Path, url_prefix: &str, url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix(url_prefix)?.strip_prefix('/')?;
    if rest.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return None;
    }
    Some(assets_dir.join(rest))
}

/// Check a parsed manifest against the destination tree. Returns one
/// message per violation.
pub fn check_records(records: &[AssetRecord], assets_dir: &Path, url_prefix: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let mut ids = HashSet::new();

    for record in records {
        if !ids.insert(record.id.as_str()) {
            problems.push(format!("duplicate id {}", record.id));
        }
        if record.assets.image_url.is_empty() {
            problems.push(format!("{}: empty image_url", record.id));
        }
        if record.assets.depth_url.is_empty() {
            problems.push(format!("{}: empty depth_url", record.id));
        }

        let mut urls = vec![
            ("image_url", record.assets.image_url.as_str()),
            ("depth_url", record.assets.depth_url.as_str()),
        ];
        urls.extend(record.assets.parts.iter());
        for (field, url) in urls {
            if url.is_empty() {
                continue;
            }
            match url_to_path(assets_dir, url_prefix, url) {
                Some(path) if path.is_file() => {}
                Some(path) => problems.push(format!(
                    "{}: {field} points at missing file {}",
                    record.id,
                    path.display()
                )),
                None => problems.push(format!(
                    "{}: {field} is outside {url_prefix}: {url}",
                    record.id
                )),
            }
        }
    }

    problems
}

pub fn run(overrides: &PathOverrides) -> Result<CommandReport> {
    let paths = resolve_paths(overrides)?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("verify");
    report.detail(format!("manifest={}", paths.manifest_path.display()));

    if !paths.manifest_path.is_file() {
        report.issue(format!(
            "{}: manifest not found",
            AtlasErrorCode::E005ManifestInvalid.as_str()
        ));
        return Ok(report);
    }

    // Part keys are mandatory in the schema, so a missing one fails here.
    let records = match manifest::read(&paths.manifest_path) {
        Ok(records) => records,
        Err(err) => {
            report.issue(format!(
                "{}: {err:#}",
                AtlasErrorCode::E005ManifestInvalid.as_str()
            ));
            return Ok(report);
        }
    };
    report.detail(format!("entries={}", records.len()));

    for problem in check_records(&records, &paths.assets_dir, &cfg.output.url_prefix) {
        report.issue(problem);
    }
    if report.ok {
        report.detail("manifest consistent with destination tree");
    }

    Ok(report)
}
