use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

pub const PART_NAMES: [&str; 3] = ["neck", "body", "base"];

#[derive(Debug, Clone, Serialize)]
pub struct AtlasPaths {
    pub source_root: PathBuf,
    pub original_dir: PathBuf,
    pub depth_dir: PathBuf,
    pub parts_dir: PathBuf,
    pub spreadsheet: PathBuf,
    pub project_root: PathBuf,
    pub assets_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub logs_dir: PathBuf,
}

/// Command-line overrides. Any field left `None` falls back to the
/// environment, then to the layout derived from the source/project roots.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub source_root: Option<PathBuf>,
    pub original_dir: Option<PathBuf>,
    pub depth_dir: Option<PathBuf>,
    pub parts_dir: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

fn pick(flag: &Option<PathBuf>, var: &str, fallback: PathBuf) -> PathBuf {
    match flag {
        Some(path) => path.clone(),
        None => env_or_default_path(var, fallback),
    }
}

impl AtlasPaths {
    pub fn part_source_dir(&self, part: &str) -> PathBuf {
        self.parts_dir.join(part)
    }

    /// Destination directory for one asset category, e.g. `original` or
    /// `parts/neck`.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.assets_dir.join(category)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.logs_dir.join("import.lock")
    }
}

pub fn category_for_part(part: &str) -> String {
    format!("parts/{part}")
}

pub fn destination_categories() -> Vec<String> {
    let mut out = vec!["original".to_string(), "depth".to_string()];
    out.extend(PART_NAMES.iter().map(|part| category_for_part(part)));
    out
}

pub fn resolve_paths(overrides: &PathOverrides) -> Result<AtlasPaths> {
    let cwd = env::current_dir().context("failed to resolve current directory")?;
    resolve_paths_from(&cwd, overrides)
}

pub fn resolve_paths_from(cwd: &Path, overrides: &PathOverrides) -> Result<AtlasPaths> {
    let source_root = pick(&overrides.source_root, "ATLAS_SOURCE_ROOT", cwd.to_path_buf());
    let original_dir = pick(
        &overrides.original_dir,
        "ATLAS_ORIGINAL_DIR",
        source_root.join("Photos_NoBG"),
    );
    let depth_dir = pick(&overrides.depth_dir, "ATLAS_DEPTH_DIR", source_root.join("Depth"));
    let parts_dir = pick(&overrides.parts_dir, "ATLAS_PARTS_DIR", source_root.join("Parts"));
    let spreadsheet = pick(
        &overrides.spreadsheet,
        "ATLAS_SPREADSHEET",
        source_root.join("web_database.csv"),
    );

    let project_root = env_or_default_path("ATLAS_PROJECT_ROOT", cwd.to_path_buf());
    let assets_dir = pick(
        &overrides.assets_dir,
        "ATLAS_ASSETS_DIR",
        project_root.join("public/assets/images"),
    );
    let manifest_path = pick(
        &overrides.manifest_path,
        "ATLAS_MANIFEST_PATH",
        project_root.join("frontend_master_db.json"),
    );
    let logs_dir = env_or_default_path("ATLAS_LOGS_DIR", project_root.join(".atlas/logs"));

    Ok(AtlasPaths {
        source_root,
        original_dir,
        depth_dir,
        parts_dir,
        spreadsheet,
        project_root,
        assets_dir,
        manifest_path,
        logs_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_win_over_derived_layout() {
        let overrides = PathOverrides {
            source_root: Some(PathBuf::from("/data/packages")),
            depth_dir: Some(PathBuf::from("/elsewhere/depth")),
            ..PathOverrides::default()
        };
        let paths = resolve_paths_from(Path::new("/work"), &overrides).expect("paths");
        assert_eq!(paths.original_dir, PathBuf::from("/data/packages/Photos_NoBG"));
        assert_eq!(paths.depth_dir, PathBuf::from("/elsewhere/depth"));
        assert_eq!(paths.part_source_dir("neck"), PathBuf::from("/data/packages/Parts/neck"));
    }

    #[test]
    fn destination_categories_cover_every_part() {
        assert_eq!(
            destination_categories(),
            vec!["original", "depth", "parts/neck", "parts/body", "parts/base"]
        );
    }
}
