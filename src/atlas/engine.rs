use crate::atlas::config::AtlasConfig;
use crate::atlas::fingerprint::{FingerprintSet, fingerprint};
use crate::atlas::ids::{IdentifierRegistry, desired_id};
use crate::atlas::manifest::{self, AssetRecord, AssetUrls, GlobeCoordinates, PartUrls, asset_url};
use crate::atlas::metadata::{self, MatchKind, MetadataTable};
use crate::atlas::paths::{AtlasPaths, PART_NAMES, category_for_part, destination_categories};
use crate::atlas::region::infer_folder_region;
use crate::atlas::stem_index::{self, StemIndex};
use crate::atlas::util::{has_accepted_extension, lowercase_extension, normalize_stem};
use crate::atlas::warn::{self, WarnEvent};
use crate::error::{AtlasError, AtlasErrorCode};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunStats {
    pub scanned: usize,
    pub rejected_duplicate: usize,
    pub rejected_no_depth: usize,
    pub accepted: usize,
    pub copy_failures: usize,
    pub metadata_single_match: usize,
    pub metadata_folder_tiebreak: usize,
    pub metadata_first_candidate: usize,
    pub metadata_folder_fallback: usize,
    pub parts_neck: usize,
    pub parts_body: usize,
    pub parts_base: usize,
}

impl RunStats {
    /// Accepted entries whose metadata came from the spreadsheet.
    pub fn metadata_matched(&self) -> usize {
        self.metadata_single_match + self.metadata_folder_tiebreak + self.metadata_first_candidate
    }

    fn count_match(&mut self, kind: MatchKind) {
        match kind {
            MatchKind::SingleMatch => self.metadata_single_match += 1,
            MatchKind::FolderTiebreak => self.metadata_folder_tiebreak += 1,
            MatchKind::FirstCandidate => self.metadata_first_candidate += 1,
            MatchKind::FolderFallback => self.metadata_folder_fallback += 1,
        }
    }

    fn count_part(&mut self, part: &str) {
        match part {
            "neck" => self.parts_neck += 1,
            "body" => self.parts_body += 1,
            "base" => self.parts_base += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndexSizes {
    pub depth: usize,
    pub neck: usize,
    pub body: usize,
    pub base: usize,
    pub shadowed: usize,
    pub metadata_stems: usize,
    pub metadata_rows: usize,
    pub metadata_rows_skipped: usize,
    pub metadata_rows_degraded: usize,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub records: Vec<AssetRecord>,
    pub stats: RunStats,
    pub indexes: IndexSizes,
    pub copy_failures: Vec<String>,
    pub manifest_written: bool,
}

/// Depth and part-crop lookups for one run.
#[derive(Debug, Default)]
pub struct SiblingIndexes {
    pub depth: StemIndex,
    pub parts: Vec<(&'static str, StemIndex)>,
}

impl SiblingIndexes {
    pub fn build(paths: &AtlasPaths, extensions: &[String]) -> Self {
        Self {
            depth: stem_index::build(&paths.depth_dir, extensions),
            parts: PART_NAMES
                .iter()
                .map(|part| (*part, stem_index::build(&paths.part_source_dir(part), extensions)))
                .collect(),
        }
    }

    fn part_len(&self, name: &str) -> usize {
        self.parts
            .iter()
            .find(|(part, _)| *part == name)
            .map(|(_, index)| index.len())
            .unwrap_or(0)
    }
}

struct PlannedCopy {
    category: String,
    source: PathBuf,
    file_name: String,
}

impl PlannedCopy {
    fn new(category: String, source: &Path, id: &str) -> Self {
        let file_name = match lowercase_extension(source) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        Self {
            category,
            source: source.to_path_buf(),
            file_name,
        }
    }
}

/// Owns every per-run registry. Nothing here outlives one import.
pub struct Reconciler<'a> {
    paths: &'a AtlasPaths,
    cfg: &'a AtlasConfig,
    dry_run: bool,
    metadata: MetadataTable,
    siblings: SiblingIndexes,
    fingerprints: FingerprintSet,
    ids: IdentifierRegistry,
    records: Vec<AssetRecord>,
    stats: RunStats,
    copy_failures: Vec<String>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        paths: &'a AtlasPaths,
        cfg: &'a AtlasConfig,
        dry_run: bool,
        metadata: MetadataTable,
        siblings: SiblingIndexes,
    ) -> Self {
        Self {
            paths,
            cfg,
            dry_run,
            metadata,
            siblings,
            fingerprints: FingerprintSet::default(),
            ids: IdentifierRegistry::default(),
            records: Vec::new(),
            stats: RunStats::default(),
            copy_failures: Vec::new(),
        }
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        self.cfg
            .import
            .exclude_dir_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }

    /// Visit every original in sorted path order.
    pub fn scan(&mut self) -> Result<()> {
        let root = self.paths.original_dir.clone();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry));

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if entry.file_type().is_file()
                && has_accepted_extension(entry.path(), &self.cfg.import.extensions)
            {
                candidates.push(entry.into_path());
            }
        }

        for path in candidates {
            self.process(&path)?;
        }
        Ok(())
    }

    /// Drive one original through fingerprint, depth check, metadata,
    /// identifier and copy. Rejections return `Ok` with nothing emitted.
    pub fn process(&mut self, path: &Path) -> Result<()> {
        self.stats.scanned += 1;

        let digest = fingerprint(path)?;
        if !self.fingerprints.register_if_new(digest) {
            debug!(path = %path.display(), "rejected: duplicate content");
            self.stats.rejected_duplicate += 1;
            return Ok(());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = normalize_stem(&file_name);
        let Some(depth_src) = self.siblings.depth.get(&stem).map(Path::to_path_buf) else {
            debug!(path = %path.display(), stem = %stem, "rejected: no depth map");
            self.stats.rejected_no_depth += 1;
            return Ok(());
        };

        let folder_region = infer_folder_region(path);
        let resolution = metadata::resolve(self.metadata.candidates(&stem), folder_region);

        let relative_dir = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.paths.original_dir).ok())
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw_stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self
            .ids
            .allocate(&desired_id(&resolution.region, &relative_dir, &raw_stem));

        let mut plan = vec![
            PlannedCopy::new("original".to_string(), path, &id),
            PlannedCopy::new("depth".to_string(), &depth_src, &id),
        ];
        let mut present_parts = Vec::new();
        for (part, index) in &self.siblings.parts {
            if let Some(src) = index.get(&stem) {
                plan.push(PlannedCopy::new(category_for_part(part), src, &id));
                present_parts.push(*part);
            }
        }

        if !self.dry_run {
            if let Err(err) = self.copy_all(&plan) {
                return self.record_copy_failure(&id, err);
            }
        }

        let prefix = self.cfg.output.url_prefix.as_str();
        let mut parts = PartUrls::default();
        for copy in &plan[2..] {
            let part = copy.category.trim_start_matches("parts/");
            if let Some(slot) = parts.slot_mut(part) {
                *slot = asset_url(prefix, &copy.category, &copy.file_name);
            }
        }
        let record = AssetRecord {
            id: id.clone(),
            region: resolution.region.clone(),
            period: self.cfg.import.default_period.clone(),
            globe_coordinates: GlobeCoordinates {
                x: resolution.x,
                y: resolution.y,
            },
            assets: AssetUrls {
                image_url: asset_url(prefix, &plan[0].category, &plan[0].file_name),
                depth_url: asset_url(prefix, &plan[1].category, &plan[1].file_name),
                parts,
            },
        };

        self.stats.count_match(resolution.kind);
        for part in present_parts {
            self.stats.count_part(part);
        }
        self.stats.accepted += 1;
        debug!(id = %id, region = %resolution.region, kind = ?resolution.kind, "accepted");
        self.records.push(record);
        Ok(())
    }

    /// Copy every planned file, removing the ones already written if any
    /// copy fails.
    fn copy_all(&self, plan: &[PlannedCopy]) -> Result<(), AtlasError> {
        let mut written: Vec<PathBuf> = Vec::new();
        for copy in plan {
            let target = self.paths.category_dir(&copy.category).join(&copy.file_name);
            if let Err(source) = fs::copy(&copy.source, &target) {
                for done in &written {
                    let _ = fs::remove_file(done);
                }
                return Err(AtlasError::CopyFailure {
                    from: copy.source.clone(),
                    to: target,
                    source,
                });
            }
            written.push(target);
        }
        Ok(())
    }

    fn record_copy_failure(&mut self, id: &str, err: AtlasError) -> Result<()> {
        let abort = self.cfg.import.abort_on_copy_error();
        let mut line = format!("{id}: {err}");
        if let AtlasError::CopyFailure { from, to, source } = &err {
            warn::emit(WarnEvent {
                code: AtlasErrorCode::E004CopyFailed.as_str(),
                stage: "copy",
                action: if abort { "abort" } else { "skip" },
                source: &from.to_string_lossy(),
                target: &to.to_string_lossy(),
                reason: id,
                err: &source.to_string(),
            });
            line = format!("{line}: {source}");
        }
        warn!(id, error = %line, "copy failed; entry dropped");
        self.stats.copy_failures += 1;
        self.copy_failures.push(line);
        if abort {
            return Err(err.into());
        }
        Ok(())
    }

    pub fn finish(self, indexes: IndexSizes, manifest_written: bool) -> ImportOutcome {
        debug!(
            distinct_contents = self.fingerprints.len(),
            issued_ids = self.ids.len(),
            "registries released"
        );
        ImportOutcome {
            records: self.records,
            stats: self.stats,
            indexes,
            copy_failures: self.copy_failures,
            manifest_written,
        }
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }
}

/// Remove and recreate every destination category directory.
pub fn prepare_destination(paths: &AtlasPaths) -> Result<()> {
    for category in destination_categories() {
        let dir = paths.category_dir(&category);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to clear {}", dir.display()))?;
        }
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Run the whole pipeline. All configuration checks happen before the
/// destination is touched.
pub fn run_import(
    paths: &AtlasPaths,
    cfg: &AtlasConfig,
    opts: &ImportOptions,
) -> Result<ImportOutcome> {
    if !paths.original_dir.is_dir() {
        return Err(AtlasError::configuration(format!(
            "original image directory not found: {}",
            paths.original_dir.display()
        ))
        .into());
    }
    let metadata = metadata::load(&paths.spreadsheet, cfg.import.strict_rows())?;

    let extensions = &cfg.import.extensions;
    let siblings = SiblingIndexes::build(paths, extensions);
    let indexes = IndexSizes {
        depth: siblings.depth.len(),
        neck: siblings.part_len("neck"),
        body: siblings.part_len("body"),
        base: siblings.part_len("base"),
        shadowed: siblings.depth.shadowed()
            + siblings.parts.iter().map(|(_, i)| i.shadowed()).sum::<usize>(),
        metadata_stems: metadata.stems(),
        metadata_rows: metadata.rows_loaded,
        metadata_rows_skipped: metadata.rows_skipped,
        metadata_rows_degraded: metadata.rows_degraded,
    };
    info!(
        depth = indexes.depth,
        neck = indexes.neck,
        body = indexes.body,
        base = indexes.base,
        metadata_stems = indexes.metadata_stems,
        "indexes built"
    );

    if !opts.dry_run {
        // The old manifest describes files about to be wiped; a run that
        // fails from here on must not leave it behind.
        if paths.manifest_path.exists() {
            fs::remove_file(&paths.manifest_path).with_context(|| {
                format!("failed to remove {}", paths.manifest_path.display())
            })?;
        }
        prepare_destination(paths)?;
    }

    let mut reconciler = Reconciler::new(paths, cfg, opts.dry_run, metadata, siblings);
    reconciler.scan()?;

    let manifest_written = if opts.dry_run {
        false
    } else {
        manifest::write(&paths.manifest_path, reconciler.records())?;
        true
    };

    let outcome = reconciler.finish(indexes, manifest_written);
    info!(
        scanned = outcome.stats.scanned,
        accepted = outcome.stats.accepted,
        rejected_no_depth = outcome.stats.rejected_no_depth,
        rejected_duplicate = outcome.stats.rejected_duplicate,
        copy_failures = outcome.stats.copy_failures,
        "import finished"
    );
    Ok(outcome)
}
