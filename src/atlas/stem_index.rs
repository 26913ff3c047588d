use crate::atlas::util::{has_accepted_extension, normalize_stem};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lookup from normalized stem to the file carrying it, for one asset
/// category tree.
///
/// When two files in the tree share a stem, the one visited last wins.
/// The walk is sorted by file name at every level, so for an unchanged tree
/// the winner is stable, but no caller should rely on which sibling folder
/// it comes from.
#[derive(Debug, Clone, Default)]
pub struct StemIndex {
    entries: HashMap<String, PathBuf>,
    shadowed: usize,
}

impl StemIndex {
    pub fn get(&self, stem: &str) -> Option<&Path> {
        self.entries.get(stem).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files that were replaced by a later file with the same stem.
    pub fn shadowed(&self) -> usize {
        self.shadowed
    }

    fn insert(&mut self, stem: String, path: PathBuf) {
        if let Some(previous) = self.entries.insert(stem, path) {
            debug!(previous = %previous.display(), "stem index entry replaced");
            self.shadowed += 1;
        }
    }
}

/// Index every accepted file under `root`. A missing root yields an empty
/// index since sibling categories are optional.
pub fn build(root: &Path, extensions: &[String]) -> StemIndex {
    let mut index = StemIndex::default();
    if !root.is_dir() {
        debug!(root = %root.display(), "sibling category missing, using empty index");
        return index;
    }

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !has_accepted_extension(path, extensions) {
            continue;
        }
        let stem = normalize_stem(&entry.file_name().to_string_lossy());
        if stem.is_empty() {
            continue;
        }
        index.insert(stem, path.to_path_buf());
    }

    debug!(
        root = %root.display(),
        files = index.len(),
        shadowed = index.shadowed,
        "built stem index"
    );
    index
}
