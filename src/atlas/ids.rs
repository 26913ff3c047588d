use std::collections::HashSet;

/// Collapse every run of characters outside `[A-Za-z0-9_]` (Unicode word
/// characters included) to one underscore, squeeze repeated underscores and
/// trim them from both ends.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            prev_sep = false;
        } else if !prev_sep {
            out.push('_');
            prev_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Keep the region readable (spaces and punctuation stay) but replace path
/// separators and control characters so the id is always one file name.
fn region_segment(region: &str) -> String {
    region
        .chars()
        .map(|ch| {
            if ch == '/' || ch == '\\' || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

/// `{region}_{relative dir}_{file stem}`, omitting the middle segment for
/// files directly under the original root.
pub fn desired_id(region: &str, relative_dir: &str, file_stem: &str) -> String {
    let region = region_segment(region);
    let prefix = sanitize(relative_dir);
    let name = sanitize(file_stem);
    if prefix.is_empty() {
        format!("{region}_{name}")
    } else {
        format!("{region}_{prefix}_{name}")
    }
}

#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    issued: HashSet<String>,
}

impl IdentifierRegistry {
    /// Return `desired` if unused, else the first free `desired_N` for
    /// N = 1, 2, ... The returned id is recorded before returning.
    pub fn allocate(&mut self, desired: &str) -> String {
        let mut candidate = desired.to_string();
        let mut counter = 1u64;
        while self.issued.contains(&candidate) {
            candidate = format!("{desired}_{counter}");
            counter += 1;
        }
        self.issued.insert(candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Component, Path};

    #[test]
    fn sanitize_collapses_runs_and_trims() {
        assert_eq!(sanitize("Vase (12) copy"), "Vase_12_copy");
        assert_eq!(sanitize("__a--b__"), "a_b");
        assert_eq!(sanitize("Africa/batch 1"), "Africa_batch_1");
        assert_eq!(sanitize("---"), "");
    }

    #[test]
    fn desired_id_omits_empty_prefix() {
        assert_eq!(desired_id("Africa", "", "Vase 1"), "Africa_Vase_1");
        assert_eq!(desired_id("Europe", "greek/attic", "amphora"), "Europe_greek_attic_amphora");
    }

    #[test]
    fn region_cannot_introduce_path_components() {
        let escaped = desired_id("../../escaped", "", "jar");
        assert_eq!(escaped, ".._.._escaped_jar");
        assert_eq!(Path::new(&escaped).components().count(), 1);
        assert!(matches!(
            Path::new(&escaped).components().next(),
            Some(Component::Normal(_))
        ));

        assert_eq!(desired_id("Near East/Anatolia", "", "jar"), "Near East_Anatolia_jar");
        assert_eq!(desired_id("a\\b", "", "jar"), "a_b_jar");
        assert_eq!(desired_id("East Asia", "", "jar"), "East Asia_jar");
    }

    #[test]
    fn collision_appends_increasing_suffix() {
        let mut ids = IdentifierRegistry::default();
        assert_eq!(ids.allocate("Africa_Vase_1"), "Africa_Vase_1");
        assert_eq!(ids.allocate("Africa_Vase_1"), "Africa_Vase_1_1");
        assert_eq!(ids.allocate("Africa_Vase_1"), "Africa_Vase_1_2");
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn suffix_skips_ids_taken_directly() {
        let mut ids = IdentifierRegistry::default();
        assert_eq!(ids.allocate("a_1"), "a_1");
        assert_eq!(ids.allocate("a"), "a");
        assert_eq!(ids.allocate("a"), "a_2");
    }
}
