use std::path::Path;

/// Folder keyword to canonical region. Matching is a case-insensitive
/// substring test; when several keywords hit, the longest one wins and
/// ties go to the earlier row.
const REGION_KEYWORDS: &[(&str, &str)] = &[
    ("middle_east", "Middle East"),
    ("middle east", "Middle East"),
    ("east_asia", "East Asia"),
    ("east asia", "East Asia"),
    ("asia", "East Asia"),
    ("africa", "Africa"),
    ("americas", "Americas"),
    ("america", "Americas"),
    ("europe", "Europe"),
];

pub const UNKNOWN_REGION: &str = "Unknown";

pub fn region_for_folder_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    let mut best: Option<(usize, &'static str)> = None;
    for (keyword, region) in REGION_KEYWORDS {
        if !lower.contains(keyword) {
            continue;
        }
        match best {
            Some((len, _)) if len >= keyword.len() => {}
            _ => best = Some((keyword.len(), region)),
        }
    }
    best.map(|(_, region)| region)
}

/// Region named by the directory that directly contains `file`. Higher
/// ancestors are not consulted.
pub fn infer_folder_region(file: &Path) -> Option<&'static str> {
    let folder = file.parent()?.file_name()?.to_str()?;
    region_for_folder_name(folder)
}
