use std::path::Path;

/// Join key shared by every asset category: file name without its final
/// extension, trimmed and lowercased.
pub fn normalize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    stem.trim().to_lowercase()
}

pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty())
}

/// `extensions` must already be lowercase without a leading dot.
pub fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    match lowercase_extension(path) {
        Some(ext) => extensions.iter().any(|accepted| *accepted == ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
    }

    #[test]
    fn stem_is_trimmed_and_lowercased() {
        assert_eq!(normalize_stem(" Main-Image_35.PNG "), "main-image_35");
        assert_eq!(normalize_stem("vase.v2.jpg"), "vase.v2");
        assert_eq!(normalize_stem("noext"), "noext");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_accepted_extension(Path::new("a/B.JPEG"), &exts()));
        assert!(!has_accepted_extension(Path::new("a/b.webp"), &exts()));
        assert!(!has_accepted_extension(Path::new("a/png"), &exts()));
    }
}
