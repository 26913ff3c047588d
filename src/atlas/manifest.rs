use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobeCoordinates {
    pub x: f64,
    pub y: f64,
}

/// Part URLs are always present; an absent crop is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartUrls {
    pub neck: String,
    pub body: String,
    pub base: String,
}

impl PartUrls {
    pub fn slot_mut(&mut self, part: &str) -> Option<&mut String> {
        match part {
            "neck" => Some(&mut self.neck),
            "body" => Some(&mut self.body),
            "base" => Some(&mut self.base),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("neck", self.neck.as_str()),
            ("body", self.body.as_str()),
            ("base", self.base.as_str()),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetUrls {
    pub image_url: String,
    pub depth_url: String,
    pub parts: PartUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub region: String,
    pub period: String,
    pub globe_coordinates: GlobeCoordinates,
    pub assets: AssetUrls,
}

pub fn asset_url(url_prefix: &str, category: &str, file_name: &str) -> String {
    format!("{url_prefix}/{category}/{file_name}")
}

pub fn render(records: &[AssetRecord]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(records)?;
    out.push('\n');
    Ok(out)
}

/// Replace the manifest at `path` in one step so readers never observe a
/// half-written file.
pub fn write(path: &Path, records: &[AssetRecord]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let data = render(records)?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data.as_bytes())
        .with_context(|| format!("failed to write temp manifest for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Vec<AssetRecord>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    fn sample() -> AssetRecord {
        AssetRecord {
            id: "Africa_Vase_1".to_string(),
            region: "Africa".to_string(),
            period: "Unknown".to_string(),
            globe_coordinates: GlobeCoordinates { x: 1.5, y: 0.0 },
            assets: AssetUrls {
                image_url: asset_url("/assets/images", "original", "Africa_Vase_1.png"),
                depth_url: asset_url("/assets/images", "depth", "Africa_Vase_1.png"),
                parts: PartUrls {
                    body: asset_url("/assets/images", "parts/body", "Africa_Vase_1.png"),
                    ..PartUrls::default()
                },
            },
        }
    }

    #[test]
    fn absent_parts_serialize_as_empty_strings() {
        let rendered = render(&[sample()]).expect("render");
        let value: Value = serde_json::from_str(&rendered).expect("json");
        let parts = &value[0]["assets"]["parts"];
        assert_eq!(parts["neck"], Value::String(String::new()));
        assert_eq!(parts["base"], Value::String(String::new()));
        assert_eq!(
            parts["body"],
            Value::String("/assets/images/parts/body/Africa_Vase_1.png".to_string())
        );
        assert_eq!(value[0]["globe_coordinates"]["x"], 1.5);
    }

    #[test]
    fn write_then_read_preserves_order() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("out/db.json");
        let mut second = sample();
        second.id = "Africa_Vase_1_1".to_string();
        write(&path, &[sample(), second.clone()]).expect("write");

        let back = read(&path).expect("read");
        assert_eq!(back.len(), 2);
        assert_eq!(back[1], second);
        assert!(fs::read_to_string(&path).expect("raw").ends_with("]\n"));
    }
}
