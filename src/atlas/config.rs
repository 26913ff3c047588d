use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasImportConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_dir_keywords: Vec<String>,
    #[serde(default = "default_period")]
    pub default_period: String,
    #[serde(default = "default_row_policy")]
    pub row_policy: String,
    #[serde(default = "default_on_copy_error")]
    pub on_copy_error: String,
}

fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn default_period() -> String {
    "Unknown".to_string()
}

fn default_row_policy() -> String {
    "lenient".to_string()
}

fn default_on_copy_error() -> String {
    "skip".to_string()
}

impl Default for AtlasImportConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dir_keywords: Vec::new(),
            default_period: default_period(),
            row_policy: default_row_policy(),
            on_copy_error: default_on_copy_error(),
        }
    }
}

impl AtlasImportConfig {
    pub fn strict_rows(&self) -> bool {
        self.row_policy == "strict"
    }

    pub fn abort_on_copy_error(&self) -> bool {
        self.on_copy_error == "abort"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasOutputConfig {
    pub url_prefix: String,
}

impl Default for AtlasOutputConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/assets/images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AtlasConfig {
    pub import: AtlasImportConfig,
    pub output: AtlasOutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAtlasConfig {
    import: Option<AtlasImportConfig>,
    output: Option<AtlasOutputConfig>,
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn normalize_extensions(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ext in raw {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

pub fn validate(cfg: &AtlasConfig) -> Result<()> {
    if cfg.import.extensions.is_empty() {
        return Err(anyhow!("invalid extensions: at least one is required"));
    }
    if cfg.import.row_policy != "lenient" && cfg.import.row_policy != "strict" {
        return Err(anyhow!("invalid row policy: use `lenient` or `strict`"));
    }
    if cfg.import.on_copy_error != "skip" && cfg.import.on_copy_error != "abort" {
        return Err(anyhow!("invalid copy error policy: use `skip` or `abort`"));
    }
    if cfg.import.default_period.trim().is_empty() {
        return Err(anyhow!("invalid default period: cannot be empty"));
    }
    let prefix = cfg.output.url_prefix.trim();
    if prefix.is_empty() || !prefix.starts_with('/') {
        return Err(anyhow!("invalid url prefix: must start with `/`"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("ATLAS_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".atlas").join("atlas.toml"))
}

fn merge_file_config(base: &mut AtlasConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse atlas config {}: {err}", path.display()))
}

fn merge_toml(base: &mut AtlasConfig, raw: &str) -> Result<()> {
    let parsed: PartialAtlasConfig = toml::from_str(raw)?;
    if let Some(import) = parsed.import {
        base.import = import;
    }
    if let Some(output) = parsed.output {
        base.output = output;
    }
    Ok(())
}

pub fn load_config() -> Result<AtlasConfig> {
    let mut cfg = AtlasConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.import.extensions = env_or_csv("ATLAS_EXTENSIONS", &cfg.import.extensions);
    cfg.import.exclude_dir_keywords =
        env_or_csv("ATLAS_EXCLUDE_DIR_KEYWORDS", &cfg.import.exclude_dir_keywords);
    cfg.import.default_period = env_or_string("ATLAS_DEFAULT_PERIOD", &cfg.import.default_period);
    cfg.import.row_policy = env_or_string("ATLAS_ROW_POLICY", &cfg.import.row_policy);
    cfg.import.on_copy_error = env_or_string("ATLAS_ON_COPY_ERROR", &cfg.import.on_copy_error);
    cfg.output.url_prefix = env_or_string("ATLAS_URL_PREFIX", &cfg.output.url_prefix);

    cfg.import.extensions = normalize_extensions(&cfg.import.extensions);
    cfg.import.exclude_dir_keywords = cfg
        .import
        .exclude_dir_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    cfg.output.url_prefix = cfg.output.url_prefix.trim_end_matches('/').to_string();

    validate(&cfg)?;
    Ok(cfg)
}
