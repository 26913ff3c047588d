use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid spreadsheet row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("failed to copy {} to {}", from.display(), to.display())]
    CopyFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AtlasError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasErrorCode {
    E001Locked,
    E002SourceMissing,
    E003SpreadsheetMissing,
    E004CopyFailed,
    E005ManifestInvalid,
}

impl AtlasErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001Locked => "E001_LOCKED",
            Self::E002SourceMissing => "E002_SOURCE_MISSING",
            Self::E003SpreadsheetMissing => "E003_SPREADSHEET_MISSING",
            Self::E004CopyFailed => "E004_COPY_FAILED",
            Self::E005ManifestInvalid => "E005_MANIFEST_INVALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_failure_chain_names_io_error_once() {
        let err = anyhow::Error::from(AtlasError::CopyFailure {
            from: PathBuf::from("a.png"),
            to: PathBuf::from("b.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        let rendered = format!("{err:#}");
        assert_eq!(rendered, "failed to copy a.png to b.png: gone");
        assert_eq!(rendered.matches("gone").count(), 1);
    }
}
