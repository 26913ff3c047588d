use crate::atlas::region::UNKNOWN_REGION;
use crate::atlas::util::normalize_stem;
use crate::error::AtlasError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub region: String,
    pub x: f64,
    pub y: f64,
}

/// Candidate metadata per normalized stem, in file order.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    entries: HashMap<String, Vec<MetadataRecord>>,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub rows_degraded: usize,
}

impl MetadataTable {
    pub fn candidates(&self, stem: &str) -> &[MetadataRecord] {
        self.entries.get(stem).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stems(&self) -> usize {
        self.entries.len()
    }

    fn push(&mut self, stem: String, record: MetadataRecord) {
        self.entries.entry(stem).or_default().push(record);
        self.rows_loaded += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Exactly one spreadsheet row; trusted over the folder.
    SingleMatch,
    /// Several rows; the folder region picked one.
    FolderTiebreak,
    /// Several rows and none matched the folder region.
    FirstCandidate,
    /// No rows; region came from the folder (or is unknown).
    FolderFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub kind: MatchKind,
}

impl Resolution {
    fn from_record(record: &MetadataRecord, kind: MatchKind) -> Self {
        Self {
            region: record.region.clone(),
            x: record.x,
            y: record.y,
            kind,
        }
    }
}

/// Choose metadata for one image.
///
/// A lone spreadsheet row always wins, even against the folder. The folder
/// region only breaks ties between several rows, and only fills in when
/// there are no rows at all.
pub fn resolve(candidates: &[MetadataRecord], folder_region: Option<&str>) -> Resolution {
    match candidates {
        [] => Resolution {
            region: folder_region.unwrap_or(UNKNOWN_REGION).to_string(),
            x: 0.0,
            y: 0.0,
            kind: MatchKind::FolderFallback,
        },
        [only] => Resolution::from_record(only, MatchKind::SingleMatch),
        [first, ..] => {
            let by_folder = folder_region
                .and_then(|folder| candidates.iter().find(|c| c.region == folder));
            match by_folder {
                Some(hit) => Resolution::from_record(hit, MatchKind::FolderTiebreak),
                None => Resolution::from_record(first, MatchKind::FirstCandidate),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    filename: Option<usize>,
    region: Option<usize>,
    x: Option<usize>,
    y: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| {
            headers.iter().position(|h| {
                h.trim_start_matches('\u{feff}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };
        Self {
            filename: find("filename"),
            region: find("region"),
            x: find("x"),
            y: find("y"),
        }
    }
}

fn field<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| record.get(i)).map(str::trim)
}

fn parse_coord(raw: Option<&str>) -> Option<f64> {
    match raw {
        // Absent column reads as zero, like a blank default.
        None => Some(0.0),
        Some(v) => v.parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

/// Parse the metadata spreadsheet.
///
/// Only a missing file is fatal. In lenient mode rows without a filename are
/// skipped and rows with unparseable coordinates keep their region but sit
/// at `(0, 0)`; in strict mode either condition fails the load.
pub fn load(path: &Path, strict: bool) -> Result<MetadataTable, AtlasError> {
    if !path.is_file() {
        return Err(AtlasError::configuration(format!(
            "metadata spreadsheet not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| {
            AtlasError::configuration(format!("failed to open {}: {err}", path.display()))
        })?;

    let headers = reader
        .headers()
        .map_err(|err| {
            AtlasError::configuration(format!("failed to read header of {}: {err}", path.display()))
        })?
        .clone();
    let columns = Columns::from_headers(&headers);
    if columns.filename.is_none() {
        if strict {
            return Err(AtlasError::configuration(format!(
                "{} has no `filename` column",
                path.display()
            )));
        }
        warn!(path = %path.display(), "spreadsheet has no filename column; every row will be skipped");
    }

    let mut table = MetadataTable::default();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let row = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) if strict => {
                return Err(AtlasError::InvalidRow {
                    row,
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                debug!(row, error = %err, "skipping unreadable spreadsheet row");
                table.rows_skipped += 1;
                continue;
            }
        };

        let filename = field(&record, columns.filename).unwrap_or("");
        let stem = normalize_stem(filename);
        if stem.is_empty() {
            if strict {
                return Err(AtlasError::InvalidRow {
                    row,
                    reason: "missing filename".to_string(),
                });
            }
            table.rows_skipped += 1;
            continue;
        }

        let region = field(&record, columns.region)
            .filter(|r| !r.is_empty())
            .unwrap_or(UNKNOWN_REGION)
            .to_string();

        let (x, y) = match (
            parse_coord(field(&record, columns.x)),
            parse_coord(field(&record, columns.y)),
        ) {
            (Some(x), Some(y)) => (x, y),
            _ if strict => {
                return Err(AtlasError::InvalidRow {
                    row,
                    reason: format!("unparseable coordinates for {filename}"),
                });
            }
            _ => {
                debug!(row, filename, "coordinates unparseable, using (0, 0)");
                table.rows_degraded += 1;
                (0.0, 0.0)
            }
        };

        table.push(stem, MetadataRecord { region, x, y });
    }

    debug!(
        path = %path.display(),
        loaded = table.rows_loaded,
        skipped = table.rows_skipped,
        degraded = table.rows_degraded,
        "loaded metadata spreadsheet"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(region: &str, x: f64, y: f64) -> MetadataRecord {
        MetadataRecord {
            region: region.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn single_candidate_overrides_folder() {
        let got = resolve(&[record("Europe", 1.0, 2.0)], Some("Africa"));
        assert_eq!(got.region, "Europe");
        assert_eq!((got.x, got.y), (1.0, 2.0));
        assert_eq!(got.kind, MatchKind::SingleMatch);
    }

    #[test]
    fn folder_breaks_ties_between_candidates() {
        let candidates = [record("Africa", 1.0, 1.0), record("Europe", 5.0, 6.0)];
        let got = resolve(&candidates, Some("Europe"));
        assert_eq!(got.region, "Europe");
        assert_eq!((got.x, got.y), (5.0, 6.0));
        assert_eq!(got.kind, MatchKind::FolderTiebreak);
    }

    #[test]
    fn unmatched_tie_falls_back_to_first_candidate() {
        let candidates = [record("Africa", 1.0, 1.0), record("Europe", 5.0, 6.0)];
        let got = resolve(&candidates, Some("Americas"));
        assert_eq!(got.region, "Africa");
        assert_eq!(got.kind, MatchKind::FirstCandidate);

        let got = resolve(&candidates, None);
        assert_eq!(got.region, "Africa");
    }

    #[test]
    fn no_candidates_uses_folder_region_at_origin() {
        let got = resolve(&[], Some("Americas"));
        assert_eq!(got.region, "Americas");
        assert_eq!((got.x, got.y), (0.0, 0.0));
        assert_eq!(got.kind, MatchKind::FolderFallback);

        assert_eq!(resolve(&[], None).region, "Unknown");
    }

    #[test]
    fn missing_spreadsheet_is_a_configuration_error() {
        let tmp = tempdir().expect("tempdir");
        let err = load(&tmp.path().join("missing.csv"), false).expect_err("must fail");
        assert!(matches!(err, AtlasError::Configuration(_)));
    }

    #[test]
    fn lenient_load_skips_and_degrades_rows() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("db.csv");
        fs::write(
            &path,
            "\u{feff}filename,region,x,y,notes\n\
             Vase_1.png,Africa,10.5,-3,first\n\
             ,Europe,1,1,no name\n\
             vase_1.jpg,Europe,abc,2,bad x\n\
             Other.png,Americas,4,5\n",
        )
        .expect("write csv");

        let table = load(&path, false).expect("load");
        assert_eq!(table.rows_loaded, 3);
        assert_eq!(table.rows_skipped, 1);
        assert_eq!(table.rows_degraded, 1);
        assert_eq!(
            table.candidates("vase_1"),
            &[record("Africa", 10.5, -3.0), record("Europe", 0.0, 0.0)]
        );
        assert_eq!(table.candidates("other"), &[record("Americas", 4.0, 5.0)]);
        assert!(table.candidates("absent").is_empty());
    }

    #[test]
    fn strict_load_rejects_bad_coordinates() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("db.csv");
        fs::write(&path, "filename,region,x,y\nvase.png,Africa,1,oops\n").expect("write csv");

        let err = load(&path, true).expect_err("strict must fail");
        match err {
            AtlasError::InvalidRow { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
