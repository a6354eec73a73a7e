//! Decode RollerCoaster Tycoon `CSS0.DAT` scenario progress archives and
//! build OpenRCT2 `highscores.dat` score files from them.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod archive;
pub mod checksum;
pub mod crypt;
pub mod highscores;
pub mod merge;
pub mod rle;
pub mod table;
pub mod tabular;

pub use archive::{decode_archive, locate_archive, DecodedArchive};
pub use highscores::{ScoreEntry, ScoreFile, ScoreTable};
pub use merge::{best_from_rows, merge_into, CompanyValue, ScoreRow};
pub use table::ScenarioRecord;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive is {len} bytes, too small to contain a checksum")]
    ArchiveTooShort { len: usize },
    #[error("checksum mismatch: expected {expected}, calculated {calculated}")]
    ChecksumMismatch { expected: u32, calculated: u32 },
    #[error("score file is truncated while reading {context}")]
    TruncatedScoreFile { context: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProgressError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    /// A `CSS0.DAT` archive, or a directory containing one.
    Archive(PathBuf),
    /// A CSV with `filename,name,company_value,winner` columns.
    Csv(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighscoreSettings {
    pub source: RowSource,
    pub output_path: PathBuf,
    #[serde(default)]
    pub merge: bool,
    #[serde(default)]
    pub keep_intermediate: bool,
    #[serde(default)]
    pub rows_csv: Option<PathBuf>,
}

impl HighscoreSettings {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub rows_read: usize,
    pub entries_written: usize,
    /// Entries taken over unchanged from the existing score file.
    pub merged_from_existing: Option<usize>,
}

fn decode_source_archive(path: &Path, keep_intermediate: bool) -> Result<DecodedArchive> {
    let archive_path = locate_archive(path)?;
    let decoded = archive::read_archive(&archive_path)?;
    if keep_intermediate {
        archive::write_intermediates(&archive_path, &decoded)?;
    }
    Ok(decoded)
}

/// Decodes an archive and writes its scenario rows as CSV.
pub fn export_rows(
    archive_path: &Path,
    csv_out: &Path,
    keep_intermediate: bool,
) -> Result<Vec<ScenarioRecord>> {
    let decoded = decode_source_archive(archive_path, keep_intermediate)?;
    tabular::write_records_to_path(csv_out, &decoded.records)?;
    info!(
        "Wrote {} rows to {}",
        decoded.records.len(),
        csv_out.display()
    );
    Ok(decoded.records)
}

/// Builds (or merges into) a score file from the configured row source.
pub fn run(settings: &HighscoreSettings) -> Result<RunSummary> {
    let rows: Vec<ScoreRow> = match &settings.source {
        RowSource::Archive(path) => {
            let decoded = decode_source_archive(path, settings.keep_intermediate)?;
            if let Some(csv_out) = &settings.rows_csv {
                tabular::write_records_to_path(csv_out, &decoded.records)?;
            }
            decoded.records.iter().map(ScoreRow::from).collect()
        }
        RowSource::Csv(path) => {
            if settings.rows_csv.is_some() {
                return Err(ProgressError::Config(
                    "rows_csv is only available when reading an archive".to_string(),
                ));
            }
            info!("Reading rows: {}", path.display());
            tabular::read_rows_from_path(path)?
        }
    };

    let rows_read = rows.len();
    let best = best_from_rows(rows);

    let (table, merged_from_existing) = if settings.merge {
        let mut existing = highscores::load_score_file(&settings.output_path)?;
        let before = existing.len();
        let updated = merge_into(&mut existing, best);
        let added = existing.len() - before;
        info!(
            "Merged into {} existing entries ({} updated, {} added)",
            before,
            updated - added,
            added
        );
        let untouched = existing.len() - updated;
        (existing, Some(untouched))
    } else {
        (best, None)
    };

    highscores::save_score_file(&settings.output_path, &table)?;
    info!(
        "Wrote {} entries to {}",
        table.len(),
        settings.output_path.display()
    );

    Ok(RunSummary {
        output_path: settings.output_path.clone(),
        rows_read,
        entries_written: table.len(),
        merged_from_existing,
    })
}
