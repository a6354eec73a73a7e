//! `CSS0.DAT` scenario progress archives.
//!
//! An archive is `[run-length body][u32 LE checksum]`. The body expands to a
//! word-encrypted buffer holding the scenario tables.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::checksum;
use crate::crypt;
use crate::rle;
use crate::table::{self, ScenarioRecord};
use crate::{ProgressError, Result};

pub const ARCHIVE_FILE_NAME: &str = "CSS0.DAT";
const CHECKSUM_LEN: usize = 4;

/// Buffers and records produced by decoding one archive.
#[derive(Debug, Clone)]
pub struct DecodedArchive {
    pub checksum: u32,
    pub decompressed: Vec<u8>,
    pub decrypted: Vec<u8>,
    /// Offset of the run that ran off the end of the body, if any.
    pub truncated_at: Option<usize>,
    pub records: Vec<ScenarioRecord>,
}

/// Splits `raw` into body and trailing checksum.
pub fn split_checksum(raw: &[u8]) -> Result<(&[u8], u32)> {
    if raw.len() < CHECKSUM_LEN {
        return Err(ProgressError::ArchiveTooShort { len: raw.len() });
    }
    let (body, tail) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    Ok((body, expected))
}

/// Verifies, expands, decrypts and parses an archive.
///
/// A short input or checksum mismatch stops here with an error; a damaged
/// run-length stream is decoded as far as it goes.
pub fn decode_archive(raw: &[u8]) -> Result<DecodedArchive> {
    let (body, expected) = split_checksum(raw)?;

    let (valid, calculated) = checksum::verify(body, expected);
    if !valid {
        return Err(ProgressError::ChecksumMismatch {
            expected,
            calculated,
        });
    }
    debug!("checksum valid: {}", expected);

    let rle::Decompressed { data: decompressed, truncated_at } = rle::decompress_report(body);
    if let Some(offset) = truncated_at {
        debug!(
            "run-length stream truncated at body offset 0x{:X}, keeping {} bytes",
            offset,
            decompressed.len()
        );
    }

    let decrypted = crypt::decrypt(&decompressed);
    let records = table::parse_records(&decrypted);
    debug!(
        "decoded {} compressed bytes into {} bytes, {} scenario rows",
        body.len(),
        decrypted.len(),
        records.len()
    );

    Ok(DecodedArchive {
        checksum: expected,
        decompressed,
        decrypted,
        truncated_at,
        records,
    })
}

/// Builds an archive whose decrypted payload is `plain`.
pub fn build_archive(plain: &[u8]) -> Vec<u8> {
    let mut out = rle::compress(&crypt::encrypt(plain));
    let sum = checksum::checksum(&out);
    out.extend_from_slice(&sum.to_le_bytes());
    out
}

pub fn read_archive(path: &Path) -> Result<DecodedArchive> {
    info!("Reading archive: {}", path.display());
    let raw = fs::read(path)?;
    decode_archive(&raw)
}

/// Writes the intermediate buffers next to `archive_path` as
/// `<stem>.decompressed.raw.bin` and `<stem>.decrypted.bin`.
pub fn write_intermediates(archive_path: &Path, decoded: &DecodedArchive) -> Result<Vec<PathBuf>> {
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());

    let outputs = [
        (format!("{}.decompressed.raw.bin", stem), &decoded.decompressed),
        (format!("{}.decrypted.bin", stem), &decoded.decrypted),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, data) in outputs {
        let path = archive_path.with_file_name(name);
        fs::write(&path, data)?;
        info!("Wrote {} ({} bytes)", path.display(), data.len());
        written.push(path);
    }
    Ok(written)
}

/// Resolves `path` to an archive: a file is returned as-is, a directory is
/// searched for `CSS0.DAT` (any case).
pub fn locate_archive(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        return Err(ProgressError::Config(format!(
            "Input path does not exist: {}",
            path.display()
        )));
    }

    WalkDir::new(path)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .eq_ignore_ascii_case(ARCHIVE_FILE_NAME)
        })
        .map(|entry| entry.into_path())
        .ok_or_else(|| {
            ProgressError::Config(format!(
                "Could not find {} under {}",
                ARCHIVE_FILE_NAME,
                path.display()
            ))
        })
}
