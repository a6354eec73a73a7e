//! Reader and writer for OpenRCT2 `highscores.dat` (score file v2).
//!
//! ```text
//! u32 version = 2
//! u32 count
//! count x { cstring filename, cstring winner, i64 company_value, i64 timestamp }
//! ```
//!
//! All integers are little-endian. Strings are raw UTF-8 followed by a single
//! NUL, with no length prefix.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::{ProgressError, Result};

pub const SCORE_FILE_VERSION: u32 = 2;

/// Timestamp written for entries whose completion time is unknown.
pub const UNKNOWN_TIMESTAMP: i64 = i64::MIN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub filename: String,
    pub winner: String,
    /// Internal currency units (display value x 10).
    pub company_value: i64,
    pub timestamp: i64,
}

impl ScoreEntry {
    /// Lowercased filename; at most one entry per key is kept in a table.
    pub fn key(&self) -> String {
        self.filename.to_lowercase()
    }
}

/// Score entries keyed by lowercased filename. Iteration is in key order,
/// which is also the order entries are written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    entries: BTreeMap<String, ScoreEntry>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&ScoreEntry> {
        self.entries.get(&filename.to_lowercase())
    }

    /// Inserts `entry`, replacing and returning any entry with the same key.
    pub fn insert(&mut self, entry: ScoreEntry) -> Option<ScoreEntry> {
        self.entries.insert(entry.key(), entry)
    }

    /// Inserts `entry` if its key is new or its value beats the current
    /// entry's. Returns whether the table changed.
    pub fn insert_if_higher(&mut self, entry: ScoreEntry) -> bool {
        match self.entries.get(&entry.key()) {
            Some(current) if entry.company_value <= current.company_value => false,
            _ => {
                self.insert(entry);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> Vec<ScoreEntry> {
        self.entries.into_values().collect()
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let entries: Vec<&ScoreEntry> = self.iter().collect();
        encode_entries(&entries)
    }
}

impl FromIterator<ScoreEntry> for ScoreTable {
    /// Later entries replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = ScoreEntry>>(iter: I) -> Self {
        let mut table = ScoreTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// A score file as stored on disk, entries in file order. The header's
/// entry count is not kept separately; it is always `entries.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreFile {
    pub version: u32,
    pub entries: Vec<ScoreEntry>,
}

impl ScoreFile {
    pub fn parse(mut raw: &[u8]) -> Result<Self> {
        read_score_file(&mut raw)
    }

    pub fn into_table(self) -> ScoreTable {
        self.entries.into_iter().collect()
    }
}

fn truncated(context: String) -> impl FnOnce(io::Error) -> ProgressError {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProgressError::TruncatedScoreFile { context }
        } else {
            ProgressError::Io(err)
        }
    }
}

fn read_cstring<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.read_until(0, &mut buf)?;
    // End of input before the terminator yields what was read.
    if buf.last() == Some(&0) {
        buf.pop();
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn read_score_file<R: BufRead>(reader: &mut R) -> Result<ScoreFile> {
    let version = reader
        .read_u32::<LittleEndian>()
        .map_err(truncated("header version".to_string()))?;
    let count = reader
        .read_u32::<LittleEndian>()
        .map_err(truncated("header entry count".to_string()))?;

    if version != SCORE_FILE_VERSION {
        debug!(
            "score file version {} (expected {}), reading anyway",
            version, SCORE_FILE_VERSION
        );
    }

    // The count is untrusted; don't preallocate from it.
    let mut entries = Vec::new();
    for i in 0..count {
        let filename = read_cstring(reader)?;
        let winner = read_cstring(reader)?;
        let company_value = reader
            .read_i64::<LittleEndian>()
            .map_err(truncated(format!("company value of entry {} of {}", i, count)))?;
        let timestamp = reader
            .read_i64::<LittleEndian>()
            .map_err(truncated(format!("timestamp of entry {} of {}", i, count)))?;

        entries.push(ScoreEntry {
            filename,
            winner,
            company_value,
            timestamp,
        });
    }

    Ok(ScoreFile { version, entries })
}

fn write_cstring<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    // An interior NUL would end the string early for any reader.
    let bytes = s.as_bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    writer.write_all(&bytes[..end])?;
    writer.write_u8(0)
}

/// Writes `entries` as a v2 score file, ordered by lowercased filename.
pub fn write_score_file<W: Write>(writer: &mut W, entries: &[&ScoreEntry]) -> io::Result<()> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_cached_key(|e| e.key());

    let count = u32::try_from(sorted.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many score entries")
    })?;

    writer.write_u32::<LittleEndian>(SCORE_FILE_VERSION)?;
    writer.write_u32::<LittleEndian>(count)?;
    for entry in sorted {
        write_cstring(writer, &entry.filename)?;
        write_cstring(writer, &entry.winner)?;
        writer.write_i64::<LittleEndian>(entry.company_value)?;
        writer.write_i64::<LittleEndian>(entry.timestamp)?;
    }
    Ok(())
}

pub fn encode_entries(entries: &[&ScoreEntry]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_score_file(&mut out, entries)?;
    Ok(out)
}

/// Loads a score file as a table. A missing file is an empty table.
pub fn load_score_file(path: &Path) -> Result<ScoreTable> {
    if !path.exists() {
        debug!("{} does not exist, starting from an empty table", path.display());
        return Ok(ScoreTable::new());
    }
    let raw = fs::read(path)?;
    Ok(ScoreFile::parse(&raw)?.into_table())
}

pub fn save_score_file(path: &Path, table: &ScoreTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, table.to_bytes()?)?;
    Ok(())
}
