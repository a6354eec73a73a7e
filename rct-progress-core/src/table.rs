use serde::Serialize;

/// One fixed-stride table inside the decrypted progress buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub offset: usize,
    pub entry_size: usize,
    pub max_entries: usize,
}

pub const SCENARIO_SLOTS: usize = 128;

pub const FILENAME_TABLE: TableLayout = TableLayout {
    offset: 0x0000,
    entry_size: 16,
    max_entries: SCENARIO_SLOTS,
};

pub const SCENARIO_NAME_TABLE: TableLayout = TableLayout {
    offset: 0x0800,
    entry_size: 64,
    max_entries: SCENARIO_SLOTS,
};

pub const COMPANY_VALUE_TABLE: TableLayout = TableLayout {
    offset: 0x2800,
    entry_size: 4,
    max_entries: SCENARIO_SLOTS,
};

pub const WINNER_TABLE: TableLayout = TableLayout {
    offset: 0x2A00,
    entry_size: 32,
    max_entries: SCENARIO_SLOTS,
};

impl TableLayout {
    /// Number of complete entries available in a buffer of `len` bytes.
    pub fn count(&self, len: usize) -> usize {
        if len <= self.offset {
            return 0;
        }
        ((len - self.offset) / self.entry_size).min(self.max_entries)
    }

    fn entries(self, buf: &[u8]) -> std::slice::ChunksExact<'_, u8> {
        let count = self.count(buf.len());
        let end = self.offset + count * self.entry_size;
        buf.get(self.offset..end)
            .unwrap_or(&[])
            .chunks_exact(self.entry_size)
    }
}

/// A parsed scenario slot. Fields from a table that was cut short are empty
/// (text) or `None` (company value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioRecord {
    pub index: usize,
    pub filename: String,
    #[serde(rename = "name")]
    pub scenario_name: String,
    pub company_value: Option<i32>,
    pub winner: String,
}

/// Decodes a NUL-terminated fixed-width field one byte per character
/// (ISO-8859-1), so arbitrary archive bytes always produce text.
pub(crate) fn read_fixed_str(block: &[u8]) -> String {
    block
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn read_strings(buf: &[u8], layout: TableLayout) -> Vec<String> {
    layout.entries(buf).map(read_fixed_str).collect()
}

fn read_i32s(buf: &[u8], layout: TableLayout) -> Vec<i32> {
    layout
        .entries(buf)
        .map(|e| i32::from_le_bytes([e[0], e[1], e[2], e[3]]))
        .collect()
}

fn column(col: &[String], index: usize) -> String {
    col.get(index).cloned().unwrap_or_default()
}

/// Extracts every scenario slot from a decrypted progress buffer.
///
/// The row count is the longest of the four tables; a buffer too short for
/// some table leaves that column empty for the remaining rows.
pub fn parse_records(buf: &[u8]) -> Vec<ScenarioRecord> {
    let filenames = read_strings(buf, FILENAME_TABLE);
    let names = read_strings(buf, SCENARIO_NAME_TABLE);
    let values = read_i32s(buf, COMPANY_VALUE_TABLE);
    let winners = read_strings(buf, WINNER_TABLE);

    let rows = filenames
        .len()
        .max(names.len())
        .max(values.len())
        .max(winners.len());

    (0..rows)
        .map(|index| ScenarioRecord {
            index,
            filename: column(&filenames, index),
            scenario_name: column(&names, index),
            company_value: values.get(index).copied(),
            winner: column(&winners, index),
        })
        .collect()
}

/// Size of a buffer holding every table in full.
pub fn full_layout_len() -> usize {
    WINNER_TABLE.offset + WINNER_TABLE.entry_size * WINNER_TABLE.max_entries
}
