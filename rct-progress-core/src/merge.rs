use log::debug;

use crate::highscores::{ScoreEntry, ScoreTable, UNKNOWN_TIMESTAMP};
use crate::table::ScenarioRecord;

/// A company value as it arrives from a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyValue {
    Missing,
    Amount(i64),
    /// Unparsed text from a tabular source.
    Text(String),
}

impl CompanyValue {
    /// Internal currency units for this value. Text is read as a real
    /// number and truncated; anything non-numeric counts as 0.
    pub fn to_money(&self) -> i64 {
        match self {
            CompanyValue::Missing => 0,
            CompanyValue::Amount(v) => *v,
            CompanyValue::Text(s) => parse_money(s),
        }
    }
}

fn parse_money(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => {
            debug!("company value {:?} is not numeric, using 0", s);
            0
        }
    }
}

/// One candidate score, from an archive record or a tabular row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub filename: String,
    pub winner: String,
    pub company_value: CompanyValue,
}

impl From<&ScenarioRecord> for ScoreRow {
    fn from(record: &ScenarioRecord) -> Self {
        ScoreRow {
            filename: record.filename.clone(),
            winner: record.winner.clone(),
            company_value: match record.company_value {
                Some(v) => CompanyValue::Amount(i64::from(v)),
                None => CompanyValue::Missing,
            },
        }
    }
}

/// Final path component, accepting either separator.
fn file_name_only(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("")
}

impl ScoreRow {
    /// Normalised entry for this row, or `None` when the filename or winner
    /// is blank.
    pub fn to_entry(&self) -> Option<ScoreEntry> {
        let filename = file_name_only(self.filename.trim()).trim();
        let winner = self.winner.trim();
        if filename.is_empty() || winner.is_empty() {
            return None;
        }
        Some(ScoreEntry {
            filename: filename.to_string(),
            winner: winner.to_string(),
            company_value: self.company_value.to_money(),
            timestamp: UNKNOWN_TIMESTAMP,
        })
    }
}

/// Reduces rows to the best entry per lowercased filename.
///
/// Among duplicates the strictly larger company value wins, so the first of
/// several equal rows is kept.
pub fn best_from_rows<I>(rows: I) -> ScoreTable
where
    I: IntoIterator<Item = ScoreRow>,
{
    let mut best = ScoreTable::new();
    let mut skipped = 0usize;
    for row in rows {
        match row.to_entry() {
            Some(entry) => {
                best.insert_if_higher(entry);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {} rows without a filename or winner", skipped);
    }
    best
}

/// Folds `newer` into `existing`, keeping the higher value per filename.
/// Entries only in `existing` are left untouched.
pub fn merge_into(existing: &mut ScoreTable, newer: ScoreTable) -> usize {
    let mut updated = 0usize;
    for entry in newer.into_entries() {
        if existing.insert_if_higher(entry) {
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn row(filename: &str, winner: &str, value: CompanyValue) -> ScoreRow {
        ScoreRow {
            filename: filename.to_string(),
            winner: winner.to_string(),
            company_value: value,
        }
    }

    fn text(s: &str) -> CompanyValue {
        CompanyValue::Text(s.to_string())
    }

    #[test]
    fn text_values_are_truncated_reals() {
        assert_eq!(text("80000").to_money(), 80000);
        assert_eq!(text(" 1234.9 ").to_money(), 1234);
        assert_eq!(text("-7.8").to_money(), -7);
        assert_eq!(text("1e3").to_money(), 1000);
        assert_eq!(text("").to_money(), 0);
        assert_eq!(text("n/a").to_money(), 0);
        assert_eq!(text("inf").to_money(), 0);
        assert_eq!(CompanyValue::Missing.to_money(), 0);
        assert_eq!(CompanyValue::Amount(-3).to_money(), -3);
    }

    #[test]
    fn blank_filename_or_winner_is_dropped() {
        let rows = vec![
            row("SC0.SC4", "  ", CompanyValue::Amount(1)),
            row("   ", "Ann", CompanyValue::Amount(1)),
            row("", "", CompanyValue::Missing),
            row("SC1.SC4", " Ann ", CompanyValue::Amount(5)),
        ];
        let best = best_from_rows(rows);
        assert_eq!(best.len(), 1);
        let e = best.get("sc1.sc4").unwrap();
        assert_eq!(e.winner, "Ann");
        assert_eq!(e.timestamp, UNKNOWN_TIMESTAMP);
    }

    #[test]
    fn filenames_are_reduced_to_their_last_component() {
        assert_eq!(file_name_only("C:\\RCT\\Scenarios\\SC3.SC4"), "SC3.SC4");
        assert_eq!(file_name_only("data/sc3.sc4"), "sc3.sc4");
        assert_eq!(file_name_only("dir/"), "dir");
        assert_eq!(file_name_only("SC3.SC4"), "SC3.SC4");

        let best = best_from_rows(vec![row(" /x/y/SC9.SC4 ", "W", CompanyValue::Amount(9))]);
        assert_eq!(best.get("sc9.sc4").unwrap().filename, "SC9.SC4");
    }

    #[test]
    fn case_variants_collapse_to_the_higher_value() {
        let rows = vec![
            row("SC1.SC4", "Low", CompanyValue::Amount(100)),
            row("sc1.sc4", "High", CompanyValue::Amount(200)),
        ];
        let best = best_from_rows(rows);
        assert_eq!(best.len(), 1);

        let e = best.get("SC1.SC4").unwrap();
        assert_eq!(e.company_value, 200);
        assert_eq!(e.filename, "sc1.sc4");
        assert_eq!(e.winner, "High");
    }

    #[test]
    fn equal_duplicates_keep_the_first() {
        let rows = vec![
            row("SC2.SC4", "First", text("50")),
            row("sc2.SC4", "Second", text("50.5")),
        ];
        let e = best_from_rows(rows).get("sc2.sc4").cloned().unwrap();
        assert_eq!(e.winner, "First");
    }

    #[test]
    fn merge_keeps_existing_only_keys_and_higher_values() {
        let mut existing = best_from_rows(vec![
            row("SC1.SC4", "Old", CompanyValue::Amount(500)),
            row("SC2.SC4", "Old", CompanyValue::Amount(10)),
            row("SC3.SC4", "Kept", CompanyValue::Amount(1)),
        ]);
        let newer = best_from_rows(vec![
            row("sc1.sc4", "New", CompanyValue::Amount(400)),
            row("sc2.sc4", "New", CompanyValue::Amount(20)),
            row("SC4.SC4", "New", CompanyValue::Amount(0)),
        ]);

        let updated = merge_into(&mut existing, newer);
        assert_eq!(updated, 2);
        assert_eq!(existing.len(), 4);
        assert_eq!(existing.get("sc1.sc4").unwrap().winner, "Old");
        assert_eq!(existing.get("sc2.sc4").unwrap().company_value, 20);
        assert_eq!(existing.get("sc3.sc4").unwrap().winner, "Kept");
        assert_eq!(existing.get("sc4.sc4").unwrap().winner, "New");
    }

    #[test]
    fn merging_a_table_into_itself_changes_nothing() {
        let table = best_from_rows(vec![
            row("SC1.SC4", "A", CompanyValue::Amount(1)),
            row("SC2.SC4", "B", CompanyValue::Amount(-1)),
        ]);
        let mut merged = table.clone();
        assert_eq!(merge_into(&mut merged, table.clone()), 0);
        assert_eq!(merged, table);
        assert_eq!(merged.to_bytes().unwrap(), table.to_bytes().unwrap());
    }

    #[test]
    fn merged_values_never_regress() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..100 {
            let random_table = |rng: &mut StdRng| {
                let rows: Vec<ScoreRow> = (0..20)
                    .map(|_| {
                        let name = format!("SC{}.SC4", rng.gen_range(0..10));
                        let name = if rng.gen() { name.to_lowercase() } else { name };
                        row(&name, "w", CompanyValue::Amount(rng.gen_range(-1000..1000)))
                    })
                    .collect();
                best_from_rows(rows)
            };
            let before = random_table(&mut rng);
            let newer = random_table(&mut rng);

            let mut merged = before.clone();
            merge_into(&mut merged, newer.clone());

            for e in before.iter().chain(newer.iter()) {
                assert!(merged.get(&e.filename).unwrap().company_value >= e.company_value);
            }
            assert!(merged.len() >= before.len());
        }
    }
}
