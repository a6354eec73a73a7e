//! CSV row source (`filename,name,company_value,winner`) and the parsed
//! archive dump written by `export_rows`.

use log::debug;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::merge::{CompanyValue, ScoreRow};
use crate::table::ScenarioRecord;
use crate::Result;

/// Reads score rows from CSV with a header line. Columns are found by name;
/// unknown columns are ignored, and a column missing from the header or a
/// field missing from a short row reads as empty.
pub fn read_rows<R: Read>(mut reader: R) -> Result<Vec<ScoreRow>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let filename_col = column("filename");
    let value_col = column("company_value");
    let winner_col = column("winner");

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!("skipping CSV record {}: {}", i + 1, err);
                continue;
            }
        };
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c)).unwrap_or("").to_string()
        };
        rows.push(ScoreRow {
            filename: field(filename_col),
            winner: field(winner_col),
            company_value: CompanyValue::Text(field(value_col)),
        });
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<ScoreRow>> {
    read_rows(fs::File::open(path)?)
}

/// Writes parsed archive records with header
/// `index,filename,name,company_value,winner`.
pub fn write_records<W: Write>(writer: W, records: &[ScenarioRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: &Path, records: &[ScenarioRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_records(fs::File::create(path)?, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_columns_in_any_order() {
        let input = "winner,company_value,filename,name\nAnn,800000,SC0.SC4,Forest Frontiers\n";
        let rows = read_rows(input.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![ScoreRow {
                filename: "SC0.SC4".to_string(),
                winner: "Ann".to_string(),
                company_value: CompanyValue::Text("800000".to_string()),
            }]
        );
    }

    #[test]
    fn tolerates_bom_extra_and_missing_columns() {
        let input = "\u{feff}index,filename,company_value\n0,SC1.SC4,12.5\n1,SC2.SC4,\n";
        let rows = read_rows(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filename, "SC1.SC4");
        assert_eq!(rows[0].winner, "");
        assert_eq!(rows[0].company_value.to_money(), 12);
        assert_eq!(rows[1].company_value.to_money(), 0);
    }

    #[test]
    fn short_rows_read_as_empty_fields() {
        let input = "filename,name,company_value,winner\n\
                     SC1.SC4,X,5,Ann\n\
                     SC2.SC4\n\
                     SC3.SC4,Z,7,Cy\n\
                     SC4.SC4,W\n";
        let rows = read_rows(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].to_entry().unwrap().company_value, 5);
        assert_eq!(rows[1].filename, "SC2.SC4");
        assert_eq!(rows[1].winner, "");
        assert_eq!(rows[1].company_value.to_money(), 0);
        assert_eq!(rows[2].to_entry().unwrap().winner, "Cy");
        assert_eq!(rows[3].to_entry(), None);

        let best = crate::merge::best_from_rows(rows);
        assert_eq!(best.len(), 2);
        assert!(best.get("sc1.sc4").is_some());
        assert!(best.get("sc3.sc4").is_some());
    }

    #[test]
    fn writes_absent_values_as_empty_fields() {
        let records = vec![
            ScenarioRecord {
                index: 0,
                filename: "SC0.SC4".to_string(),
                scenario_name: "Forest Frontiers".to_string(),
                company_value: Some(-1),
                winner: "Ann".to_string(),
            },
            ScenarioRecord {
                index: 1,
                filename: "SC1.SC4".to_string(),
                scenario_name: String::new(),
                company_value: None,
                winner: String::new(),
            },
        ];
        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "index,filename,name,company_value,winner\n\
             0,SC0.SC4,Forest Frontiers,-1,Ann\n\
             1,SC1.SC4,,,\n"
        );
    }

    #[test]
    fn dumped_records_read_back_as_rows() {
        let records = vec![ScenarioRecord {
            index: 3,
            filename: "SC3.SC4".to_string(),
            scenario_name: "Dynamite Dunes".to_string(),
            company_value: Some(4200),
            winner: "Cy".to_string(),
        }];
        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();

        let rows = read_rows(out.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_entry(), ScoreRow::from(&records[0]).to_entry());
    }
}
