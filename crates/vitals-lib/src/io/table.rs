use crate::signal::{AlignedRow, AlignedTable};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::io::{Read, Write};

pub const TABLE_HEADER: [&str; 4] = ["timestamp", "oxygen_saturation", "sleep_stage", "heart_rate"];
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn render_value(value: Option<f64>, sentinel: f64) -> String {
    value.unwrap_or(sentinel).to_string()
}

/// Write the table as comma-separated text, rendering missing values as `sentinel`.
pub fn write_table_csv<W: Write>(writer: W, table: &AlignedTable, sentinel: f64) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(TABLE_HEADER)?;
    for row in &table.rows {
        writer.write_record([
            row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            render_value(row.oxygen_saturation, sentinel),
            render_value(row.sleep_stage, sentinel),
            render_value(row.heart_rate, sentinel),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn render_table_csv(table: &AlignedTable, sentinel: f64) -> Result<String> {
    let mut buf = Vec::new();
    write_table_csv(&mut buf, table, sentinel)?;
    String::from_utf8(buf).context("table output is not UTF-8")
}

/// Read a table written by [`write_table_csv`]; cells equal to `sentinel` become `None`.
///
/// A real value equal to the sentinel renders identically and so also reads
/// back as `None`. Pick a sentinel outside the signals' range, or use the JSON
/// output, when that matters.
pub fn read_table_csv<R: Read>(reader: R, sentinel: f64) -> Result<AlignedTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader.headers().context("reading header")?.clone();
    if headers.iter().ne(TABLE_HEADER.iter().copied()) {
        return Err(anyhow!(
            "unexpected table header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        ));
    }
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {}", idx + 1))?;
        let timestamp = record
            .get(0)
            .ok_or_else(|| anyhow!("missing timestamp in row {}", idx + 1))?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .with_context(|| format!("parsing timestamp {}", timestamp))?;
        let cell = |col: usize| -> Result<Option<f64>> {
            let text = record
                .get(col)
                .ok_or_else(|| anyhow!("missing column {} in row {}", col, idx + 1))?;
            let value: f64 = text
                .parse()
                .with_context(|| format!("row {} column {} is not f64: {}", idx + 1, col, text))?;
            Ok((value != sentinel).then_some(value))
        };
        rows.push(AlignedRow {
            timestamp,
            oxygen_saturation: cell(1)?,
            sleep_stage: cell(2)?,
            heart_rate: cell(3)?,
        });
    }
    Ok(AlignedTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> AlignedTable {
        let t0 = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        AlignedTable {
            rows: vec![
                AlignedRow {
                    timestamp: t0,
                    oxygen_saturation: Some(97.0),
                    sleep_stage: None,
                    heart_rate: Some(62.375),
                },
                AlignedRow {
                    timestamp: t0 + chrono::Duration::minutes(1),
                    oxygen_saturation: None,
                    sleep_stage: Some(2.0),
                    heart_rate: None,
                },
            ],
        }
    }

    #[test]
    fn renders_sentinel_for_missing_cells() {
        let text = render_table_csv(&table(), -1.0).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,oxygen_saturation,sleep_stage,heart_rate");
        assert_eq!(lines[1], "2024-03-20 00:00:00,97,-1,62.375");
        assert_eq!(lines[2], "2024-03-20 00:01:00,-1,2,-1");
    }

    #[test]
    fn reads_back_rendered_table() {
        let text = render_table_csv(&table(), -1.0).unwrap();
        let parsed = read_table_csv(text.as_bytes(), -1.0).unwrap();
        assert_eq!(parsed, table());
    }

    #[test]
    fn value_equal_to_sentinel_reads_as_missing() {
        let mut table = table();
        table.rows[0].heart_rate = Some(-1.0);
        let text = render_table_csv(&table, -1.0).unwrap();
        let parsed = read_table_csv(text.as_bytes(), -1.0).unwrap();
        assert_eq!(parsed.rows[0].heart_rate, None);

        let text = render_table_csv(&table, -999.0).unwrap();
        let parsed = read_table_csv(text.as_bytes(), -999.0).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn rejects_foreign_header() {
        let err = read_table_csv("datetime,spo2,sleep,heart_rate\n".as_bytes(), -1.0).unwrap_err();
        assert!(err.to_string().contains("unexpected table header"));
    }

    #[test]
    fn empty_table_is_header_only() {
        let text = render_table_csv(&AlignedTable::default(), -1.0).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
