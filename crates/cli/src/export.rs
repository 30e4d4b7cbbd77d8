//! Export — CSV and JSON serialization of parsed events.

use std::io::Write;

use anyhow::Result;
use engine::{FieldKind, GcEvent};

const CSV_COLUMNS: &[(&str, FieldKind)] = &[
    ("young_before", FieldKind::YoungBefore),
    ("young_after", FieldKind::YoungAfter),
    ("young_capacity", FieldKind::YoungCapacity),
    ("tenured_before", FieldKind::TenuredBefore),
    ("tenured_after", FieldKind::TenuredAfter),
    ("tenured_capacity", FieldKind::TenuredCapacity),
    ("tenured_used", FieldKind::TenuredUsed),
    ("perm_before", FieldKind::PermBefore),
    ("perm_after", FieldKind::PermAfter),
    ("perm_capacity", FieldKind::PermCapacity),
    ("heap_before", FieldKind::HeapBefore),
    ("heap_after", FieldKind::HeapAfter),
    ("heap_capacity", FieldKind::HeapCapacity),
    ("heap_used", FieldKind::HeapUsed),
];

/// Write one CSV row per event. Memory columns are bytes; cells the event
/// cannot produce stay empty.
pub fn write_csv(out: &mut dyn Write, events: &[GcEvent]) -> Result<()> {
    write!(out, "line,type,timestamp,time_ms,duration_ms")?;
    for (name, _) in CSV_COLUMNS {
        write!(out, ",{name}")?;
    }
    writeln!(out)?;

    for event in events {
        write!(
            out,
            "{},{},{},{},{}",
            event.line(),
            event.collection_type().as_str(),
            quote(event.offset_literal().unwrap_or_default()),
            event
                .time_ms()
                .map(|ms| ms.to_string())
                .unwrap_or_default(),
            event.duration_ms(),
        )?;
        for (_, kind) in CSV_COLUMNS {
            match event.field(*kind) {
                Some(value) => write!(out, ",{value}")?,
                None => write!(out, ",")?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

pub fn write_json(out: &mut dyn Write, events: &[GcEvent]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, events)?;
    writeln!(out)?;
    Ok(())
}

/// Quote a CSV cell when it carries a delimiter (combined timestamp
/// literals contain a space; nothing else here should need it).
fn quote(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains(' ') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{scan_reader, ScanOptions};
    use std::io::Cursor;

    fn sample_events() -> Vec<GcEvent> {
        let input = "4.751: [GC [PSYoungGen: 660640K->72890K(1835008K)] \
                     660640K->72890K(6029312K), 0.0515050 secs]";
        scan_reader(
            Cursor::new(input.to_string()),
            ScanOptions {
                time_origin: Some(1000),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_csv_row_shape() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &sample_events()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("line,type,timestamp,time_ms,duration_ms"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("1,new_generation,4.751,5751,52"));
        assert!(row.contains(&format!(",{}", 660_640 * 1024)));
    }

    #[test]
    fn test_json_is_tagged() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &sample_events()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["type"], "new_generation");
    }

    #[test]
    fn test_quote_only_when_needed() {
        assert_eq!(quote("4.751"), "4.751");
        assert_eq!(
            quote("2013-05-16T23:05:18.903+0800 34.907"),
            "\"2013-05-16T23:05:18.903+0800 34.907\""
        );
    }
}
