//! Read-only rendering of the result store.

use crate::results::ListingRecord;
use crate::store::{ResultStore, write_pretty};
use crate::utils::{single_line, truncate_chars};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Which records to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewFilter {
    Blacklisted,
    #[default]
    NotBlacklisted,
    Failed,
    All,
}

impl ViewFilter {
    /// Failed placeholders only show up under `Failed` and `All`
    pub fn accepts(&self, record: &ListingRecord) -> bool {
        match self {
            ViewFilter::Blacklisted => !record.failed && record.blacklisted,
            ViewFilter::NotBlacklisted => !record.failed && !record.blacklisted,
            ViewFilter::Failed => record.failed,
            ViewFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewFormat {
    #[default]
    Table,
    RawJson,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub filter: ViewFilter,
    pub format: ViewFormat,
    /// Add a column with the first image of each listing
    pub show_images: bool,
}

struct Column {
    header: &'static str,
    max_width: usize,
}

static COLUMNS: [Column; 7] = [
    Column { header: "title", max_width: 40 },
    Column { header: "blacklisted", max_width: 11 },
    Column { header: "price", max_width: 14 },
    Column { header: "url", max_width: 48 },
    Column { header: "location", max_width: 20 },
    Column { header: "description", max_width: 40 },
    Column { header: "upload_date", max_width: 20 },
];

static IMAGE_COLUMN: Column = Column {
    header: "images",
    max_width: 48,
};

/// Selected records, newest upload first; records without a date come last
pub fn select<'a>(store: &'a ResultStore, filter: ViewFilter) -> Vec<(&'a str, &'a ListingRecord)> {
    let mut rows: Vec<_> = store
        .iter()
        .filter(|(_, record)| filter.accepts(record))
        .map(|(id, record)| (id.as_str(), record))
        .collect();
    rows.sort_by_cached_key(|(_, record)| {
        std::cmp::Reverse(record.upload_date().unwrap_or_default())
    });
    rows
}

/// Render the store to `out` according to `options`
pub fn render<W: Write>(store: &ResultStore, options: &ViewOptions, mut out: W) -> io::Result<()> {
    let rows = select(store, options.filter);
    match options.format {
        ViewFormat::RawJson => {
            let selected: BTreeMap<&str, &ListingRecord> = rows.into_iter().collect();
            write_pretty(&mut out, &selected)?;
            writeln!(out)
        }
        ViewFormat::Table => render_table(&rows, options.show_images, out),
    }
}

fn render_table<W: Write>(
    rows: &[(&str, &ListingRecord)],
    show_images: bool,
    mut out: W,
) -> io::Result<()> {
    let mut columns: Vec<&Column> = COLUMNS.iter().collect();
    if show_images {
        columns.push(&IMAGE_COLUMN);
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|(_, record)| {
            let mut row = table_cells(record);
            if show_images {
                row.push(record.first_image().unwrap_or_default());
            }
            row.iter()
                .zip(&columns)
                .map(|(cell, column)| truncate_chars(cell, column.max_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns.iter().map(|c| c.header.to_string()).collect();
    write_row(&mut out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(&mut out, &rule, &widths)?;
    for row in &cells {
        write_row(&mut out, row, &widths)?;
    }
    writeln!(out, "{} listings", rows.len())
}

fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(out, "{}", line.trim_end())
}

fn table_cells(record: &ListingRecord) -> Vec<String> {
    vec![
        single_line(record.title()),
        if record.blacklisted { "yes" } else { "no" }.to_string(),
        record.price().map(|p| p.display()).unwrap_or_default(),
        record.url().unwrap_or_default().to_string(),
        single_line(record.city()),
        single_line(record.description()),
        record.upload_date().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(title: &str, date: Option<&str>, blacklisted: bool) -> ListingRecord {
        let mut data = json!({
            "title": format!("  {}  ", title),
            "description": "Zustand:\ngut",
            "price": {"amount": "120", "currency": "EUR"},
            "location": {"city": " München "},
            "images": ["https://img.example.org/a.jpg", "https://img.example.org/b.jpg"],
        });
        if let Some(date) = date {
            data["upload_date"] = json!(date);
        }
        let payload = match data {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut record = ListingRecord::from_detail(payload, &format!("https://example.org/{}", title));
        record.blacklisted = blacklisted;
        record
    }

    fn store() -> ResultStore {
        let mut store = ResultStore::new("results.json");
        store.insert("1", record("Herrenrad", Some("2025-01-10"), false));
        store.insert("2", record("Rennrad", Some("2025-03-01"), true));
        store.insert("3", record("Citybike", None, false));
        store.insert("4", record("Trekkingrad", Some("2025-02-15"), false));
        store.insert("5", ListingRecord::failed());
        store
    }

    fn ids(rows: &[(&str, &ListingRecord)]) -> Vec<String> {
        rows.iter().map(|(id, _)| id.to_string()).collect()
    }

    #[test]
    fn test_select_filters_and_orders_newest_first() {
        let store = store();
        assert_eq!(ids(&select(&store, ViewFilter::NotBlacklisted)), ["4", "1", "3"]);
        assert_eq!(ids(&select(&store, ViewFilter::Blacklisted)), ["2"]);
        assert_eq!(ids(&select(&store, ViewFilter::Failed)), ["5"]);
        assert_eq!(ids(&select(&store, ViewFilter::All)), ["2", "4", "1", "3", "5"]);
    }

    #[test]
    fn test_table_output() {
        let store = store();
        let mut out = Vec::new();
        let options = ViewOptions {
            filter: ViewFilter::Blacklisted,
            ..ViewOptions::default()
        };
        render(&store, &options, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("title   | blacklisted | price"));
        assert!(!lines[0].contains("images"));
        assert!(lines[2].starts_with("Rennrad | yes"));
        assert!(lines[2].contains("120 EUR"));
        assert!(lines[2].contains("München"));
        assert!(lines[2].contains("Zustand: gut"));
        assert_eq!(lines.last(), Some(&"1 listings"));
    }

    #[test]
    fn test_table_with_images_shows_first_image() {
        let store = store();
        let mut out = Vec::new();
        let options = ViewOptions {
            show_images: true,
            ..ViewOptions::default()
        };
        render(&store, &options, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.lines().next().unwrap().ends_with("images"));
        assert!(text.contains("https://img.example.org/a.jpg"));
        assert!(!text.contains("https://img.example.org/b.jpg"));
    }

    #[test]
    fn test_raw_json_output_is_filtered() {
        let store = store();
        let mut out = Vec::new();
        let options = ViewOptions {
            filter: ViewFilter::Failed,
            format: ViewFormat::RawJson,
            show_images: false,
        };
        render(&store, &options, &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, json!({"5": {"blacklisted": false, "failed": true}}));
    }

    #[test]
    fn test_empty_store_renders_header_only() {
        let store = ResultStore::new("results.json");
        let mut out = Vec::new();
        render(&store, &ViewOptions::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("0 listings\n"));
    }
}
