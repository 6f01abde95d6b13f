use crate::models::ListingRecord;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Fixed column order of the tabular output
pub const CSV_COLUMNS: &[&str] = &[
    "id",
    "date",
    "location",
    "city",
    "rent",
    "bhk",
    "additional_details",
    "latitude",
    "longitude",
    "distance_from_office_km",
    "driving_duration",
    "source",
    "page_url",
    "original_message",
];

/// Where new records land in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Append-only collection of listing records for one run
#[derive(Debug, Default)]
pub struct ResultStore {
    records: Vec<ListingRecord>,
    order: InsertOrder,
}

impl ResultStore {
    pub fn new(order: InsertOrder) -> Self {
        Self {
            records: Vec::new(),
            order,
        }
    }

    /// Add a record, giving it a fresh id when it has none
    pub fn append(&mut self, mut record: ListingRecord) -> &ListingRecord {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        match self.order {
            InsertOrder::OldestFirst => {
                self.records.push(record);
                &self.records[self.records.len() - 1]
            }
            InsertOrder::NewestFirst => {
                self.records.insert(0, record);
                &self.records[0]
            }
        }
    }

    pub fn list(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn serialize(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(&self.records)
                .context("Failed to serialize listings to JSON"),
            OutputFormat::Csv => Ok(to_csv(&self.records)),
        }
    }

    /// Write `<stem>.json` and `<stem>.csv` under `dir`
    pub async fn save(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let mut written = Vec::new();
        for format in [OutputFormat::Json, OutputFormat::Csv] {
            let path = dir.join(format!("{}.{}", stem, format.extension()));
            let contents = self.serialize(format)?;
            tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("💾 Saved {} listings to {}", self.records.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn to_csv(records: &[ListingRecord]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');

    for record in records {
        let cells = [
            text_cell(Some(record.id.as_str())),
            text_cell(Some(record.date.to_rfc3339().as_str())),
            text_cell(record.location.as_deref()),
            text_cell(record.city.as_deref()),
            number_cell(record.rent),
            text_cell(record.bhk.as_deref()),
            text_cell(record.additional_details.as_deref()),
            number_cell(record.latitude),
            number_cell(record.longitude),
            number_cell(record.distance_from_office_km),
            text_cell(record.driving_duration.as_deref()),
            text_cell(Some(record.source.as_str())),
            text_cell(Some(record.page_url.as_str())),
            text_cell(Some(record.original_message.as_str())),
        ];
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    out
}

fn text_cell(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("\"{}\"", single_line(value).replace('"', "\"\"")),
        None => String::new(),
    }
}

/// One physical line per record: line breaks inside a value become spaces
fn single_line(value: &str) -> Cow<'_, str> {
    if !value.contains(['\r', '\n']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn number_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
