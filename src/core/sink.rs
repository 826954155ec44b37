use crate::config::{RunContext, SheetOutput};
use crate::domain::model::{MetricsRecord, TabState};
use crate::domain::ports::{SpreadsheetStore, Storage};
use crate::utils::error::{PipelineError, Result};
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};
use std::cmp::Ordering;

pub const OUTPUT_FILE: &str = "ads_keyword_metrics.csv";

pub const CSV_COLUMNS: [&str; 5] = [
    "keyword",
    "avg_monthly_searches",
    "competition",
    "low_top_of_page_bid_micros",
    "high_top_of_page_bid_micros",
];

pub const SHEET_HEADER: [&str; 12] = [
    "keyword",
    "country",
    "language",
    "avg_monthly_searches",
    "competition",
    "low_top_of_page_bid_micros",
    "high_top_of_page_bid_micros",
    "location_ids",
    "language_id",
    "date_yyyy",
    "date_mm",
    "date_dd",
];

const UTF8_BOM: &str = "\u{FEFF}";

/// Descending by monthly searches, records without a volume last. Ties keep
/// provider order.
pub fn sort_records(records: &mut [MetricsRecord]) {
    records.sort_by(|a, b| match (a.avg_monthly_searches, b.avg_monthly_searches) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// UTF-8 CSV with a BOM so spreadsheet tools detect the encoding. Missing
/// metrics are written as empty cells.
pub fn encode_csv(records: &[MetricsRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(CSV_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::IoError(e.into_error()))
}

pub fn sheet_rows(
    records: &[MetricsRecord],
    output: &SheetOutput,
    context: &RunContext,
    date: NaiveDate,
) -> Vec<Vec<Value>> {
    let location_ids = context
        .location_ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let language_id = context.language_id.to_string();

    records
        .iter()
        .map(|r| {
            vec![
                json!(r.keyword),
                json!(output.country),
                json!(output.language_tag),
                json!(r.avg_monthly_searches.unwrap_or(0)),
                json!(r.competition.as_str()),
                json!(r.low_top_of_page_bid_micros.unwrap_or(0)),
                json!(r.high_top_of_page_bid_micros.unwrap_or(0)),
                json!(location_ids),
                json!(language_id),
                json!(date.year()),
                json!(date.month()),
                json!(date.day()),
            ]
        })
        .collect()
}

/// The Sink Writer.
pub struct SinkWriter<'a, S: Storage, W: SpreadsheetStore> {
    storage: &'a S,
    sheets: Option<&'a W>,
    context: &'a RunContext,
}

impl<'a, S: Storage, W: SpreadsheetStore> SinkWriter<'a, S, W> {
    pub fn new(storage: &'a S, sheets: Option<&'a W>, context: &'a RunContext) -> Self {
        Self {
            storage,
            sheets,
            context,
        }
    }

    pub fn csv_path(&self) -> String {
        format!("{}/{}", self.context.output_dir.trim_end_matches('/'), OUTPUT_FILE)
    }

    /// Writes the sorted CSV, then appends the records in provider order to
    /// the spreadsheet tab when one is configured. Returns the CSV location.
    pub async fn write(&self, records: Vec<MetricsRecord>, date: NaiveDate) -> Result<String> {
        let mut sorted = records.clone();
        sort_records(&mut sorted);

        let path = self.csv_path();
        let data = encode_csv(&sorted)?;
        self.storage.write_file(&path, &data).await?;
        let location = self.storage.display_path(&path);
        tracing::info!("💾 Wrote {} ({} rows)", location, sorted.len());

        match &self.context.sheet_output {
            Some(output) => self.write_sheet(&records, output, date).await?,
            None => tracing::debug!("SHEET_ID not set, skipping spreadsheet output"),
        }

        Ok(location)
    }

    async fn write_sheet(
        &self,
        records: &[MetricsRecord],
        output: &SheetOutput,
        date: NaiveDate,
    ) -> Result<()> {
        let sheets = self.sheets.ok_or_else(|| {
            PipelineError::config("Spreadsheet output configured without a spreadsheet client")
        })?;
        let id = &output.spreadsheet_id;

        let needs_header = match sheets.ensure_tab(id, &output.tab).await? {
            TabState::Created => true,
            TabState::Existing => sheets.is_tab_empty(id, &output.tab).await?,
        };
        if needs_header {
            tracing::debug!("Writing header row to '{}'", output.tab);
            let header: Vec<Value> = SHEET_HEADER.iter().map(|h| json!(h)).collect();
            sheets.append_rows(id, &output.tab, vec![header]).await?;
        }

        let rows = sheet_rows(records, output, self.context, date);
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        sheets.append_rows(id, &output.tab, rows).await?;
        tracing::info!("📤 Appended {} rows to worksheet '{}'", count, output.tab);
        Ok(())
    }
}
