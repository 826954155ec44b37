use crate::config::KeywordSource;
use crate::domain::ports::{SpreadsheetStore, Storage};
use crate::utils::error::{PipelineError, Result};
use std::collections::HashSet;

/// Header names recognised for the keyword column of a CSV file.
const KEYWORD_HEADERS: [&str; 4] = ["keyword", "keywords", "kw", "term"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Trims, drops blanks and a leading `keyword` header cell, then removes exact
/// duplicates, keeping the position of the first occurrence. Case is
/// significant: `shoes` and `Shoes` are different keywords.
pub fn normalize_keywords<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    let mut first = true;

    for cell in cells {
        let keyword = cell.as_ref().trim();
        if keyword.is_empty() {
            continue;
        }
        if std::mem::take(&mut first) && keyword.eq_ignore_ascii_case("keyword") {
            continue;
        }
        if seen.insert(keyword.to_string()) {
            keywords.push(keyword.to_string());
        }
    }

    keywords
}

/// First cell of every non-empty row.
pub fn first_column(rows: &[Vec<String>]) -> impl Iterator<Item = &str> {
    rows.iter().filter_map(|row| row.first().map(String::as_str))
}

pub fn keyword_column_index(headers: &csv::StringRecord) -> Option<usize> {
    if headers.is_empty() {
        return None;
    }
    let named = headers.iter().position(|h| {
        let h = h.trim().to_ascii_lowercase();
        KEYWORD_HEADERS.contains(&h.as_str())
    });
    Some(named.unwrap_or(0))
}

pub fn keywords_from_csv(data: &[u8]) -> Result<Vec<String>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let column = keyword_column_index(&headers)
        .ok_or_else(|| PipelineError::config("Keyword CSV has no columns"))?;
    tracing::debug!(
        "Using CSV column '{}' for keywords",
        headers.get(column).unwrap_or_default()
    );

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(cell) = record.get(column) {
            cells.push(cell.to_string());
        }
    }

    Ok(normalize_keywords(cells))
}

/// The Keyword Source Reader.
pub struct KeywordReader<'a, S: Storage, W: SpreadsheetStore> {
    storage: &'a S,
    sheets: Option<&'a W>,
}

impl<'a, S: Storage, W: SpreadsheetStore> KeywordReader<'a, S, W> {
    pub fn new(storage: &'a S, sheets: Option<&'a W>) -> Self {
        Self { storage, sheets }
    }

    pub async fn read(&self, source: &KeywordSource) -> Result<Vec<String>> {
        let keywords = match source {
            KeywordSource::Sheet {
                spreadsheet_id,
                tab,
                range,
            } => {
                let sheets = self.sheets.ok_or_else(|| {
                    PipelineError::config("SHEET_ID is set but no spreadsheet client is available")
                })?;
                tracing::info!("📥 Reading keywords from spreadsheet {} ({})", spreadsheet_id, range);
                let rows = sheets
                    .read_range(spreadsheet_id, tab.as_deref(), range)
                    .await?;
                normalize_keywords(first_column(&rows))
            }
            KeywordSource::Csv { path } => {
                tracing::info!("📥 Reading keywords from {}", self.storage.display_path(path));
                let data = self.storage.read_file(path).await.map_err(|e| match e {
                    PipelineError::IoError(io) => PipelineError::config(format!(
                        "SHEET_ID is not set and keyword CSV {} cannot be read: {}",
                        path, io
                    )),
                    other => other,
                })?;
                keywords_from_csv(&data)?
            }
        };

        if keywords.is_empty() {
            return Err(PipelineError::EmptyKeywords);
        }
        tracing::info!("Loaded {} unique keywords", keywords.len());
        Ok(keywords)
    }
}
