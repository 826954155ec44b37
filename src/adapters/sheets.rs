use crate::adapters::google_auth::TokenProvider;
use crate::domain::model::TabState;
use crate::domain::ports::SpreadsheetStore;
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn quoted_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// A1 notation for `range` on `tab`, quoting the tab name.
pub fn a1_range(tab: &str, range: &str) -> String {
    format!("{}!{}", quoted_tab(tab), range)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets v4 REST client.
pub struct SheetsClient {
    client: Client,
    auth: Box<dyn TokenProvider>,
    base_url: Url,
}

impl SheetsClient {
    pub fn new(client: Client, base_url: &str, auth: Box<dyn TokenProvider>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| PipelineError::InvalidConfigValueError {
            field: "SHEETS_API_BASE".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            auth,
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::config("SHEETS_API_BASE cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.auth.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(PipelineError::SpreadsheetError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let mut url = self.url(&["spreadsheets", spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let meta: SpreadsheetMeta = self.send(self.client.get(url)).await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        let url = self.url(&["spreadsheets", spreadsheet_id, "values", range])?;
        let body: ValueRange = self.send(self.client.get(url)).await?;
        Ok(body.values)
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let url = self.url(&["spreadsheets", &format!("{}:batchUpdate", spreadsheet_id)])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {"rowCount": 1000, "columnCount": 12}
                    }
                }
            }]
        });
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetStore for SheetsClient {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        tab: Option<&str>,
        range: &str,
    ) -> Result<Vec<Vec<String>>> {
        let titles = self.sheet_titles(spreadsheet_id).await?;
        let tab = match tab {
            Some(tab) if titles.iter().any(|t| t == tab) => tab.to_string(),
            Some(tab) => {
                return Err(PipelineError::SpreadsheetError {
                    status: 404,
                    message: format!("Worksheet '{}' not found", tab),
                })
            }
            None => titles
                .into_iter()
                .next()
                .ok_or_else(|| PipelineError::SpreadsheetError {
                    status: 404,
                    message: "Spreadsheet has no worksheets".to_string(),
                })?,
        };

        tracing::debug!("Reading keywords from '{}'!{}", tab, range);
        let rows = self
            .get_values(spreadsheet_id, &a1_range(&tab, range))
            .await?;
        Ok(rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn ensure_tab(&self, spreadsheet_id: &str, tab: &str) -> Result<TabState> {
        let titles = self.sheet_titles(spreadsheet_id).await?;
        if titles.iter().any(|t| t == tab) {
            return Ok(TabState::Existing);
        }

        tracing::info!("Creating worksheet '{}'", tab);
        self.add_sheet(spreadsheet_id, tab).await?;
        Ok(TabState::Created)
    }

    async fn is_tab_empty(&self, spreadsheet_id: &str, tab: &str) -> Result<bool> {
        // a bare tab name selects every populated cell of the tab
        let rows = self.get_values(spreadsheet_id, &quoted_tab(tab)).await?;
        Ok(rows
            .iter()
            .all(|row| row.iter().all(|cell| cell_text(cell).trim().is_empty())))
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<()> {
        let range = format!("{}:append", a1_range(tab, "A1"));
        let mut url = self.url(&["spreadsheets", spreadsheet_id, "values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let row_count = rows.len();
        let body = json!({"majorDimension": "ROWS", "values": rows});
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        tracing::debug!("Appended {} rows to '{}'", row_count, tab);
        Ok(())
    }
}
