use crate::domain::model::{IdeaRequest, KeywordIdea, MetricsRecord, TabState};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human readable location of `path`, for logs and the run summary.
    fn display_path(&self, path: &str) -> String;
}

/// The Ads Metrics Provider.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn generate_keyword_ideas(&self, request: &IdeaRequest) -> Result<Vec<KeywordIdea>>;
}

/// The Spreadsheet Store.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Rows of `range` on `tab`, or on the first tab when `tab` is `None`.
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        tab: Option<&str>,
        range: &str,
    ) -> Result<Vec<Vec<String>>>;

    async fn ensure_tab(&self, spreadsheet_id: &str, tab: &str) -> Result<TabState>;

    async fn is_tab_empty(&self, spreadsheet_id: &str, tab: &str) -> Result<bool>;

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<serde_json::Value>>,
    ) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, keywords: Vec<String>) -> Result<Vec<MetricsRecord>>;
    async fn load(&self, records: Vec<MetricsRecord>) -> Result<String>;
}
