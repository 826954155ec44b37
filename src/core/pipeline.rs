use crate::config::RunContext;
use crate::core::batch::BatchRequester;
use crate::core::keywords::KeywordReader;
use crate::core::normalize::normalize_ideas;
use crate::core::sink::SinkWriter;
use crate::domain::model::MetricsRecord;
use crate::domain::ports::{MetricsProvider, Pipeline, SpreadsheetStore, Storage};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Keywords in, metrics out: source reader, batch requester, normalizer and
/// sink writer wired over one immutable `RunContext`.
pub struct KeywordMetricsPipeline<S: Storage, P: MetricsProvider, W: SpreadsheetStore> {
    storage: S,
    provider: P,
    sheets: Option<W>,
    context: RunContext,
    run_date: NaiveDate,
}

impl<S: Storage, P: MetricsProvider, W: SpreadsheetStore> KeywordMetricsPipeline<S, P, W> {
    pub fn new(storage: S, provider: P, sheets: Option<W>, context: RunContext) -> Self {
        Self {
            storage,
            provider,
            sheets,
            context,
            run_date: chrono::Local::now().date_naive(),
        }
    }

    /// Date stamped into spreadsheet rows.
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }
}

#[async_trait::async_trait]
impl<S: Storage, P: MetricsProvider, W: SpreadsheetStore> Pipeline
    for KeywordMetricsPipeline<S, P, W>
{
    async fn extract(&self) -> Result<Vec<String>> {
        KeywordReader::new(&self.storage, self.sheets.as_ref())
            .read(&self.context.source)
            .await
    }

    async fn transform(&self, keywords: Vec<String>) -> Result<Vec<MetricsRecord>> {
        let ideas = BatchRequester::new(&self.provider, &self.context)
            .request_all(&keywords)
            .await?;
        Ok(normalize_ideas(ideas))
    }

    async fn load(&self, records: Vec<MetricsRecord>) -> Result<String> {
        SinkWriter::new(&self.storage, self.sheets.as_ref(), &self.context)
            .write(records, self.run_date)
            .await
    }
}
