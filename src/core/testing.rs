//! In-memory doubles for the provider and spreadsheet ports.

use crate::config::{KeywordSource, RunContext, SheetOutput};
use crate::domain::model::{
    Competition, IdeaRequest, KeywordIdea, MetricsRecord, Network, TabState,
};
use crate::domain::ports::{MetricsProvider, SpreadsheetStore};
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn run_context() -> RunContext {
    RunContext {
        language_id: 1000,
        location_ids: vec![2392],
        network: Network::GoogleSearch,
        source: KeywordSource::Csv {
            path: "keywords.csv".to_string(),
        },
        sheet_output: None,
        output_dir: "output".to_string(),
    }
}

pub fn sheet_output() -> SheetOutput {
    SheetOutput {
        spreadsheet_id: "sheet-1".to_string(),
        tab: "Results".to_string(),
        country: "SK".to_string(),
        language_tag: "sk".to_string(),
    }
}

pub fn record(keyword: &str, avg_monthly_searches: Option<i64>) -> MetricsRecord {
    MetricsRecord {
        keyword: keyword.to_string(),
        avg_monthly_searches,
        competition: Competition::Unknown,
        low_top_of_page_bid_micros: None,
        high_top_of_page_bid_micros: None,
    }
}

/// Echoes every seed keyword back as an idea with volume = keyword length.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    calls: Arc<Mutex<Vec<IdeaRequest>>>,
    fail_on_call: Option<usize>,
}

impl RecordingProvider {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<IdeaRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl MetricsProvider for RecordingProvider {
    async fn generate_keyword_ideas(&self, request: &IdeaRequest) -> Result<Vec<KeywordIdea>> {
        let mut calls = self.calls.lock().await;
        calls.push(request.clone());

        if self.fail_on_call == Some(calls.len()) {
            return Err(PipelineError::ProviderError {
                status: "INVALID_ARGUMENT".to_string(),
                message: "rejected".to_string(),
                details: vec![],
            });
        }

        Ok(request
            .keywords
            .iter()
            .map(|k| KeywordIdea {
                text: k.clone(),
                avg_monthly_searches: Some(k.len() as i64),
                competition_code: Some(2),
                ..Default::default()
            })
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MemorySheets {
    input: Vec<Vec<String>>,
    tabs: Arc<Mutex<HashMap<String, Vec<Vec<Value>>>>>,
}

impl MemorySheets {
    pub fn with_input(input: Vec<Vec<String>>) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    pub async fn insert_tab(&self, title: &str, rows: Vec<Vec<Value>>) {
        self.tabs.lock().await.insert(title.to_string(), rows);
    }

    pub async fn tab(&self, title: &str) -> Option<Vec<Vec<Value>>> {
        self.tabs.lock().await.get(title).cloned()
    }
}

#[async_trait]
impl SpreadsheetStore for MemorySheets {
    async fn read_range(
        &self,
        _spreadsheet_id: &str,
        _tab: Option<&str>,
        _range: &str,
    ) -> Result<Vec<Vec<String>>> {
        Ok(self.input.clone())
    }

    async fn ensure_tab(&self, _spreadsheet_id: &str, tab: &str) -> Result<TabState> {
        let mut tabs = self.tabs.lock().await;
        if tabs.contains_key(tab) {
            return Ok(TabState::Existing);
        }
        tabs.insert(tab.to_string(), Vec::new());
        Ok(TabState::Created)
    }

    async fn is_tab_empty(&self, _spreadsheet_id: &str, tab: &str) -> Result<bool> {
        let tabs = self.tabs.lock().await;
        Ok(tabs.get(tab).map_or(true, |rows| rows.is_empty()))
    }

    async fn append_rows(
        &self,
        _spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<()> {
        let mut tabs = self.tabs.lock().await;
        tabs.entry(tab.to_string()).or_default().extend(rows);
        Ok(())
    }
}
