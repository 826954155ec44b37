use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ProcessMonitor;
use tokio::sync::Mutex;

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub keywords: usize,
    pub records: usize,
    pub output_path: String,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Mutex<ProcessMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: Mutex::new(ProcessMonitor::new(monitor_enabled)),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting keyword metrics run");

        let keywords = self.pipeline.extract().await?;
        let keyword_count = keywords.len();
        tracing::info!("Extracted {} keywords", keyword_count);
        self.monitor.lock().await.log_phase("Extract");

        let records = self.pipeline.transform(keywords).await?;
        let record_count = records.len();
        tracing::info!("Received metrics for {} keywords", record_count);
        if record_count < keyword_count {
            tracing::warn!(
                "{} keywords had no estimate from the provider",
                keyword_count - record_count
            );
        }
        self.monitor.lock().await.log_phase("Transform");

        let output_path = self.pipeline.load(records).await?;
        self.monitor.lock().await.log_phase("Load");

        Ok(RunSummary {
            keywords: keyword_count,
            records: record_count,
            output_path,
        })
    }
}
