use crate::adapters::ads::GoogleAdsClient;
use crate::adapters::google_auth::{RefreshTokenAuth, ServiceAccountAuth, SHEETS_SCOPE};
use crate::adapters::sheets::SheetsClient;
use crate::config::cli::LocalStorage;
use crate::config::AppConfig;
use crate::core::etl::{EtlEngine, RunSummary};
use crate::core::pipeline::KeywordMetricsPipeline;
use crate::utils::error::Result;
use reqwest::Client;
use std::path::PathBuf;

/// Builds the HTTP adapters from `config` and runs the pipeline once.
/// Relative paths resolve against `workdir`.
pub async fn run(config: AppConfig, workdir: impl Into<PathBuf>, monitor: bool) -> Result<RunSummary> {
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let ads_auth = RefreshTokenAuth::new(client.clone(), &config.ads.token_url, &config.ads.credentials);
    let provider = GoogleAdsClient::new(client.clone(), &config.ads, Box::new(ads_auth));
    tracing::debug!("Ads endpoint: {}", provider.endpoint());

    let sheets = match &config.sheets {
        Some(settings) => {
            let auth =
                ServiceAccountAuth::from_source(client.clone(), &settings.service_account, SHEETS_SCOPE)
                    .await?;
            tracing::info!("Using service account {} for Google Sheets", auth.client_email());
            Some(SheetsClient::new(client.clone(), &settings.api_base, Box::new(auth))?)
        }
        None => None,
    };

    let storage = LocalStorage::new(workdir);
    let pipeline = KeywordMetricsPipeline::new(storage, provider, sheets, config.run);
    EtlEngine::new_with_monitoring(pipeline, monitor).run().await
}
