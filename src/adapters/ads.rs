use crate::adapters::google_auth::TokenProvider;
use crate::config::AdsSettings;
use crate::domain::model::{IdeaRequest, KeywordIdea};
use crate::domain::ports::MetricsProvider;
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateKeywordIdeasBody<'a> {
    language: String,
    geo_target_constants: Vec<String>,
    include_adult_keywords: bool,
    keyword_plan_network: &'static str,
    keyword_seed: KeywordSeed<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct KeywordSeed<'a> {
    keywords: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateKeywordIdeasResponse {
    #[serde(default)]
    results: Vec<IdeaResult>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeaResult {
    #[serde(default)]
    text: String,
    keyword_idea_metrics: Option<IdeaMetrics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeaMetrics {
    #[serde(default, deserialize_with = "int64")]
    avg_monthly_searches: Option<i64>,
    #[serde(default, deserialize_with = "competition_code")]
    competition: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    low_top_of_page_bid_micros: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    high_top_of_page_bid_micros: Option<i64>,
}

/// proto3 JSON writes int64 as a string; plain numbers are accepted too.
fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Enum fields arrive by name unless the server is asked for integers.
fn competition_code<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => match s.as_str() {
            "UNSPECIFIED" => Some(0),
            "UNKNOWN" => Some(1),
            "LOW" => Some(2),
            "MEDIUM" => Some(3),
            "HIGH" => Some(4),
            other => other.parse().ok(),
        },
        _ => None,
    })
}

impl From<IdeaResult> for KeywordIdea {
    fn from(result: IdeaResult) -> Self {
        let metrics = result.keyword_idea_metrics.unwrap_or_default();
        KeywordIdea {
            text: result.text,
            avg_monthly_searches: metrics.avg_monthly_searches,
            competition_code: metrics.competition,
            low_top_of_page_bid_micros: metrics.low_top_of_page_bid_micros,
            high_top_of_page_bid_micros: metrics.high_top_of_page_bid_micros,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<Value>,
}

/// Decodes a non-success Ads response into a `ProviderError`, keeping the
/// GoogleAdsFailure messages and request id.
/// Exponential backoff for the given 1-based retry attempt, saturating instead
/// of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

fn provider_error(http_status: reqwest::StatusCode, body: &str) -> PipelineError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return PipelineError::ProviderError {
            status: http_status.to_string(),
            message: body.trim().to_string(),
            details: vec![],
        };
    };

    let mut details = Vec::new();
    for detail in &envelope.error.details {
        if let Some(errors) = detail.get("errors").and_then(Value::as_array) {
            for error in errors {
                let message = error.get("message").and_then(Value::as_str).unwrap_or("");
                match error.get("errorCode") {
                    Some(code) => details.push(format!("{} {}", code, message).trim().to_string()),
                    None => details.push(message.to_string()),
                }
            }
        }
        if let Some(request_id) = detail.get("requestId").and_then(Value::as_str) {
            details.push(format!("request_id={}", request_id));
        }
    }

    let status = if envelope.error.status.is_empty() {
        http_status.to_string()
    } else {
        envelope.error.status
    };

    PipelineError::ProviderError {
        status,
        message: envelope.error.message,
        details,
    }
}

/// Google Ads REST client for `KeywordPlanIdeaService.GenerateKeywordIdeas`.
pub struct GoogleAdsClient {
    client: Client,
    auth: Box<dyn TokenProvider>,
    endpoint: String,
    developer_token: String,
    login_customer_id: Option<String>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl GoogleAdsClient {
    pub fn new(client: Client, settings: &AdsSettings, auth: Box<dyn TokenProvider>) -> Self {
        let endpoint = format!(
            "{}/{}/customers/{}:generateKeywordIdeas",
            settings.api_base, settings.api_version, settings.credentials.customer_id
        );
        Self {
            client,
            auth,
            endpoint,
            developer_token: settings.credentials.developer_token.clone(),
            login_customer_id: settings.credentials.login_customer_id.clone(),
            max_retries: settings.max_retries,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_page(
        &self,
        request: &IdeaRequest,
        page_token: Option<&str>,
    ) -> Result<GenerateKeywordIdeasResponse> {
        let body = GenerateKeywordIdeasBody {
            language: format!("languageConstants/{}", request.language_id),
            geo_target_constants: request
                .location_ids
                .iter()
                .map(|id| format!("geoTargetConstants/{}", id))
                .collect(),
            include_adult_keywords: request.include_adult_keywords,
            keyword_plan_network: request.network.api_name(),
            keyword_seed: KeywordSeed {
                keywords: &request.keywords,
            },
            page_token,
        };

        let token = self.auth.access_token().await?;
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("developer-token", &self.developer_token)
            .json(&body);
        if let Some(login_customer_id) = &self.login_customer_id {
            builder = builder.header("login-customer-id", login_customer_id);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("Ads API response status: {}", status);

        if !status.is_success() {
            let text = response.text().await?;
            return Err(provider_error(status, &text));
        }

        Ok(response.json().await?)
    }

    async fn fetch_page_with_retry(
        &self,
        request: &IdeaRequest,
        page_token: Option<&str>,
    ) -> Result<GenerateKeywordIdeasResponse> {
        let mut attempts = 0;
        loop {
            match self.fetch_page(request, page_token).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempts < self.max_retries => {
                    attempts += 1;
                    let delay = backoff_delay(self.retry_backoff, attempts);
                    tracing::warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying Ads API call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MetricsProvider for GoogleAdsClient {
    async fn generate_keyword_ideas(&self, request: &IdeaRequest) -> Result<Vec<KeywordIdea>> {
        let mut ideas = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page_with_retry(request, page_token.as_deref())
                .await?;
            ideas.extend(page.results.into_iter().map(KeywordIdea::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(ideas)
    }
}
