use crate::config::RunContext;
use crate::domain::model::{IdeaRequest, KeywordIdea};
use crate::domain::ports::MetricsProvider;
use crate::utils::error::Result;

/// Seed keyword limit of one `generateKeywordIdeas` request.
pub const MAX_KEYWORDS_PER_REQUEST: usize = 100;

pub fn keyword_batches(keywords: &[String]) -> std::slice::Chunks<'_, String> {
    keywords.chunks(MAX_KEYWORDS_PER_REQUEST)
}

pub fn idea_request(context: &RunContext, batch: &[String]) -> IdeaRequest {
    IdeaRequest {
        language_id: context.language_id,
        location_ids: context.location_ids.clone(),
        network: context.network,
        include_adult_keywords: false,
        keywords: batch.to_vec(),
    }
}

/// The Batch Requester: one provider call per batch, strictly in order.
pub struct BatchRequester<'a, P: MetricsProvider> {
    provider: &'a P,
    context: &'a RunContext,
}

impl<'a, P: MetricsProvider> BatchRequester<'a, P> {
    pub fn new(provider: &'a P, context: &'a RunContext) -> Self {
        Self { provider, context }
    }

    pub async fn request_all(&self, keywords: &[String]) -> Result<Vec<KeywordIdea>> {
        let total = keywords.len().div_ceil(MAX_KEYWORDS_PER_REQUEST);
        let mut ideas = Vec::new();

        for (index, batch) in keyword_batches(keywords).enumerate() {
            tracing::info!(
                "🔎 Requesting batch {}/{} ({} keywords)",
                index + 1,
                total,
                batch.len()
            );
            let request = idea_request(self.context, batch);
            let batch_ideas = self
                .provider
                .generate_keyword_ideas(&request)
                .await
                .inspect_err(|e| tracing::error!("Batch {}/{} failed: {}", index + 1, total, e))?;
            tracing::debug!("Batch {} returned {} ideas", index + 1, batch_ideas.len());
            ideas.extend(batch_ideas);
        }

        Ok(ideas)
    }
}
