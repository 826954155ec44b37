use crate::domain::model::{Competition, KeywordIdea, MetricsRecord};

pub fn normalize_idea(idea: KeywordIdea) -> MetricsRecord {
    MetricsRecord {
        keyword: idea.text,
        avg_monthly_searches: idea.avg_monthly_searches,
        competition: Competition::from_code(idea.competition_code),
        low_top_of_page_bid_micros: idea.low_top_of_page_bid_micros,
        high_top_of_page_bid_micros: idea.high_top_of_page_bid_micros,
    }
}

pub fn normalize_ideas(ideas: Vec<KeywordIdea>) -> Vec<MetricsRecord> {
    ideas.into_iter().map(normalize_idea).collect()
}
