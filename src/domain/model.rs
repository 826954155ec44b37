use serde::{Deserialize, Serialize};
use std::fmt;

/// Competition band of a keyword as reported by the Ads API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Competition {
    Low,
    Medium,
    High,
    Unknown,
}

impl Competition {
    /// Maps the provider's numeric competition code. Anything outside 2..=4 is unknown.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => Competition::Low,
            Some(3) => Competition::Medium,
            Some(4) => Competition::High,
            _ => Competition::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Competition::Low => "LOW",
            Competition::Medium => "MEDIUM",
            Competition::High => "HIGH",
            Competition::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Competition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword plan network the estimates are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    GoogleSearch,
    GoogleSearchAndPartners,
}

impl Network {
    /// `GOOGLE_SEARCH` selects search only; every other value selects search and partners.
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "GOOGLE_SEARCH" => Network::GoogleSearch,
            "GOOGLE_SEARCH_AND_PARTNERS" => Network::GoogleSearchAndPartners,
            other => {
                tracing::warn!(
                    "Unrecognised NETWORK '{}', using GOOGLE_SEARCH_AND_PARTNERS",
                    other
                );
                Network::GoogleSearchAndPartners
            }
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Network::GoogleSearch => "GOOGLE_SEARCH",
            Network::GoogleSearchAndPartners => "GOOGLE_SEARCH_AND_PARTNERS",
        }
    }
}

/// One `generateKeywordIdeas` call: a seed batch plus targeting.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaRequest {
    pub language_id: u64,
    pub location_ids: Vec<u64>,
    pub network: Network,
    pub include_adult_keywords: bool,
    pub keywords: Vec<String>,
}

/// A provider result item before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordIdea {
    pub text: String,
    pub avg_monthly_searches: Option<i64>,
    pub competition_code: Option<i64>,
    pub low_top_of_page_bid_micros: Option<i64>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub keyword: String,
    pub avg_monthly_searches: Option<i64>,
    pub competition: Competition,
    pub low_top_of_page_bid_micros: Option<i64>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

/// Where an `ensure_tab` call found the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Existing,
    Created,
}
