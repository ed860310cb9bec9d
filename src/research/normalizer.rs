//! Input normalization
//!
//! A URL is replaced by the text of the page it points to; anything else is
//! treated as a company query and may be enriched with a general briefing
//! from the selected provider and with instant-answer search results. Every
//! failure degrades to the raw input, so [`InputNormalizer::normalize`] never
//! fails.

use crate::llm::LLMClient;
use crate::research::prompts::GENERAL_INFO_SYSTEM_PROMPT;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ResearchConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    r#abstract: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: Option<String>,
}

impl InstantAnswer {
    /// Non-empty snippets in response order
    fn snippets(self) -> Vec<String> {
        [self.r#abstract, self.description]
            .into_iter()
            .chain(self.related_topics.into_iter().filter_map(|t| t.text))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Whether the (trimmed) input parses as an absolute URL
pub fn is_url(input: &str) -> bool {
    reqwest::Url::parse(input.trim()).is_ok()
}

pub struct InputNormalizer {
    http: reqwest::Client,
    general_information: bool,
    search_enrichment: bool,
    search_url: String,
}

impl InputNormalizer {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Normalizer HTTP client: {}", e)))?;

        Ok(Self {
            http,
            general_information: config.general_information,
            search_enrichment: config.search_enrichment,
            search_url: config.search_url.clone(),
        })
    }

    /// Page text for a URL, or the query plus any enrichment.
    ///
    /// `llm` is the provider the research will run on; it writes the general
    /// briefing for free-text queries.
    pub async fn normalize(&self, raw: &str, llm: &dyn LLMClient) -> String {
        if is_url(raw) {
            return match self.fetch_page(raw.trim()).await {
                Some(text) if !text.trim().is_empty() => text,
                _ => raw.to_string(),
            };
        }

        let (general, news) = tokio::join!(self.briefing(raw, llm), self.recent_news(raw));

        let mut blocks = Vec::new();
        if let Some(general) = general {
            blocks.push(format!("General Information:\n{}", general));
        }
        if let Some(news) = news {
            blocks.push(format!("Recent Updates and News:\n{}", news.join("\n")));
        }

        if blocks.is_empty() {
            raw.to_string()
        } else {
            format!("{}\n\n{}", raw, blocks.join("\n\n"))
        }
    }

    async fn briefing(&self, query: &str, llm: &dyn LLMClient) -> Option<String> {
        if !self.general_information {
            return None;
        }

        match llm
            .generate_with_system(GENERAL_INFO_SYSTEM_PROMPT, query.trim())
            .await
        {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!(provider = %llm.kind(), error = %e, "General information lookup failed");
                None
            }
        }
    }

    async fn recent_news(&self, query: &str) -> Option<Vec<String>> {
        if !self.search_enrichment {
            return None;
        }
        self.search(query).await.filter(|snippets| !snippets.is_empty())
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        debug!(url, "Fetching page");
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Page fetch failed, using raw input");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Page fetch returned error status");
            return None;
        }

        response
            .text()
            .await
            .map_err(|e| warn!(url, error = %e, "Failed to read page body"))
            .ok()
    }

    async fn search(&self, query: &str) -> Option<Vec<String>> {
        let q = format!("{} company news last month", query.trim());
        let response = self
            .http
            .get(&self.search_url)
            .query(&[("q", q.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| warn!(error = %e, "Search enrichment failed"))
            .ok()?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Search enrichment returned error status");
            return None;
        }

        // The instant-answer API may label JSON as text, so decode by hand
        let body = response
            .text()
            .await
            .map_err(|e| warn!(error = %e, "Failed to read search response"))
            .ok()?;
        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|e| warn!(error = %e, "Unreadable search response"))
            .ok()?;

        Some(answer.snippets())
    }
}
