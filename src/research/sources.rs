//! Source citations for a finished report

use crate::llm::LLMClient;
use crate::research::prompts::SOURCES_SYSTEM_PROMPT;
use crate::types::Source;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SourcesPayload {
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Ask the provider that wrote the report for verification sources.
///
/// Any failure (provider error or unparseable answer) yields an empty list.
pub async fn generate_sources(llm: &dyn LLMClient, content: &str) -> Vec<Source> {
    match llm.generate_with_system(SOURCES_SYSTEM_PROMPT, content).await {
        Ok(raw) => parse_sources(&raw),
        Err(e) => {
            warn!(error = %e, "Source generation failed, continuing without sources");
            Vec::new()
        }
    }
}

/// Parse `{"sources": [{"title", "url"}]}`, tolerating a Markdown code fence.
pub fn parse_sources(raw: &str) -> Vec<Source> {
    let body = strip_code_fence(raw);

    match serde_json::from_str::<SourcesPayload>(body) {
        Ok(payload) => payload
            .sources
            .into_iter()
            .filter_map(|source| {
                let url = source.url?.trim().to_string();
                if url.is_empty() {
                    return None;
                }
                Some(Source {
                    title: source.title.unwrap_or_else(|| url.clone()),
                    url,
                })
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "Could not parse sources JSON");
            Vec::new()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_plain_json() {
        let sources = parse_sources(
            r#"{"sources":[{"title":"Acme","url":"https://acme.example"},{"title":"News","url":"https://news.example/acme"}]}"#,
        );

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].title, "News");
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"sources\": [{\"title\": \"Acme\", \"url\": \"https://acme.example\"}]}\n```";
        let sources = parse_sources(raw);

        assert_eq!(
            sources,
            vec![Source {
                title: "Acme".to_string(),
                url: "https://acme.example".to_string()
            }]
        );
    }

    #[test]
    fn test_extra_fields_dropped_and_missing_url_skipped() {
        let sources = parse_sources(
            r#"{"sources":[{"title":"A","url":"https://a.example","relevance":0.8},{"title":"No url"}]}"#,
        );

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://a.example");
    }

    #[rstest]
    #[case("")]
    #[case("Here are some sources: acme.example")]
    #[case("```json\n{\"sources\": [\n```")]
    #[case("{}")]
    fn test_unparseable_or_empty_yields_nothing(#[case] raw: &str) {
        assert!(parse_sources(raw).is_empty());
    }
}
