//! Web search tool for current-information lookups
//!
//! Provider auto-selection:
//! - Brave Search API (needs BRAVE_API_KEY)
//! - DuckDuckGo HTML (free, no API key, best-effort)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::http_client::build_http_client;
use crate::tools::{Tool, ToolOutput};

const DEFAULT_RESULT_COUNT: usize = 5;
const MAX_RESULT_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
    num_results: Option<usize>,
}

/// Web search tool that searches the internet for information.
///
/// Uses Brave Search when an API key is configured, DuckDuckGo HTML
/// otherwise.
pub struct WebSearchTool {
    client: Client,
    brave_api_key: Option<String>,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            client: build_http_client(),
            brave_api_key: None,
        }
    }

    pub fn with_brave_key(mut self, api_key: impl Into<String>) -> Self {
        self.brave_api_key = Some(api_key.into());
        self
    }

    async fn brave_search(
        &self,
        query: &str,
        num: usize,
        api_key: &str,
    ) -> Result<Value, ProviderError> {
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={}",
            urlencoding::encode(query),
            num
        );
        let response = self
            .client
            .get(&url)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Other(format!(
                "Brave Search API error ({}): {}",
                status, body
            )));
        }

        let data: Value = response.json().await?;
        let results = data["web"]["results"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .take(num)
                    .map(|r| {
                        json!({
                            "title": r["title"].as_str().unwrap_or(""),
                            "url": r["url"].as_str().unwrap_or(""),
                            "snippet": r["description"].as_str().unwrap_or("")
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(json!({ "provider": "brave", "results": results }))
    }

    async fn duckduckgo_search(&self, query: &str, num: usize) -> Result<Value, ProviderError> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let response = self
            .client
            .get(&url)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Other(format!(
                "DuckDuckGo returned status {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let results = parse_duckduckgo_html(&html, num);
        Ok(json!({ "provider": "duckduckgo", "results": results }))
    }
}

/// Parse DuckDuckGo HTML lite results page
fn parse_duckduckgo_html(html: &str, max_results: usize) -> Vec<Value> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    // DuckDuckGo HTML lite uses .result class for each result
    let result_sel = Selector::parse(".result").unwrap();
    let link_sel = Selector::parse(".result__a").unwrap();
    let snippet_sel = Selector::parse(".result__snippet").unwrap();

    for element in document.select(&result_sel).take(max_results) {
        let title = element
            .select(&link_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();

        let url = element
            .select(&link_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or("")
            .to_string();
        let normalized_url = normalize_duckduckgo_url(&url);

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();

        if !title.is_empty() && !normalized_url.is_empty() {
            results.push(json!({
                "title": title,
                "url": normalized_url,
                "snippet": snippet
            }));
        }
    }

    results
}

/// Normalize DuckDuckGo tracking links to the destination URL.
///
/// DDG HTML results often return links like:
/// https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com
fn normalize_duckduckgo_url(raw_url: &str) -> String {
    let Ok(parsed) = url::Url::parse(raw_url) else {
        return raw_url.to_string();
    };

    if parsed.domain() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        for (key, value) in parsed.query_pairs() {
            if key == "uddg" {
                return value.into_owned();
            }
        }
    }

    raw_url.to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns a list of results with \
         titles, URLs, and snippets. Use this when the user asks about recent \
         events, news, or information that may not be in your training data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default: 5, max: 10)",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ProviderError> {
        let input: WebSearchInput = match serde_json::from_value(args) {
            Ok(input) => input,
            Err(err) => return Ok(ToolOutput::error(format!("Invalid arguments: {err}"))),
        };

        let num = input
            .num_results
            .unwrap_or(DEFAULT_RESULT_COUNT)
            .min(MAX_RESULT_COUNT);

        tracing::info!(query = %input.query, num, "web search");

        let results = match &self.brave_api_key {
            Some(api_key) => self.brave_search(&input.query, num, api_key).await?,
            None => self.duckduckgo_search(&input.query, num).await?,
        };

        Ok(ToolOutput::success(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duckduckgo_html() {
        let html = r#"
            <div class="result">
                <a class="result__a" href="https://example.com/page">Example Title</a>
                <a class="result__snippet" href="https://example.com/page">A snippet.</a>
            </div>
            <div class="result">
                <a class="result__a" href="https://other.org">Other</a>
                <a class="result__snippet" href="https://other.org">More text.</a>
            </div>
        "#;

        let results = parse_duckduckgo_html(html, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "Example Title");
        assert_eq!(results[0]["url"], "https://example.com/page");
        assert_eq!(results[0]["snippet"], "A snippet.");
    }

    #[test]
    fn test_result_limit_respected() {
        let html = r#"
            <div class="result"><a class="result__a" href="https://a.com">A</a></div>
            <div class="result"><a class="result__a" href="https://b.com">B</a></div>
            <div class="result"><a class="result__a" href="https://c.com">C</a></div>
        "#;
        let results = parse_duckduckgo_html(html, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_normalize_duckduckgo_redirect() {
        let raw = "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage";
        assert_eq!(normalize_duckduckgo_url(raw), "https://example.com/page");
    }

    #[test]
    fn test_normalize_passes_through_direct_urls() {
        let raw = "https://example.com/page";
        assert_eq!(normalize_duckduckgo_url(raw), raw);
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_tool_error() {
        let tool = WebSearchTool::new();
        let output = tool.execute(json!({"nope": true})).await.unwrap();
        assert!(!output.success);
        assert!(output.error.unwrap().contains("Invalid arguments"));
    }
}
