//! search_web tool backed by the DuckDuckGo Instant Answer API

use async_trait::async_trait;
use droid_core::{Error, Result, Tool, ToolArgs, ToolResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const SEARCH_TOOL_NAME: &str = "search_web";

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";

/// Web search for research-style agents
pub struct WebSearchTool {
    client: Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: DUCKDUCKGO_URL.to_string(),
        }
    }

    /// Point the tool at another Instant Answer compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DuckDuckGoResponse {
    #[serde(default)]
    abstract_text: Option<String>,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: Option<String>,
    #[serde(default)]
    abstract_source: Option<String>,
    #[serde(default)]
    related_topics: Vec<DuckDuckGoTopic>,
}

#[derive(Debug, Deserialize)]
struct DuckDuckGoTopic {
    #[serde(default, rename = "Text")]
    text: Option<String>,
    #[serde(default, rename = "FirstURL")]
    first_url: Option<String>,
}

struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

impl WebSearchTool {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::tool(SEARCH_TOOL_NAME, e))?;

        if !response.status().is_success() {
            return Err(Error::tool(
                SEARCH_TOOL_NAME,
                format!("DuckDuckGo API error: {}", response.status()),
            ));
        }

        let body: DuckDuckGoResponse = response
            .json()
            .await
            .map_err(|e| Error::tool(SEARCH_TOOL_NAME, e))?;

        let mut results = Vec::new();

        if let Some(text) = body.abstract_text.filter(|t| !t.is_empty()) {
            results.push(SearchResult {
                title: body.abstract_source.unwrap_or_else(|| "Summary".to_string()),
                url: body.abstract_url.unwrap_or_default(),
                snippet: text,
            });
        }

        for topic in body.related_topics {
            if results.len() >= limit {
                break;
            }
            if let (Some(text), Some(url)) = (topic.text, topic.first_url) {
                if !text.is_empty() {
                    results.push(SearchResult {
                        title: title_of(&text),
                        url,
                        snippet: text,
                    });
                }
            }
        }

        results.truncate(limit);
        Ok(results)
    }
}

fn format_results(results: &[SearchResult], query: &str) -> String {
    if results.is_empty() {
        return format!("No results found for '{}'.", query);
    }

    let mut output = format!("Search results for: \"{}\"\n\n", query);
    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("## [{}] {}\n", i + 1, result.title));
        output.push_str(&format!("URL: {}\n", result.url));
        output.push_str(&format!("{}\n\n", result.snippet));
    }
    output.push_str(&format!("Found {} results.\n", results.len()));
    output
}

/// Topic texts read "Title - Description"
fn title_of(text: &str) -> String {
    text.split(" - ").next().unwrap_or("Result").to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns titles, URLs and snippets."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 5, max: 10)",
                    "minimum": 1,
                    "maximum": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
        let input: SearchInput = serde_json::from_value(Value::Object(args))
            .map_err(|e| Error::tool(SEARCH_TOOL_NAME, e))?;

        if input.query.trim().is_empty() {
            return Ok(ToolResult::error("Query cannot be empty"));
        }

        let limit = input.limit.clamp(1, 10);
        tracing::info!(query = %input.query, limit, "Executing web search");

        let results = self.search(&input.query, limit).await?;
        Ok(ToolResult::success(format_results(&results, &input.query)))
    }
}
