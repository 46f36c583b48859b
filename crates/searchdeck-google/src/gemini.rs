//! Gemini batched intent-classification adapter.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use searchdeck_core::analytics::IntentClassifier;

/// Generation cap for the batched call; a single response must hold one
/// entry for every query in the report.
const MAX_OUTPUT_TOKENS: u32 = 8192;

/// HTTP client for the Gemini `generateContent` endpoint.
///
/// Issues exactly one request per report cycle, carrying the full ordered
/// query list, and hands the raw candidate text back to the caller — the
/// layered parsing and degraded defaults live with the intent annotator in
/// core, because free text without parseable structure is a valid
/// (degraded) response here, not an error.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// One prompt covering every query, demanding a same-length ordered JSON
/// array so entry *i* answers query *i*.
fn build_prompt(queries: &[String]) -> String {
    let mut listed = String::new();
    for (i, query) in queries.iter().enumerate() {
        // JSON-escape each query so quotes inside the text cannot break
        // the numbered list apart.
        let quoted = serde_json::to_string(query).unwrap_or_else(|_| format!("{query:?}"));
        listed.push_str(&format!("{}. {}\n", i + 1, quoted));
    }
    format!(
        "Analyze the search intent of each of the following {count} search queries:\n\
         {listed}\n\
         Respond with a JSON array of exactly {count} objects, in the same order \
         as the queries, each with the following fields:\n\
         1. intent: A concise description of what the user is trying to find or do\n\
         2. category: One of the following categories:\n\
            - Informational\n\
            - Navigational\n\
            - Transactional\n\
            - Commercial Investigation",
        count = queries.len(),
        listed = listed,
    )
}

fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let part = content.parts.into_iter().next()?;
    (!part.text.is_empty()).then_some(part.text)
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IntentClassifier for GeminiClient {
    async fn classify_batch(&self, queries: &[String]) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: build_prompt(queries),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!(
            "{}/v1/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let resp = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini error {status}: {body}");
        }

        let parsed: GenerateResponse =
            resp.json().await.context("Gemini response parse failed")?;

        debug!(queries = queries.len(), "Intent classification batch answered");

        first_candidate_text(parsed).context("Gemini returned no candidate text")
    }
}
