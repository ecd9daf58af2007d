// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Generative-AI vision client and the prompts sent to it.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service is not configured (missing GEMINI_API_KEY)")]
    NotConfigured,
    #[error("AI request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("AI service returned no text")]
    Empty,
}

impl From<reqwest::Error> for AiError {
    /// Drops the request URL so nothing from it reaches logs or clients.
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

#[derive(Debug, Clone)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub images: Vec<ImagePart>,
    pub config: Option<GenerationConfig>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError>;

    /// Whether requests can succeed at all; reported by the health check.
    fn is_configured(&self) -> bool {
        true
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }
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

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn request_body(request: &GenerateRequest) -> serde_json::Value {
    let mut parts = vec![json!({ "text": request.prompt })];
    parts.extend(request.images.iter().map(|img| {
        json!({
            "inline_data": {
                "mime_type": img.mime_type,
                "data": STANDARD.encode(&img.data),
            }
        })
    }));
    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }],
    });
    if let Some(cfg) = request.config {
        body["generationConfig"] = json!(cfg);
    }
    body
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        let key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, images = request.images.len(), "calling AI service");

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(&request_body(&request))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: GenerateResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AiError::Empty);
        }
        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

pub const REPORT_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.2,
    top_p: 0.9,
    top_k: 40,
    max_output_tokens: 3000,
};

pub fn report_prompt(goal: &str) -> String {
    format!(
        r#"You are a professional financial advisor AI. Analyze the user's investment portfolio using ONLY the data directly visible in the uploaded screenshots. Do not use outside knowledge or invent data. If a value is not visible, write "N/A".

USER GOAL: "{goal}"

INSTRUCTIONS:
- Generate a report with EXACTLY 8 sections.
- Use the precise titles and formatting: 1. *Section Title*.
- Sections 1-7 are 2-4 short paragraphs each.
- For sections 2, 3, 4 and 5 give a direct assessment from the visible data, explain the reasoning and state the assumptions.
- Section 8 MUST be a markdown table containing ONLY the assets visible in the screenshots.

REQUIRED SECTIONS:
1. *Summary & Portfolio Characteristics*
2. *Goal Alignment Grade*
3. *Goal Alignment Percentage*
4. *Risk Meter*
5. *Estimated 5-Year Return*
6. *Where You Are Strong*
7. *Where You Need to Improve*
8. *Asset Allocation Breakdown*

SECTION 8 FORMAT:
- Columns, exactly: "Asset Name", "Type", "Invested Amount", "Current Value".
- Asset Name: the text of the 'Instrument' column.
- Type: 'Stock' for every row of the holdings table.
- Invested Amount: 'Qty' multiplied by 'Avg. cost', formatted like ₹1234.56; "N/A" when either is not visible.
- Current Value: the 'Cur. val' column, formatted like ₹1234.56.
- Include every visible row of the holdings table.

Asset Name | Type | Invested Amount | Current Value
-----------|------|-----------------|--------------
PAYTM      | Stock| ₹49684.80       | ₹11251.35

SECTION GUIDANCE:
2. *Goal Alignment Grade*: a letter grade A, B, C or D, with reasons tied to visible holdings. State that the grade is preliminary.
3. *Goal Alignment Percentage*: a qualitative band such as "Low alignment (0-30%)", "Moderate alignment (30-70%)" or "High alignment (70-100%)".
4. *Risk Meter*: one of "Very Low", "Low", "Moderate", "High", "Very High", justified by visible assets.
5. *Estimated 5-Year Return*: a qualitative label such as "Aggressive Growth Potential" or "Uncertain Growth Potential"; no numeric percentage.
"#
    )
}

pub fn trade_extraction_prompt() -> &'static str {
    r#"You are a stock portfolio analyzer AI. From the attached screenshots, extract a list of investments using this exact JSON format:

```json
[
  {
    "Stock Name": "XYZ",
    "Invested Date": "YYYY-MM-DD",
    "Invested Amount": "₹10000",
    "Current Value": "₹12000",
    "Profit or Loss": "N/A"
  }
]
```

If any field is missing or unclear, write "N/A". Reply with the JSON only."#
}

pub fn ticker_mapping_prompt(names: &[String]) -> String {
    format!(
        r#"Map each Indian stock name below to its Yahoo Finance ticker symbol (NSE symbols end in ".NS", BSE in ".BO").
Reply with JSON only, in the form [{{"name": "<name as given>", "ticker": "<symbol>"}}]. Use "N/A" when unsure.

{}
"#,
        names.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_inlines_images_as_base64() {
        let req = GenerateRequest {
            prompt: "describe".into(),
            images: vec![ImagePart {
                mime_type: "image/png".into(),
                data: b"abc".to_vec(),
            }],
            config: Some(REPORT_CONFIG),
        };
        let body = request_body(&req);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "YWJj");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 3000);
    }

    #[test]
    fn text_requests_skip_generation_config() {
        let body = request_body(&GenerateRequest::text("hi"));
        assert!(body.get("generationConfig").is_none());
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn report_prompt_carries_goal_and_template() {
        let p = report_prompt("retire early");
        assert!(p.contains("USER GOAL: \"retire early\""));
        assert!(p.contains("8. *Asset Allocation Breakdown*"));
    }
}
