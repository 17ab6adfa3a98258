//! LLM-backed suggestion service (OpenAI-compatible chat completions or
//! Anthropic messages) for the core prioritizer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use taskflow_core::{SuggestionRequest, SuggestionService};
use tracing::debug;

use crate::auth::AuthState;
use crate::config::LlmSection;
use crate::prompt::{extract_json_array, render_prompt, SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider '{other}' (expected openai or anthropic)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub api_key: String,
}

impl LlmConfig {
    /// Combine the `[llm]` config section with stored credentials.
    pub fn resolve(section: &LlmSection, auth: &AuthState) -> Result<Self> {
        let provider = Provider::parse(&section.provider)?;
        let api_key = match provider {
            Provider::OpenAI => auth.openai_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("missing openai_api_key; run: taskflow auth paste-openai-api-key")
            })?,
            Provider::Anthropic => auth.anthropic_token.clone().ok_or_else(|| {
                anyhow::anyhow!("missing anthropic_token; run: taskflow auth paste-anthropic-token")
            })?,
        };
        Ok(Self {
            provider,
            model: section.model.clone(),
            base_url: section.base_url.trim_end_matches('/').to_string(),
            temperature: section.temperature,
            api_key,
        })
    }
}

pub struct LlmSuggestionService {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmSuggestionService {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { config, client })
    }

    async fn complete(&self, user: &str) -> Result<String> {
        match self.config.provider {
            Provider::Anthropic => self.anthropic_complete(user).await,
            Provider::OpenAI => self.openai_complete(user).await,
        }
    }

    async fn anthropic_complete(&self, user: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: i32,
            temperature: f32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            max_tokens: 2048,
            temperature: self.config.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![Msg {
                role: "user",
                content: user,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.config.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }

    async fn openai_complete(&self, user: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl SuggestionService for LlmSuggestionService {
    async fn suggest(&self, request: &[SuggestionRequest]) -> Result<Value> {
        let prompt = render_prompt(request);
        debug!(
            provider = ?self.config.provider,
            model = %self.config.model,
            "sending prioritization prompt"
        );
        let reply = self.complete(&prompt).await?;
        extract_json_array(&reply)
    }
}
