//! External service clients: generative text (OpenAI-compatible), CRM
//! (Notion-style pages/blocks API), and transactional email (Postmark-style).
//!
//! Clients are constructed once at startup from `Config` and injected into
//! the application state; every request carries an explicit timeout and no
//! client retries on its own.

use crate::circuit_breaker::{create_generation_breaker, GenerationBreaker};
use crate::config::Config;
use crate::errors::AppError;
use failsafe::futures::CircuitBreaker;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const OPENAI_TIMEOUT: Duration = Duration::from_secs(60);
const NOTION_TIMEOUT: Duration = Duration::from_secs(30);
const POSTMARK_TIMEOUT: Duration = Duration::from_secs(15);

// ============ Generative text service ============

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Calls are guarded by a circuit breaker: after repeated consecutive
/// failures the breaker opens and requests fail fast until the backoff
/// window elapses.
pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    breaker: GenerationBreaker,
}

impl OpenAiService {
    /// Returns `None` when no API key is configured; the pipeline then runs
    /// without research enrichment or style guides.
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        config.openai_api_key.as_ref().map(|key| Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key: key.clone(),
            model: config.openai_model.clone(),
            breaker: create_generation_breaker(),
        })
    }

    /// Single-turn completion: system + user message, returns the assistant
    /// message content.
    pub async fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        match self
            .breaker
            .call(self.request_completion(system_prompt, user_prompt, temperature, max_tokens))
            .await
        {
            Ok(content) => Ok(content),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => Err(AppError::ExternalApiError(
                "Generation service circuit open, failing fast".to_string(),
            )),
        }
    }

    async fn request_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        tracing::debug!(
            "Requesting completion from {} (model {}, max_tokens {})",
            self.base_url,
            self.model,
            max_tokens
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(OPENAI_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Generation request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Generation service returned status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse completion response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::ExternalApiError("Completion response had no choices".to_string())
            })?;

        tracing::debug!("Received completion ({} chars)", content.len());
        Ok(content)
    }
}

// ============ CRM (Notion-style) ============

const NOTION_VERSION: &str = "2022-06-28";

/// Maximum children per block-append call; the API rejects larger batches.
pub const MAX_BLOCKS_PER_APPEND: usize = 100;

/// Identity of a page created in (or fetched from) the CRM.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmPage {
    pub id: String,
    pub url: Option<String>,
}

/// Client for the CRM's pages/blocks API. Exposes exactly the operations the
/// pipeline needs: title query, page create, page update, block append.
pub struct NotionService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NotionService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.notion_base_url.clone(),
            api_key: config.notion_api_key.clone(),
        }
    }

    /// Finds a page in a database whose title matches `title` exactly.
    ///
    /// The remote title filter is not case-sensitive, so results are
    /// re-checked here with an exact string comparison. Distinct companies
    /// that differ only in casing must not be merged.
    pub async fn find_page_by_title(
        &self,
        database_id: &str,
        title: &str,
    ) -> Result<Option<CrmPage>, AppError> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, database_id);

        let body = json!({
            "filter": {
                "property": "Name",
                "title": { "equals": title }
            },
            "page_size": 10
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(NOTION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("CRM query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "CRM query returned status {}: {}",
                status, error_text
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse CRM query response: {}", e))
        })?;

        let results = payload
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        for page in &results {
            if page_title(page).as_deref() == Some(title) {
                let id = page
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                if id.is_empty() {
                    continue;
                }
                let url = page
                    .get("url")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                return Ok(Some(CrmPage { id, url }));
            }
        }

        Ok(None)
    }

    /// Creates a page in a database with the given property map.
    pub async fn create_page(
        &self,
        database_id: &str,
        properties: Value,
    ) -> Result<CrmPage, AppError> {
        let url = format!("{}/v1/pages", self.base_url);

        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(NOTION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("CRM create failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "CRM create returned status {}: {}",
                status, error_text
            )));
        }

        let page: CrmPage = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse CRM create response: {}", e))
        })?;

        Ok(page)
    }

    /// Updates properties on an existing page.
    pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<(), AppError> {
        let url = format!("{}/v1/pages/{}", self.base_url, page_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(NOTION_TIMEOUT)
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("CRM update failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "CRM update returned status {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    /// Appends content blocks to a page, batching at the API's 100-block
    /// cap. Returns the number of append calls issued.
    pub async fn append_blocks(
        &self,
        block_id: &str,
        children: &[Value],
    ) -> Result<usize, AppError> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url, block_id);
        let mut calls = 0;

        for chunk in children.chunks(MAX_BLOCKS_PER_APPEND) {
            let response = self
                .client
                .patch(&url)
                .bearer_auth(&self.api_key)
                .header("Notion-Version", NOTION_VERSION)
                .timeout(NOTION_TIMEOUT)
                .json(&json!({ "children": chunk }))
                .send()
                .await
                .map_err(|e| AppError::ExternalApiError(format!("CRM append failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::ExternalApiError(format!(
                    "CRM append returned status {} after {} call(s): {}",
                    status, calls, error_text
                )));
            }

            calls += 1;
        }

        tracing::debug!(
            "Appended {} block(s) to {} in {} call(s)",
            children.len(),
            block_id,
            calls
        );
        Ok(calls)
    }
}

/// Extracts a page's title text from its property map, whatever the title
/// property is named.
fn page_title(page: &Value) -> Option<String> {
    let properties = page.get("properties")?.as_object()?;
    for property in properties.values() {
        if property.get("type").and_then(|t| t.as_str()) == Some("title") {
            let parts = property.get("title")?.as_array()?;
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("plain_text").and_then(|t| t.as_str()))
                .collect();
            return Some(text);
        }
    }
    None
}

// ============ Transactional email ============

/// One base64-encoded attachment.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAttachment {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
}

/// A composed message in the sender's wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Cc", skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "HtmlBody")]
    pub html_body: String,
    #[serde(rename = "TextBody")]
    pub text_body: String,
    #[serde(rename = "Attachments", skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<EmailAttachment>,
}

/// Client for a Postmark-style transactional email API.
pub struct PostmarkService {
    client: Client,
    base_url: String,
    server_token: String,
}

impl PostmarkService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.postmark_base_url.clone(),
            server_token: config.postmark_api_token.clone(),
        }
    }

    /// Sends a composed message. The sender either accepts it or returns an
    /// error; there is no partial success.
    pub async fn send_email(&self, message: &EmailMessage) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);

        tracing::info!("Sending email to {}: {}", message.to, message.subject);

        let response = self
            .client
            .post(&url)
            .header("X-Postmark-Server-Token", &self.server_token)
            .header("Accept", "application/json")
            .timeout(POSTMARK_TIMEOUT)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Email send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Email sender returned status {}: {}",
                status, error_text
            )));
        }

        let payload: Value = response.json().await.unwrap_or_default();
        if let Some(code) = payload.get("ErrorCode").and_then(|c| c.as_i64()) {
            if code != 0 {
                let message_text = payload
                    .get("Message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error");
                return Err(AppError::ExternalApiError(format!(
                    "Email sender rejected message (code {}): {}",
                    code, message_text
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_title_reads_any_title_property() {
        let page = json!({
            "id": "abc",
            "properties": {
                "Company": {
                    "type": "title",
                    "title": [
                        { "plain_text": "Acme " },
                        { "plain_text": "Corp" }
                    ]
                }
            }
        });
        assert_eq!(page_title(&page).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn email_message_serializes_in_wire_shape() {
        let message = EmailMessage {
            from: "a@b.co".to_string(),
            to: "c@d.co".to_string(),
            cc: None,
            subject: "Hi".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
            attachments: vec![],
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["From"], "a@b.co");
        assert!(value.get("Cc").is_none());
        assert!(value.get("Attachments").is_none());
    }
}
