use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ChatCompletion, ChatMessage, LlmError};

pub const DEFAULT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_MODEL: &str = "GigaChat";

/// Chat completion calls are slower than metadata calls.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for GigaChat or any other OpenAI-compatible
/// `{base_url}/chat/completions` endpoint.
pub struct GigaChatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    token: String,
}

impl GigaChatClient {
    pub fn new(token: &str, base_url: &str, model: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(CHAT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl ChatCompletion for GigaChatClient {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });

        debug!(%url, "POST chat completion");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedResponse(format!("status {status}: {body}")));
        }

        let body: serde_json::Value = response.json().await?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| LlmError::UnexpectedResponse(body.to_string()))?;
        debug!(chars = content.len(), "received completion");
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn conversation() -> Vec<ChatMessage> {
        vec![ChatMessage::system("be brief"), ChatMessage::user("review this")]
    }

    #[tokio::test]
    async fn test_complete_extracts_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer giga"))
            .and(body_partial_json(serde_json::json!({
                "model": "GigaChat",
                "temperature": 0.2,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "review this" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "Looks fine." } } ]
            })))
            .mount(&server)
            .await;

        let client = GigaChatClient::new("giga", &server.uri(), DEFAULT_MODEL).unwrap();
        let text = client.complete(&conversation(), 0.2).await.unwrap();
        assert_eq!(text, "Looks fine.");
    }

    #[tokio::test]
    async fn test_error_status_is_unexpected_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = GigaChatClient::new("giga", &server.uri(), DEFAULT_MODEL).unwrap();
        let err = client.complete(&conversation(), 0.2).await.unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedResponse(ref m) if m.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_missing_choices_is_unexpected_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = GigaChatClient::new("giga", &server.uri(), DEFAULT_MODEL).unwrap();
        let err = client.complete(&conversation(), 0.2).await.unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedResponse(_)));
    }
}
