use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, ImageUrl, MessagePart};
use crate::ai::{CompletionService, Prompt, PromptPart};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiCompletionClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: OpenAiHttpClient::new(api_key, Duration::from_secs(60)),
            model,
        }
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, timeout, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// A lone text part is sent as a plain string; anything else as parts.
    fn user_content(prompt: &Prompt) -> ChatMessageContent {
        if let [PromptPart::Text(text)] = prompt.user.as_slice() {
            return ChatMessageContent::Text(text.clone());
        }

        ChatMessageContent::Parts(
            prompt
                .user
                .iter()
                .map(|part| match part {
                    PromptPart::Text(text) => MessagePart::Text { text: text.clone() },
                    PromptPart::Image(image) => MessagePart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                })
                .collect(),
        )
    }

    fn build_request(&self, prompt: &Prompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(ChatMessageContent::Text(prompt.system.clone())),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(Self::user_content(prompt)),
                },
            ],
            temperature: prompt.temperature,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        tracing::debug!(
            "Sending chat completion to OpenAI (model: {}, image: {})",
            self.model,
            prompt.has_image()
        );

        let response = self.http.chat_completion(&self.build_request(prompt)).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::AiProvider("No response from OpenAI chat API".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("OpenAI completion was truncated by the token limit");
        }

        match &choice.message.content {
            Some(ChatMessageContent::Text(text)) => Ok(text.clone()),
            _ => Err(Error::AiProvider(
                "OpenAI chat API returned no text content".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EncodedImage;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, model: &str) -> OpenAiCompletionClient {
        OpenAiCompletionClient::new("test-key".to_string(), model.to_string())
            .with_base_url(server.uri())
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
    }

    #[tokio::test]
    async fn test_complete_text_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "temperature": 0.0,
                "messages": [
                    { "role": "system", "content": "Only agriculture." },
                    { "role": "user", "content": "When should I transplant?" }
                ]
            })))
            .respond_with(reply("After 20-25 days in the nursery."))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o");
        let prompt = Prompt::new("Only agriculture.").with_text("When should I transplant?");

        let text = client.complete(&prompt).await.unwrap();
        assert_eq!(text, "After 20-25 days in the nursery.");
    }

    #[tokio::test]
    async fn test_complete_image_prompt_sends_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system" },
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": "Look at this." },
                            {
                                "type": "image_url",
                                "image_url": { "url": "data:image/png;base64,iVBORw0K" }
                            }
                        ]
                    }
                ]
            })))
            .respond_with(reply("Healthy leaf."))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o");
        let prompt = Prompt::new("doctor")
            .with_text("Look at this.")
            .with_image(EncodedImage {
                mime_type: "image/png",
                data: "iVBORw0K".to_string(),
            });

        assert_eq!(client.complete(&prompt).await.unwrap(), "Healthy leaf.");
    }

    #[tokio::test]
    async fn test_sends_configured_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(wiremock::matchers::body_string_contains(
                "\"model\":\"custom-model\"",
            ))
            .respond_with(reply("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "custom-model");
        client
            .complete(&Prompt::new("system").with_text("hi"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o");
        let err = client
            .complete(&Prompt::new("system").with_text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o");
        let err = client
            .complete(&Prompt::new("system").with_text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(reply("late").set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new_with_client(
            "test-key".to_string(),
            "gpt-4o".to_string(),
            Duration::from_millis(50),
            reqwest::Client::new(),
        )
        .with_base_url(server.uri());

        let err = client
            .complete(&Prompt::new("system").with_text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }
}
