use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::{CompletionService, Prompt, PromptPart};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiCompletionClient {
    http: GeminiHttpClient,
}

impl GeminiCompletionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, Duration::from_secs(60), reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(prompt: &Prompt) -> GenerateContentRequest {
        let parts = prompt
            .user
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text { text: text.clone() },
                PromptPart::Image(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.to_string(),
                        data: image.data.clone(),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.system.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                temperature: prompt.temperature,
            }),
        }
    }

    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        response.candidates.first().and_then(|c| {
            c.content.parts.iter().find_map(|p| match p {
                Part::Text { text } => Some(text.clone()),
                Part::InlineData { .. } => None,
            })
        })
    }
}

#[async_trait]
impl CompletionService for GeminiCompletionClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        tracing::debug!(
            "Sending generateContent to Gemini (model: {}, image: {})",
            self.http.model(),
            prompt.has_image()
        );

        let response: GenerateContentResponse = self
            .http
            .generate_content(&Self::build_request(prompt))
            .await?;

        Self::extract_text(&response)
            .ok_or_else(|| Error::AiProvider("No text in Gemini response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EncodedImage;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn make_client(server: &MockServer) -> GeminiCompletionClient {
        GeminiCompletionClient::new("test-key".to_string(), "models/gemini-2.0-flash".to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_complete_sends_system_instruction_and_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "system_instruction": { "parts": [{ "text": "doctor" }] },
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Analyze." },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4A" } }
                    ]
                }],
                "generationConfig": { "temperature": 0.0 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Blast lesions visible." }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = Prompt::new("doctor")
            .with_text("Analyze.")
            .with_image(EncodedImage {
                mime_type: "image/jpeg",
                data: "/9j/4A".to_string(),
            });

        let text = make_client(&server).complete(&prompt).await.unwrap();
        assert_eq!(text, "Blast lesions visible.");
    }

    #[tokio::test]
    async fn test_no_candidates_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .complete(&Prompt::new("s").with_text("u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .complete(&Prompt::new("s").with_text("u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
