//! Completion API integration
//!
//! Provides a provider-neutral prompt type and the [`CompletionService`]
//! trait, with OpenAI and Gemini implementations plus a mock for tests.

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod openai;

pub use gemini::GeminiCompletionClient;
pub use mime::EncodedImage;
pub use mock::MockCompletionClient;
pub use openai::OpenAiCompletionClient;

use crate::models::{AiProvider, Config};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One piece of user content in a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Image(EncodedImage),
}

/// A system instruction plus ordered user content, sent as one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: Vec<PromptPart>,
    pub temperature: f32,
}

impl Prompt {
    /// Start a prompt with deterministic sampling.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: Vec::new(),
            temperature: 0.0,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.user.push(PromptPart::Text(text.into()));
        self
    }

    pub fn with_image(mut self, image: EncodedImage) -> Self {
        self.user.push(PromptPart::Image(image));
        self
    }

    /// All user text parts joined by newlines.
    pub fn user_text(&self) -> String {
        self.user
            .iter()
            .filter_map(|part| match part {
                PromptPart::Text(text) => Some(text.as_str()),
                PromptPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_image(&self) -> bool {
        self.user
            .iter()
            .any(|part| matches!(part, PromptPart::Image(_)))
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the prompt and return the generated text.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// Build the completion client selected by the configuration.
///
/// One `reqwest::Client` (and its connection pool) is shared by every
/// request the service makes.
pub fn build_completion_client(config: &Config) -> Arc<dyn CompletionService> {
    let http_client = reqwest::Client::new();

    let client: Arc<dyn CompletionService> = match config.provider {
        AiProvider::OpenAi => {
            let mut client = OpenAiCompletionClient::new_with_client(
                config.api_key.clone(),
                config.model.clone(),
                config.timeout,
                http_client,
            );
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
        AiProvider::Gemini => {
            let mut client = GeminiCompletionClient::new_with_client(
                config.api_key.clone(),
                config.model.clone(),
                config.timeout,
                http_client,
            );
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Arc::new(client)
        }
    };

    tracing::info!(
        "Completion provider: {} (model: {})",
        config.provider,
        config.model
    );

    client
}
