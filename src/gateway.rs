//! The three gateway operations, independent of HTTP.

use crate::ai::{mime, CompletionService, Prompt};
use crate::models::WeatherReading;
use crate::pipeline::LeafPipeline;
use crate::{prompts, Result};

/// Validate and encode the upload, then run it through the leaf pipeline.
pub async fn analyze_leaf(
    ai: &dyn CompletionService,
    pipeline: &LeafPipeline,
    image_bytes: Vec<u8>,
) -> Result<String> {
    tracing::info!("Analyzing rice leaf image ({} bytes)", image_bytes.len());

    let image = mime::encode_image_blocking(image_bytes).await?;
    pipeline.run(ai, &image).await
}

/// Forward the farmer's question verbatim under the agriculture-only instruction.
pub async fn agriculture_chatbot(ai: &dyn CompletionService, query: &str) -> Result<String> {
    tracing::info!("Answering chatbot query ({} chars)", query.chars().count());

    let prompt = Prompt::new(prompts::CHATBOT_SYSTEM).with_text(query);
    ai.complete(&prompt).await
}

pub fn weather_prompt(reading: &WeatherReading) -> Prompt {
    Prompt::new(prompts::WEATHER_SYSTEM).with_text(prompts::weather_user(reading))
}

pub async fn weather_insights(
    ai: &dyn CompletionService,
    reading: &WeatherReading,
) -> Result<String> {
    tracing::info!(
        "Generating weather insights (temperature={}, humidity={}, windspeed={}, pressure={})",
        reading.temperature,
        reading.humidity,
        reading.windspeed,
        reading.pressure
    );

    ai.complete(&weather_prompt(reading)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mime::test_images;
    use crate::ai::{MockCompletionClient, PromptPart};
    use crate::models::AnalysisMode;
    use crate::Error;
    use image::ImageFormat;

    #[tokio::test]
    async fn test_analyze_leaf_returns_model_text() {
        let ai = MockCompletionClient::new().with_response("Healthy leaf, no action needed.");
        let pipeline = LeafPipeline::for_mode(AnalysisMode::Plain);

        let text = analyze_leaf(&ai, &pipeline, test_images::leaf(ImageFormat::Png))
            .await
            .unwrap();

        assert_eq!(text, "Healthy leaf, no action needed.");
        assert_eq!(ai.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_analyze_leaf_rejects_bad_uploads_without_calling_api() {
        let ai = MockCompletionClient::new();
        let pipeline = LeafPipeline::for_mode(AnalysisMode::Plain);

        for upload in [Vec::new(), b"GIF89a-but-truncated".to_vec(), b"not an image at all".to_vec()] {
            let err = analyze_leaf(&ai, &pipeline, upload).await.unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)));
        }
        assert_eq!(ai.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_chatbot_forwards_query_verbatim() {
        for query in ["", "normal query"] {
            let ai = MockCompletionClient::new();
            agriculture_chatbot(&ai, query).await.unwrap();

            let prompts = ai.prompts();
            assert_eq!(prompts.len(), 1);
            assert_eq!(prompts[0].system, prompts::CHATBOT_SYSTEM);
            assert_eq!(prompts[0].user, vec![PromptPart::Text(query.to_string())]);
        }
    }

    #[tokio::test]
    async fn test_weather_prompt_has_units() {
        let ai = MockCompletionClient::new().with_response("Drain the field.");
        let reading = WeatherReading {
            temperature: 30.0,
            humidity: 80.0,
            windspeed: 5.0,
            pressure: 1012.0,
        };

        assert_eq!(
            weather_insights(&ai, &reading).await.unwrap(),
            "Drain the field."
        );

        let user = ai.prompts()[0].user_text();
        for expected in ["30.0°C", "80.0%", "5.0 m/s", "1012.0 hPa"] {
            assert!(user.contains(expected), "missing {expected} in {user}");
        }
    }
}
