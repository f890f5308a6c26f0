//! Leaf analysis pipeline
//!
//! The analysis endpoint runs an ordered list of completion stages: an
//! analysis of the uploaded image, optionally followed by a rewrite pass
//! over the analysis text. Which stages run is a configuration choice.

use crate::ai::{CompletionService, EncodedImage, Prompt};
use crate::models::AnalysisMode;
use crate::{prompts, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Image plus instruction in, diagnosis text out.
    Analyze,
    /// Previous stage's text in, clearer text out.
    Rewrite,
}

impl Stage {
    fn prompt(self, image: &EncodedImage, previous: Option<&str>) -> Result<Prompt> {
        match (self, previous) {
            (Stage::Analyze, _) => Ok(Prompt::new(prompts::ANALYZE_SYSTEM)
                .with_text(prompts::ANALYZE_USER)
                .with_image(image.clone())),
            (Stage::Rewrite, Some(text)) => {
                Ok(Prompt::new(prompts::REWRITE_SYSTEM).with_text(prompts::rewrite_user(text)))
            }
            (Stage::Rewrite, None) => Err(Error::Invariant(
                "Rewrite stage has no previous output to rewrite".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPipeline {
    stages: Vec<Stage>,
}

impl LeafPipeline {
    pub fn for_mode(mode: AnalysisMode) -> Self {
        let stages = match mode {
            AnalysisMode::Plain => vec![Stage::Analyze],
            AnalysisMode::Rewrite => vec![Stage::Analyze, Stage::Rewrite],
        };
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order, feeding each stage's output to the next.
    pub async fn run(&self, ai: &dyn CompletionService, image: &EncodedImage) -> Result<String> {
        let mut output: Option<String> = None;

        for (index, stage) in self.stages.iter().enumerate() {
            let prompt = stage.prompt(image, output.as_deref())?;
            tracing::debug!("Running leaf pipeline stage {} ({:?})", index + 1, stage);
            output = Some(ai.complete(&prompt).await?);
        }

        output.ok_or_else(|| Error::Invariant("Leaf pipeline has no stages".to_string()))
    }
}
