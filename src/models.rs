//! Data models and structures
//!
//! Defines the request/response bodies of the HTTP surface and the
//! process-wide configuration read from the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// `POST /analyze-rice-leaf` JSON body (plain analysis mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub suggestions: String,
}

/// `POST /agriculture-chatbot` JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotResponse {
    pub response: String,
}

/// `POST /weather-insights` JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInsightsResponse {
    pub insights: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotForm {
    pub query: String,
}

/// Weather readings submitted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub humidity: f64,
    pub windspeed: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::Gemini => "gemini-2.0-flash",
        }
    }
}

impl FromStr for AiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(Error::Config(format!(
                "Unknown AI_PROVIDER '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::OpenAi => write!(f, "openai"),
            AiProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// How `/analyze-rice-leaf` processes the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Single analysis call, JSON `{"suggestions": ...}` response.
    #[default]
    Plain,
    /// Analysis followed by a rewrite pass, `text/plain` response.
    Rewrite,
}

impl FromStr for AnalysisMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(AnalysisMode::Plain),
            "rewrite" => Ok(AnalysisMode::Rewrite),
            other => Err(Error::Config(format!(
                "Unknown analysis mode '{}'. Expected 'plain' or 'rewrite'",
                other
            ))),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Plain => write!(f, "plain"),
            AnalysisMode::Rewrite => write!(f, "rewrite"),
        }
    }
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub provider: AiProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub analysis_mode: AnalysisMode,
    pub max_upload_bytes: usize,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("AI_API_KEY")
            .or_else(|| lookup("CHRISKEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("AI_API_KEY not set".to_string()))?;

        let provider = match lookup("AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::OpenAi,
        };

        let model = lookup("AI_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let timeout_secs = match lookup("AI_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("AI_TIMEOUT_SECS must be an integer, got '{}'", value))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let analysis_mode = match lookup("ANALYSIS_MODE") {
            Some(value) => value.parse()?,
            None => AnalysisMode::default(),
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("MAX_UPLOAD_BYTES must be an integer, got '{}'", value))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            api_key,
            provider,
            model,
            base_url: lookup("AI_BASE_URL"),
            timeout: Duration::from_secs(timeout_secs),
            analysis_mode,
            max_upload_bytes,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}
