use super::extract::FormFields;
use super::AppState;
use crate::models::{
    AnalysisMode, ChatbotForm, ChatbotResponse, ImageResponse, WeatherInsightsResponse,
    WeatherReading,
};
use crate::{gateway, Error, Result};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

const UPLOAD_FIELD: &str = "file";

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn upload_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::PayloadTooLarge(err.body_text());
    }
    tracing::warn!("Failed to read uploaded file: {}", err);
    Error::BadRequest("Invalid image file".to_string())
}

/// Read the bytes of the `file` field; other fields are skipped.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok(bytes.to_vec());
    }

    Err(Error::BadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

pub async fn analyze_rice_leaf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let multipart = multipart.map_err(|e| Error::BadRequest(e.body_text()))?;
    let image_bytes = read_upload(multipart).await?;

    let suggestions =
        gateway::analyze_leaf(state.ai.as_ref(), &state.pipeline, image_bytes).await?;

    Ok(match state.analysis_mode {
        AnalysisMode::Plain => Json(ImageResponse { suggestions }).into_response(),
        AnalysisMode::Rewrite => suggestions.into_response(),
    })
}

pub async fn agriculture_chatbot(
    State(state): State<AppState>,
    FormFields(form): FormFields<ChatbotForm>,
) -> Result<Json<ChatbotResponse>> {
    let response = gateway::agriculture_chatbot(state.ai.as_ref(), &form.query).await?;
    Ok(Json(ChatbotResponse { response }))
}

pub async fn weather_insights(
    State(state): State<AppState>,
    FormFields(reading): FormFields<WeatherReading>,
) -> Result<Json<WeatherInsightsResponse>> {
    let insights = gateway::weather_insights(state.ai.as_ref(), &reading).await?;
    Ok(Json(WeatherInsightsResponse { insights }))
}
