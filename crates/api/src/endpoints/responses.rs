//! Response submission endpoints.

use std::collections::HashMap;

use axum::{Json, Router, extract::Path, extract::State, routing::post};
use chrono::{DateTime, FixedOffset};
use enquete_common::AppResult;
use enquete_core::AnswerInput;
use enquete_db::entities::response;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{middleware::AppState, response::ApiResponse};

/// Create response router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/responses", post(submit_response))
}

/// Submit response request.
///
/// Answers are keyed by question ID. The value shape depends on the
/// question type: a string for free text and single choice, an array of
/// option IDs for multi choice, a number for ratings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub answers: HashMap<String, AnswerInput>,
}

/// Submitted response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseResponse {
    pub id: String,
    pub survey_id: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<response::Model> for ResponseResponse {
    fn from(r: response::Model) -> Self {
        Self {
            id: r.id,
            survey_id: r.survey_id,
            created_at: r.created_at,
        }
    }
}

/// Submit a response to a survey.
async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitResponseRequest>,
) -> AppResult<ApiResponse<ResponseResponse>> {
    let response = state.response_service.submit(&id, req.answers).await?;

    info!(survey_id = %id, response_id = %response.id, "Recorded response");

    Ok(ApiResponse::ok(response.into()))
}
