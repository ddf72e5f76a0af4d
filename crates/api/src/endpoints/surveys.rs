//! Survey endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use chrono::{DateTime, FixedOffset};
use enquete_common::AppResult;
use enquete_core::{CreateSurveyInput, QuestionWithOptions, SurveyWithQuestions};
use enquete_db::entities::{question, question_option, survey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Create survey router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_survey))
        .route("/", get(list_surveys))
        .route("/mine", get(list_own_surveys))
        .route("/{id}", get(get_survey))
        .route("/{id}", delete(delete_survey))
}

/// Survey response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: String,
    pub owner_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<survey::Model> for SurveyResponse {
    fn from(s: survey::Model) -> Self {
        Self {
            id: s.id,
            owner_id: s.owner_id,
            title: s.title,
            description: s.description,
            created_at: s.created_at,
        }
    }
}

/// Question option response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResponse {
    pub id: String,
    pub text: String,
    pub order_index: i32,
}

impl From<question_option::Model> for OptionResponse {
    fn from(o: question_option::Model) -> Self {
        Self {
            id: o.id,
            text: o.text,
            order_index: o.order_index,
        }
    }
}

/// Question response with its options.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub text: String,
    pub question_type: question::QuestionType,
    pub allow_multiple: bool,
    pub order_index: i32,
    pub options: Vec<OptionResponse>,
}

impl From<QuestionWithOptions> for QuestionResponse {
    fn from(q: QuestionWithOptions) -> Self {
        Self {
            id: q.question.id,
            text: q.question.text,
            question_type: q.question.question_type,
            allow_multiple: q.question.allow_multiple,
            order_index: q.question.order_index,
            options: q.options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Survey response including its questions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetailResponse {
    pub id: String,
    pub owner_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub questions: Vec<QuestionResponse>,
}

impl From<SurveyWithQuestions> for SurveyDetailResponse {
    fn from(s: SurveyWithQuestions) -> Self {
        Self {
            id: s.survey.id,
            owner_id: s.survey.owner_id,
            title: s.survey.title,
            description: s.survey.description,
            created_at: s.survey.created_at,
            questions: s.questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// List surveys response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyListResponse {
    pub surveys: Vec<SurveyResponse>,
    pub total: u64,
}

/// List surveys query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSurveysQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Create a survey with its questions.
async fn create_survey(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateSurveyInput>,
) -> AppResult<ApiResponse<SurveyDetailResponse>> {
    // The owner comes from the token, never from the request body.
    input.owner_id = user.map(|u| u.id);

    let survey = state.survey_service.create(input).await?;

    info!(survey_id = %survey.survey.id, "Created survey");

    Ok(ApiResponse::ok(survey.into()))
}

/// List recent surveys.
async fn list_surveys(
    State(state): State<AppState>,
    Query(query): Query<ListSurveysQuery>,
) -> AppResult<ApiResponse<SurveyListResponse>> {
    let limit = query.limit.min(100);
    let surveys = state.survey_service.list(limit, query.offset).await?;

    let total = surveys.len() as u64;
    Ok(ApiResponse::ok(SurveyListResponse {
        surveys: surveys.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// List surveys owned by the authenticated user.
async fn list_own_surveys(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SurveyListResponse>> {
    let surveys = state.survey_service.list_by_owner(&user.id).await?;

    let total = surveys.len() as u64;
    Ok(ApiResponse::ok(SurveyListResponse {
        surveys: surveys.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get a survey with its questions.
async fn get_survey(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SurveyDetailResponse>> {
    let survey = state.survey_service.get_with_questions(&id).await?;

    Ok(ApiResponse::ok(survey.into()))
}

/// Delete a survey (owner only).
async fn delete_survey(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    info!(user_id = %user.id, survey_id = %id, "Deleting survey");

    state.survey_service.delete(&id, &user.id).await?;

    Ok(ApiResponse::ok(()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_detail_response_serialization() {
        let response = SurveyDetailResponse {
            id: "01h0000000000000000000srv1".to_string(),
            owner_id: None,
            title: "Team lunch".to_string(),
            description: Some("Pick a day".to_string()),
            created_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00+00:00").unwrap(),
            questions: vec![QuestionResponse {
                id: "01h0000000000000000000qst1".to_string(),
                text: "Which day?".to_string(),
                question_type: question::QuestionType::SingleChoice,
                allow_multiple: false,
                order_index: 0,
                options: vec![OptionResponse {
                    id: "01h0000000000000000000opt1".to_string(),
                    text: "Friday".to_string(),
                    order_index: 0,
                }],
            }],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"title\":\"Team lunch\""));
        assert!(json.contains("\"questionType\":\"single_choice\""));
        assert!(json.contains("\"allowMultiple\":false"));
        assert!(json.contains("\"orderIndex\":0"));
    }
}
