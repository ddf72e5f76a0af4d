//! Survey results endpoints.

use axum::{Router, extract::Path, extract::State, routing::get};
use enquete_common::AppResult;
use enquete_core::{OptionTally, QuestionResults, QuestionTally, RatingBucket, SurveyResults};
use serde::Serialize;

use crate::{endpoints::surveys::SurveyResponse, middleware::AppState, response::ApiResponse};

/// Create results router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/results", get(get_results))
}

/// Aggregated results for a survey.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResultsResponse {
    pub survey: SurveyResponse,
    pub responses_count: u64,
    pub questions: Vec<QuestionResultsResponse>,
}

impl From<SurveyResults> for SurveyResultsResponse {
    fn from(r: SurveyResults) -> Self {
        Self {
            survey: r.survey.into(),
            responses_count: r.responses_count,
            questions: r.questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-question tally.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResultsResponse {
    pub id: String,
    pub text: String,
    pub question_type: enquete_db::entities::question::QuestionType,
    pub order_index: i32,
    #[serde(flatten)]
    pub tally: TallyResponse,
}

impl From<QuestionResults> for QuestionResultsResponse {
    fn from(q: QuestionResults) -> Self {
        Self {
            id: q.question.id,
            text: q.question.text,
            question_type: q.question.question_type,
            order_index: q.question.order_index,
            tally: q.tally.into(),
        }
    }
}

/// Tally payload, shaped by the question type.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TallyResponse {
    /// Free text answers in arrival order.
    FreeText { entries: Vec<String> },
    /// Per-option counts and shares.
    Choice { options: Vec<OptionTallyResponse> },
    /// Rating histogram and mean.
    Rating {
        buckets: Vec<RatingBucketResponse>,
        average: f64,
    },
}

impl From<QuestionTally> for TallyResponse {
    fn from(tally: QuestionTally) -> Self {
        match tally {
            QuestionTally::FreeText { entries } => Self::FreeText { entries },
            QuestionTally::Choice { options } => Self::Choice {
                options: options.into_iter().map(Into::into).collect(),
            },
            QuestionTally::Rating { buckets, average } => Self::Rating {
                buckets: buckets.into_iter().map(Into::into).collect(),
                average,
            },
        }
    }
}

/// Tally for one option.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTallyResponse {
    pub option_id: String,
    pub text: String,
    pub count: usize,
    pub percentage: f64,
}

impl From<OptionTally> for OptionTallyResponse {
    fn from(o: OptionTally) -> Self {
        Self {
            option_id: o.option_id,
            text: o.text,
            count: o.count,
            percentage: o.percentage,
        }
    }
}

/// Tally for one rating value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucketResponse {
    pub rating: u8,
    pub count: usize,
    pub percentage: f64,
}

impl From<RatingBucket> for RatingBucketResponse {
    fn from(b: RatingBucket) -> Self {
        Self {
            rating: b.rating,
            count: b.count,
            percentage: b.percentage,
        }
    }
}

/// Get aggregated results for a survey.
async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SurveyResultsResponse>> {
    let results = state.results_service.results(&id).await?;

    Ok(ApiResponse::ok(results.into()))
}
