//! Response service.
//!
//! Accepts survey submissions, validates them against the survey's
//! questions, and records one response row plus one answer row per
//! selected option or entered value.

use std::collections::{HashMap, HashSet};

use enquete_common::{AppError, AppResult};
use enquete_db::{
    entities::{answer, question, question::QuestionType, question_option, response},
    repositories::{QuestionRepository, ResponseRepository, SurveyRepository},
};
use sea_orm::Set;
use serde::Deserialize;

/// One submitted answer, keyed by question ID in the request body.
///
/// Multi-choice questions send a list of option IDs, ratings send a
/// number, and everything else sends a single string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerInput {
    /// Option IDs selected on a multi-choice question.
    Multiple(Vec<String>),
    /// A rating value.
    Number(i64),
    /// An option ID or free text.
    Single(String),
}

impl AnswerInput {
    /// Whether this input carries any content at all.
    ///
    /// An empty string and an empty list count as unanswered; whitespace
    /// does not.
    fn is_answered(&self) -> bool {
        match self {
            Self::Multiple(items) => !items.is_empty(),
            Self::Number(_) => true,
            Self::Single(text) => !text.is_empty(),
        }
    }
}

/// One validated answer row, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnswerRow {
    question_id: String,
    selected_option_id: Option<String>,
    answer_text: Option<String>,
}

/// Response service for business logic.
#[derive(Clone)]
pub struct ResponseService {
    survey_repo: SurveyRepository,
    question_repo: QuestionRepository,
    response_repo: ResponseRepository,
}

impl ResponseService {
    /// Create a new response service.
    #[must_use]
    pub const fn new(
        survey_repo: SurveyRepository,
        question_repo: QuestionRepository,
        response_repo: ResponseRepository,
    ) -> Self {
        Self {
            survey_repo,
            question_repo,
            response_repo,
        }
    }

    /// Validate and record an anonymous submission.
    ///
    /// Every question must be answered; a submission with unanswered
    /// questions is rejected with their IDs and nothing is written.
    /// Answers referencing unknown questions or options never reach the
    /// database either.
    pub async fn submit(
        &self,
        survey_id: &str,
        answers: HashMap<String, AnswerInput>,
    ) -> AppResult<response::Model> {
        let survey = self.survey_repo.get_by_id(survey_id).await?;
        let questions = self.question_repo.find_by_survey(&survey.id).await?;

        let question_ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let options = self
            .question_repo
            .find_options_by_questions(&question_ids)
            .await?;

        // Completeness first, then shape.
        let unanswered = unanswered_question_ids(&questions, &answers);
        if !unanswered.is_empty() {
            return Err(AppError::IncompleteSubmission(unanswered));
        }

        for question_id in answers.keys() {
            if !questions.iter().any(|q| &q.id == question_id) {
                return Err(AppError::Validation(format!(
                    "Unknown question: {question_id}"
                )));
            }
        }

        let rows = build_answer_rows(&questions, &options, &answers)?;

        let response_id = crate::generate_id();
        let response_model = response::ActiveModel {
            id: Set(response_id.clone()),
            survey_id: Set(survey.id),
            ..Default::default()
        };

        let answer_models = rows
            .into_iter()
            .map(|row| answer::ActiveModel {
                id: Set(crate::generate_id()),
                response_id: Set(response_id.clone()),
                question_id: Set(row.question_id),
                selected_option_id: Set(row.selected_option_id),
                answer_text: Set(row.answer_text),
            })
            .collect();

        self.response_repo
            .create_with_answers(response_model, answer_models)
            .await
    }
}

/// IDs of questions without a usable answer, in question order.
fn unanswered_question_ids(
    questions: &[question::Model],
    answers: &HashMap<String, AnswerInput>,
) -> Vec<String> {
    questions
        .iter()
        .filter(|q| !answers.get(&q.id).is_some_and(AnswerInput::is_answered))
        .map(|q| q.id.clone())
        .collect()
}

/// Turn a complete set of answers into persistable rows.
///
/// Choice answers become one row per selected option; ratings and free
/// text become one row carrying the value as text.
fn build_answer_rows(
    questions: &[question::Model],
    options: &[question_option::Model],
    answers: &HashMap<String, AnswerInput>,
) -> AppResult<Vec<AnswerRow>> {
    let mut option_ids_by_question: HashMap<&str, HashSet<&str>> = HashMap::new();
    for option in options {
        option_ids_by_question
            .entry(option.question_id.as_str())
            .or_default()
            .insert(option.id.as_str());
    }

    let mut rows = Vec::new();
    for question in questions {
        let Some(answer) = answers.get(&question.id) else {
            continue;
        };
        let valid_options = option_ids_by_question.get(question.id.as_str());

        match question.question_type {
            QuestionType::MultiChoice => {
                let AnswerInput::Multiple(selected) = answer else {
                    return Err(AppError::Validation(format!(
                        "Question {} expects a list of option ids",
                        question.id
                    )));
                };
                for option_id in selected {
                    if !valid_options.is_some_and(|ids| ids.contains(option_id.as_str())) {
                        return Err(AppError::Validation(format!(
                            "Unknown option {} for question {}",
                            option_id, question.id
                        )));
                    }
                    rows.push(AnswerRow {
                        question_id: question.id.clone(),
                        selected_option_id: Some(option_id.clone()),
                        answer_text: None,
                    });
                }
            }
            QuestionType::SingleChoice => {
                let AnswerInput::Single(option_id) = answer else {
                    return Err(AppError::Validation(format!(
                        "Question {} expects a single option id",
                        question.id
                    )));
                };
                if !valid_options.is_some_and(|ids| ids.contains(option_id.as_str())) {
                    return Err(AppError::Validation(format!(
                        "Unknown option {} for question {}",
                        option_id, question.id
                    )));
                }
                rows.push(AnswerRow {
                    question_id: question.id.clone(),
                    selected_option_id: Some(option_id.clone()),
                    answer_text: None,
                });
            }
            QuestionType::Rating => {
                let rating = match answer {
                    AnswerInput::Number(n) => Some(*n),
                    AnswerInput::Single(text) => text.parse::<i64>().ok(),
                    AnswerInput::Multiple(_) => None,
                };
                let rating = rating.filter(|r| (1..=5).contains(r)).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Question {} expects a rating from 1 to 5",
                        question.id
                    ))
                })?;
                rows.push(AnswerRow {
                    question_id: question.id.clone(),
                    selected_option_id: None,
                    answer_text: Some(rating.to_string()),
                });
            }
            QuestionType::FreeText => {
                let AnswerInput::Single(text) = answer else {
                    return Err(AppError::Validation(format!(
                        "Question {} expects free text",
                        question.id
                    )));
                };
                rows.push(AnswerRow {
                    question_id: question.id.clone(),
                    selected_option_id: None,
                    answer_text: Some(text.clone()),
                });
            }
        }
    }

    Ok(rows)
}
