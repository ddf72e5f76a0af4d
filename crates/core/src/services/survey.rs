//! Survey service.

use std::collections::HashMap;

use chrono::Utc;
use enquete_common::{AppError, AppResult, IdGenerator};
use enquete_db::{
    entities::{question, question_option, survey},
    repositories::{QuestionRepository, SurveyRepository},
};
use sea_orm::Set;

use crate::services::draft::CreateSurveyInput;

/// A survey with its questions and options in authoring order.
#[derive(Debug, Clone)]
pub struct SurveyWithQuestions {
    pub survey: survey::Model,
    pub questions: Vec<QuestionWithOptions>,
}

/// A question with its options in authoring order.
#[derive(Debug, Clone)]
pub struct QuestionWithOptions {
    pub question: question::Model,
    pub options: Vec<question_option::Model>,
}

/// Survey service for business logic.
#[derive(Clone)]
pub struct SurveyService {
    survey_repo: SurveyRepository,
    question_repo: QuestionRepository,
    id_gen: IdGenerator,
}

impl SurveyService {
    /// Create a new survey service.
    #[must_use]
    pub const fn new(survey_repo: SurveyRepository, question_repo: QuestionRepository) -> Self {
        Self {
            survey_repo,
            question_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate and persist a survey with its questions and options.
    ///
    /// All rows are written in one transaction, then the stored survey is
    /// read back with its children.
    pub async fn create(&self, input: CreateSurveyInput) -> AppResult<SurveyWithQuestions> {
        input.validate()?;

        let survey_id = self.id_gen.generate();
        let survey_model = survey::ActiveModel {
            id: Set(survey_id.clone()),
            owner_id: Set(input.owner_id),
            title: Set(input.title),
            description: Set(input.description),
            created_at: Set(Utc::now().into()),
        };

        let mut question_models = Vec::with_capacity(input.questions.len());
        let mut option_models = Vec::new();

        for (question_index, question_input) in input.questions.into_iter().enumerate() {
            let question_id = self.id_gen.generate();

            // Options only exist for choice questions; the draft has already
            // dropped blank ones.
            if question_input.question_type.is_choice() {
                for (option_index, text) in question_input.options.into_iter().enumerate() {
                    option_models.push(question_option::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        question_id: Set(question_id.clone()),
                        text: Set(text),
                        order_index: Set(option_index as i32),
                    });
                }
            }

            let allow_multiple =
                question_input.question_type == question::QuestionType::MultiChoice;
            question_models.push(question::ActiveModel {
                id: Set(question_id),
                survey_id: Set(survey_id.clone()),
                text: Set(question_input.text),
                question_type: Set(question_input.question_type),
                allow_multiple: Set(allow_multiple),
                order_index: Set(question_index as i32),
            });
        }

        self.survey_repo
            .create_with_children(survey_model, question_models, option_models)
            .await?;

        self.get_with_questions(&survey_id).await
    }

    /// Get a survey with its questions and options.
    pub async fn get_with_questions(&self, id: &str) -> AppResult<SurveyWithQuestions> {
        let survey = self.survey_repo.get_by_id(id).await?;
        let questions = self.question_repo.find_by_survey(id).await?;

        let question_ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let options = self
            .question_repo
            .find_options_by_questions(&question_ids)
            .await?;

        let mut options_by_question: HashMap<String, Vec<question_option::Model>> = HashMap::new();
        for option in options {
            options_by_question
                .entry(option.question_id.clone())
                .or_default()
                .push(option);
        }

        let questions = questions
            .into_iter()
            .map(|q| {
                let options = options_by_question.remove(&q.id).unwrap_or_default();
                QuestionWithOptions {
                    question: q,
                    options,
                }
            })
            .collect();

        Ok(SurveyWithQuestions { survey, questions })
    }

    /// Get recent surveys, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<survey::Model>> {
        self.survey_repo.find_recent(limit, offset).await
    }

    /// Get surveys owned by a user, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<survey::Model>> {
        self.survey_repo.find_by_owner(owner_id).await
    }

    /// Delete a survey. Only its owner may do so; ownerless surveys cannot
    /// be deleted through the API at all.
    pub async fn delete(&self, id: &str, requester_id: &str) -> AppResult<()> {
        let survey = self.survey_repo.get_by_id(id).await?;

        if survey.owner_id.as_deref() != Some(requester_id) {
            return Err(AppError::Forbidden(
                "Only the owner can delete a survey".to_string(),
            ));
        }

        self.survey_repo.delete(id).await
    }
}
