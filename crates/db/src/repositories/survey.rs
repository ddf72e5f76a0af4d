//! Survey and question repositories.

use std::sync::Arc;

use crate::entities::{Question, QuestionOption, Survey, question, question_option, survey};
use enquete_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};

/// Survey repository for database operations.
#[derive(Clone)]
pub struct SurveyRepository {
    db: Arc<DatabaseConnection>,
}

impl SurveyRepository {
    /// Create a new survey repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a survey by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<survey::Model>> {
        Survey::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a survey by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<survey::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::SurveyNotFound(id.to_string()))
    }

    /// Get recent surveys, newest first (paginated).
    pub async fn find_recent(&self, limit: u64, offset: u64) -> AppResult<Vec<survey::Model>> {
        Survey::find()
            .order_by_desc(survey::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get surveys owned by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<survey::Model>> {
        Survey::find()
            .filter(survey::Column::OwnerId.eq(owner_id))
            .order_by_desc(survey::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a survey together with its questions and options in a single
    /// transaction. Either every row lands or none do.
    pub async fn create_with_children(
        &self,
        survey: survey::ActiveModel,
        questions: Vec<question::ActiveModel>,
        options: Vec<question_option::ActiveModel>,
    ) -> AppResult<survey::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = survey
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !questions.is_empty() {
            Question::insert_many(questions)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !options.is_empty() {
            QuestionOption::insert_many(options)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Delete a survey. Questions, options, responses and answers go with it
    /// via cascading foreign keys.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Survey::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a survey's questions in authoring order.
    pub async fn find_by_survey(&self, survey_id: &str) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::SurveyId.eq(survey_id))
            .order_by_asc(question::Column::OrderIndex)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the options of the given questions in authoring order.
    pub async fn find_options_by_questions(
        &self,
        question_ids: &[String],
    ) -> AppResult<Vec<question_option::Model>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        QuestionOption::find()
            .filter(question_option::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(question_option::Column::OrderIndex)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
