//! Response and answer repositories.

use std::sync::Arc;

use crate::entities::{Answer, Response, answer, response};
use enquete_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

/// Response repository for database operations.
#[derive(Clone)]
pub struct ResponseRepository {
    db: Arc<DatabaseConnection>,
}

impl ResponseRepository {
    /// Create a new response repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a response together with its answers in a single transaction.
    /// A submission is never half-recorded.
    pub async fn create_with_answers(
        &self,
        response: response::ActiveModel,
        answers: Vec<answer::ActiveModel>,
    ) -> AppResult<response::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = response
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !answers.is_empty() {
            Answer::insert_many(answers)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Get all responses to a survey.
    pub async fn find_by_survey(&self, survey_id: &str) -> AppResult<Vec<response::Model>> {
        Response::find()
            .filter(response::Column::SurveyId.eq(survey_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

}

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get all answers belonging to the given responses, oldest first.
    /// Ids are ULIDs, so ascending id follows insertion order.
    pub async fn find_by_responses(
        &self,
        response_ids: &[String],
    ) -> AppResult<Vec<answer::Model>> {
        if response_ids.is_empty() {
            return Ok(vec![]);
        }

        Answer::find()
            .filter(answer::Column::ResponseId.is_in(response_ids.to_vec()))
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_with_answers_commits_all_rows() {
        let response = response::Model {
            id: "resp1".to_string(),
            survey_id: "survey1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[response.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = ResponseRepository::new(db);

        let response_active = response::ActiveModel {
            id: Set("resp1".to_string()),
            survey_id: Set("survey1".to_string()),
            created_at: Set(Utc::now().into()),
        };
        let answers = vec![
            answer::ActiveModel {
                id: Set("a1".to_string()),
                response_id: Set("resp1".to_string()),
                question_id: Set("q1".to_string()),
                selected_option_id: Set(Some("o1".to_string())),
                answer_text: Set(None),
            },
            answer::ActiveModel {
                id: Set("a2".to_string()),
                response_id: Set("resp1".to_string()),
                question_id: Set("q2".to_string()),
                selected_option_id: Set(None),
                answer_text: Set(Some("4".to_string())),
            },
        ];

        let created = repo.create_with_answers(response_active, answers).await.unwrap();

        assert_eq!(created.id, "resp1");
        assert_eq!(created.survey_id, "survey1");
    }

    #[tokio::test]
    async fn test_find_by_responses_empty_input() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let result = repo.find_by_responses(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_survey_returns_rows() {
        let rows = vec![
            response::Model {
                id: "resp1".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
            response::Model {
                id: "resp2".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );

        let repo = ResponseRepository::new(db);
        let found = repo.find_by_survey("survey1").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "resp1");
        assert_eq!(found[1].id, "resp2");
    }
}
