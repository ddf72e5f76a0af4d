//! Create response and answer tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Response::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Response::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Response::SurveyId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Response::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_survey")
                            .from(Response::Table, Response::SurveyId)
                            .to(Survey::Table, Survey::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: survey_id (for counting and listing submissions)
        manager
            .create_index(
                Index::create()
                    .name("idx_response_survey_id")
                    .table(Response::Table)
                    .col(Response::SurveyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Answer::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Answer::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Answer::ResponseId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::SelectedOptionId).string_len(32))
                    .col(ColumnDef::new(Answer::AnswerText).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_response")
                            .from(Answer::Table, Answer::ResponseId)
                            .to(Response::Table, Response::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_question")
                            .from(Answer::Table, Answer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_option")
                            .from(Answer::Table, Answer::SelectedOptionId)
                            .to(QuestionOption::Table, QuestionOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: response_id (for fetching a submission's answers)
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_response_id")
                    .table(Answer::Table)
                    .col(Answer::ResponseId)
                    .to_owned(),
            )
            .await?;

        // Index: question_id (for per-question aggregation)
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_question_id")
                    .table(Answer::Table)
                    .col(Answer::QuestionId)
                    .to_owned(),
            )
            .await?;

        // Every answer carries either a selected option or free text, never
        // both and never neither. The query builder cannot express CHECK
        // constraints, so add it directly.
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE answer
                ADD CONSTRAINT chk_answer_option_xor_text
                CHECK ((selected_option_id IS NULL) <> (answer_text IS NULL));
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Answer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Response::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Response {
    Table,
    Id,
    SurveyId,
    CreatedAt,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
    ResponseId,
    QuestionId,
    SelectedOptionId,
    AnswerText,
}

#[derive(Iden)]
enum Survey {
    Table,
    Id,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}

#[derive(Iden)]
enum QuestionOption {
    Table,
    Id,
}
