//! Create survey, question and `question_option` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Survey::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Survey::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Survey::OwnerId).string_len(32))
                    .col(ColumnDef::new(Survey::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Survey::Description).text())
                    .col(
                        ColumnDef::new(Survey::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_survey_owner")
                            .from(Survey::Table, Survey::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (for listing a user's surveys)
        manager
            .create_index(
                Index::create()
                    .name("idx_survey_owner_id")
                    .table(Survey::Table)
                    .col(Survey::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for newest-first listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_survey_created_at")
                    .table(Survey::Table)
                    .col(Survey::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Question::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Question::SurveyId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Text).text().not_null())
                    .col(
                        ColumnDef::new(Question::QuestionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Question::AllowMultiple)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::OrderIndex).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_survey")
                            .from(Question::Table, Question::SurveyId)
                            .to(Survey::Table, Survey::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (survey_id, order_index) (ordered question fetches,
        // no duplicate positions within a survey)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_survey_order")
                    .table(Question::Table)
                    .col(Question::SurveyId)
                    .col(Question::OrderIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuestionOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionOption::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionOption::QuestionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionOption::Text).string_len(512).not_null())
                    .col(ColumnDef::new(QuestionOption::OrderIndex).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_option_question")
                            .from(QuestionOption::Table, QuestionOption::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (question_id, order_index) (ordered option fetches,
        // no duplicate positions within a question)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_option_question_order")
                    .table(QuestionOption::Table)
                    .col(QuestionOption::QuestionId)
                    .col(QuestionOption::OrderIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionOption::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Survey::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Survey {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    SurveyId,
    Text,
    QuestionType,
    AllowMultiple,
    OrderIndex,
}

#[derive(Iden)]
enum QuestionOption {
    Table,
    Id,
    QuestionId,
    Text,
    OrderIndex,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
