//! Answer entity, one row per answered question (or per selected option).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub response_id: String,

    #[sea_orm(indexed)]
    pub question_id: String,

    /// Selected option for choice questions.
    /// Exactly one of `selected_option_id` and `answer_text` is set
    /// (CHECK constraint).
    #[sea_orm(nullable)]
    pub selected_option_id: Option<String>,

    /// Free text, or the rating rendered as a string ("1".."5")
    #[sea_orm(column_type = "Text", nullable)]
    pub answer_text: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::response::Entity",
        from = "Column::ResponseId",
        to = "super::response::Column::Id",
        on_delete = "Cascade"
    )]
    Response,

    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id",
        on_delete = "Cascade"
    )]
    Question,

    #[sea_orm(
        belongs_to = "super::question_option::Entity",
        from = "Column::SelectedOptionId",
        to = "super::question_option::Column::Id",
        on_delete = "Cascade"
    )]
    SelectedOption,
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::question_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SelectedOption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
