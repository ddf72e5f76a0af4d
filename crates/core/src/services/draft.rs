//! Survey draft builder.
//!
//! An in-memory survey under construction. The draft accumulates questions
//! through [`QuestionOp`] edits, then [`SurveyDraft::commit`] validates the
//! whole draft and produces a [`CreateSurveyInput`] ready for persistence.

use enquete_db::entities::question::QuestionType;
use serde::Deserialize;
use thiserror::Error;

/// Why a draft cannot be committed.
///
/// Variants carry the 0-based question position where the problem was found;
/// messages render it 1-based for humans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Survey title cannot be empty")]
    EmptyTitle,

    #[error("Survey must have at least one question")]
    NoQuestions,

    #[error("Question {} text cannot be empty", .position + 1)]
    EmptyQuestionText { position: usize },

    #[error("Question {} must have at least 2 options", .position + 1)]
    InsufficientOptions { position: usize },
}

impl From<DraftError> for enquete_common::AppError {
    fn from(err: DraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A single edit to one question of a draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QuestionOp {
    /// Replace the question text.
    SetText { text: String },
    /// Change the question type. Switching to a choice type seeds two blank
    /// options if the question has none yet.
    SetType { question_type: QuestionType },
    /// Toggle multi-select. Only meaningful on choice questions, where it
    /// also flips the type between single and multi choice.
    SetAllowMultiple { allow_multiple: bool },
    /// Replace all options at once.
    SetOptions { options: Vec<String> },
    /// Append one blank option.
    AddOption,
    /// Remove the option at `index`. Out-of-range indexes are ignored.
    RemoveOption { index: usize },
    /// Replace the text of the option at `index`.
    SetOption { index: usize, text: String },
}

/// One question being authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub question_type: QuestionType,
    pub allow_multiple: bool,
    pub options: Vec<String>,
}

impl QuestionDraft {
    fn blank() -> Self {
        Self {
            text: String::new(),
            question_type: QuestionType::FreeText,
            allow_multiple: false,
            options: vec![],
        }
    }
}

/// A survey being authored.
#[derive(Debug, Clone)]
pub struct SurveyDraft {
    title: String,
    description: String,
    questions: Vec<QuestionDraft>,
}

impl Default for SurveyDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyDraft {
    /// Create a draft with a single blank free-text question.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            questions: vec![QuestionDraft::blank()],
        }
    }

    /// Set the survey title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Set the survey description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The questions authored so far.
    #[must_use]
    pub fn questions(&self) -> &[QuestionDraft] {
        &self.questions
    }

    /// Append a blank free-text question.
    pub fn add_question(&mut self) {
        self.questions.push(QuestionDraft::blank());
    }

    /// Remove the question at `index`. The last remaining question is never
    /// removed; out-of-range indexes are ignored.
    pub fn remove_question(&mut self, index: usize) {
        if self.questions.len() > 1 && index < self.questions.len() {
            self.questions.remove(index);
        }
    }

    /// Apply one edit to the question at `index`. Edits addressed to
    /// questions that do not exist are ignored.
    pub fn apply(&mut self, index: usize, op: QuestionOp) {
        let Some(question) = self.questions.get_mut(index) else {
            return;
        };

        match op {
            QuestionOp::SetText { text } => question.text = text,
            QuestionOp::SetType { question_type } => {
                if question_type.is_choice() && question.options.is_empty() {
                    question.options = vec![String::new(), String::new()];
                }
                question.allow_multiple = question_type == QuestionType::MultiChoice;
                question.question_type = question_type;
            }
            QuestionOp::SetAllowMultiple { allow_multiple } => {
                if question.question_type.is_choice() {
                    question.allow_multiple = allow_multiple;
                    question.question_type = if allow_multiple {
                        QuestionType::MultiChoice
                    } else {
                        QuestionType::SingleChoice
                    };
                }
            }
            QuestionOp::SetOptions { options } => question.options = options,
            QuestionOp::AddOption => question.options.push(String::new()),
            QuestionOp::RemoveOption { index } => {
                if index < question.options.len() {
                    question.options.remove(index);
                }
            }
            QuestionOp::SetOption { index, text } => {
                if let Some(option) = question.options.get_mut(index) {
                    *option = text;
                }
            }
        }
    }

    /// Validate the draft and turn it into a [`CreateSurveyInput`].
    ///
    /// Blank options are dropped here; everything else is carried verbatim.
    pub fn commit(&self, owner_id: Option<String>) -> Result<CreateSurveyInput, DraftError> {
        let input = CreateSurveyInput {
            owner_id,
            title: self.title.clone(),
            description: if self.description.trim().is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
            questions: self
                .questions
                .iter()
                .map(|q| CreateQuestionInput {
                    text: q.text.clone(),
                    question_type: q.question_type.clone(),
                    options: q
                        .options
                        .iter()
                        .filter(|o| !o.trim().is_empty())
                        .cloned()
                        .collect(),
                })
                .collect(),
        };

        input.validate()?;
        Ok(input)
    }
}

/// Validated input for creating a survey with its questions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyInput {
    #[serde(default)]
    pub owner_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<CreateQuestionInput>,
}

/// One question of a [`CreateSurveyInput`].
///
/// Multi-select is expressed through `question_type` alone; the stored
/// `allow_multiple` flag is derived from it at persistence time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionInput {
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
}

impl CreateSurveyInput {
    /// Check the authoring rules, in order: title, question count, question
    /// texts, option counts for choice questions.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::EmptyTitle);
        }

        if self.questions.is_empty() {
            return Err(DraftError::NoQuestions);
        }

        for (position, question) in self.questions.iter().enumerate() {
            if question.text.trim().is_empty() {
                return Err(DraftError::EmptyQuestionText { position });
            }
        }

        for (position, question) in self.questions.iter().enumerate() {
            if question.question_type.is_choice() {
                let filled = question
                    .options
                    .iter()
                    .filter(|o| !o.trim().is_empty())
                    .count();
                if filled < 2 {
                    return Err(DraftError::InsufficientOptions { position });
                }
            }
        }

        Ok(())
    }
}
