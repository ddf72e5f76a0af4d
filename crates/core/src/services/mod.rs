//! Business logic services.

#![allow(missing_docs)]

pub mod draft;
pub mod response;
pub mod results;
pub mod survey;
pub mod user;

pub use draft::{
    CreateQuestionInput, CreateSurveyInput, DraftError, QuestionDraft, QuestionOp, SurveyDraft,
};
pub use response::{AnswerInput, ResponseService};
pub use results::{
    OptionTally, QuestionResults, QuestionTally, RatingBucket, ResultsService, SurveyResults,
    aggregate,
};
pub use survey::{QuestionWithOptions, SurveyService, SurveyWithQuestions};
pub use user::{CreateUserInput, UserService};
