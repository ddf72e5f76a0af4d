//! Database repositories.

pub mod response;
pub mod survey;
pub mod user;

pub use response::{AnswerRepository, ResponseRepository};
pub use survey::{QuestionRepository, SurveyRepository};
pub use user::UserRepository;
