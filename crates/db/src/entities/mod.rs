//! Database entities.

pub mod answer;
pub mod question;
pub mod question_option;
pub mod response;
pub mod survey;
pub mod user;

pub use answer::Entity as Answer;
pub use question::Entity as Question;
pub use question_option::Entity as QuestionOption;
pub use response::Entity as Response;
pub use survey::Entity as Survey;
pub use user::Entity as User;
