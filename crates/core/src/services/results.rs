//! Survey results aggregation.
//!
//! Turns recorded answer rows into per-question tallies: free text in
//! arrival order, option counts with percentages for choice questions,
//! and a 1..=5 histogram with a mean for rating questions.

use std::collections::HashMap;

use enquete_common::AppResult;
use enquete_db::{
    entities::{
        answer,
        question::{self, QuestionType},
        question_option, survey,
    },
    repositories::{AnswerRepository, QuestionRepository, ResponseRepository, SurveyRepository},
};

use crate::services::survey::QuestionWithOptions;

/// Aggregated results of a survey.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyResults {
    pub survey: survey::Model,
    pub responses_count: u64,
    /// Per-question tallies in authoring order.
    pub questions: Vec<QuestionResults>,
}

/// One question together with its tally.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionResults {
    pub question: question::Model,
    pub tally: QuestionTally,
}

/// Tallied answers of a single question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionTally {
    /// Answer texts in arrival order.
    FreeText { entries: Vec<String> },
    /// Every option of the question in authoring order, zero counts included.
    Choice { options: Vec<OptionTally> },
    /// One bucket per rating value 1 to 5, plus the mean.
    Rating {
        buckets: Vec<RatingBucket>,
        average: f64,
    },
}

/// Count and share of one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTally {
    pub option_id: String,
    pub text: String,
    pub count: usize,
    /// Share of all answer rows for the question, rounded to one decimal.
    pub percentage: f64,
}

/// Count and share of one rating value.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
    pub percentage: f64,
}

/// Tally answers question by question. Pure; the caller fetches the rows.
#[must_use]
pub fn aggregate(
    questions: &[QuestionWithOptions],
    answers: &[answer::Model],
) -> HashMap<String, QuestionTally> {
    let mut rows_by_question: HashMap<&str, Vec<&answer::Model>> = HashMap::new();
    for row in answers {
        rows_by_question
            .entry(row.question_id.as_str())
            .or_default()
            .push(row);
    }

    questions
        .iter()
        .map(|question_with_options| {
            let question = &question_with_options.question;
            let rows = rows_by_question
                .get(question.id.as_str())
                .map_or(&[][..], Vec::as_slice);

            let tally = match question.question_type {
                QuestionType::FreeText => tally_free_text(rows),
                QuestionType::SingleChoice | QuestionType::MultiChoice => {
                    tally_choice(&question_with_options.options, rows)
                }
                QuestionType::Rating => tally_rating(rows),
            };

            (question.id.clone(), tally)
        })
        .collect()
}

fn tally_free_text(rows: &[&answer::Model]) -> QuestionTally {
    let entries = rows
        .iter()
        .filter_map(|row| row.answer_text.clone())
        .collect();

    QuestionTally::FreeText { entries }
}

fn tally_choice(options: &[question_option::Model], rows: &[&answer::Model]) -> QuestionTally {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        if let Some(option_id) = row.selected_option_id.as_deref() {
            *counts.entry(option_id).or_insert(0) += 1;
        }
    }

    // Multi-select questions record several rows per response, so shares
    // are of answer rows, not of respondents.
    let total = rows.len();
    let options = options
        .iter()
        .map(|option| {
            let count = counts.get(option.id.as_str()).copied().unwrap_or(0);
            OptionTally {
                option_id: option.id.clone(),
                text: option.text.clone(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    QuestionTally::Choice { options }
}

fn tally_rating(rows: &[&answer::Model]) -> QuestionTally {
    let mut counts = [0usize; 5];
    for row in rows {
        // Ratings are stored as text. Anything that does not parse to a
        // value in 1..=5 stays out of the histogram and the total.
        let rating = row
            .answer_text
            .as_deref()
            .and_then(|text| text.parse::<u8>().ok())
            .filter(|rating| (1..=5).contains(rating));

        if let Some(rating) = rating {
            counts[usize::from(rating) - 1] += 1;
        }
    }

    let total: usize = counts.iter().sum();
    let weighted_sum: usize = counts
        .iter()
        .enumerate()
        .map(|(index, count)| (index + 1) * count)
        .sum();
    let average = if total == 0 {
        0.0
    } else {
        round_one_decimal(weighted_sum as f64 / total as f64)
    };

    let buckets = (1..=5u8)
        .map(|rating| {
            let count = counts[usize::from(rating) - 1];
            RatingBucket {
                rating,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    QuestionTally::Rating { buckets, average }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_one_decimal(count as f64 / total as f64 * 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Results service for business logic.
#[derive(Clone)]
pub struct ResultsService {
    survey_repo: SurveyRepository,
    question_repo: QuestionRepository,
    response_repo: ResponseRepository,
    answer_repo: AnswerRepository,
}

impl ResultsService {
    /// Create a new results service.
    #[must_use]
    pub const fn new(
        survey_repo: SurveyRepository,
        question_repo: QuestionRepository,
        response_repo: ResponseRepository,
        answer_repo: AnswerRepository,
    ) -> Self {
        Self {
            survey_repo,
            question_repo,
            response_repo,
            answer_repo,
        }
    }

    /// Aggregate a survey's recorded answers, question by question.
    ///
    /// The survey and its questions must load. Failures fetching the
    /// submissions themselves degrade to zero responses and empty tallies.
    pub async fn results(&self, survey_id: &str) -> AppResult<SurveyResults> {
        let survey = self.survey_repo.get_by_id(survey_id).await?;

        let questions = self.question_repo.find_by_survey(survey_id).await?;
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

        let questions_with_options: Vec<QuestionWithOptions> = questions
            .into_iter()
            .map(|question| {
                let options = options_by_question.remove(&question.id).unwrap_or_default();
                QuestionWithOptions { question, options }
            })
            .collect();

        let (responses_count, answers) = self.fetch_submissions(survey_id).await;

        let mut tallies = aggregate(&questions_with_options, &answers);

        let questions = questions_with_options
            .into_iter()
            .map(|question_with_options| {
                // aggregate() tallies every question it is given.
                let tally = tallies
                    .remove(&question_with_options.question.id)
                    .unwrap_or_else(|| QuestionTally::FreeText {
                        entries: Vec::new(),
                    });
                QuestionResults {
                    question: question_with_options.question,
                    tally,
                }
            })
            .collect();

        Ok(SurveyResults {
            survey,
            responses_count,
            questions,
        })
    }

    /// Load a survey's responses and answers.
    ///
    /// A failed responses fetch yields zero of both. A failed answers fetch
    /// keeps the response count and yields no answers.
    async fn fetch_submissions(&self, survey_id: &str) -> (u64, Vec<answer::Model>) {
        let responses = match self.response_repo.find_by_survey(survey_id).await {
            Ok(responses) => responses,
            Err(e) => {
                tracing::warn!("Failed to fetch responses for survey {}: {}", survey_id, e);
                return (0, Vec::new());
            }
        };

        let responses_count = responses.len() as u64;
        let response_ids: Vec<String> = responses.into_iter().map(|r| r.id).collect();

        let answers = match self.answer_repo.find_by_responses(&response_ids).await {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!("Failed to fetch answers for survey {}: {}", survey_id, e);
                Vec::new()
            }
        };

        (responses_count, answers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use enquete_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn make_question(id: &str, question_type: QuestionType, order_index: i32) -> question::Model {
        question::Model {
            id: id.to_string(),
            survey_id: "survey1".to_string(),
            text: format!("Question {id}"),
            allow_multiple: question_type == QuestionType::MultiChoice,
            question_type,
            order_index,
        }
    }

    fn make_option(id: &str, question_id: &str, text: &str, order_index: i32) -> question_option::Model {
        question_option::Model {
            id: id.to_string(),
            question_id: question_id.to_string(),
            text: text.to_string(),
            order_index,
        }
    }

    fn option_row(id: &str, question_id: &str, option_id: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            response_id: "resp1".to_string(),
            question_id: question_id.to_string(),
            selected_option_id: Some(option_id.to_string()),
            answer_text: None,
        }
    }

    fn text_row(id: &str, question_id: &str, text: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            response_id: "resp1".to_string(),
            question_id: question_id.to_string(),
            selected_option_id: None,
            answer_text: Some(text.to_string()),
        }
    }

    fn choice_options(tally: QuestionTally) -> Vec<OptionTally> {
        match tally {
            QuestionTally::Choice { options } => options,
            _ => panic!("Expected a choice tally"),
        }
    }

    fn rating_parts(tally: QuestionTally) -> (Vec<RatingBucket>, f64) {
        match tally {
            QuestionTally::Rating { buckets, average } => (buckets, average),
            _ => panic!("Expected a rating tally"),
        }
    }

    fn free_text_entries(tally: QuestionTally) -> Vec<String> {
        match tally {
            QuestionTally::FreeText { entries } => entries,
            _ => panic!("Expected a free text tally"),
        }
    }

    #[test]
    fn test_choice_counts_every_option_with_percentages() {
        let questions = vec![QuestionWithOptions {
            question: make_question("q1", QuestionType::SingleChoice, 0),
            options: vec![
                make_option("o1", "q1", "Espresso", 0),
                make_option("o2", "q1", "Filter", 1),
                make_option("o3", "q1", "Decaf", 2),
            ],
        }];
        let answers = vec![
            option_row("a1", "q1", "o1"),
            option_row("a2", "q1", "o2"),
            option_row("a3", "q1", "o1"),
        ];

        let mut tallies = aggregate(&questions, &answers);
        let options = choice_options(tallies.remove("q1").unwrap());

        assert_eq!(
            options,
            vec![
                OptionTally {
                    option_id: "o1".to_string(),
                    text: "Espresso".to_string(),
                    count: 2,
                    percentage: 66.7,
                },
                OptionTally {
                    option_id: "o2".to_string(),
                    text: "Filter".to_string(),
                    count: 1,
                    percentage: 33.3,
                },
                OptionTally {
                    option_id: "o3".to_string(),
                    text: "Decaf".to_string(),
                    count: 0,
                    percentage: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_multi_choice_percentages_are_shares_of_rows() {
        // Two respondents: one picked both options, one picked the first.
        // Three rows in total, so the shares are 2/3 and 1/3.
        let questions = vec![QuestionWithOptions {
            question: make_question("q1", QuestionType::MultiChoice, 0),
            options: vec![
                make_option("o1", "q1", "Monday", 0),
                make_option("o2", "q1", "Tuesday", 1),
            ],
        }];
        let answers = vec![
            option_row("a1", "q1", "o1"),
            option_row("a2", "q1", "o2"),
            option_row("a3", "q1", "o1"),
        ];

        let mut tallies = aggregate(&questions, &answers);
        let options = choice_options(tallies.remove("q1").unwrap());

        assert_eq!(options[0].count, 2);
        assert_eq!(options[0].percentage, 66.7);
        assert_eq!(options[1].count, 1);
        assert_eq!(options[1].percentage, 33.3);
    }

    #[test]
    fn test_rating_histogram_and_average() {
        let questions = vec![QuestionWithOptions {
            question: make_question("q1", QuestionType::Rating, 0),
            options: vec![],
        }];
        let answers = vec![
            text_row("a1", "q1", "5"),
            text_row("a2", "q1", "4"),
            text_row("a3", "q1", "5"),
        ];

        let mut tallies = aggregate(&questions, &answers);
        let (buckets, average) = rating_parts(tallies.remove("q1").unwrap());

        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 1, 2]);
        assert_eq!(buckets[3].percentage, 33.3);
        assert_eq!(buckets[4].percentage, 66.7);
        assert_eq!(average, 4.7);
    }

    #[test]
    fn test_rating_skips_malformed_rows() {
        let questions = vec![QuestionWithOptions {
            question: make_question("q1", QuestionType::Rating, 0),
            options: vec![],
        }];
        let answers = vec![
            text_row("a1", "q1", "ten"),
            text_row("a2", "q1", "0"),
            text_row("a3", "q1", "6"),
            text_row("a4", "q1", "5"),
        ];

        let mut tallies = aggregate(&questions, &answers);
        let (buckets, average) = rating_parts(tallies.remove("q1").unwrap());

        // Only the "5" row counts, so it is 100% of a total of one.
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets[4].percentage, 100.0);
        assert_eq!(buckets[0].count, 0);
        assert_eq!(buckets[0].percentage, 0.0);
        assert_eq!(average, 5.0);
    }

    #[test]
    fn test_free_text_entries_keep_arrival_order() {
        let questions = vec![QuestionWithOptions {
            question: make_question("q1", QuestionType::FreeText, 0),
            options: vec![],
        }];
        let answers = vec![
            text_row("a1", "q1", "Loved it"),
            text_row("a2", "q1", "Too long"),
        ];

        let mut tallies = aggregate(&questions, &answers);
        let entries = free_text_entries(tallies.remove("q1").unwrap());

        assert_eq!(entries, vec!["Loved it".to_string(), "Too long".to_string()]);
    }

    #[test]
    fn test_aggregate_without_answers_yields_empty_tallies() {
        let questions = vec![
            QuestionWithOptions {
                question: make_question("q1", QuestionType::FreeText, 0),
                options: vec![],
            },
            QuestionWithOptions {
                question: make_question("q2", QuestionType::SingleChoice, 1),
                options: vec![
                    make_option("o1", "q2", "Yes", 0),
                    make_option("o2", "q2", "No", 1),
                ],
            },
            QuestionWithOptions {
                question: make_question("q3", QuestionType::Rating, 2),
                options: vec![],
            },
        ];

        let mut tallies = aggregate(&questions, &[]);

        let entries = free_text_entries(tallies.remove("q1").unwrap());
        assert!(entries.is_empty());

        let options = choice_options(tallies.remove("q2").unwrap());
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.count == 0 && o.percentage == 0.0));

        let (buckets, average) = rating_parts(tallies.remove("q3").unwrap());
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.count == 0 && b.percentage == 0.0));
        assert_eq!(average, 0.0);
    }

    #[tokio::test]
    async fn test_results_unknown_survey() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<survey::Model>::new()])
                .into_connection(),
        );

        let service = ResultsService::new(
            SurveyRepository::new(db.clone()),
            QuestionRepository::new(db.clone()),
            ResponseRepository::new(db.clone()),
            AnswerRepository::new(db),
        );

        let result = service.results("missing").await;

        assert!(matches!(result, Err(AppError::SurveyNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_results_assembles_tallies_in_question_order() {
        let survey = survey::Model {
            id: "survey1".to_string(),
            owner_id: None,
            title: "Coffee".to_string(),
            description: None,
            created_at: Utc::now().into(),
        };
        let q1 = make_question("q1", QuestionType::SingleChoice, 0);
        let q2 = make_question("q2", QuestionType::FreeText, 1);
        let options = vec![
            make_option("o1", "q1", "Espresso", 0),
            make_option("o2", "q1", "Filter", 1),
        ];
        let responses = vec![
            enquete_db::entities::response::Model {
                id: "resp1".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
            enquete_db::entities::response::Model {
                id: "resp2".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
        ];
        let answers = vec![
            option_row("a1", "q1", "o1"),
            text_row("a2", "q2", "nice"),
            option_row("a3", "q1", "o2"),
            text_row("a4", "q2", "ok"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[survey.clone()]])
                .append_query_results([vec![q1.clone(), q2.clone()]])
                .append_query_results([options])
                .append_query_results([responses])
                .append_query_results([answers])
                .into_connection(),
        );

        let service = ResultsService::new(
            SurveyRepository::new(db.clone()),
            QuestionRepository::new(db.clone()),
            ResponseRepository::new(db.clone()),
            AnswerRepository::new(db),
        );

        let results = service.results("survey1").await.unwrap();

        assert_eq!(results.survey.id, "survey1");
        assert_eq!(results.responses_count, 2);
        assert_eq!(results.questions.len(), 2);
        assert_eq!(results.questions[0].question.id, "q1");
        assert_eq!(results.questions[1].question.id, "q2");

        let options = choice_options(results.questions[0].tally.clone());
        assert_eq!(options[0].count, 1);
        assert_eq!(options[0].percentage, 50.0);
        assert_eq!(options[1].count, 1);
        assert_eq!(options[1].percentage, 50.0);

        let entries = free_text_entries(results.questions[1].tally.clone());
        assert_eq!(entries, vec!["nice".to_string(), "ok".to_string()]);
    }

    #[tokio::test]
    async fn test_results_survey_without_questions() {
        let survey = survey::Model {
            id: "survey1".to_string(),
            owner_id: None,
            title: "Empty".to_string(),
            description: None,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[survey.clone()]])
                .append_query_results([Vec::<question::Model>::new()])
                .append_query_results([Vec::<enquete_db::entities::response::Model>::new()])
                .into_connection(),
        );

        let service = ResultsService::new(
            SurveyRepository::new(db.clone()),
            QuestionRepository::new(db.clone()),
            ResponseRepository::new(db.clone()),
            AnswerRepository::new(db),
        );

        let results = service.results("survey1").await.unwrap();

        assert_eq!(results.responses_count, 0);
        assert!(results.questions.is_empty());
    }

    #[tokio::test]
    async fn test_results_degrades_when_responses_fetch_fails() {
        let survey = survey::Model {
            id: "survey1".to_string(),
            owner_id: None,
            title: "Coffee".to_string(),
            description: None,
            created_at: Utc::now().into(),
        };
        let q1 = make_question("q1", QuestionType::FreeText, 0);

        // A row without response columns makes the responses query fail
        // while everything before it succeeds.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[survey.clone()]])
                .append_query_results([vec![q1.clone()]])
                .append_query_results([Vec::<question_option::Model>::new()])
                .append_query_results([[maplit::btreemap! {
                    "bogus" => Into::<sea_orm::Value>::into(1i64)
                }]])
                .into_connection(),
        );

        let service = ResultsService::new(
            SurveyRepository::new(db.clone()),
            QuestionRepository::new(db.clone()),
            ResponseRepository::new(db.clone()),
            AnswerRepository::new(db),
        );

        let results = service.results("survey1").await.unwrap();

        assert_eq!(results.responses_count, 0);
        assert_eq!(results.questions.len(), 1);
        let entries = free_text_entries(results.questions[0].tally.clone());
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_results_keeps_count_when_answers_fetch_fails() {
        let survey = survey::Model {
            id: "survey1".to_string(),
            owner_id: None,
            title: "Coffee".to_string(),
            description: None,
            created_at: Utc::now().into(),
        };
        let q1 = make_question("q1", QuestionType::FreeText, 0);
        let responses = vec![
            enquete_db::entities::response::Model {
                id: "resp1".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
            enquete_db::entities::response::Model {
                id: "resp2".to_string(),
                survey_id: "survey1".to_string(),
                created_at: Utc::now().into(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[survey.clone()]])
                .append_query_results([vec![q1.clone()]])
                .append_query_results([Vec::<question_option::Model>::new()])
                .append_query_results([responses])
                .append_query_results([[maplit::btreemap! {
                    "bogus" => Into::<sea_orm::Value>::into(1i64)
                }]])
                .into_connection(),
        );

        let service = ResultsService::new(
            SurveyRepository::new(db.clone()),
            QuestionRepository::new(db.clone()),
            ResponseRepository::new(db.clone()),
            AnswerRepository::new(db),
        );

        let results = service.results("survey1").await.unwrap();

        // The count survives; the tallies are computed from nothing.
        assert_eq!(results.responses_count, 2);
        let entries = free_text_entries(results.questions[0].tally.clone());
        assert!(entries.is_empty());
    }
}
