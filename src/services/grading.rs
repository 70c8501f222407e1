//! Deterministic exam scoring.

use std::collections::{HashMap, HashSet};

use crate::db::models::{Question, SubmittedAnswer};
use crate::db::types::QuestionType;

/// Sums the weights of correctly answered questions. Answers to unknown
/// question ids score nothing; if a question is answered twice the first
/// answer counts.
pub(crate) fn score_answers(questions: &[Question], answers: &[SubmittedAnswer]) -> f64 {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();

    let mut graded = HashSet::new();
    answers
        .iter()
        .filter_map(|answer| {
            let question = by_id.get(answer.question_id.as_str())?;
            if !graded.insert(question.id.as_str()) {
                return None;
            }
            answer_matches(question.question_type, &question.answer, &answer.answer)
                .then_some(question.score)
        })
        .sum()
}

pub(crate) fn answer_matches(question_type: QuestionType, expected: &str, submitted: &str) -> bool {
    match question_type {
        QuestionType::SingleChoice | QuestionType::MultipleChoice => expected == submitted,
        QuestionType::FillBlank => normalize_blank(expected) == normalize_blank(submitted),
    }
}

/// Trims, collapses whitespace runs and lowercases.
pub(crate) fn normalize_blank(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use sqlx::types::Json;

    fn question(id: &str, question_type: QuestionType, answer: &str, score: f64) -> Question {
        let now = primitive_now_utc();
        Question {
            id: id.to_string(),
            exam_id: Some("exam".to_string()),
            question_type,
            content: "?".to_string(),
            options: Json(serde_json::json!([])),
            answer: answer.to_string(),
            explanation: String::new(),
            score,
            order_num: 0,
            created_by: "author".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(question_id: &str, value: &str) -> SubmittedAnswer {
        SubmittedAnswer { question_id: question_id.to_string(), answer: value.to_string() }
    }

    #[test]
    fn single_choice_scores_only_exact_match() {
        let questions = vec![question("q1", QuestionType::SingleChoice, "B", 10.0)];

        assert_eq!(score_answers(&questions, &[answer("q1", "B")]), 10.0);
        assert_eq!(score_answers(&questions, &[answer("q1", "A")]), 0.0);
        assert_eq!(score_answers(&questions, &[answer("q1", "b")]), 0.0);
        assert_eq!(score_answers(&questions, &[answer("nope", "B")]), 0.0);
    }

    #[test]
    fn multiple_choice_is_order_sensitive() {
        assert!(answer_matches(QuestionType::MultipleChoice, "A,C", "A,C"));
        assert!(!answer_matches(QuestionType::MultipleChoice, "A,C", "C,A"));
    }

    #[test]
    fn fill_blank_ignores_case_and_spacing() {
        assert!(answer_matches(QuestionType::FillBlank, "Hello  World", " hello world "));
        assert!(!answer_matches(QuestionType::FillBlank, "hello world", "helloworld"));
    }

    #[test]
    fn total_is_sum_of_correct_weights() {
        let questions = vec![
            question("q1", QuestionType::SingleChoice, "A", 2.0),
            question("q2", QuestionType::FillBlank, "rust", 3.5),
            question("q3", QuestionType::MultipleChoice, "A,B", 4.0),
        ];
        let answers = vec![answer("q1", "A"), answer("q2", "RUST"), answer("q3", "B,A")];
        assert_eq!(score_answers(&questions, &answers), 5.5);
    }

    #[test]
    fn repeated_answers_do_not_double_count() {
        let questions = vec![question("q1", QuestionType::SingleChoice, "A", 5.0)];
        let answers = vec![answer("q1", "A"), answer("q1", "A")];
        assert_eq!(score_answers(&questions, &answers), 5.0);
        let answers = vec![answer("q1", "B"), answer("q1", "A")];
        assert_eq!(score_answers(&questions, &answers), 0.0);
    }
}
