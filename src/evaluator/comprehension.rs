use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::catalog::{Module, QuestionKind, QuizQuestion};

/// Submitted quiz answers keyed by question id.
pub type Answers = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub question: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub score: u32,
    pub total: u32,
    pub percentage: u8,
    pub passed: bool,
    pub corrections: Vec<Correction>,
}

/// Score a quiz submission. Missing or ill-typed answers count as wrong.
pub fn evaluate(module: &Module, answers: &Answers) -> QuizOutcome {
    let test = &module.comprehension_test;
    let mut score = 0u32;
    let mut corrections = Vec::new();

    for question in &test.questions {
        if is_correct(question, answers.get(&question.id)) {
            score += 1;
        } else {
            corrections.push(Correction {
                question: question.prompt.clone(),
                explanation: question.explanation.clone(),
            });
        }
    }

    let total = test.questions.len() as u32;
    let percentage = percentage(score, total);

    QuizOutcome {
        score,
        total,
        percentage,
        passed: total > 0 && percentage >= test.passing_score,
        corrections,
    }
}

/// `round(100 * correct / total)`, halves rounded up.
fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = (200 * u64::from(correct) + u64::from(total)) / (2 * u64::from(total));
    scaled.min(100) as u8
}

fn is_correct(question: &QuizQuestion, answer: Option<&Value>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match &question.kind {
        QuestionKind::SingleChoice { correct, .. } => {
            parse_index(answer).is_some_and(|index| index == *correct as i64)
        }
        QuestionKind::TrueFalse { correct } => {
            let submitted = match answer {
                Value::Bool(flag) => flag.to_string(),
                Value::String(raw) => raw.clone(),
                _ => return false,
            };
            submitted == correct.to_string()
        }
        QuestionKind::OpenKeyword { keywords } | QuestionKind::ExampleKeyword { keywords } => {
            let Value::String(text) = answer else {
                return false;
            };
            contains_any_keyword(text, keywords)
        }
    }
}

fn parse_index(answer: &Value) -> Option<i64> {
    match answer {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

// Any keyword appearing anywhere in the text counts.
fn contains_any_keyword(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| text.contains(&keyword))
}
