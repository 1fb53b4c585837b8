//! Pure scoring of quiz and project-form submissions.

pub mod comprehension;
pub mod project_form;

pub use comprehension::{evaluate, Answers, Correction, QuizOutcome};
pub use project_form::{validate, validate_module, FormIssue, FormValidation, FormValues, IssueCode};
