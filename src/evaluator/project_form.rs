use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::catalog::{FieldKind, FormField, FormRule, Module, ProjectForm, Severity};

/// Submitted form values keyed by field id.
pub type FormValues = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    Required,
    TooShort,
    NotANumber,
    OutOfRange,
    BelowHealthy,
    InvalidOption,
    GenericTarget,
    SolutionLeak,
}

impl IssueCode {
    /// Message key in the Fluent resources.
    pub fn message_key(&self) -> &'static str {
        match self {
            IssueCode::Required => "form-required",
            IssueCode::TooShort => "form-too-short",
            IssueCode::NotANumber => "form-not-a-number",
            IssueCode::OutOfRange => "form-out-of-range",
            IssueCode::BelowHealthy => "form-below-healthy",
            IssueCode::InvalidOption => "form-invalid-option",
            IssueCode::GenericTarget => "form-generic-target",
            IssueCode::SolutionLeak => "form-solution-leak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormIssue {
    pub field: String,
    pub code: IssueCode,
    /// Rule parameter that triggered the issue (a bound, a matched term).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FormIssue {
    fn new(field: &str, code: IssueCode, detail: Option<String>) -> Self {
        Self {
            field: field.to_string(),
            code,
            detail,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub valid: bool,
    pub errors: Vec<FormIssue>,
    pub warnings: Vec<FormIssue>,
}

impl FormValidation {
    fn push(&mut self, severity: Severity, issue: FormIssue) {
        match severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

/// Validate against the module's own form; modules without a form always pass.
pub fn validate_module(module: &Module, values: &FormValues) -> FormValidation {
    match &module.project_form {
        Some(form) => validate(form, values),
        None => FormValidation {
            valid: true,
            ..Default::default()
        },
    }
}

/// Errors block submission, warnings are advisory only.
pub fn validate(form: &ProjectForm, values: &FormValues) -> FormValidation {
    let mut outcome = FormValidation::default();

    for field in form.fields() {
        check_field(field, values.get(&field.id), &mut outcome);
    }

    for rule in &form.rules {
        let Some(text) = values.get(rule.field()).and_then(as_text) else {
            continue;
        };
        let Some(term) = find_term(&text, rule.terms()) else {
            continue;
        };
        match rule {
            FormRule::GenericTerms {
                field, severity, ..
            } => outcome.push(
                *severity,
                FormIssue::new(field, IssueCode::GenericTarget, Some(term)),
            ),
            FormRule::SolutionLeak { field, .. } => outcome.push(
                Severity::Warning,
                FormIssue::new(field, IssueCode::SolutionLeak, Some(term)),
            ),
        }
    }

    outcome.valid = outcome.errors.is_empty();
    outcome
}

fn check_field(field: &FormField, value: Option<&Value>, outcome: &mut FormValidation) {
    let Some(text) = value.and_then(as_text).filter(|text| !text.is_empty()) else {
        if field.required {
            outcome.push(
                Severity::Error,
                FormIssue::new(&field.id, IssueCode::Required, None),
            );
        }
        return;
    };

    match &field.kind {
        FieldKind::Text | FieldKind::Textarea => {
            if let Some(min) = field.min_length {
                if text.chars().count() < min {
                    outcome.push(
                        Severity::Error,
                        FormIssue::new(&field.id, IssueCode::TooShort, Some(min.to_string())),
                    );
                }
            }
        }
        FieldKind::NumericRange {
            min,
            max,
            healthy_min,
        } => {
            let Some(number) = whole_number(&text) else {
                outcome.push(
                    Severity::Error,
                    FormIssue::new(&field.id, IssueCode::NotANumber, None),
                );
                return;
            };
            if number < *min || number > *max {
                outcome.push(
                    Severity::Error,
                    FormIssue::new(
                        &field.id,
                        IssueCode::OutOfRange,
                        Some(format!("{min}-{max}")),
                    ),
                );
            } else if let Some(healthy) = healthy_min.filter(|healthy| number < *healthy) {
                outcome.push(
                    Severity::Warning,
                    FormIssue::new(&field.id, IssueCode::BelowHealthy, Some(healthy.to_string())),
                );
            }
        }
        FieldKind::Select { options } => {
            if !options.iter().any(|option| option == &text) {
                outcome.push(
                    Severity::Error,
                    FormIssue::new(&field.id, IssueCode::InvalidOption, None),
                );
            }
        }
    }
}

/// Trimmed textual form of a scalar value.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Whole part of a numeric answer; decimals are truncated toward zero.
fn whole_number(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64)
    })
}

fn find_term(text: &str, terms: &[String]) -> Option<String> {
    let text = text.to_lowercase();
    terms
        .iter()
        .find(|term| {
            let term = term.trim().to_lowercase();
            !term.is_empty() && text.contains(&term)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> FormValues {
        pairs
            .iter()
            .map(|(id, value)| (id.to_string(), value.clone()))
            .collect()
    }

    fn problem_form() -> ProjectForm {
        ModuleCatalog::builtin()
            .unwrap()
            .module("probleme")
            .and_then(|module| module.project_form.clone())
            .unwrap()
    }

    fn well_formed() -> FormValues {
        values(&[
            (
                "description_probleme",
                json!("Les artisans perdent plusieurs heures par semaine à relancer leurs factures impayées."),
            ),
            ("frequence", json!("hebdomadaire")),
            ("cible_concernee", json!("Artisans du bâtiment en Bretagne")),
            ("nombre_entretiens", json!(12)),
        ])
    }

    #[test]
    fn well_formed_submission_is_valid_without_warnings() {
        let outcome = validate(&problem_form(), &well_formed());
        assert!(outcome.valid, "{outcome:?}");
        assert!(outcome.errors.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn generic_target_is_a_blocking_error() {
        let mut submitted = well_formed();
        submitted.insert("cible_concernee".into(), json!("tout le monde"));

        let outcome = validate(&problem_form(), &submitted);
        assert!(!outcome.valid);
        assert!(outcome.errors.contains(&FormIssue::new(
            "cible_concernee",
            IssueCode::GenericTarget,
            Some("tout le monde".into()),
        )));
    }

    #[test]
    fn solution_phrasing_only_warns() {
        let mut submitted = well_formed();
        submitted.insert(
            "description_probleme".into(),
            json!("Il manque une application pour que les artisans suivent leurs factures."),
        );

        let outcome = validate(&problem_form(), &submitted);
        assert!(outcome.valid);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, IssueCode::SolutionLeak);
        assert_eq!(outcome.warnings[0].detail.as_deref(), Some("application"));
    }

    #[test]
    fn generic_description_is_a_warning() {
        let mut submitted = well_formed();
        submitted.insert(
            "description_probleme".into(),
            json!("Tout le monde perd du temps à relancer les factures impayées chaque semaine."),
        );

        let outcome = validate(&problem_form(), &submitted);
        assert!(outcome.valid);
        assert_eq!(outcome.warnings[0].code, IssueCode::GenericTarget);
    }

    #[test]
    fn missing_and_short_fields_are_errors() {
        let outcome = validate(
            &problem_form(),
            &values(&[
                ("description_probleme", json!("   trop court   ")),
                ("cible_concernee", json!("")),
            ]),
        );
        assert!(!outcome.valid);
        let codes: Vec<(&str, IssueCode)> = outcome
            .errors
            .iter()
            .map(|issue| (issue.field.as_str(), issue.code))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("description_probleme", IssueCode::TooShort),
                ("frequence", IssueCode::Required),
                ("cible_concernee", IssueCode::Required),
                ("nombre_entretiens", IssueCode::Required),
            ]
        );
    }

    #[test]
    fn numeric_range_errors_and_healthy_warning() {
        let form = problem_form();

        let mut submitted = well_formed();
        submitted.insert("nombre_entretiens".into(), json!("beaucoup"));
        assert_eq!(validate(&form, &submitted).errors[0].code, IssueCode::NotANumber);

        submitted.insert("nombre_entretiens".into(), json!(500));
        assert_eq!(validate(&form, &submitted).errors[0].code, IssueCode::OutOfRange);

        submitted.insert("nombre_entretiens".into(), json!("2"));
        let outcome = validate(&form, &submitted);
        assert!(outcome.valid);
        assert_eq!(outcome.warnings[0].code, IssueCode::BelowHealthy);
        assert_eq!(outcome.warnings[0].detail.as_deref(), Some("5"));
    }

    #[test]
    fn decimal_counts_are_truncated_before_range_checks() {
        let form = problem_form();
        let mut submitted = well_formed();

        submitted.insert("nombre_entretiens".into(), json!(12.0));
        assert!(validate(&form, &submitted).valid);

        submitted.insert("nombre_entretiens".into(), json!("12.5"));
        let outcome = validate(&form, &submitted);
        assert!(outcome.valid, "{outcome:?}");
        assert!(outcome.warnings.is_empty());

        submitted.insert("nombre_entretiens".into(), json!("4.9"));
        assert_eq!(validate(&form, &submitted).warnings[0].code, IssueCode::BelowHealthy);

        submitted.insert("nombre_entretiens".into(), json!(200.7));
        assert!(validate(&form, &submitted).valid);

        submitted.insert("nombre_entretiens".into(), json!("NaN"));
        assert_eq!(validate(&form, &submitted).errors[0].code, IssueCode::NotANumber);
    }

    #[test]
    fn select_rejects_unknown_options() {
        let mut submitted = well_formed();
        submitted.insert("frequence".into(), json!("jamais"));
        let outcome = validate(&problem_form(), &submitted);
        assert_eq!(outcome.errors[0].code, IssueCode::InvalidOption);
    }

    #[test]
    fn validation_is_idempotent() {
        let mut submitted = well_formed();
        submitted.insert("cible_concernee".into(), json!("chacun"));
        let form = problem_form();
        assert_eq!(validate(&form, &submitted), validate(&form, &submitted));
    }

    #[test]
    fn modules_without_form_always_validate() {
        let mut module = ModuleCatalog::builtin()
            .unwrap()
            .module("probleme")
            .cloned()
            .unwrap();
        module.project_form = None;
        assert!(validate_module(&module, &FormValues::new()).valid);
    }
}
