use serde::{Deserialize, Serialize};

/// An ordered group of modules sharing a theme (a "parcours").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One learning unit: immersion content, comprehension quiz, project form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub track_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub required_level: u32,
    #[serde(default = "default_xp_reward")]
    pub xp_reward: u32,
    #[serde(default)]
    pub step_rewards: StepRewards,
    #[serde(default)]
    pub theory: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub comprehension_test: ComprehensionTest,
    #[serde(default)]
    pub project_form: Option<ProjectForm>,
    #[serde(default)]
    pub canvas_mapping: Vec<CanvasMapping>,
    #[serde(default)]
    pub certification: Option<ModuleCertification>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_xp_reward() -> u32 {
    500
}

/// Per-step rewards, only used by the step-sum XP policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepRewards {
    pub immersion: u32,
    pub quiz: u32,
    pub form: u32,
}

impl Default for StepRewards {
    fn default() -> Self {
        Self {
            immersion: 100,
            quiz: 200,
            form: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensionTest {
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,
    pub questions: Vec<QuizQuestion>,
}

fn default_passing_score() -> u8 {
    75
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Correctness data, one variant per question kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice { options: Vec<String>, correct: usize },
    TrueFalse { correct: bool },
    OpenKeyword { keywords: Vec<String> },
    ExampleKeyword { keywords: Vec<String> },
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice { .. } => "single_choice",
            QuestionKind::TrueFalse { .. } => "true_false",
            QuestionKind::OpenKeyword { .. } => "open_keyword",
            QuestionKind::ExampleKeyword { .. } => "example_keyword",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectForm {
    pub sections: Vec<FormSection>,
    #[serde(default)]
    pub rules: Vec<FormRule>,
}

impl ProjectForm {
    /// All fields across sections, in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields().find(|field| field.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSection {
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    NumericRange {
        min: i64,
        max: i64,
        #[serde(default)]
        healthy_min: Option<i64>,
    },
    Select {
        options: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Heuristic checks layered on top of the per-field constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FormRule {
    /// Target descriptions that address nobody in particular.
    GenericTerms {
        field: String,
        terms: Vec<String>,
        severity: Severity,
    },
    /// A problem statement that already describes a solution. Never blocking.
    SolutionLeak { field: String, terms: Vec<String> },
}

impl FormRule {
    pub fn field(&self) -> &str {
        match self {
            FormRule::GenericTerms { field, .. } | FormRule::SolutionLeak { field, .. } => field,
        }
    }

    pub fn terms(&self) -> &[String] {
        match self {
            FormRule::GenericTerms { terms, .. } | FormRule::SolutionLeak { terms, .. } => terms,
        }
    }
}

/// Copies a form answer into a Business Model Canvas block on unlock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasMapping {
    pub field: String,
    pub block: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCertification {
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub passing_threshold: Option<u8>,
    #[serde(default)]
    pub next_level_target: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CatalogDocument {
    pub tracks: Vec<Track>,
    pub modules: Vec<Module>,
}
