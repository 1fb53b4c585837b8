use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::catalog::{
    CanvasMapping, FormField, Module, ModuleCertification, QuestionKind, QuizQuestion,
    Track,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct TrackSummary {
    #[serde(flatten)]
    pub track: Track,
    pub module_ids: Vec<String>,
}

/// Catalog entry as shown to learners: answer keys and form heuristics stay
/// on the server.
#[derive(Debug, Serialize)]
pub struct ModuleView {
    pub id: String,
    pub track_id: String,
    pub title: String,
    pub description: String,
    pub required_level: u32,
    pub xp_reward: u32,
    pub theory: Vec<String>,
    pub video_url: Option<String>,
    pub passing_score: u8,
    pub questions: Vec<QuestionView>,
    pub form_sections: Vec<SectionView>,
    pub canvas_mapping: Vec<CanvasMapping>,
    pub certification: Option<ModuleCertification>,
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub title: String,
    pub fields: Vec<FormField>,
}

impl From<&QuizQuestion> for QuestionView {
    fn from(question: &QuizQuestion) -> Self {
        let options = match &question.kind {
            QuestionKind::SingleChoice { options, .. } => Some(options.clone()),
            _ => None,
        };
        Self {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            kind: question.kind.name(),
            options,
        }
    }
}

impl From<&Module> for ModuleView {
    fn from(module: &Module) -> Self {
        let form_sections = module
            .project_form
            .iter()
            .flat_map(|form| form.sections.iter())
            .map(|section| SectionView {
                title: section.title.clone(),
                fields: section.fields.clone(),
            })
            .collect();

        Self {
            id: module.id.clone(),
            track_id: module.track_id.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            required_level: module.required_level,
            xp_reward: module.xp_reward,
            theory: module.theory.clone(),
            video_url: module.video_url.clone(),
            passing_score: module.comprehension_test.passing_score,
            questions: module
                .comprehension_test
                .questions
                .iter()
                .map(QuestionView::from)
                .collect(),
            form_sections,
            canvas_mapping: module.canvas_mapping.clone(),
            certification: module.certification.clone(),
            skills: module.skills.clone(),
        }
    }
}

pub async fn list_tracks(State(state): State<AppState>) -> Json<Vec<TrackSummary>> {
    let catalog = state.engine.catalog();
    let tracks = catalog
        .tracks()
        .iter()
        .map(|track| TrackSummary {
            track: track.clone(),
            module_ids: catalog
                .modules_in_track(&track.id)
                .map(|module| module.id.clone())
                .collect(),
        })
        .collect();
    Json(tracks)
}

pub async fn list_track_modules(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> AppResult<Json<Vec<ModuleView>>> {
    let catalog = state.engine.catalog();
    if catalog.track(&track_id).is_none() {
        return Err(AppError::NotFound(format!("Track {}", track_id)));
    }

    Ok(Json(
        catalog
            .modules_in_track(&track_id)
            .map(ModuleView::from)
            .collect(),
    ))
}

pub async fn get_module(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> AppResult<Json<ModuleView>> {
    state
        .engine
        .catalog()
        .module(&module_id)
        .map(|module| Json(ModuleView::from(module)))
        .ok_or_else(|| AppError::NotFound(format!("Module {}", module_id)))
}

