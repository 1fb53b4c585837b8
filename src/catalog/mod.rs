//! Mission catalog: tracks, modules and the level gates between them.
//!
//! The catalog is built once at startup and shared read-only. Every
//! evaluation receives it explicitly, there is no process-wide registry.

mod model;

pub use model::*;

use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/missions.json");

/// The nine Business Model Canvas blocks.
pub const CANVAS_BLOCKS: &[&str] = &[
    "key_partners",
    "key_activities",
    "key_resources",
    "value_propositions",
    "customer_relationships",
    "channels",
    "customer_segments",
    "cost_structure",
    "revenue_streams",
];

pub fn is_canvas_block(block: &str) -> bool {
    CANVAS_BLOCKS.contains(&block)
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate track id: {0}")]
    DuplicateTrack(String),

    #[error("Duplicate module id: {0}")]
    DuplicateModule(String),

    #[error("Module {module} references unknown track {track}")]
    UnknownTrack { module: String, track: String },

    #[error("Module {module} requires level {level}, which does not increase on the previous module of track {track}")]
    LevelNotIncreasing {
        module: String,
        track: String,
        level: u32,
    },

    #[error("Module {0} has no comprehension questions")]
    EmptyQuiz(String),

    #[error("Module {module} passing score {score} exceeds 100")]
    PassingScoreOutOfRange { module: String, score: u8 },

    #[error("Question {question} of module {module} is invalid: {reason}")]
    InvalidQuestion {
        module: String,
        question: String,
        reason: String,
    },

    #[error("Field {field} of module {module} is invalid: {reason}")]
    InvalidField {
        module: String,
        field: String,
        reason: String,
    },

    #[error("Module {module} references unknown form field {field}")]
    UnknownField { module: String, field: String },

    #[error("Module {module} maps onto unknown canvas block {block}")]
    UnknownCanvasBlock { module: String, block: String },
}

/// Read-only registry of mission definitions.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    tracks: Vec<Track>,
    modules: Vec<Module>,
    by_id: HashMap<String, usize>,
}

impl ModuleCatalog {
    /// Parse and validate a catalog document.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::new(document.tracks, document.modules)
    }

    /// Catalog shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load from a JSON file, or fall back to the built-in catalog.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let catalog = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
                Self::from_json(&raw)
                    .with_context(|| format!("Invalid catalog file: {}", path.display()))?
            }
            None => Self::builtin().context("Invalid built-in catalog")?,
        };

        tracing::info!(
            tracks = catalog.tracks.len(),
            modules = catalog.modules.len(),
            "Mission catalog loaded"
        );
        Ok(catalog)
    }

    pub fn new(tracks: Vec<Track>, modules: Vec<Module>) -> Result<Self, CatalogError> {
        let mut track_ids = HashSet::new();
        for track in &tracks {
            if !track_ids.insert(track.id.as_str()) {
                return Err(CatalogError::DuplicateTrack(track.id.clone()));
            }
        }

        let mut by_id = HashMap::new();
        let mut last_level: HashMap<&str, u32> = HashMap::new();
        for (index, module) in modules.iter().enumerate() {
            if by_id.insert(module.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateModule(module.id.clone()));
            }
            if !track_ids.contains(module.track_id.as_str()) {
                return Err(CatalogError::UnknownTrack {
                    module: module.id.clone(),
                    track: module.track_id.clone(),
                });
            }
            if let Some(previous) = last_level.get(module.track_id.as_str()) {
                if module.required_level <= *previous {
                    return Err(CatalogError::LevelNotIncreasing {
                        module: module.id.clone(),
                        track: module.track_id.clone(),
                        level: module.required_level,
                    });
                }
                if module.required_level > previous + 1 {
                    tracing::warn!(
                        module = %module.id,
                        previous_level = previous,
                        required_level = module.required_level,
                        "Level gap inside track; some learners may be unable to reach this module"
                    );
                }
            }
            last_level.insert(module.track_id.as_str(), module.required_level);
            validate_module(module)?;
        }

        Ok(Self {
            tracks,
            modules,
            by_id,
        })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.by_id.get(id).map(|index| &self.modules[*index])
    }

    pub fn modules_in_track<'a>(&'a self, track_id: &'a str) -> impl Iterator<Item = &'a Module> {
        self.modules
            .iter()
            .filter(move |module| module.track_id == track_id)
    }

    /// The module following `module` inside its own track.
    pub fn next_in_track<'a>(&'a self, module: &'a Module) -> Option<&'a Module> {
        self.modules_in_track(&module.track_id)
            .skip_while(|candidate| candidate.id != module.id)
            .nth(1)
    }

    /// Smallest gate of the whole catalog above `level`.
    fn next_gate(&self, level: u32) -> Option<u32> {
        self.modules
            .iter()
            .map(|module| module.required_level)
            .filter(|gate| *gate > level)
            .min()
    }

    /// A module is open from its own gate up to the next gate of the catalog.
    ///
    /// The level counts unlocks across every track, so the bound is global:
    /// the tail of a track closes once the user has moved past it, and the
    /// highest gate only stays open at its own level.
    pub fn is_reachable(&self, module: &Module, level: u32) -> bool {
        let gate = module.required_level;
        let upper = self
            .next_gate(gate)
            .unwrap_or_else(|| gate.saturating_add(1));
        (gate..upper).contains(&level)
    }

    pub fn active_modules(&self, level: u32) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|module| self.is_reachable(module, level))
            .collect()
    }
}

fn validate_module(module: &Module) -> Result<(), CatalogError> {
    let test = &module.comprehension_test;
    if test.questions.is_empty() {
        return Err(CatalogError::EmptyQuiz(module.id.clone()));
    }
    if test.passing_score > 100 {
        return Err(CatalogError::PassingScoreOutOfRange {
            module: module.id.clone(),
            score: test.passing_score,
        });
    }

    let mut question_ids = HashSet::new();
    for question in &test.questions {
        let invalid = |reason: &str| CatalogError::InvalidQuestion {
            module: module.id.clone(),
            question: question.id.clone(),
            reason: reason.to_string(),
        };
        if !question_ids.insert(question.id.as_str()) {
            return Err(invalid("duplicate question id"));
        }
        match &question.kind {
            QuestionKind::SingleChoice { options, correct } => {
                if options.is_empty() {
                    return Err(invalid("no options"));
                }
                if *correct >= options.len() {
                    return Err(invalid("correct option index out of range"));
                }
            }
            QuestionKind::TrueFalse { .. } => {}
            QuestionKind::OpenKeyword { keywords } | QuestionKind::ExampleKeyword { keywords } => {
                if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(invalid("keyword list must contain non-blank keywords"));
                }
            }
        }
    }

    if let Some(mapping) = module
        .canvas_mapping
        .iter()
        .find(|mapping| !is_canvas_block(&mapping.block))
    {
        return Err(CatalogError::UnknownCanvasBlock {
            module: module.id.clone(),
            block: mapping.block.clone(),
        });
    }

    let Some(form) = &module.project_form else {
        if let Some(mapping) = module.canvas_mapping.first() {
            return Err(CatalogError::UnknownField {
                module: module.id.clone(),
                field: mapping.field.clone(),
            });
        }
        return Ok(());
    };

    let mut field_ids = HashSet::new();
    for field in form.fields() {
        let invalid = |reason: &str| CatalogError::InvalidField {
            module: module.id.clone(),
            field: field.id.clone(),
            reason: reason.to_string(),
        };
        if !field_ids.insert(field.id.as_str()) {
            return Err(invalid("duplicate field id"));
        }
        match &field.kind {
            FieldKind::NumericRange { min, max, .. } if min > max => {
                return Err(invalid("numeric range min exceeds max"));
            }
            FieldKind::Select { options } if options.is_empty() => {
                return Err(invalid("select field without options"));
            }
            _ => {}
        }
    }

    let referenced = form
        .rules
        .iter()
        .map(FormRule::field)
        .chain(module.canvas_mapping.iter().map(|m| m.field.as_str()));
    for field in referenced {
        if !field_ids.contains(field) {
            return Err(CatalogError::UnknownField {
                module: module.id.clone(),
                field: field.to_string(),
            });
        }
    }

    Ok(())
}
