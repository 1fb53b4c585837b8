//! Level/XP progression and certification on top of the evaluators.

mod certification;
mod engine;

pub use certification::{
    certificate_id, is_eligible, issue, CertificationPolicy, CertificationSettings,
    EligibilityReport,
};
pub use engine::{ProgressionEngine, UnlockBlocker, UnlockOutcome};

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::Module;
use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    #[error("Module {module} is not open at level {level}")]
    ModuleLocked { module: String, level: u32 },

    #[error("Immersion for module {0} has not been completed")]
    ImmersionRequired(String),

    #[error("The project form of module {0} is not valid")]
    FormNotValid(String),

    #[error("Unknown canvas block: {0}")]
    UnknownCanvasBlock(String),

    #[error("Not eligible for the certificate of module {0}")]
    NotEligible(String),

    #[error("Progress could not be committed after repeated conflicts")]
    CommitConflict,

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// How much XP one unlock is worth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XpPolicy {
    /// The module's flat `xp_reward`.
    #[default]
    ModuleReward,
    /// Immersion + quiz + form step rewards; the form reward only counts
    /// for modules that have a form.
    StepSum,
}

impl XpPolicy {
    pub fn reward(&self, module: &Module) -> u32 {
        match self {
            XpPolicy::ModuleReward => module.xp_reward,
            XpPolicy::StepSum => {
                let steps = module.step_rewards;
                let form = if module.project_form.is_some() {
                    steps.form
                } else {
                    0
                };
                steps.immersion + steps.quiz + form
            }
        }
    }
}

impl FromStr for XpPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "module" | "module_reward" | "flat" => Ok(XpPolicy::ModuleReward),
            "steps" | "step_sum" => Ok(XpPolicy::StepSum),
            _ => Err(format!("Unknown XP policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressionPolicy {
    pub xp_policy: XpPolicy,
    /// Re-reads allowed after an optimistic-lock conflict during unlock.
    pub commit_retries: u8,
    pub certification: CertificationSettings,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            xp_policy: XpPolicy::default(),
            commit_retries: 3,
            certification: CertificationSettings::default(),
        }
    }
}

/// Pushed to websocket subscribers after each successful commit.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    LevelUp {
        user_id: Uuid,
        module_id: String,
        level: u32,
        xp: i64,
    },
    CertificateIssued {
        user_id: Uuid,
        module_id: String,
        certificate_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;

    #[test]
    fn xp_policies() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let module = catalog.module("probleme").unwrap();
        assert_eq!(XpPolicy::ModuleReward.reward(module), 500);
        assert_eq!(XpPolicy::StepSum.reward(module), 500);

        let mut without_form = module.clone();
        without_form.project_form = None;
        assert_eq!(XpPolicy::StepSum.reward(&without_form), 300);

        assert_eq!("steps".parse::<XpPolicy>(), Ok(XpPolicy::StepSum));
        assert!("double".parse::<XpPolicy>().is_err());
    }
}
