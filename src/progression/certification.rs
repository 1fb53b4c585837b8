use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ProgressEvent, ProgressionEngine, ProgressionError};
use crate::catalog::Module;
use crate::db::models::{CertificateRecord, UserAccount, UserProgressRecord};

/// Steps and score required before a certificate can be issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationPolicy {
    pub complete_all_steps: bool,
    pub minimum_quiz_score: Option<u8>,
    /// Requires the coach/reviewer confirmation on top of automatic validation.
    pub form_validated: bool,
}

impl Default for CertificationPolicy {
    fn default() -> Self {
        Self {
            complete_all_steps: true,
            minimum_quiz_score: Some(75),
            form_validated: false,
        }
    }
}

impl CertificationPolicy {
    /// A threshold declared by the module wins over the default.
    pub fn for_module(&self, module: &Module) -> Self {
        let threshold = module
            .certification
            .as_ref()
            .and_then(|certification| certification.passing_threshold);
        Self {
            minimum_quiz_score: threshold.or(self.minimum_quiz_score),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CertificationSettings {
    pub defaults: CertificationPolicy,
    pub issuer: String,
    pub recognized_by: Vec<String>,
}

impl Default for CertificationSettings {
    fn default() -> Self {
        Self {
            defaults: CertificationPolicy::default(),
            issuer: "Incubateur".to_string(),
            recognized_by: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub module_id: String,
    pub eligible: bool,
    pub policy: CertificationPolicy,
}

/// Pure predicate; a missing record is never eligible.
pub fn is_eligible(record: Option<&UserProgressRecord>, policy: &CertificationPolicy) -> bool {
    let Some(record) = record else {
        return false;
    };

    if policy.complete_all_steps
        && !(record.immersion_done && record.quiz_passed && record.form_valid)
    {
        return false;
    }
    if let Some(minimum) = policy.minimum_quiz_score {
        if record.quiz_score < i32::from(minimum) {
            return false;
        }
    }
    if policy.form_validated && !record.form_reviewed {
        return false;
    }
    true
}

/// `CERT-<MODULE>-<user fragment>-<unix millis>-<random suffix>`.
pub fn certificate_id(module_id: &str, user_id: Uuid, issued_at: OffsetDateTime) -> String {
    let user = user_id.simple().to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    let millis = issued_at.unix_timestamp_nanos() / 1_000_000;
    format!(
        "CERT-{}-{}-{}-{}",
        module_id.to_uppercase(),
        user[..8].to_uppercase(),
        millis,
        nonce[..6].to_uppercase()
    )
}

pub fn issue(
    module: &Module,
    account: &UserAccount,
    settings: &CertificationSettings,
    xp_awarded: u32,
    issued_at: OffsetDateTime,
) -> CertificateRecord {
    CertificateRecord {
        certificate_id: certificate_id(&module.id, account.id, issued_at),
        module_id: module.id.clone(),
        module_title: module.title.clone(),
        user_id: account.id,
        user_name: account.display_name.clone(),
        issued_at,
        issuer: settings.issuer.clone(),
        recognized_by: Json(settings.recognized_by.clone()),
        skills: Json(module.skills.clone()),
        xp_awarded: i64::from(xp_awarded),
    }
}

impl ProgressionEngine {
    #[instrument(skip(self))]
    pub async fn eligibility(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<EligibilityReport, ProgressionError> {
        let module = self.module(module_id)?;
        self.account(user_id).await?;
        let record = self.store.get_progress(user_id, module_id).await?;
        let policy = self.policy.certification.defaults.for_module(module);

        Ok(EligibilityReport {
            module_id: module.id.clone(),
            eligible: is_eligible(record.as_ref(), &policy),
            policy,
        })
    }

    #[instrument(skip(self))]
    pub async fn certify(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<CertificateRecord, ProgressionError> {
        let module = self.module(module_id)?;
        let account = self.account(user_id).await?;
        let record = self.store.get_progress(user_id, module_id).await?;
        let policy = self.policy.certification.defaults.for_module(module);

        if !is_eligible(record.as_ref(), &policy) {
            return Err(ProgressionError::NotEligible(module.id.clone()));
        }

        let xp = self.policy.xp_policy.reward(module);
        let certificate = issue(
            module,
            &account,
            &self.policy.certification,
            xp,
            OffsetDateTime::now_utc(),
        );
        self.store.insert_certificate(&certificate).await?;

        info!(
            certificate_id = %certificate.certificate_id,
            "Certificate issued"
        );
        let _ = self.events.send(ProgressEvent::CertificateIssued {
            user_id,
            module_id: module.id.clone(),
            certificate_id: certificate.certificate_id.clone(),
        });

        Ok(certificate)
    }

    pub async fn certificates(&self, user_id: Uuid) -> Result<Vec<CertificateRecord>, ProgressionError> {
        self.account(user_id).await?;
        Ok(self.store.list_certificates(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;

    fn record() -> UserProgressRecord {
        let mut record =
            UserProgressRecord::new(Uuid::new_v4(), "probleme", OffsetDateTime::now_utc());
        record.immersion_done = true;
        record.quiz_passed = true;
        record.quiz_score = 80;
        record.form_valid = true;
        record
    }

    #[test]
    fn missing_record_is_not_eligible() {
        assert!(!is_eligible(None, &CertificationPolicy::default()));
    }

    #[test]
    fn every_step_is_required_when_complete_all_steps() {
        let policy = CertificationPolicy {
            minimum_quiz_score: None,
            ..CertificationPolicy::default()
        };
        assert!(is_eligible(Some(&record()), &policy));

        let steps: [fn(&mut UserProgressRecord); 3] = [
            |r| r.immersion_done = false,
            |r| r.quiz_passed = false,
            |r| r.form_valid = false,
        ];
        for clear in steps {
            let mut incomplete = record();
            incomplete.quiz_score = 100;
            clear(&mut incomplete);
            assert!(!is_eligible(Some(&incomplete), &policy));
        }
    }

    #[test]
    fn minimum_score_and_review_flag() {
        let policy = CertificationPolicy {
            complete_all_steps: false,
            minimum_quiz_score: Some(85),
            form_validated: true,
        };
        let mut candidate = record();
        assert!(!is_eligible(Some(&candidate), &policy));
        candidate.quiz_score = 90;
        assert!(!is_eligible(Some(&candidate), &policy));
        candidate.form_reviewed = true;
        assert!(is_eligible(Some(&candidate), &policy));
    }

    #[test]
    fn module_threshold_overrides_default() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let defaults = CertificationPolicy::default();

        let declared = catalog.module("modele-economique").unwrap();
        assert_eq!(defaults.for_module(declared).minimum_quiz_score, Some(80));

        let undeclared = catalog.module("probleme").unwrap();
        assert_eq!(defaults.for_module(undeclared).minimum_quiz_score, Some(75));
    }

    #[test]
    fn certificate_ids_differ_across_repeated_issuance() {
        let user = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let first = certificate_id("probleme", user, now);
        let second = certificate_id("probleme", user, now);

        assert_ne!(first, second);
        assert!(first.starts_with("CERT-PROBLEME-"));
        let fragment = user.simple().to_string()[..8].to_uppercase();
        assert!(first.contains(&fragment));
    }
}
