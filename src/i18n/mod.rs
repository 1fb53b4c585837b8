pub mod fluent_loader;
pub mod helpers;
pub mod language;
pub mod localizer;

pub use fluent_loader::FluentLoader;
pub use helpers::I18n;
pub use language::SupportedLanguage;
pub use localizer::{Localizer, MessageArgs};

use anyhow::Result;
use std::path::Path;

/// Initialize the i18n system with French (default) and English.
pub fn init_i18n(locales_dir: Option<&Path>) -> Result<Localizer> {
    let mut loader = FluentLoader::new();

    for language in SupportedLanguage::all() {
        match locales_dir {
            Some(dir) => loader.load_dir(dir, *language)?,
            None => loader.load_embedded(*language)?,
        }
    }

    Ok(Localizer::new(loader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::IssueCode;
    use crate::i18n_args;

    #[test]
    fn every_issue_code_has_both_translations() {
        let localizer = init_i18n(None).unwrap();
        let codes = [
            IssueCode::Required,
            IssueCode::TooShort,
            IssueCode::NotANumber,
            IssueCode::OutOfRange,
            IssueCode::BelowHealthy,
            IssueCode::InvalidOption,
            IssueCode::GenericTarget,
            IssueCode::SolutionLeak,
        ];
        for language in SupportedLanguage::all() {
            for code in codes {
                assert!(
                    localizer.has_message(language, code.message_key()),
                    "{} missing in {}",
                    code.message_key(),
                    language
                );
            }
        }
    }

    #[test]
    fn formats_arguments_without_isolation_marks() {
        let localizer = init_i18n(None).unwrap();
        let args = i18n_args! { "label" => "Cible", "detail" => "tout le monde" };
        let message = localizer.get_string(
            &SupportedLanguage::English,
            "form-generic-target",
            Some(&args),
        );
        assert_eq!(
            message,
            "\"tout le monde\" is too generic for \"Cible\". Narrow down your target."
        );

        assert_eq!(
            localizer.get_string(&SupportedLanguage::French, "no-such-key", None),
            "no-such-key"
        );
    }
}
