use axum::response::Json;
use serde::Serialize;

use crate::i18n::{I18n, SupportedLanguage};

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct SupportedLanguagesResponse {
    pub languages: Vec<LanguageInfo>,
    pub default_language: String,
    /// Language picked for this request from `X-Language` / `Accept-Language`.
    pub current_language: String,
}

pub async fn get_supported_languages(i18n: I18n) -> Json<SupportedLanguagesResponse> {
    let default_language = i18n.localizer.default_language();
    let languages = SupportedLanguage::all()
        .iter()
        .map(|lang| LanguageInfo {
            code: lang.code().to_string(),
            name: lang.name().to_string(),
            is_default: *lang == default_language,
        })
        .collect();

    Json(SupportedLanguagesResponse {
        languages,
        default_language: default_language.code().to_string(),
        current_language: i18n.language().code().to_string(),
    })
}
