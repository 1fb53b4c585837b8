use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::i18n::SupportedLanguage;

/// Language detection middleware that extracts language preference from headers
pub async fn language_middleware(mut request: Request, next: Next) -> Response {
    let language = detect_language_from_headers(request.headers());

    // Add the detected language to request extensions
    request.extensions_mut().insert(language);

    next.run(request).await
}

/// `X-Language` wins over `Accept-Language`; French otherwise.
pub fn detect_language_from_headers(headers: &HeaderMap) -> SupportedLanguage {
    if let Some(language) = headers
        .get("X-Language")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<SupportedLanguage>().ok())
    {
        return language;
    }

    headers
        .get("Accept-Language")
        .and_then(|value| value.to_str().ok())
        .map(SupportedLanguage::from_accept_language)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn explicit_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("Accept-Language", HeaderValue::from_static("fr-FR,fr;q=0.9"));
        headers.insert("X-Language", HeaderValue::from_static("en"));
        assert_eq!(detect_language_from_headers(&headers), SupportedLanguage::English);

        headers.insert("X-Language", HeaderValue::from_static("klingon"));
        assert_eq!(detect_language_from_headers(&headers), SupportedLanguage::French);

        assert_eq!(detect_language_from_headers(&HeaderMap::new()), SupportedLanguage::French);
    }
}
