use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::translation::domain::translation_engine::{TranslationEngine, TranslationError};

pub const DEFAULT_LIBRETRANSLATE_ENDPOINT: &str = "http://localhost:5000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

/// Translates through a LibreTranslate (Argos Translate) HTTP server.
///
/// Offline-capable when the server runs locally with installed language
/// packages.
pub struct LibreTranslateEngine {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
}

impl LibreTranslateEngine {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, TranslationError> {
        let url = format!("{}/translate", endpoint.trim_end_matches('/'));
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TranslationError::Request {
                url: url.clone(),
                source: e,
            })?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TranslationEngine for LibreTranslateEngine {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let body = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| TranslationError::Request {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        let payload = response.text().map_err(|e| TranslationError::Request {
            url: self.url.clone(),
            source: e,
        })?;
        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body: payload,
            });
        }
        parse_response(&payload)
    }
}

fn parse_response(payload: &str) -> Result<String, TranslationError> {
    let parsed: TranslateResponse =
        serde_json::from_str(payload).map_err(|e| TranslationError::Response(e.to_string()))?;
    if let Some(err) = parsed.error {
        return Err(TranslationError::Response(err));
    }
    match parsed.translated_text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(TranslationError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_translated_text() {
        let out = parse_response(r#"{"translatedText":"Hello"}"#).unwrap();
        assert_eq!(out, "Hello");
    }

    #[test]
    fn test_error_field_is_response_error() {
        let result = parse_response(r#"{"error":"ja is not supported"}"#);
        assert!(
            matches!(result, Err(TranslationError::Response(msg)) if msg.contains("not supported"))
        );
    }

    #[test]
    fn test_blank_translation_is_empty_error() {
        assert!(matches!(
            parse_response(r#"{"translatedText":"  "}"#),
            Err(TranslationError::Empty)
        ));
        assert!(matches!(parse_response("{}"), Err(TranslationError::Empty)));
    }

    #[test]
    fn test_invalid_json_is_response_error() {
        assert!(matches!(
            parse_response("<html>502</html>"),
            Err(TranslationError::Response(_))
        ));
    }

    #[test]
    fn test_request_body_omits_missing_api_key() {
        let body = TranslateRequest {
            q: "はい",
            source: "ja",
            target: "en",
            format: "text",
            api_key: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"q": "はい", "source": "ja", "target": "en", "format": "text"})
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_normalised() {
        let engine = LibreTranslateEngine::new("http://host:5000/", None).unwrap();
        assert_eq!(engine.url(), "http://host:5000/translate");
    }

    #[test]
    fn test_unreachable_server_is_request_error() {
        let engine = LibreTranslateEngine::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(
            engine.translate("はい", "ja", "en"),
            Err(TranslationError::Request { .. })
        ));
    }
}
