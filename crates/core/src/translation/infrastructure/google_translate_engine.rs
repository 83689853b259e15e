use std::time::Duration;

use serde::Deserialize;

use crate::translation::domain::translation_engine::{TranslationEngine, TranslationError};

pub const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Deserialize)]
struct V2Response {
    data: V2Data,
}

#[derive(Deserialize)]
struct V2Data {
    translations: Vec<V2Translation>,
}

#[derive(Deserialize)]
struct V2Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Google Cloud Translation (v2 basic) engine. Requires an API key.
pub struct GoogleTranslateEngine {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl GoogleTranslateEngine {
    pub fn new(api_key: String) -> Result<Self, TranslationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TranslationError::Request {
                url: GOOGLE_TRANSLATE_URL.to_string(),
                source: e,
            })?;
        Ok(Self { client, api_key })
    }
}

impl TranslationEngine for GoogleTranslateEngine {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let params = [
            ("q", text),
            ("source", source),
            ("target", target),
            ("format", "text"),
        ];
        let response = self
            .client
            .post(GOOGLE_TRANSLATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .form(&params)
            .send()
            .map_err(|e| TranslationError::Request {
                url: GOOGLE_TRANSLATE_URL.to_string(),
                source: e,
            })?;

        let status = response.status();
        let payload = response.text().map_err(|e| TranslationError::Request {
            url: GOOGLE_TRANSLATE_URL.to_string(),
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
    let parsed: V2Response =
        serde_json::from_str(payload).map_err(|e| TranslationError::Response(e.to_string()))?;
    parsed
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(TranslationError::Empty)
}
