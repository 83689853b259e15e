use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("translation request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("translation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed translation response: {0}")]
    Response(String),
    #[error("translation service returned no text")]
    Empty,
}

/// Domain interface for a text translation backend.
pub trait TranslationEngine: Send {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError>;
}
