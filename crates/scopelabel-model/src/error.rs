use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("model returned an empty reply")]
    EmptyResponse,
}
