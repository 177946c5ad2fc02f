use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Tenant storage is not configured")]
    NotConfigured,

    #[error("Invalid tenant identifier: {0}")]
    InvalidTenant(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
