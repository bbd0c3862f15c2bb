use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartmarkError {
    #[error("credential exchange failed: {0}")]
    Auth(String),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("page readiness polling exhausted after {attempts} attempts")]
    AutomationTimeout { attempts: u32 },

    #[error("browser session could not be established: {0}")]
    BrowserConnect(#[from] fantoccini::error::NewSessionError),

    #[error("browser command failed: {0}")]
    Browser(#[from] fantoccini::error::CmdError),

    #[error("ledger file error at {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("printer rejected label program: {0}")]
    Printer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PartmarkError>;
