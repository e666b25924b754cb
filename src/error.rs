// Error types for every layer of the tool. Each failure is human-readable:
// the `Display` text is what ends up on the console.

use std::path::PathBuf;
use thiserror::Error;

/// Problems loading the env file. All of them end the process with exit
/// code 0 after printing the message.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load environment variables from {} file. Please check the file and try again.", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, String),

    #[error("Missing required setting {0}. Please add it to the environment file and try again.")]
    MissingKey(&'static str),

    #[error("Invalid URL in {0}: {1}")]
    InvalidUrl(&'static str, String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid identity endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Token request failed: {0}")]
    TokenRequest(String),

    #[error("Access token cannot be used as a request header")]
    InvalidToken,
}

/// Failure of a single authenticated GET. The messages are the diagnostics
/// printed by the query helper.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Error 404: The requested resource could not be found. Please check the endpoint URL and Purview account name.")]
    NotFound,

    #[error("Failed to retrieve data sources. Status code: {status}\n{body}")]
    Status { status: u16, body: String },

    #[error("Failed to retrieve data sources. Please check the endpoint URL and try again.")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Anything that stops a report part-way. The menu turns it into the
/// report's one-line failure message.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("Terminal error: {0}")]
    Terminal(#[from] anyhow::Error),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn missing(key: &str) -> Self {
        ReportError::Malformed(format!("missing `{}`", key))
    }
}
