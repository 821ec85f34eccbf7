//! Error types for clipboard transfer operations.

use miette::Diagnostic;

/// Main error type for docclip operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// Network leg of a transfer failed.
    #[error(transparent)]
    #[diagnostic_source]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded or is inconsistent.
    #[error(transparent)]
    #[diagnostic_source]
    Config(#[from] ConfigError),
}

/// Errors raised by a [`ClipboardTransport`](crate::transport::ClipboardTransport).
#[derive(thiserror::Error, Debug, Diagnostic)]
#[diagnostic(code(docclip::transport))]
#[non_exhaustive]
pub enum TransportError {
    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The endpoint answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The body arrived but is neither a relay blob nor an HTML document.
    #[error("malformed clipboard response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn request(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Request {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[diagnostic(code(docclip::config))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse clipboard configuration")]
    Parse(#[from] serde_json::Error),

    #[error("service root {0:?} must not contain a query string")]
    #[diagnostic(help("pass the bare scheme://host/prefix the clipboard endpoint hangs off"))]
    ServiceRootHasQuery(String),

    #[error("missing required session field `{0}`")]
    MissingField(&'static str),
}
