/// Error types for the NWDM client library
use thiserror::Error;

/// Main error type for NWDM operations
#[derive(Error, Debug)]
pub enum NwdmError {
    /// Failed to assemble a request URL
    #[error("Failed to build request URL: {0}")]
    UrlBuild(String),

    /// HTTP transport failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status} for {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Response body could not be read or decoded as text
    #[error("Failed to read response body: {0}")]
    ResponseBody(String),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),
}

/// Type alias for Results using NwdmError
pub type Result<T> = std::result::Result<T, NwdmError>;
