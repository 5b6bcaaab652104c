//! Error types for talking to the directory API

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid API base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Short text for a widget that failed to load.
    pub fn placeholder(&self) -> &'static str {
        match self {
            ClientError::Status { status: 404, .. } => "Not found",
            ClientError::Status { .. } => "Server error",
            ClientError::InvalidBaseUrl { .. } => "Invalid API address",
            ClientError::Request { .. } => "Could not reach server",
            ClientError::Decode { .. } => "Unexpected response",
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_placeholder() {
        let not_found = ClientError::Status {
            url: "http://localhost/api/companies/9".to_string(),
            status: 404,
        };
        assert_eq!(not_found.placeholder(), "Not found");
        assert_eq!(
            not_found.to_string(),
            "http://localhost/api/companies/9 returned HTTP 404"
        );

        let failed = ClientError::Status {
            url: "http://localhost/api/stats".to_string(),
            status: 500,
        };
        assert_eq!(failed.placeholder(), "Server error");
    }
}
