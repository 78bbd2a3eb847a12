use std::error::Error as StdError;
use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// A failed request to the backend, classified by what the user should be told.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("server error: {0}")]
    Server(StatusCode),
    #[error("endpoint not found")]
    NotFound,
    #[error("connection reset by peer")]
    ConnectionReset,
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify a non-success HTTP status. Returns `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            None
        } else if status == StatusCode::NOT_FOUND {
            Some(Self::NotFound)
        } else if status.is_server_error() {
            Some(Self::Server(status))
        } else {
            Some(Self::Other(format!("unexpected status {}", status)))
        }
    }

    /// Text shown in the thread in place of a reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout => {
                "Spectra is thinking deeply about your message... Please wait a moment and try again 💜"
            }
            Self::Server(_) => {
                "Spectra is having a moment of technical difficulty. Please try again 💜"
            }
            Self::NotFound => {
                "Lost connection to Spectra. Please check the API URL and restart the chat 💜"
            }
            Self::ConnectionReset => {
                "Connection was reset while Spectra was responding. Please try again 💜"
            }
            Self::Other(_) => "Having trouble connecting to Spectra right now. Please try again 💜",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if let Some(err) = err.status().and_then(Self::from_status) {
            return err;
        }
        if chain_has_reset(&err) {
            return Self::ConnectionReset;
        }
        Self::Other(err.to_string())
    }
}

/// Walk the source chain looking for a reset connection, either as a typed
/// io error or as an error message from the layers below hyper.
fn chain_has_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        let text = err.to_string().to_lowercase();
        if text.contains("connection reset") || text.contains("econnreset") {
            return true;
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(TransportError::from_status(StatusCode::OK).is_none());
        assert!(matches!(
            TransportError::from_status(StatusCode::NOT_FOUND),
            Some(TransportError::NotFound)
        ));
        assert!(matches!(
            TransportError::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            Some(TransportError::Server(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        assert!(matches!(
            TransportError::from_status(StatusCode::BAD_GATEWAY),
            Some(TransportError::Server(_))
        ));
        assert!(matches!(
            TransportError::from_status(StatusCode::UNPROCESSABLE_ENTITY),
            Some(TransportError::Other(_))
        ));
    }

    #[test]
    fn test_reset_found_in_source_chain() {
        let err = Wrapped(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(chain_has_reset(&err));

        let err = Wrapped(io::Error::new(io::ErrorKind::Other, "read ECONNRESET"));
        assert!(chain_has_reset(&err));

        let err = Wrapped(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(!chain_has_reset(&err));
    }

    #[test]
    fn test_each_category_has_distinct_message() {
        let errors = [
            TransportError::Timeout,
            TransportError::Server(StatusCode::INTERNAL_SERVER_ERROR),
            TransportError::NotFound,
            TransportError::ConnectionReset,
            TransportError::Other("boom".to_string()),
        ];
        let messages: HashSet<&str> = errors.iter().map(|e| e.user_message()).collect();
        assert_eq!(messages.len(), errors.len());
    }
}
