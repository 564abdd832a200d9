use extract::ExtractionError;
use serde::Serialize;
use thiserror::Error;

/// The four ways an attempt can fail. None of them are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Service,
    Connectivity,
    RequestConstruction,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please enter some text.")]
    Validation,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation => ErrorKind::Validation,
            Self::Extraction(ExtractionError::Service { .. }) => ErrorKind::Service,
            Self::Extraction(ExtractionError::Connectivity(_)) => ErrorKind::Connectivity,
            Self::Extraction(ExtractionError::RequestConstruction(_)) => {
                ErrorKind::RequestConstruction
            }
        }
    }

    /// Text suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation => self.to_string(),
            Self::Extraction(ExtractionError::Service { message, .. }) => message.clone(),
            Self::Extraction(ExtractionError::Connectivity(_)) => {
                "The extraction service could not be reached. Check your connection and try again."
                    .to_string()
            }
            Self::Extraction(ExtractionError::RequestConstruction(_)) => {
                "The request could not be sent. Check the configured endpoint.".to_string()
            }
        }
    }
}
