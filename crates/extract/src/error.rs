use thiserror::Error;

/// Why an extraction call produced no result.
///
/// Callers pick the user-facing message from the variant, so the three
/// kinds must stay distinct.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The service answered with an error status or an unusable body.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// The request went out but no response came back.
    #[error("could not reach the extraction service: {0}")]
    Connectivity(String),

    /// The request could not be built or sent.
    #[error("could not send the extraction request: {0}")]
    RequestConstruction(String),
}

impl ExtractionError {
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::RequestConstruction(err.to_string())
        } else {
            Self::Connectivity(err.to_string())
        }
    }
}
