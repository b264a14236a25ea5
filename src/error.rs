use thiserror::Error;

#[derive(Error, Debug)]
pub enum OvenError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        response: Option<String>,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl OvenError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        OvenError::Protocol {
            message: message.into(),
            response: None,
        }
    }

    pub(crate) fn protocol_with_response(
        message: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        OvenError::Protocol {
            message: message.into(),
            response: Some(response.into()),
        }
    }

    /// Raw oven response that caused the failure, when one was received
    pub fn response(&self) -> Option<&str> {
        match self {
            OvenError::Protocol { response, .. } => response.as_deref(),
            _ => None,
        }
    }
}

pub type OvenResult<T> = std::result::Result<T, OvenError>;
