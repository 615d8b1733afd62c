use crate::types::Region;

/// Terminal failure of a capture session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A capture is already in progress")]
    SessionBusy,

    #[error("Capture cancelled")]
    SelectionCancelled,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("No text found")]
    NoTextRecognized,

    #[error("Couldn't copy text: {0}")]
    SinkWriteFailed(String),

    /// The loop shut down after the selection was delivered
    #[error("Capture interrupted")]
    Interrupted,
}

impl SessionError {
    /// Outcomes the user caused themselves get no toast
    pub fn is_silent(&self) -> bool {
        matches!(self, SessionError::SelectionCancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("No display available")]
    NoDisplay,

    #[error("Region {0} is outside every display")]
    OutOfBounds(Region),

    #[error("Capture backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Recognition error: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("Destination unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}
