use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListenerError {
    #[error("SMS read permission was denied")]
    PermissionDenied,
    #[error("An SMS read permission request is already pending")]
    PermissionPending,
    #[error("Listener was stopped before permission was granted")]
    Cancelled
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Connectivity loss, timeouts and server side failures. Eligible for retry.
    #[error("Transient transport error: {0}")]
    Transient(String),
    /// The boundary refused the payload itself. Retrying cannot succeed.
    #[error("Submission rejected: {0}")]
    Rejected(String)
}
