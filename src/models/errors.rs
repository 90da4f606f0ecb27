use thiserror::Error;

/// Validation failures for an inbound create request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid value for field [{0}]")]
    InvalidField(&'static str)
}
