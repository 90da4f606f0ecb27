use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Money error: {0}")]
    InvalidFormat(String),
    #[error("Money error: more than {0} fractional digits")]
    TooPrecise(u32),
    #[error("Money error: negative value")]
    Negative
}
