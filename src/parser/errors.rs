use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// Fields the parser extracts independently from a notification body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Amount,
    SenderNumber,
    Balance,
    ExternalId,
    DateTime
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::SenderNumber => "senderNumber",
            Field::Balance => "balance",
            Field::ExternalId => "externalId",
            Field::DateTime => "dateTime"
        }
    }
}

impl Display for Field {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("Notification is not a provider transaction message")]
    NotApplicable,
    #[error("Could not extract field [{0}] from notification")]
    MissingField(Field),
    #[error("Notification failed validation: {0}")]
    InvalidRecord(String)
}

impl ParseFailure {
    /// `NotApplicable` is the only failure that should be dropped without a trace.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, ParseFailure::NotApplicable)
    }
}
