mod errors;
mod notification;
pub mod provider_format;
#[cfg(test)]
mod tests;
mod transaction;
mod wire;

pub use errors::RequestError;
pub use notification::RawNotification;
pub use transaction::{ParsedTransaction, StoredTransaction};
pub use wire::{CreateTransactionPayload, CreateTransactionRequest};
