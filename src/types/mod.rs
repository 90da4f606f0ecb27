mod errors;
mod money;
#[cfg(test)]
mod tests;

pub use errors::MoneyError;
pub use money::{format_money, parse_money};

/// Surrogate key assigned by the store when a transaction is first ingested.
pub type RowId = u64;

/// The issuing mobile financial service this crate understands.
pub const PROVIDER: &str = "bKash";
