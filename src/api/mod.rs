mod response;
#[cfg(test)]
mod tests;
mod transaction_api;

pub use response::ApiResponse;
pub use transaction_api::TransactionApi;
