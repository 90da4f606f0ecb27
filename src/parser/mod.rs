mod bkash;
mod errors;

pub use bkash::{
    extract_amount, extract_balance, extract_date_time, extract_external_id, extract_sender_number,
    is_eligible, parse, parse_notification
};
pub use errors::{Field, ParseFailure};
