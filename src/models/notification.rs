use jiff::Timestamp;
use serde::Deserialize;

/// A single SMS as delivered by the host platform.
///
/// Notifications are ephemeral: they are handed to the parser once and
/// never persisted on their own. The body survives only as the `raw_sms`
/// field of a successfully parsed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawNotification {
    /// Display name or short code of the sender, e.g. `bKash Alert`.
    pub sender: String,
    /// Full message text.
    pub body: String,
    /// Delivery time reported by the platform, if any.
    #[serde(default)]
    pub received_at: Option<Timestamp>
}

impl RawNotification {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            received_at: None
        }
    }
}
