use serde::Serialize;

/// Envelope returned by every store boundary operation.
///
/// `status` mirrors the HTTP status the transport layer would send and is
/// not part of the serialized body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl<T> ApiResponse<T> {
    pub fn ok(status: u16, message: &str, data: T) -> Self {
        Self {
            status,
            success: true,
            message: message.to_string(),
            data: Some(data),
            count: None,
            duplicate: None,
            error: None
        }
    }

    pub fn duplicate() -> Self {
        Self {
            status: 200,
            success: true,
            message: "Transaction already exists".to_string(),
            data: None,
            count: None,
            duplicate: Some(true),
            error: None
        }
    }

    pub fn failure(status: u16, message: &str, error: Option<String>) -> Self {
        Self {
            status,
            success: false,
            message: message.to_string(),
            data: None,
            count: None,
            duplicate: None,
            error
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate == Some(true)
    }
}
