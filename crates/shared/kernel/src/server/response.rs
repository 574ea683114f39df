use vpms_derive::api_model;

/// Plain acknowledgement body.
#[api_model]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
