use serde::{Deserialize, Serialize};

/// One chat message routed to the plugin by the host runtime.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    pub origin: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct OutboundReply {
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutboundReply {
    pub fn text(origin: String, text: String) -> Self {
        Self {
            origin: Some(origin),
            text: Some(text),
            error: None,
        }
    }

    pub fn error(origin: Option<String>, msg: impl Into<String>) -> Self {
        Self {
            origin,
            text: None,
            error: Some(msg.into()),
        }
    }
}
