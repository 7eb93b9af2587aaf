use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("api key not configured")]
    NotConfigured,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream returned http status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("mailbox generation failed: {0}")]
    GenerationFailed(String),

    #[error("malformed message detail: {0}")]
    MalformedDetail(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl MailError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn generation_failed(msg: impl Into<String>) -> Self {
        Self::GenerationFailed(msg.into())
    }

    pub fn malformed_detail(msg: impl Into<String>) -> Self {
        Self::MalformedDetail(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// True for failures that happened before any upstream request was made.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::InvalidInput(_))
    }
}

/// User-facing rendering of a [`MailError`], one chat message per failure.
#[derive(Debug, Serialize)]
pub struct ErrorReply {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
    pub retryable: bool,
}

impl From<&MailError> for ErrorReply {
    fn from(err: &MailError) -> Self {
        let (code, message, suggestion, retryable) = match err {
            MailError::NotConfigured => (
                "NOT_CONFIGURED",
                "临时邮箱插件尚未配置 API Key".to_string(),
                Some("请联系管理员在插件配置中填写 api_key"),
                false,
            ),
            MailError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None, false),
            MailError::Status(status) => (
                "NETWORK_ERROR",
                format!("网络请求失败，状态码: {status}"),
                Some("请稍后重试"),
                true,
            ),
            MailError::Network(msg) => (
                "NETWORK_ERROR",
                format!("网络请求失败: {msg}"),
                Some("请稍后重试"),
                true,
            ),
            MailError::Decode(msg) => (
                "DECODE_ERROR",
                format!("API返回的JSON格式无效: {msg}"),
                None,
                false,
            ),
            MailError::GenerationFailed(_) => (
                "GENERATION_FAILED",
                "生成邮箱失败".to_string(),
                Some("请稍后重试"),
                true,
            ),
            MailError::MalformedDetail(_) => (
                "MALFORMED_DETAIL",
                "邮件详情格式错误".to_string(),
                None,
                false,
            ),
            MailError::NotFound(id) => (
                "NOT_FOUND",
                format!("获取邮件详情失败，请检查邮件ID: {id}"),
                None,
                false,
            ),
            MailError::Persistence(msg) => (
                "PERSISTENCE_ERROR",
                format!("保存状态失败: {msg}"),
                None,
                true,
            ),
        };
        Self {
            code,
            message,
            suggestion,
            retryable,
        }
    }
}

impl ErrorReply {
    /// Renders the reply prefixed with `context`, e.g. "获取邮件列表".
    pub fn to_text(&self, context: &str) -> String {
        let mut text = if context.is_empty() {
            format!("❌ {}", self.message)
        } else {
            format!("❌ {context}: {}", self.message)
        };
        if let Some(s) = self.suggestion {
            text.push_str(&format!("\n💡 {s}"));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reply_carries_code() {
        let reply = ErrorReply::from(&MailError::Status(502));
        assert_eq!(reply.code, "NETWORK_ERROR");
        assert!(reply.retryable);
        assert!(reply.to_text("").contains("502"));
    }

    #[test]
    fn not_found_mentions_id() {
        let reply = ErrorReply::from(&MailError::not_found("m-42"));
        let text = reply.to_text("获取邮件详情");
        assert!(text.starts_with("❌ 获取邮件详情: "));
        assert!(text.contains("m-42"));
    }

    #[test]
    fn invalid_input_is_local() {
        assert!(MailError::invalid_input("missing id").is_local());
        assert!(MailError::NotConfigured.is_local());
        assert!(!MailError::Status(500).is_local());
    }

    #[test]
    fn suggestion_is_omitted_when_absent() {
        let reply = ErrorReply::from(&MailError::decode("eof"));
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("suggestion"));
    }
}
