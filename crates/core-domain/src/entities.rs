use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A freshly generated mailbox as reported by the upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    /// Empty when the upstream returned a bare address string.
    pub email_id: String,
    pub email_address: String,
}

impl Mailbox {
    pub fn has_id(&self) -> bool {
        !self.email_id.is_empty()
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_id() {
            write!(f, "{} (id:{})", self.email_address, self.email_id)
        } else {
            write!(f, "{}", self.email_address)
        }
    }
}

/// The single active mailbox tracked for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSession {
    pub email_id: String,
    pub email_address: String,
    pub created_at: DateTime<Utc>,
}

impl MailboxSession {
    pub fn new(mailbox: Mailbox) -> Self {
        Self::created_at(mailbox, Utc::now())
    }

    pub fn created_at(mailbox: Mailbox, created_at: DateTime<Utc>) -> Self {
        Self {
            email_id: mailbox.email_id,
            email_address: mailbox.email_address,
            created_at,
        }
    }
}

/// A timestamp exactly as the upstream sent it: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Number(f64),
    Text(String),
}

impl fmt::Display for RawTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<RawTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDetail {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Raw upstream body, HTML and trailer included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl fmt::Display for MessageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self.subject.as_deref().unwrap_or("");
        let preview: String = subject.chars().take(60).collect();
        let suffix = if subject.chars().count() > 60 {
            "..."
        } else {
            ""
        };
        write!(
            f,
            "[{}] {}: {preview}{suffix}",
            self.id.as_deref().unwrap_or("-"),
            self.sender.as_deref().unwrap_or("?")
        )
    }
}
