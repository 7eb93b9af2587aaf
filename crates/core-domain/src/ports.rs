use async_trait::async_trait;
use tempmail_error::MailError;

use crate::entities::{Mailbox, MessageDetail, MessageSummary};

/// Upstream temporary-mail service. Every call is a single attempt with no
/// retry; failures surface to the caller unchanged.
#[async_trait]
pub trait TempMailPort: Send + Sync {
    async fn generate_mailbox(&self) -> Result<Mailbox, MailError>;

    /// Messages in upstream order, assumed newest first.
    async fn list_messages(&self, mailbox_id: &str) -> Result<Vec<MessageSummary>, MailError>;

    async fn fetch_message_detail(&self, message_id: &str) -> Result<MessageDetail, MailError>;
}
