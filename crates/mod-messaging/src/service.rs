use std::sync::Arc;

use tempmail_domain::{MailboxSession, TempMailPort};
use tempmail_error::MailError;
use tempmail_session::{SessionStore, UserLocks};
use tracing::{debug, info, warn};

use crate::command::{Command, CMD_GENERATE, CMD_LIST, CMD_VIEW};
use crate::format;

/// Replies for one command, in emission order.
pub type Replies = Vec<String>;

const CTX_GENERATE: &str = "生成临时邮箱";
const CTX_LIST: &str = "获取邮件列表";
const CTX_VIEW: &str = "获取邮件详情";
const CTX_STATUS: &str = "查询邮箱状态";
const CTX_HELP: &str = "";

/// The four user commands plus status, over one upstream port and one store.
///
/// `port` is `None` when no API key is configured; every data command then
/// answers "not configured" without touching locks or state.
pub struct MailService {
    port: Option<Arc<dyn TempMailPort>>,
    store: Arc<SessionStore>,
    locks: UserLocks,
}

impl MailService {
    pub fn new(port: Option<Arc<dyn TempMailPort>>, store: Arc<SessionStore>) -> Self {
        info!(configured = port.is_some(), "mail service ready");
        Self {
            port,
            store,
            locks: UserLocks::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.port.is_some()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    fn require_port(&self) -> Result<&Arc<dyn TempMailPort>, MailError> {
        self.port.as_ref().ok_or(MailError::NotConfigured)
    }

    /// Parses and runs one line of chat text. Text that is not a command
    /// produces no replies.
    pub async fn handle(&self, user_id: &str, text: &str) -> Replies {
        match text.parse::<Command>() {
            Ok(cmd) => self.execute(user_id, cmd).await,
            Err(e) => {
                debug!(user = user_id, error = %e, "ignored text");
                Vec::new()
            }
        }
    }

    pub async fn execute(&self, user_id: &str, cmd: Command) -> Replies {
        debug!(user = user_id, %cmd, "executing command");
        let (context, result) = match cmd {
            Command::Generate => (CTX_GENERATE, self.generate_mailbox(user_id).await),
            Command::List { mailbox_id } => (
                CTX_LIST,
                self.list_messages(user_id, mailbox_id.as_deref()).await,
            ),
            Command::View { message_id } => (
                CTX_VIEW,
                self.view_message(user_id, message_id.as_deref()).await,
            ),
            Command::Status => (CTX_STATUS, self.mailbox_status(user_id).await),
            Command::Help => (CTX_HELP, Ok(self.help())),
        };

        match result {
            Ok(text) => vec![text],
            Err(e) => {
                if e.is_local() {
                    debug!(user = user_id, error = %e, "command rejected");
                } else {
                    warn!(user = user_id, error = %e, "command failed");
                }
                vec![format::error_reply(context, &e)]
            }
        }
    }

    pub async fn generate_mailbox(&self, user_id: &str) -> Result<String, MailError> {
        let port = self.require_port()?;
        let _guard = self.locks.acquire(user_id).await;

        let mailbox = port.generate_mailbox().await?;
        if mailbox.has_id() {
            self.store
                .set_session(user_id, MailboxSession::new(mailbox.clone()))
                .await;
        } else {
            warn!(user = user_id, %mailbox, "upstream returned no mailbox id; not tracked");
        }
        info!(user = user_id, %mailbox, "generated mailbox");
        Ok(format::format_generated(&mailbox))
    }

    /// Lists the explicit mailbox, or the user's current one.
    pub async fn list_messages(
        &self,
        user_id: &str,
        mailbox_id: Option<&str>,
    ) -> Result<String, MailError> {
        let port = self.require_port()?;
        let _guard = self.locks.acquire(user_id).await;

        let mailbox_id = match non_blank(mailbox_id) {
            Some(id) => id.to_string(),
            None => self
                .store
                .get_session(user_id)
                .await
                .map(|s| s.email_id)
                .ok_or_else(|| {
                    MailError::invalid_input(format!(
                        "未找到您的邮箱信息，请先使用 {CMD_GENERATE} 生成邮箱，或手动指定邮箱ID\n\n使用方法: {CMD_LIST} <邮箱ID>"
                    ))
                })?,
        };

        let messages = port.list_messages(&mailbox_id).await?;
        let ids: Vec<String> = messages.iter().filter_map(|m| m.id.clone()).collect();
        info!(user = user_id, mailbox_id = %mailbox_id, count = messages.len(), "listed messages");
        self.store.set_cached_message_ids(user_id, ids).await;
        Ok(format::format_message_list(&mailbox_id, &messages))
    }

    /// Shows the explicit message, or the newest one from the last listing.
    pub async fn view_message(
        &self,
        user_id: &str,
        message_id: Option<&str>,
    ) -> Result<String, MailError> {
        let port = self.require_port()?;
        let _guard = self.locks.acquire(user_id).await;

        let message_id = match non_blank(message_id) {
            Some(id) => id.to_string(),
            None => self
                .store
                .get_cached_message_ids(user_id)
                .await
                .and_then(|ids| ids.into_iter().next())
                .ok_or_else(|| {
                    MailError::invalid_input(format!(
                        "未找到邮件ID，请先使用 {CMD_LIST} 查看邮件，或手动指定邮件ID\n\n使用方法: {CMD_VIEW} <邮件ID>"
                    ))
                })?,
        };

        let detail = port.fetch_message_detail(&message_id).await?;
        debug!(user = user_id, message_id = %message_id, "fetched message detail");
        Ok(format::format_message_detail(&detail))
    }

    pub async fn get_mailbox_status(&self, user_id: &str) -> Option<MailboxSession> {
        self.store.get_session(user_id).await
    }

    pub async fn mailbox_status(&self, user_id: &str) -> Result<String, MailError> {
        self.require_port()?;
        let _guard = self.locks.acquire(user_id).await;

        let session = self.get_mailbox_status(user_id).await;
        let cached = self
            .store
            .get_cached_message_ids(user_id)
            .await
            .map_or(0, |ids| ids.len());
        Ok(format::format_status(session.as_ref(), cached))
    }

    pub fn help(&self) -> String {
        format::help_text(self.is_configured())
    }

    /// Best-effort flush, then drop in-memory state. The state file stays.
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.flush().await {
            warn!(error = %e, "final flush failed");
        }
        self.store.clear().await;
        info!("mail service shut down");
    }
}

fn non_blank(val: Option<&str>) -> Option<&str> {
    val.map(str::trim).filter(|v| !v.is_empty())
}
