use std::sync::LazyLock;

use chrono::{Local, TimeZone};
use regex::Regex;
use tempmail_domain::{Mailbox, MailboxSession, MessageDetail, MessageSummary, RawTime};
use tempmail_error::{ErrorReply, MailError};

use crate::command::{CMD_GENERATE, CMD_HELP, CMD_LIST, CMD_STATUS, CMD_VIEW};

pub const NO_CONTENT: &str = "无内容";
pub const EMPTY_BODY: &str = "邮件内容为空";
pub const UNKNOWN_TIME: &str = "未知时间";
pub const UNKNOWN_SENDER: &str = "未知发件人";
pub const NO_SUBJECT: &str = "无主题";

/// Upstream appends non-body trailer data after this marker.
pub const MAIL_BOUNDARY: &str = "--- mail_boundary ---";

pub const LIST_DISPLAY_LIMIT: usize = 10;
pub const REPLY_CHAR_LIMIT: usize = 2000;
pub const REPLY_TRUNCATE_TO: usize = 1900;
pub const TRUNCATION_NOTICE: &str = "\n... (内容过长，已截断)";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MILLIS_THRESHOLD: f64 = 1e12;

const ENTITIES: [(&str, &str); 5] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("literal tag pattern"));

/// Turns a raw upstream body into one line of display-safe text.
pub fn clean_body(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return NO_CONTENT.to_string();
    };

    let body = raw.find(MAIL_BOUNDARY).map_or(raw, |idx| &raw[..idx]);
    let mut text = TAG_RE.replace_all(body, "").into_owned();
    for (entity, literal) in ENTITIES {
        text = text.replace(entity, literal);
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        EMPTY_BODY.to_string()
    } else {
        collapsed
    }
}

/// Local `YYYY-MM-DD HH:MM:SS`. Values above 1e12 are taken as milliseconds.
pub fn format_timestamp(value: Option<&RawTime>) -> String {
    let Some(value) = value else {
        return UNKNOWN_TIME.to_string();
    };
    let seconds = match value {
        RawTime::Number(n) => Some(*n),
        RawTime::Text(s) => s.trim().parse::<f64>().ok(),
    };
    seconds.and_then(local_time).unwrap_or_else(|| match value {
        RawTime::Text(s) if s.is_empty() => UNKNOWN_TIME.to_string(),
        other => other.to_string(),
    })
}

fn local_time(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value.abs() > MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    Local
        .timestamp_opt(whole as i64, 0)
        .single()
        .map(|dt| dt.format(TIME_FORMAT).to_string())
}

/// Caps a reply at [`REPLY_CHAR_LIMIT`] characters.
pub fn cap_reply(text: String) -> String {
    if text.chars().count() > REPLY_CHAR_LIMIT {
        let kept: String = text.chars().take(REPLY_TRUNCATE_TO).collect();
        format!("{kept}{TRUNCATION_NOTICE}")
    } else {
        text
    }
}

pub fn format_generated(mailbox: &Mailbox) -> String {
    let mut lines = vec![
        "✅ 临时邮箱生成成功！".to_string(),
        String::new(),
        format!("📧 邮箱地址：{}", mailbox.email_address),
    ];
    if mailbox.has_id() {
        lines.push(format!("🆔 邮箱ID：{}", mailbox.email_id));
    }
    lines.push(String::new());
    lines.push("⚠️ 注意：此邮箱为临时邮箱，请及时使用。".to_string());
    lines.push(format!("📬 使用 {CMD_LIST} 快速查看邮件列表"));
    lines.join("\n")
}

pub fn format_message_list(mailbox_id: &str, messages: &[MessageSummary]) -> String {
    if messages.is_empty() {
        return format!("📭 暂无邮件\n\n该邮箱(ID: {mailbox_id})\n目前没有收到任何邮件。");
    }

    let mut out = format!("📬 邮件列表 (邮箱ID: {mailbox_id})\n\n");
    for (i, msg) in messages.iter().take(LIST_DISPLAY_LIMIT).enumerate() {
        out.push_str(&format_message_line(i + 1, msg));
    }
    if messages.len() > LIST_DISPLAY_LIMIT {
        out.push_str(&format!(
            "... 还有 {} 封邮件未显示\n\n",
            messages.len() - LIST_DISPLAY_LIMIT
        ));
    }
    out.push_str(&format!("💡 提示: 直接输入 {CMD_VIEW} 即可查看最新邮件内容"));
    out
}

fn format_message_line(position: usize, msg: &MessageSummary) -> String {
    format!(
        "{position}. 📧 标题：{subject}\n   👤 发件人: {sender}\n   📅 时间: {time}\n\n",
        subject = msg.subject.as_deref().unwrap_or(NO_SUBJECT),
        sender = msg.sender.as_deref().unwrap_or(UNKNOWN_SENDER),
        time = format_timestamp(msg.time.as_ref()),
    )
}

pub fn format_message_detail(detail: &MessageDetail) -> String {
    let text = format!(
        "📧 邮件详情 (ID: {id})\n\n📋 主题: {subject}\n👤 发件人: {sender}\n📄 内容: {content}",
        id = detail.id,
        subject = detail.subject.as_deref().unwrap_or(NO_SUBJECT),
        sender = detail.sender.as_deref().unwrap_or(UNKNOWN_SENDER),
        content = clean_body(detail.content.as_deref()),
    );
    cap_reply(text)
}

pub fn format_status(session: Option<&MailboxSession>, cached_messages: usize) -> String {
    match session {
        Some(s) => {
            let created = s.created_at.with_timezone(&Local).format(TIME_FORMAT);
            format!(
                "📮 当前邮箱\n\n📧 邮箱地址：{}\n🆔 邮箱ID：{}\n🕒 创建时间：{created}\n📬 已缓存邮件：{cached_messages} 封",
                s.email_address, s.email_id
            )
        }
        None => format!("📭 尚未生成邮箱\n\n使用 {CMD_GENERATE} 生成一个临时邮箱"),
    }
}

pub fn help_text(configured: bool) -> String {
    let mut text = String::from("📧 临时邮箱插件帮助\n\n");
    if !configured {
        text.push_str("⚠️ 当前未配置 API Key，以下邮箱命令暂不可用，请联系管理员配置 api_key\n\n");
    }
    text.push_str(&format!(
        "🔸 {CMD_GENERATE} - 生成一个临时邮箱地址\n\
         🔸 {CMD_LIST} - 查看当前邮箱的邮件列表\n\
         🔸 {CMD_LIST} <邮箱ID> - 查看指定邮箱的邮件列表\n\
         🔸 {CMD_VIEW} - 自动查看最新邮件内容（无需输入邮件ID）\n\
         🔸 {CMD_VIEW} <邮件ID> - 查看指定邮件详情\n\
         🔸 {CMD_STATUS} - 查看当前邮箱信息\n\
         🔸 {CMD_HELP} - 显示此帮助信息\n\n\
         📝 简化使用流程：\n\
         1. 使用 {CMD_GENERATE} 生成临时邮箱\n\
         2. 复制邮箱地址用于注册或接收邮件\n\
         3. 使用 {CMD_LIST} 快速查看邮件\n\
         4. 直接输入 {CMD_VIEW} 即可查看最新邮件内容"
    ));
    if configured {
        text.push_str("\n\n💡 如有问题，请联系管理员检查API配置");
    }
    text
}

pub fn error_reply(context: &str, err: &MailError) -> String {
    ErrorReply::from(err).to_text(context)
}
