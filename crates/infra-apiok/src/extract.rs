//! Shape probing for upstream payloads.
//!
//! The upstream schema is not stable: the address may sit under one of
//! several keys or be the bare `result` string, and message lists arrive
//! either as an array or wrapped in an object. Each shape is one strategy;
//! strategies are tried in order and the first match wins, so schema drift
//! stays a change to the tables below.

use serde_json::Value;
use tempmail_domain::{Mailbox, MessageDetail, MessageSummary, RawTime};
use tempmail_error::MailError;

type MailboxStrategy = fn(&Value) -> Option<Mailbox>;
type ListStrategy = fn(&Value) -> Option<&[Value]>;

const ADDRESS_FIELDS: [&str; 3] = ["email", "mail", "address"];
const TIME_FIELDS: [&str; 2] = ["time", "date"];

const MAILBOX_STRATEGIES: &[MailboxStrategy] = &[mailbox_from_object, mailbox_from_literal];
const LIST_STRATEGIES: &[ListStrategy] = &[list_from_messages_field, list_from_array];

pub(crate) fn extract_mailbox(body: &Value) -> Result<Mailbox, MailError> {
    let result = &body["result"];
    MAILBOX_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(result))
        .ok_or_else(|| MailError::generation_failed("no address in result"))
}

/// A missing or unrecognised `result` is an empty inbox, not an error.
pub(crate) fn extract_messages(body: &Value) -> Vec<MessageSummary> {
    let result = &body["result"];
    LIST_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(result))
        .unwrap_or_default()
        .iter()
        .map(parse_summary)
        .collect()
}

pub(crate) fn extract_detail(body: &Value, message_id: &str) -> Result<MessageDetail, MailError> {
    let result = &body["result"];
    if is_blank(result) {
        return Err(MailError::not_found(message_id));
    }
    let obj = result.as_object().ok_or_else(|| {
        MailError::malformed_detail(format!("result is {}", kind_of(result)))
    })?;

    Ok(MessageDetail {
        id: message_id.to_string(),
        sender: non_empty_str(obj.get("from")),
        subject: non_empty_str(obj.get("subject")),
        content: obj.get("content").and_then(Value::as_str).map(str::to_string),
    })
}

fn mailbox_from_object(result: &Value) -> Option<Mailbox> {
    let obj = result.as_object()?;
    let email_address = ADDRESS_FIELDS
        .iter()
        .find_map(|key| non_empty_str(obj.get(*key)))?;
    Some(Mailbox {
        email_id: id_string(obj.get("id")).unwrap_or_default(),
        email_address,
    })
}

fn mailbox_from_literal(result: &Value) -> Option<Mailbox> {
    non_empty_str(Some(result)).map(|email_address| Mailbox {
        email_id: String::new(),
        email_address,
    })
}

fn list_from_messages_field(result: &Value) -> Option<&[Value]> {
    result
        .as_object()?
        .get("messages")?
        .as_array()
        .map(Vec::as_slice)
}

fn list_from_array(result: &Value) -> Option<&[Value]> {
    result.as_array().map(Vec::as_slice)
}

fn parse_summary(m: &Value) -> MessageSummary {
    let time = TIME_FIELDS
        .iter()
        .filter_map(|key| m.get(*key))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64().map(RawTime::Number),
            Value::String(s) => Some(RawTime::Text(s.clone())),
            _ => None,
        });

    MessageSummary {
        id: id_string(m.get("id")),
        sender: non_empty_str(m.get("from")),
        subject: non_empty_str(m.get("subject")),
        time,
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Upstream ids show up both as strings and as numbers.
fn id_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mailbox_prefers_object_fields_in_order() {
        let body = json!({"result": {"id": "abc123", "mail": "m@y.z", "address": "a@y.z"}});
        let mailbox = extract_mailbox(&body).unwrap();
        assert_eq!(mailbox.email_id, "abc123");
        assert_eq!(mailbox.email_address, "m@y.z");
    }

    #[test]
    fn mailbox_skips_empty_alias() {
        let body = json!({"result": {"id": 7, "email": "", "address": "a@y.z"}});
        let mailbox = extract_mailbox(&body).unwrap();
        assert_eq!(mailbox.email_id, "7");
        assert_eq!(mailbox.email_address, "a@y.z");
    }

    #[test]
    fn mailbox_from_bare_string() {
        let body = json!({"result": "x@y.z"});
        let mailbox = extract_mailbox(&body).unwrap();
        assert_eq!(mailbox.email_address, "x@y.z");
        assert!(!mailbox.has_id());
    }

    #[test]
    fn mailbox_without_address_fails() {
        let body = json!({"result": {"id": "abc123"}});
        assert!(matches!(
            extract_mailbox(&body),
            Err(MailError::GenerationFailed(_))
        ));
        assert!(matches!(
            extract_mailbox(&json!({})),
            Err(MailError::GenerationFailed(_))
        ));
    }

    #[test]
    fn messages_from_both_shapes() {
        let wrapped = json!({"result": {"messages": [{"id": "1"}, {"id": "2"}]}});
        let bare = json!({"result": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(extract_messages(&wrapped).len(), 2);
        assert_eq!(extract_messages(&bare), extract_messages(&wrapped));
    }

    #[test]
    fn missing_list_is_empty() {
        assert!(extract_messages(&json!({"result": {"count": 0}})).is_empty());
        assert!(extract_messages(&json!({})).is_empty());
    }

    #[test]
    fn summary_prefers_time_over_date() {
        let body = json!({"result": [
            {"id": 5, "from": "a@b.c", "subject": "hi", "time": 1700000000, "date": "ignored"},
            {"id": "6", "date": "1700000000000"},
            {"id": "7", "time": null, "date": 12}
        ]});
        let messages = extract_messages(&body);
        assert_eq!(messages[0].id.as_deref(), Some("5"));
        assert_eq!(messages[0].time, Some(RawTime::Number(1_700_000_000.0)));
        assert_eq!(messages[1].time, Some(RawTime::Text("1700000000000".into())));
        assert_eq!(messages[1].sender, None);
        assert_eq!(messages[2].time, Some(RawTime::Number(12.0)));
    }

    #[test]
    fn detail_distinguishes_missing_and_malformed() {
        assert!(matches!(
            extract_detail(&json!({"result": null}), "m1"),
            Err(MailError::NotFound(id)) if id == "m1"
        ));
        assert!(matches!(
            extract_detail(&json!({"result": {}}), "m1"),
            Err(MailError::NotFound(_))
        ));
        assert!(matches!(
            extract_detail(&json!({"result": "oops"}), "m1"),
            Err(MailError::MalformedDetail(_))
        ));
        assert!(matches!(
            extract_detail(&json!({"result": [1]}), "m1"),
            Err(MailError::MalformedDetail(_))
        ));
    }

    #[test]
    fn detail_reads_fields() {
        let body = json!({"result": {"from": "a@b.c", "subject": "s", "content": "<p>hi</p>"}});
        let detail = extract_detail(&body, "m1").unwrap();
        assert_eq!(detail.id, "m1");
        assert_eq!(detail.sender.as_deref(), Some("a@b.c"));
        assert_eq!(detail.content.as_deref(), Some("<p>hi</p>"));
    }
}
