//! Mentions received from, and replies sent to, a Coral session

use serde::Serialize;
use serde_json::{Value, json};

const THREAD_KEYS: &[&str] = &["threadId", "thread_id", "thread"];
const SENDER_KEYS: &[&str] = &["senderId", "sender_id", "sender", "from"];
const CONTENT_KEYS: &[&str] = &["content", "message", "text"];

/// A message addressed to this agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub thread_id: String,
    pub sender_id: String,
    pub content: String,
}

impl Mention {
    /// Read one mention, looking at top-level fields first and then `data`
    ///
    /// Returns `None` (and logs) when the thread or sender is missing.
    pub fn from_value(value: &Value) -> Option<Self> {
        let thread_id = lookup(value, THREAD_KEYS);
        let sender_id = lookup(value, SENDER_KEYS);

        match (thread_id, sender_id) {
            (Some(thread_id), Some(sender_id)) => Some(Self {
                thread_id,
                sender_id,
                content: lookup(value, CONTENT_KEYS).unwrap_or_default(),
            }),
            (thread_id, sender_id) => {
                tracing::warn!(
                    has_thread = thread_id.is_some(),
                    has_sender = sender_id.is_some(),
                    "Skipping mention without thread or sender"
                );
                None
            }
        }
    }
}

/// Parse every mention in a `wait_for_mentions` payload
///
/// The payload may be an array of mentions, an object with a `mentions` or
/// `messages` array, a single mention object, or a string holding any of
/// these as JSON.
pub fn parse_mentions(payload: &Value) -> Vec<Mention> {
    match payload {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(Mention::from_value).collect(),
        Value::Object(map) => {
            let nested = map
                .get("mentions")
                .or_else(|| map.get("messages"))
                .and_then(Value::as_array);
            match nested {
                Some(items) => items.iter().filter_map(Mention::from_value).collect(),
                None => Mention::from_value(payload).into_iter().collect(),
            }
        }
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(_)) | Err(_) => {
                tracing::debug!(payload_length = raw.len(), "Mention payload is not JSON");
                Vec::new()
            }
            Ok(parsed) => parse_mentions(&parsed),
        },
        Value::Bool(_) | Value::Number(_) => Vec::new(),
    }
}

fn lookup(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys).or_else(|| value.get("data").and_then(|data| field(data, keys)))
}

fn field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Answer to a mention, posted in the mention's thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub thread_id: String,
    pub recipient_id: String,
    pub content: String,
}

impl Reply {
    /// Reply to the sender of `mention`
    pub fn to(mention: &Mention, content: impl Into<String>) -> Self {
        Self {
            thread_id: mention.thread_id.clone(),
            recipient_id: mention.sender_id.clone(),
            content: content.into(),
        }
    }

    /// Arguments for Coral's `send_message` tool
    pub fn send_message_args(&self) -> Value {
        json!({
            "threadId": self.thread_id,
            "content": self.content,
            "mentions": [self.recipient_id],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(thread: &str, sender: &str, content: &str) -> Mention {
        Mention {
            thread_id: thread.to_string(),
            sender_id: sender.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_accepts_key_aliases() {
        let camel = json!({ "threadId": "t1", "senderId": "user", "content": "hi" });
        let snake = json!({ "thread_id": "t1", "sender_id": "user", "message": "hi" });
        let short = json!({ "thread": "t1", "from": "user", "text": "hi" });
        for value in [camel, snake, short] {
            assert_eq!(Mention::from_value(&value), Some(mention("t1", "user", "hi")));
        }
    }

    #[test]
    fn test_reads_fields_under_data() {
        let value = json!({ "type": "mention", "data": { "threadId": "t9", "sender": "ops", "content": "go" } });
        assert_eq!(Mention::from_value(&value), Some(mention("t9", "ops", "go")));
    }

    #[test]
    fn test_missing_content_is_empty() {
        let value = json!({ "threadId": "t", "senderId": "s" });
        assert_eq!(Mention::from_value(&value).unwrap().content, "");
    }

    #[test]
    fn test_skips_mentions_without_thread_or_sender() {
        let payload = json!([
            { "threadId": "t1", "content": "no sender" },
            { "senderId": "s", "content": "no thread" },
            { "threadId": " ", "senderId": "s" },
            { "threadId": "t2", "senderId": "s", "content": "ok" }
        ]);
        assert_eq!(parse_mentions(&payload), vec![mention("t2", "s", "ok")]);
    }

    #[test]
    fn test_payload_shapes() {
        let one = json!({ "threadId": "t", "senderId": "s", "content": "c" });
        let expected = vec![mention("t", "s", "c")];

        assert_eq!(parse_mentions(&one), expected);
        assert_eq!(parse_mentions(&json!([one.clone()])), expected);
        assert_eq!(parse_mentions(&json!({ "mentions": [one.clone()] })), expected);
        assert_eq!(parse_mentions(&json!({ "messages": [one.clone()] })), expected);
        assert_eq!(parse_mentions(&Value::String(one.to_string())), expected);
        assert!(parse_mentions(&Value::Null).is_empty());
        assert!(parse_mentions(&json!("No new messages")).is_empty());
        assert!(parse_mentions(&json!({ "mentions": [] })).is_empty());
    }

    #[test]
    fn test_reply_targets_sender_in_thread() {
        let reply = Reply::to(&mention("t1", "alice", "q"), "answer");
        assert_eq!(reply.thread_id, "t1");
        assert_eq!(reply.recipient_id, "alice");
        assert_eq!(
            reply.send_message_args(),
            json!({ "threadId": "t1", "content": "answer", "mentions": ["alice"] })
        );
    }
}
