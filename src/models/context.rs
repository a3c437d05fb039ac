//! Per-user conversational state.

use serde::{Deserialize, Serialize};

/// Role of a stored chat turn. History holds only user and assistant turns;
/// system and tool messages are prompt-level concerns and are never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn in a user's chat history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The full conversational state for one user.
///
/// The persistent repository stores this document keyed by user id; the cache
/// tier holds a TTL-bounded replica of the same value. Insertion order of
/// `chat_history` is chronological and is the literal prompt context.
/// `birthdate` and `topics` are profile fields passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub chat_history: Vec<Message>,
    #[serde(default)]
    pub chat_interest: Option<String>,
    #[serde(default)]
    pub user_summary: String,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl UserContext {
    /// Context for a first-contact user, seeded from their stated interest.
    pub fn seeded(interest_topic: impl Into<String>) -> Self {
        Self {
            chat_interest: Some(interest_topic.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip() {
        let context = UserContext {
            chat_history: vec![Message::user("hi"), Message::assistant("hello")],
            chat_interest: Some("astronomy".to_string()),
            user_summary: "Talked about telescopes.".to_string(),
            birthdate: Some("1990-04-01".to_string()),
            topics: vec!["space".to_string()],
        };

        let json = serde_json::to_value(&context).unwrap();
        assert!(json.get("chatHistory").is_some());
        assert!(json.get("userSummary").is_some());

        let back: UserContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, context);
    }

    #[test]
    fn test_missing_fields_default() {
        let back: UserContext = serde_json::from_str("{}").unwrap();
        assert!(back.chat_history.is_empty());
        assert!(back.user_summary.is_empty());
        assert!(back.chat_interest.is_none());
    }

    #[test]
    fn test_role_rejects_unknown_values() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"role":"system","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_seeded_context_matches_loaded_shape() {
        let seeded = UserContext::seeded("cooking");
        let loaded: UserContext =
            serde_json::from_str(r#"{"chatInterest":"cooking"}"#).unwrap();
        assert_eq!(seeded, loaded);
    }
}
