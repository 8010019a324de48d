use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_REPLY: &str =
    "Thank you for your message. How else can I assist you with your learning journey?";

/// Checked in order; the last keyword found in the message wins.
const KEYWORD_REPLIES: &[(&str, &str)] = &[
    (
        "course information",
        "We offer a variety of courses in programming, design, business, and more. Check out our catalog for the full list.",
    ),
    (
        "technical support",
        "For technical issues, please provide details about your problem. Our team will help you resolve it as soon as possible.",
    ),
    (
        "account help",
        "I can help with account-related questions like password resets, profile updates, and subscription management.",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Canned reply for a free-text message, matched case-insensitively.
pub fn keyword_reply(message: &str) -> KeywordReply {
    let lower = message.to_lowercase();
    let response = KEYWORD_REPLIES
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .last()
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY);

    KeywordReply {
        response: response.to_string(),
        timestamp: Utc::now(),
    }
}
