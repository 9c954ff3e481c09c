//! Character-based token estimation.
//!
//! ~4 chars per token for English text. Good enough to decide when a
//! conversation needs compaction; the model's own tokenizer is ground truth.

use crate::messages::{ContentPart, Message, MessageContent};

/// Characters per token used by the estimator.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate token count for a piece of text.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Estimate total tokens across a message batch.
///
/// Only the text portions of multimodal content are counted — images are
/// sized by the provider, not by character length.
#[must_use]
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| match &m.content {
            MessageContent::Text(s) => estimate_tokens(s),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => estimate_tokens(text),
                    ContentPart::ImageUrl { .. } => 0,
                })
                .sum(),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ContentPart;

    #[test]
    fn four_chars_per_token() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }

    #[test]
    fn floors_partial_tokens() {
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcde"), 1);
    }

    #[test]
    fn sums_across_messages() {
        let msgs = vec![
            Message::user("x".repeat(40)),
            Message::assistant("y".repeat(40)),
        ];
        assert_eq!(estimate_messages_tokens(&msgs), 20);
    }

    #[test]
    fn multimodal_counts_text_only() {
        let msg = Message {
            role: crate::messages::Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::ImageUrl {
                    url: "data:image/png;base64,AAAA".into(),
                },
                ContentPart::Text {
                    text: "x".repeat(40),
                },
            ]),
            tool_call_id: None,
            tool_calls: None,
            reasoning_content: None,
        };
        assert_eq!(estimate_messages_tokens(&[msg]), 10);
    }
}
