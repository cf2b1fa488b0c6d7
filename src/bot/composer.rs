use crate::parsers::MessageUtils;

/// Sent when no term in the question resolved to an answer.
pub const FALLBACK_MESSAGE: &str = "質問の意味が分かりませんでした。申し訳ありませんがプレミアムチームに直接お問い合わせをお願いいたします。";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnswer {
    pub canonical_term: String,
    pub answer_text: String,
}

impl ResolvedAnswer {
    pub fn new(canonical_term: &str, answer_text: &str) -> Self {
        Self {
            canonical_term: canonical_term.to_string(),
            answer_text: answer_text.to_string(),
        }
    }
}

/// Builds the reply body: a mention line, then one block per answer in
/// resolution order, or the fallback sentence when there is none.
pub fn compose_reply(requester_id: &str, answers: &[ResolvedAnswer]) -> String {
    let mut message = MessageUtils::format_mention(requester_id);
    message.push('\n');

    if answers.is_empty() {
        message.push_str(FALLBACK_MESSAGE);
        return message;
    }

    for answer in answers {
        message.push_str(&answer.canonical_term);
        message.push_str(": \r\n");
        message.push_str(&answer.answer_text);
        message.push_str("\r\n\r\n");
    }
    message
}
