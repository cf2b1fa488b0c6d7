//! Question answering pipeline: dedup, term extraction, synonym and answer
//! lookup, then one reply per admitted event.
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::DatabaseError;
use crate::slack::InboundEvent;
use crate::tokenizer::TermExtractor;
use crate::web::metrics::Metrics;

pub mod answers;
pub mod composer;
pub mod dedup;
pub mod synonyms;

pub use self::answers::AnswerResolver;
pub use self::composer::{FALLBACK_MESSAGE, ResolvedAnswer, compose_reply};
pub use self::dedup::EventDeduplicator;
pub use self::synonyms::SynonymResolver;

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, channel_id: &str, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("dedup store unavailable: {0}")]
    Dedup(#[from] DatabaseError),
    #[error("failed to deliver reply: {0:#}")]
    Delivery(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Delivered,
    Duplicate,
    OwnMessage,
}

/// How the bot recognises its own posts.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub bot_id: String,
    pub bot_user_id: Option<String>,
}

impl BotIdentity {
    pub fn is_own_message(&self, event: &InboundEvent) -> bool {
        if event.bot_id.as_deref() == Some(self.bot_id.as_str()) {
            return true;
        }
        self.bot_user_id.as_deref() == Some(event.requester_id.as_str())
    }
}

/// Text in, reply text out. Holds no per-event state.
pub struct ReplyBuilder {
    extractor: Arc<dyn TermExtractor>,
    synonyms: SynonymResolver,
    answers: AnswerResolver,
}

impl ReplyBuilder {
    pub fn new(
        extractor: Arc<dyn TermExtractor>,
        synonyms: SynonymResolver,
        answers: AnswerResolver,
    ) -> Self {
        Self {
            extractor,
            synonyms,
            answers,
        }
    }

    pub async fn resolve(&self, text: &str) -> Vec<ResolvedAnswer> {
        let tokens = self.extractor.extract_terms(text).await;
        debug!("extracted tokens={:?}", tokens);

        let mut resolved = Vec::new();
        for token in tokens {
            let canonical = self.synonyms.canonicalize(&token).await;
            if let Some(answer_text) = self.answers.resolve(&canonical).await {
                resolved.push(ResolvedAnswer {
                    canonical_term: canonical,
                    answer_text,
                });
            }
        }
        resolved
    }

    pub async fn build_reply(&self, requester_id: &str, text: &str) -> String {
        let resolved = self.resolve(text).await;
        if resolved.is_empty() {
            Metrics::fallback_reply();
        }
        compose_reply(requester_id, &resolved)
    }
}

pub struct BotCore {
    identity: BotIdentity,
    dedup: EventDeduplicator,
    replies: ReplyBuilder,
    sender: Arc<dyn MessageSender>,
}

impl BotCore {
    pub fn new(
        identity: BotIdentity,
        dedup: EventDeduplicator,
        replies: ReplyBuilder,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            identity,
            dedup,
            replies,
            sender,
        }
    }

    pub fn replies(&self) -> &ReplyBuilder {
        &self.replies
    }

    /// Runs one actionable event to completion. The dedup record is written
    /// before anything is sent, so a failed send is not retried on redelivery.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<Disposition, BotError> {
        if self.identity.is_own_message(event) {
            debug!("skipping own message event_id={}", event.event_id);
            Metrics::self_message();
            return Ok(Disposition::OwnMessage);
        }

        if !self.dedup.admit(&event.event_id, &event.text).await? {
            info!("duplicate delivery event_id={}", event.event_id);
            Metrics::duplicate_event();
            return Ok(Disposition::Duplicate);
        }

        let reply = self
            .replies
            .build_reply(&event.requester_id, &event.text)
            .await;

        match self.sender.send_message(&event.channel_id, &reply).await {
            Ok(()) => {
                info!(
                    "reply sent event_id={} channel={}",
                    event.event_id, event.channel_id
                );
                Metrics::reply_sent();
                Ok(Disposition::Delivered)
            }
            Err(e) => {
                warn!(
                    "reply delivery failed event_id={} channel={}: {:#}",
                    event.event_id, event.channel_id, e
                );
                Metrics::reply_failed();
                Err(BotError::Delivery(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::anyhow;
    use parking_lot::Mutex;

    use super::*;
    use crate::config::DedupFailurePolicy;
    use crate::db::EventStore;
    use crate::db::memory::{MemoryAnswerStore, MemoryEventStore, MemorySynonymStore};

    /// Maps whole message texts to a fixed token list.
    struct ScriptedExtractor {
        script: HashMap<&'static str, Vec<&'static str>>,
    }

    #[async_trait]
    impl TermExtractor for ScriptedExtractor {
        async fn extract_terms(&self, text: &str) -> Vec<String> {
            self.script
                .get(text)
                .map(|tokens| tokens.iter().map(|t| t.to_string()).collect())
                .unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_message(&self, channel_id: &str, text: &str) -> anyhow::Result<()> {
            if self.fail {
                return Err(anyhow!("channel_not_found"));
            }
            self.sent
                .lock()
                .push((channel_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Harness {
        core: BotCore,
        events: Arc<MemoryEventStore>,
        sender: Arc<RecordingSender>,
    }

    struct HarnessBuilder {
        events: Arc<MemoryEventStore>,
        synonyms: MemorySynonymStore,
        answers: MemoryAnswerStore,
        sender: RecordingSender,
        policy: DedupFailurePolicy,
    }

    impl HarnessBuilder {
        fn new() -> Self {
            Self {
                events: Arc::new(MemoryEventStore::default()),
                synonyms: MemorySynonymStore::with_entries(&[("予算", "budget")]),
                answers: MemoryAnswerStore::with_entries(&[
                    ("budget", "costs are tracked quarterly"),
                    ("travel", "book through the portal"),
                    ("経費", "submit receipts monthly"),
                ]),
                sender: RecordingSender::default(),
                policy: DedupFailurePolicy::FailClosed,
            }
        }

        fn build(self) -> Harness {
            let script = HashMap::from([
                ("予算について教えて", vec!["予算"]),
                ("budget question", vec!["budget"]),
                ("what?", vec![]),
                ("three things", vec!["travel", "予算", "経費"]),
                ("twice", vec!["予算", "予算"]),
                ("unknown and known", vec!["謎", "経費"]),
            ]);
            let sender = Arc::new(self.sender);
            let replies = ReplyBuilder::new(
                Arc::new(ScriptedExtractor { script }),
                SynonymResolver::new(Arc::new(self.synonyms)),
                AnswerResolver::new(Arc::new(self.answers)),
            );
            let core = BotCore::new(
                BotIdentity {
                    bot_id: "B0BOT".to_string(),
                    bot_user_id: Some("UBOT".to_string()),
                },
                EventDeduplicator::new(self.events.clone(), self.policy),
                replies,
                sender.clone(),
            );
            Harness {
                core,
                events: self.events,
                sender,
            }
        }
    }

    fn mention(event_id: &str, user: &str, text: &str) -> InboundEvent {
        InboundEvent {
            event_id: event_id.to_string(),
            text: text.to_string(),
            requester_id: user.to_string(),
            channel_id: "C1".to_string(),
            bot_id: None,
        }
    }

    #[tokio::test]
    async fn answers_once_per_event_id() {
        let harness = HarnessBuilder::new().build();
        let event = mention("Ev1", "U1", "予算について教えて");

        let first = harness.core.handle_event(&event).await.expect("handled");
        let second = harness.core.handle_event(&event).await.expect("handled");

        assert_eq!(first, Disposition::Delivered);
        assert_eq!(second, Disposition::Duplicate);
        let sent = harness.sender.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "C1");
        assert_eq!(
            sent[0].1,
            "<@U1>\nbudget: \r\ncosts are tracked quarterly\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn redelivery_with_different_text_is_still_a_duplicate() {
        let harness = HarnessBuilder::new().build();
        harness
            .core
            .handle_event(&mention("Ev1", "U1", "予算について教えて"))
            .await
            .expect("handled");
        let again = harness
            .core
            .handle_event(&mention("Ev1", "U1", "three things"))
            .await
            .expect("handled");

        assert_eq!(again, Disposition::Duplicate);
        assert_eq!(harness.sender.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn no_terms_gets_fallback() {
        let harness = HarnessBuilder::new().build();
        harness
            .core
            .handle_event(&mention("Ev2", "U7", "what?"))
            .await
            .expect("handled");

        let sent = harness.sender.sent.lock();
        assert_eq!(sent[0].1, format!("<@U7>\n{}", FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn answers_keep_token_order() {
        let harness = HarnessBuilder::new().build();
        let reply = harness
            .core
            .replies()
            .build_reply("U1", "three things")
            .await;

        let travel = reply.find("travel: ").expect("travel");
        let budget = reply.find("budget: ").expect("budget");
        let expenses = reply.find("経費: ").expect("expenses");
        assert!(travel < budget && budget < expenses);
    }

    #[tokio::test]
    async fn repeated_tokens_repeat_answers() {
        let harness = HarnessBuilder::new().build();
        let resolved = harness.core.replies().resolve("twice").await;
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|a| a.canonical_term == "budget"));
    }

    #[tokio::test]
    async fn unmapped_token_is_looked_up_literally() {
        let harness = HarnessBuilder::new().build();
        let resolved = harness.core.replies().resolve("unknown and known").await;
        assert_eq!(
            resolved,
            vec![ResolvedAnswer::new("経費", "submit receipts monthly")]
        );
    }

    #[tokio::test]
    async fn canonical_term_without_synonym_row_resolves() {
        let harness = HarnessBuilder::new().build();
        let resolved = harness.core.replies().resolve("budget question").await;
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn own_app_posts_are_skipped_before_dedup() {
        let harness = HarnessBuilder::new().build();
        let mut event = mention("Ev3", "U1", "予算について教えて");
        event.bot_id = Some("B0BOT".to_string());

        let outcome = harness.core.handle_event(&event).await.expect("handled");

        assert_eq!(outcome, Disposition::OwnMessage);
        assert!(harness.sender.sent.lock().is_empty());
        assert_eq!(harness.events.len(), 0);
    }

    #[tokio::test]
    async fn own_user_posts_are_skipped() {
        let harness = HarnessBuilder::new().build();
        let outcome = harness
            .core
            .handle_event(&mention("Ev4", "UBOT", "予算について教えて"))
            .await
            .expect("handled");
        assert_eq!(outcome, Disposition::OwnMessage);
    }

    #[tokio::test]
    async fn other_bots_are_answered() {
        let harness = HarnessBuilder::new().build();
        let mut event = mention("Ev5", "U9", "予算について教えて");
        event.bot_id = Some("B0OTHER".to_string());

        let outcome = harness.core.handle_event(&event).await.expect("handled");
        assert_eq!(outcome, Disposition::Delivered);
    }

    #[tokio::test]
    async fn failed_send_keeps_dedup_record() {
        let mut builder = HarnessBuilder::new();
        builder.sender.fail = true;
        let harness = builder.build();
        let event = mention("Ev6", "U1", "予算について教えて");

        let err = harness
            .core
            .handle_event(&event)
            .await
            .expect_err("send fails");
        assert!(matches!(err, BotError::Delivery(_)));
        assert!(
            harness
                .events
                .find_by_event_id("Ev6")
                .await
                .expect("lookup")
                .is_some()
        );

        let again = harness.core.handle_event(&event).await.expect("handled");
        assert_eq!(again, Disposition::Duplicate);
    }

    #[tokio::test]
    async fn dedup_outage_fails_closed_without_sending() {
        let mut builder = HarnessBuilder::new();
        builder.events = Arc::new(MemoryEventStore::failing());
        let harness = builder.build();

        let err = harness
            .core
            .handle_event(&mention("Ev7", "U1", "予算について教えて"))
            .await
            .expect_err("dedup fails");
        assert!(matches!(err, BotError::Dedup(_)));
        assert!(harness.sender.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn dedup_outage_can_fail_open() {
        let mut builder = HarnessBuilder::new();
        builder.events = Arc::new(MemoryEventStore::failing());
        builder.policy = DedupFailurePolicy::FailOpen;
        let harness = builder.build();

        let outcome = harness
            .core
            .handle_event(&mention("Ev8", "U1", "予算について教えて"))
            .await
            .expect("handled");
        assert_eq!(outcome, Disposition::Delivered);
    }

    #[tokio::test]
    async fn lookup_outages_degrade_to_fallback() {
        let mut builder = HarnessBuilder::new();
        builder.synonyms = MemorySynonymStore::failing();
        builder.answers = MemoryAnswerStore::failing();
        let harness = builder.build();

        let reply = harness
            .core
            .replies()
            .build_reply("U1", "予算について教えて")
            .await;
        assert!(reply.ends_with(FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn concurrent_deliveries_send_once() {
        let harness = Arc::new(HarnessBuilder::new().build());
        let event = mention("Ev9", "U1", "予算について教えて");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let harness = harness.clone();
                let event = event.clone();
                tokio::spawn(async move { harness.core.handle_event(&event).await })
            })
            .collect();
        let mut delivered = 0;
        for handle in handles {
            if handle.await.expect("task").expect("handled") == Disposition::Delivered {
                delivered += 1;
            }
        }

        assert_eq!(delivered, 1);
        assert_eq!(harness.sender.sent.lock().len(), 1);
    }
}
