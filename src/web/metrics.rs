use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;
use salvo::prelude::*;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

static EVENTS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static EVENTS_DUPLICATE: AtomicU64 = AtomicU64::new(0);
static EVENTS_SELF: AtomicU64 = AtomicU64::new(0);
static REPLIES_SENT: AtomicU64 = AtomicU64::new(0);
static REPLIES_FAILED: AtomicU64 = AtomicU64::new(0);
static ANSWER_HITS: AtomicU64 = AtomicU64::new(0);
static ANSWER_MISSES: AtomicU64 = AtomicU64::new(0);
static FALLBACK_REPLIES: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    /// Pins the uptime origin; later calls are no-ops.
    pub fn start() {
        Lazy::force(&STARTED_AT);
    }

    pub fn event_received() {
        EVENTS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_event() {
        EVENTS_DUPLICATE.fetch_add(1, Ordering::Relaxed);
    }

    pub fn self_message() {
        EVENTS_SELF.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_sent() {
        REPLIES_SENT.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_failed() {
        REPLIES_FAILED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn answer_hit() {
        ANSWER_HITS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn answer_miss() {
        ANSWER_MISSES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fallback_reply() {
        FALLBACK_REPLIES.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn format_prometheus() -> String {
    let uptime = STARTED_AT.elapsed().as_secs();
    let received = EVENTS_RECEIVED.load(Ordering::Relaxed);
    let duplicates = EVENTS_DUPLICATE.load(Ordering::Relaxed);
    let own = EVENTS_SELF.load(Ordering::Relaxed);
    let sent = REPLIES_SENT.load(Ordering::Relaxed);
    let failed = REPLIES_FAILED.load(Ordering::Relaxed);
    let hits = ANSWER_HITS.load(Ordering::Relaxed);
    let misses = ANSWER_MISSES.load(Ordering::Relaxed);
    let fallbacks = FALLBACK_REPLIES.load(Ordering::Relaxed);

    let lookups = hits + misses;
    let hit_rate = if lookups > 0 {
        (hits as f64 / lookups as f64) * 100.0
    } else {
        0.0
    };

    format!(
        r#"# HELP faqbot_uptime_seconds Number of seconds the bot has been running
# TYPE faqbot_uptime_seconds gauge
faqbot_uptime_seconds {}

# HELP faqbot_events_received_total Actionable events received from Slack
# TYPE faqbot_events_received_total counter
faqbot_events_received_total {}

# HELP faqbot_events_duplicate_total Redelivered events that were skipped
# TYPE faqbot_events_duplicate_total counter
faqbot_events_duplicate_total {}

# HELP faqbot_events_self_total Events posted by the bot itself
# TYPE faqbot_events_self_total counter
faqbot_events_self_total {}

# HELP faqbot_replies_sent_total Replies accepted by chat.postMessage
# TYPE faqbot_replies_sent_total counter
faqbot_replies_sent_total {}

# HELP faqbot_replies_failed_total Replies that could not be delivered
# TYPE faqbot_replies_failed_total counter
faqbot_replies_failed_total {}

# HELP faqbot_answer_hits_total Canonical terms that had an answer
# TYPE faqbot_answer_hits_total counter
faqbot_answer_hits_total {}

# HELP faqbot_answer_misses_total Canonical terms without an answer
# TYPE faqbot_answer_misses_total counter
faqbot_answer_misses_total {}

# HELP faqbot_answer_hit_rate_percent Answer hit rate as percentage
# TYPE faqbot_answer_hit_rate_percent gauge
faqbot_answer_hit_rate_percent {}

# HELP faqbot_fallback_replies_total Replies that used the fallback message
# TYPE faqbot_fallback_replies_total counter
faqbot_fallback_replies_total {}
"#,
        uptime, received, duplicates, own, sent, failed, hits, misses, hit_rate, fallbacks,
    )
}

#[handler]
pub async fn metrics_endpoint(res: &mut Response) {
    res.render(Text::Plain(format_prometheus()));
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests bump them too, so only
    // monotonic growth is asserted.
    #[test]
    fn metrics_increments_counters() {
        let before = EVENTS_RECEIVED.load(Ordering::Relaxed);
        let fallbacks = FALLBACK_REPLIES.load(Ordering::Relaxed);
        Metrics::event_received();
        Metrics::fallback_reply();

        assert!(EVENTS_RECEIVED.load(Ordering::Relaxed) > before);
        assert!(FALLBACK_REPLIES.load(Ordering::Relaxed) > fallbacks);
    }

    #[test]
    fn format_prometheus_includes_all_metrics() {
        let output = format_prometheus();
        for name in [
            "faqbot_uptime_seconds",
            "faqbot_events_received_total",
            "faqbot_events_duplicate_total",
            "faqbot_events_self_total",
            "faqbot_replies_sent_total",
            "faqbot_replies_failed_total",
            "faqbot_answer_hits_total",
            "faqbot_answer_misses_total",
            "faqbot_fallback_replies_total",
        ] {
            assert!(output.contains(name), "missing {name}");
        }
    }
}
