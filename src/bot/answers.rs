use std::sync::Arc;

use tracing::{debug, warn};

use crate::db::AnswerStore;
use crate::web::metrics::Metrics;

pub struct AnswerResolver {
    store: Arc<dyn AnswerStore>,
}

impl AnswerResolver {
    pub fn new(store: Arc<dyn AnswerStore>) -> Self {
        Self { store }
    }

    /// Missing answers and lookup errors both come back as `None`.
    pub async fn resolve(&self, canonical_term: &str) -> Option<String> {
        match self.store.find_by_canonical_term(canonical_term).await {
            Ok(Some(entry)) => {
                Metrics::answer_hit();
                Some(entry.answer_text)
            }
            Ok(None) => {
                debug!("no answer for {}", canonical_term);
                Metrics::answer_miss();
                None
            }
            Err(e) => {
                warn!("answer lookup failed for {}: {}", canonical_term, e);
                Metrics::answer_miss();
                None
            }
        }
    }
}
