use std::sync::Arc;

use tracing::{debug, warn};

use crate::db::SynonymStore;

pub struct SynonymResolver {
    store: Arc<dyn SynonymStore>,
}

impl SynonymResolver {
    pub fn new(store: Arc<dyn SynonymStore>) -> Self {
        Self { store }
    }

    /// Never fails: a token without a usable mapping is its own canonical term.
    pub async fn canonicalize(&self, raw_token: &str) -> String {
        match self.store.find_by_raw_term(raw_token).await {
            Ok(Some(entry)) => {
                debug!("synonym {} -> {}", raw_token, entry.canonical_term);
                entry.canonical_term
            }
            Ok(None) => raw_token.to_string(),
            Err(e) => {
                warn!("synonym lookup failed for {}, using it literally: {}", raw_token, e);
                raw_token.to_string()
            }
        }
    }
}
