//! Content-word extraction from chat text.
use std::sync::Arc;

use async_trait::async_trait;
use unicode_normalization::UnicodeNormalization;

use crate::parsers::MessageUtils;

pub mod analyzer;
pub mod cache;
pub mod source;
pub mod user_dic;

pub use self::analyzer::{LinderaAnalyzer, MorphologicalAnalyzer};
pub use self::cache::DictionaryCache;
pub use self::user_dic::{Segment, UserDictionary};

/// Part-of-speech tag shared by every noun class in IPADIC-style tag sets.
const NOUN_TAG: &str = "名詞";

/// Turns free text into the ordered list of terms worth looking up.
#[async_trait]
pub trait TermExtractor: Send + Sync {
    async fn extract_terms(&self, text: &str) -> Vec<String>;
}

pub fn is_content_word(pos: &str) -> bool {
    pos.contains(NOUN_TAG)
}

pub struct Tokenizer {
    analyzer: Arc<dyn MorphologicalAnalyzer>,
    dictionary: Arc<DictionaryCache>,
}

impl Tokenizer {
    pub fn new(analyzer: Arc<dyn MorphologicalAnalyzer>, dictionary: Arc<DictionaryCache>) -> Self {
        Self {
            analyzer,
            dictionary,
        }
    }

    pub fn dictionary(&self) -> Arc<DictionaryCache> {
        self.dictionary.clone()
    }

    pub fn tokenize_with(&self, text: &str, dictionary: &UserDictionary) -> Vec<String> {
        let normalized: String = text.nfc().collect();
        let cleaned = MessageUtils::strip_slack_markup(&normalized);

        let mut terms = Vec::new();
        for segment in dictionary.segment(&cleaned) {
            match segment {
                Segment::Plain(chunk) => {
                    if chunk.trim().is_empty() {
                        continue;
                    }
                    for morpheme in self.analyzer.analyze(chunk) {
                        if let Some(pos) = &morpheme.pos
                            && is_content_word(pos)
                        {
                            terms.push(morpheme.surface);
                        }
                    }
                }
                Segment::Term(entry) => {
                    if is_content_word(&entry.pos) {
                        terms.extend(entry.segments.iter().cloned());
                    }
                }
            }
        }
        terms
    }
}

#[async_trait]
impl TermExtractor for Tokenizer {
    async fn extract_terms(&self, text: &str) -> Vec<String> {
        let dictionary = self.dictionary.get().await;
        self.tokenize_with(text, &dictionary)
    }
}
