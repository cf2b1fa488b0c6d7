use anyhow::{Result, anyhow};
use lindera::DictionaryKind;
use lindera::tokenizer::{
    DictionaryConfig, Tokenizer as LinderaTokenizer, TokenizerConfig as LinderaConfig,
};
use tracing::warn;

/// Marker lindera puts in the details of words missing from the dictionary.
const UNKNOWN_DETAIL: &str = "UNK";

/// One analyzed token. `pos` is `None` for unknown words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    pub pos: Option<String>,
}

impl Morpheme {
    pub fn new(surface: &str, pos: Option<&str>) -> Self {
        Self {
            surface: surface.to_string(),
            pos: pos.map(ToOwned::to_owned),
        }
    }
}

pub trait MorphologicalAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<Morpheme>;
}

pub struct LinderaAnalyzer {
    tokenizer: LinderaTokenizer,
}

impl LinderaAnalyzer {
    pub fn new() -> Result<Self> {
        let config = LinderaConfig {
            dictionary: DictionaryConfig {
                kind: Some(DictionaryKind::IPADIC),
                path: None,
            },
            ..LinderaConfig::default()
        };
        let tokenizer = LinderaTokenizer::from_config(config)
            .map_err(|e| anyhow!("failed to build lindera tokenizer: {e}"))?;
        Ok(Self { tokenizer })
    }
}

impl MorphologicalAnalyzer for LinderaAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Morpheme> {
        let tokens = match self.tokenizer.tokenize(text) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("lindera failed to tokenize input: {}", e);
                return Vec::new();
            }
        };

        let mut morphemes = Vec::with_capacity(tokens.len());
        for mut token in tokens {
            let surface = token.get_text().trim().to_string();
            if surface.is_empty() {
                continue;
            }
            let pos = token
                .get_details()
                .and_then(|details| details.first().map(|p| p.to_string()))
                .filter(|p| p != UNKNOWN_DETAIL && p != "*");
            morphemes.push(Morpheme { surface, pos });
        }
        morphemes
    }
}

impl std::fmt::Debug for LinderaAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinderaAnalyzer").finish()
    }
}
