//! Supplemental term list in the `surface,segmentation,reading,pos` CSV layout.
//!
//! ```text
//! # comment
//! 東京スカイツリー,東京 スカイツリー,トウキョウ スカイツリー,カスタム名詞
//! ```

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDictionaryEntry {
    pub surface: String,
    pub segments: Vec<String>,
    pub readings: Vec<String>,
    pub pos: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Term(&'a UserDictionaryEntry),
}

#[derive(Debug, Clone, Default)]
pub struct UserDictionary {
    // longest surface first, so overlapping terms prefer the longer match
    entries: Vec<UserDictionaryEntry>,
}

impl UserDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(bytes: &[u8]) -> Self {
        let content = String::from_utf8_lossy(bytes);
        let mut entries = Vec::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim_start_matches('\u{feff}').trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_record(line) {
                Some(entry) => entries.push(entry),
                None => warn!(
                    "skipping malformed user dictionary record line={} record={}",
                    index + 1,
                    line
                ),
            }
        }

        entries.sort_by(|a, b| b.surface.chars().count().cmp(&a.surface.chars().count()));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits `text` into dictionary terms and the plain runs between them.
    pub fn segment<'a>(&'a self, text: &'a str) -> Vec<Segment<'a>> {
        if self.entries.is_empty() {
            return vec![Segment::Plain(text)];
        }

        let mut segments = Vec::new();
        let mut plain_start = 0;
        let mut cursor = 0;

        while cursor < text.len() {
            let rest = &text[cursor..];
            if let Some(entry) = self.entries.iter().find(|e| rest.starts_with(&e.surface)) {
                if plain_start < cursor {
                    segments.push(Segment::Plain(&text[plain_start..cursor]));
                }
                segments.push(Segment::Term(entry));
                cursor += entry.surface.len();
                plain_start = cursor;
            } else {
                cursor += rest.chars().next().map_or(1, char::len_utf8);
            }
        }

        if plain_start < text.len() {
            segments.push(Segment::Plain(&text[plain_start..]));
        }
        segments
    }
}

fn parse_record(line: &str) -> Option<UserDictionaryEntry> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [surface, segmentation, reading, pos] = fields.as_slice() else {
        return None;
    };
    if surface.is_empty() || pos.is_empty() {
        return None;
    }

    let mut segments: Vec<String> = segmentation.split_whitespace().map(String::from).collect();
    if segments.is_empty() {
        segments.push(surface.to_string());
    }

    Some(UserDictionaryEntry {
        surface: surface.to_string(),
        segments,
        readings: reading.split_whitespace().map(String::from).collect(),
        pos: pos.to_string(),
    })
}
