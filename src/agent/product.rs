// SYNOID Pitch Product Facts & Language Catalog
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::error::{PitchError, PitchResult};

/// Languages offered out of the box. Every code here is also understood by
/// both speech backends.
const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("hi", "Hindi"),
    ("en", "English"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("mr", "Marathi"),
];

/// Ordered mapping of language code to human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    entries: Vec<(String, String)>,
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_LANGUAGES
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        }
    }
}

impl LanguageCatalog {
    /// Parse a `code=Name,code=Name` list.
    pub fn parse(raw: &str) -> PitchResult<Self> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (code, name) = item.split_once('=').ok_or_else(|| {
                PitchError::Configuration(format!("language entry '{item}' is not code=Name"))
            })?;
            let code = code.trim().to_lowercase();
            let name = name.trim();
            if code.is_empty() || name.is_empty() {
                return Err(PitchError::Configuration(format!(
                    "language entry '{item}' has an empty code or name"
                )));
            }
            if entries.iter().any(|(c, _)| *c == code) {
                return Err(PitchError::Configuration(format!(
                    "language code '{code}' listed twice"
                )));
            }
            entries.push((code, name.to_string()));
        }
        if entries.is_empty() {
            return Err(PitchError::Configuration(
                "language catalog is empty".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, name)| name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.display_name(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

/// Structured product facts for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    name: String,
    features: Vec<String>,
    context: String,
    language_code: String,
}

impl ProductSpec {
    /// Build from already-split features. Blank entries are dropped, order
    /// and duplicates are kept.
    pub fn new(
        name: &str,
        features: impl IntoIterator<Item = impl AsRef<str>>,
        context: &str,
        language_code: &str,
        catalog: &LanguageCatalog,
    ) -> PitchResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PitchError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }

        let language_code = language_code.trim().to_lowercase();
        if !catalog.contains(&language_code) {
            let known: Vec<&str> = catalog.iter().map(|(c, _)| c).collect();
            return Err(PitchError::InvalidInput(format!(
                "unsupported language '{}' (expected one of: {})",
                language_code,
                known.join(", ")
            )));
        }

        let features = features
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Ok(Self {
            name: name.to_string(),
            features,
            context: context.trim().to_string(),
            language_code,
        })
    }

    /// Build from raw form input where features arrive as one
    /// comma-separated string.
    pub fn from_raw(
        name: &str,
        features_csv: &str,
        context: &str,
        language_code: &str,
        catalog: &LanguageCatalog,
    ) -> PitchResult<Self> {
        Self::new(name, features_csv.split(','), context, language_code, catalog)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Download name for the finished video: whitespace runs become `_`.
    pub fn suggested_filename(&self) -> String {
        suggested_filename(&self.name)
    }
}

pub fn suggested_filename(product_name: &str) -> String {
    let stem = product_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    // Keep the name usable as a single path component.
    let stem: String = stem
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if stem.is_empty() {
        "product_video.mp4".to_string()
    } else {
        format!("{stem}.mp4")
    }
}
