//! Content and signal types

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{SigexError, SigexResult};

/// A kind of content signals can be extracted from (photo, video, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentType {
    pub name: String,
    pub qualified_name: String,
}

impl ContentType {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
        }
    }
}

/// A kind of signal (hash, text, url, ...) and the content it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalType {
    pub name: String,
    pub qualified_name: String,
    /// Names of the content types this signal can be derived from
    pub content_types: Vec<String>,
}

impl SignalType {
    pub fn new(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        content_types: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            content_types: content_types.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// A consistent set of content and signal types
///
/// Names are unique per kind, and every signal type only references
/// content types in the same mapping.
#[derive(Debug, Clone, Default)]
pub struct SignalTypeMapping {
    content_types: Vec<ContentType>,
    signal_types: Vec<SignalType>,
}

impl SignalTypeMapping {
    /// Build a mapping, checking names and cross references
    ///
    /// # Errors
    /// Returns `DuplicateRegistration` for a repeated name, or
    /// `IncompatibleSignalType` for a signal type naming unknown content
    pub fn new(content_types: Vec<ContentType>, signal_types: Vec<SignalType>) -> SigexResult<Self> {
        ensure_unique("content type", content_types.iter().map(|c| c.name.as_str()))?;
        ensure_unique("signal type", signal_types.iter().map(|s| s.name.as_str()))?;

        let known: HashSet<&str> = content_types.iter().map(|c| c.name.as_str()).collect();
        for signal in &signal_types {
            if let Some(missing) = signal
                .content_types
                .iter()
                .find(|c| !known.contains(c.as_str()))
            {
                return Err(SigexError::IncompatibleSignalType {
                    signal_type: signal.name.clone(),
                    content_type: missing.clone(),
                });
            }
        }

        Ok(Self {
            content_types,
            signal_types,
        })
    }

    #[must_use]
    pub fn content_types(&self) -> &[ContentType] {
        &self.content_types
    }

    #[must_use]
    pub fn signal_types(&self) -> &[SignalType] {
        &self.signal_types
    }

    #[must_use]
    pub fn content_type(&self, name: &str) -> Option<&ContentType> {
        self.content_types.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn signal_type(&self, name: &str) -> Option<&SignalType> {
        self.signal_types.iter().find(|s| s.name == name)
    }
}

pub(crate) fn ensure_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> SigexResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SigexError::DuplicateRegistration {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
