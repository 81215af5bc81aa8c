//! Localized status and error text.
//!
//! Keys are dotted `section.name` paths (`status.400`, `errors.77102`,
//! `messages.sending`). Lookups never fail: an unknown key renders as the
//! key itself.

use std::collections::HashMap;
use std::path::Path;

use crate::email::EmailError;

const ENGLISH: &str = include_str!("../../resources/lang/en.toml");

pub trait MessageCatalog: Send + Sync {
    fn lookup(&self, key: &str) -> Option<&str>;

    /// Renders `key`, substituting `{name}` placeholders from `params`.
    fn message(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut text = match self.lookup(key) {
            Some(text) => text.to_string(),
            None => return key.to_string(),
        };
        for (name, value) in params {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }
}

#[derive(Debug, Clone, Default)]
pub struct TomlCatalog {
    entries: HashMap<String, String>,
}

impl TomlCatalog {
    pub fn english() -> Self {
        match Self::from_toml_str(ENGLISH) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Built-in message catalog is invalid: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, EmailError> {
        let sections: HashMap<String, HashMap<String, String>> = toml_edit::de::from_str(content)
            .map_err(|e| EmailError::ConfigError(format!("invalid message catalog: {}", e)))?;

        let entries = sections
            .into_iter()
            .flat_map(|(section, values)| {
                values
                    .into_iter()
                    .map(move |(key, text)| (format!("{}.{}", section, key), text))
            })
            .collect();

        Ok(Self { entries })
    }

    /// Loads a catalog file, with missing keys falling back to English.
    pub fn load_from_file(path: &Path) -> Result<Self, EmailError> {
        let content = std::fs::read_to_string(path)?;
        let mut catalog = Self::english();
        catalog.entries.extend(Self::from_toml_str(&content)?.entries);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageCatalog for TomlCatalog {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}
