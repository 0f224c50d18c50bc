//! Label template registry.
//!
//! Templates are enumerated once, up front, into a map keyed by format id.
//! Lookups only consult that map; a format id is never turned into a path.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::LabelError;
use crate::fill::placeholders;

/// File extension of template files in a template directory.
pub const TEMPLATE_EXTENSION: &str = "zpl";

/// Resolves a label format identifier to template text.
pub trait TemplateSource: Send + Sync {
    /// Template text with at least one placeholder.
    ///
    /// Fails with [`LabelError::TemplateNotFound`] or
    /// [`LabelError::TemplateEmpty`].
    fn fetch(&self, format_id: &str) -> Result<&str, LabelError>;
}

/// An explicit `format id → template` map.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, String>,
}

impl TemplateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(format id, content)` pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::new();
        for (id, content) in entries {
            registry.insert(id, content);
        }
        registry
    }

    /// Register every `*.zpl` file in `dir`, keyed by file stem.
    ///
    /// Subdirectories and files with other extensions are skipped. A
    /// template that cannot be read as UTF-8 is logged and left out, so
    /// only its own format reports `TemplateNotFound`.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut registry = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION)
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(content) => registry.insert(stem, content),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable label template");
                }
            }
        }
        debug!(dir = %dir.display(), count = registry.len(), "loaded label templates");
        Ok(registry)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, format_id: impl Into<String>, content: impl Into<String>) {
        let format_id = format_id.into();
        let content = content.into();
        debug!(
            format = %format_id,
            placeholders = ?placeholders(&content),
            "registered template"
        );
        self.templates.insert(format_id, content);
    }

    /// Template text that only has to exist (e.g. a fixed test label).
    pub fn raw(&self, format_id: &str) -> Result<&str, LabelError> {
        self.templates
            .get(format_id)
            .map(String::as_str)
            .ok_or_else(|| LabelError::TemplateNotFound {
                format: format_id.to_string(),
            })
    }

    /// Registered format ids, sorted.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for TemplateRegistry {
    fn fetch(&self, format_id: &str) -> Result<&str, LabelError> {
        let content = self.raw(format_id)?;
        if content.trim().is_empty() || placeholders(content).is_empty() {
            return Err(LabelError::TemplateEmpty {
                format: format_id.to_string(),
            });
        }
        Ok(content)
    }
}
