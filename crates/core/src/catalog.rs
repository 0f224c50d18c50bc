//! Parts catalog loaded from a JSON export.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::{LabelError, Part};

/// Errors that can occur when loading a parts catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("cannot read parts catalog: {0}")]
    Io(#[from] io::Error),

    /// JSON deserialization failed.
    #[error("invalid parts catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Two entries share a part number.
    #[error("duplicate part number in catalog: {0}")]
    DuplicatePart(String),
}

/// Parts indexed by part number.
#[derive(Debug, Clone, Default)]
pub struct PartsCatalog {
    parts: BTreeMap<String, Part>,
}

impl PartsCatalog {
    /// Build a catalog, rejecting duplicate part numbers.
    pub fn from_parts(parts: impl IntoIterator<Item = Part>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for part in parts {
            if map.contains_key(&part.part_number) {
                return Err(CatalogError::DuplicatePart(part.part_number));
            }
            map.insert(part.part_number.clone(), part);
        }
        Ok(Self { parts: map })
    }

    /// Parse a JSON array of parts.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let parts: Vec<Part> = serde_json::from_str(json)?;
        Self::from_parts(parts)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Look a part up by number.
    pub fn get(&self, part_number: &str) -> Result<&Part, LabelError> {
        self.parts
            .get(part_number)
            .ok_or_else(|| LabelError::PartNotInCatalog {
                part: part_number.to_string(),
            })
    }

    /// All parts, ordered by part number.
    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// `true` when the catalog has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
