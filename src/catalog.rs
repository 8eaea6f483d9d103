use crate::model::{CatalogEntry, CatalogError};
use crate::utils::strip_formatting;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use tracing::info;

/// Read-only item catalog loaded once at startup.
///
/// Entries keep the order of the snapshot file, which is the order the
/// resolver scans them in.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl ItemCatalog {
    pub fn load(path: &str) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        info!("Loaded item catalog with {} items from {}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => Ok(Self::from_entries(map)),
            _ => Err(CatalogError::NotAnObject),
        }
    }

    pub fn from_entries(map: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut catalog = Self::default();
        for (key, metadata) in map {
            let id = key.to_uppercase();
            if catalog.index.contains_key(&id) {
                continue;
            }
            let text = |field: &str| metadata.get(field).and_then(Value::as_str).map(String::from);
            let mut entry = CatalogEntry {
                display_name: text("displayname"),
                name: text("name"),
                search_name: String::new(),
                plain_name: String::new(),
                id: id.clone(),
                metadata,
            };
            let (search_name, plain_name) = entry
                .label()
                .map(|label| (label.to_lowercase(), strip_formatting(label).trim().to_lowercase()))
                .unwrap_or_default();
            entry.search_name = search_name;
            entry.plain_name = plain_name;
            catalog.index.insert(id, catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
