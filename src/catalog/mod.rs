//! Application catalog: the `applications.json` index of installable
//! programs, validated into typed entries at load time.

mod recipe;
mod schema;
mod validate;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) use recipe::{ALL_RELEASES_KEY, Method, Placeholders, RecipeError, strip_placeholders};
pub(crate) use schema::{AppEntry, Category, css_subcategory};
pub(crate) use validate::{CatalogError, ValidationIssue};

/// Location of the catalog inside the data directory.
pub(crate) const CATALOG_RELATIVE_PATH: &str = "js/applications.json";

#[derive(Clone, Debug)]
pub(crate) struct Catalog {
    path: PathBuf,
    entries: Vec<AppEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub(crate) fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(path, &content)
    }

    pub(crate) fn from_json_str(path: &Path, content: &str) -> Result<Self, CatalogError> {
        let document: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(content).map_err(CatalogError::Parse)?;

        let mut issues = Vec::new();
        let mut entries = Vec::new();
        for (key, value) in document {
            entries.extend(validate::validate_category(&key, value, &mut issues));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                issues.push(ValidationIssue {
                    category: entry.category.key().to_string(),
                    program_id: Some(entry.id.clone()),
                    message: "program id is used by more than one entry".to_string(),
                });
            }
        }

        if !issues.is_empty() {
            return Err(CatalogError::Invalid(issues));
        }

        entries.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.id.cmp(&b.id)));
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id.clone(), position))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            index,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn get(&self, program_id: &str) -> Option<&AppEntry> {
        self.index
            .get(program_id)
            .and_then(|position| self.entries.get(*position))
    }

    /// All entries, grouped by category in display order, ids sorted within.
    pub(crate) fn entries(&self) -> &[AppEntry] {
        &self.entries
    }

    pub(crate) fn in_category(&self, category: Category) -> impl Iterator<Item = &AppEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.category == category)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
