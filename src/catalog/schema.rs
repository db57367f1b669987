use std::collections::BTreeMap;

use serde::Deserialize;

use super::recipe::{Recipe, RecipeError, ResolvedRecipe, resolve};

/// Fixed category set, in the order the software page lists them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) enum Category {
    Accessories,
    Education,
    Games,
    Graphics,
    Internet,
    Office,
    Programming,
    Media,
    SysTools,
    UnivAccess,
    Servers,
    MoreApps,
}

impl Category {
    pub(crate) const ALL: [Category; 12] = [
        Category::Accessories,
        Category::Education,
        Category::Games,
        Category::Graphics,
        Category::Internet,
        Category::Office,
        Category::Programming,
        Category::Media,
        Category::SysTools,
        Category::UnivAccess,
        Category::Servers,
        Category::MoreApps,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Category::Accessories => "Accessories",
            Category::Education => "Education",
            Category::Games => "Games",
            Category::Graphics => "Graphics",
            Category::Internet => "Internet",
            Category::Office => "Office",
            Category::Programming => "Programming",
            Category::Media => "Media",
            Category::SysTools => "SysTools",
            Category::UnivAccess => "UnivAccess",
            Category::Servers => "Servers",
            Category::MoreApps => "MoreApps",
        }
    }

    pub(crate) fn from_key(value: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|category| category.key() == value)
    }
}

/// Package lists for each action, split from the comma-separated document fields.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct PackageSet {
    pub(crate) install: Vec<String>,
    pub(crate) remove: Vec<String>,
    pub(crate) upgrade: Vec<String>,
}

#[derive(Clone, Debug)]
pub(crate) struct AppEntry {
    pub(crate) id: String,
    pub(crate) category: Category,
    pub(crate) name: String,
    pub(crate) img: String,
    pub(crate) main_package: String,
    pub(crate) launch_command: Option<String>,
    pub(crate) packages: PackageSet,
    /// Entry only offers an upgrade path (no install/remove buttons).
    pub(crate) upgrade_only: bool,
    pub(crate) description: String,
    pub(crate) alternate_to: Option<String>,
    pub(crate) subcategory: String,
    pub(crate) open_source: bool,
    pub(crate) url_info: Option<String>,
    pub(crate) url_android: Option<String>,
    pub(crate) url_ios: Option<String>,
    pub(crate) arch: Vec<String>,
    pub(crate) releases: Vec<String>,
    pub(crate) working: bool,
    pub(crate) notes: Option<String>,
    pub(crate) pre_install: BTreeMap<String, Recipe>,
}

impl AppEntry {
    pub(crate) fn supports_arch(&self, arch: &str) -> bool {
        self.arch.iter().any(|value| value == arch)
    }

    pub(crate) fn supports_release(&self, codename: &str) -> bool {
        self.releases.iter().any(|value| value == codename)
    }

    /// Identifier usable in CSS selectors and element ids.
    pub(crate) fn css_id(&self) -> String {
        self.id.replace('.', "-")
    }

    pub(crate) fn css_subcategory(&self) -> String {
        css_subcategory(&self.subcategory)
    }

    pub(crate) fn resolve_recipe(&self, codename: &str) -> Result<ResolvedRecipe<'_>, RecipeError> {
        resolve(&self.id, &self.pre_install, codename)
    }
}

pub(crate) fn css_subcategory(value: &str) -> String {
    value.replace(' ', "-")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct RawEntry {
    pub(super) name: Option<String>,
    pub(super) img: Option<String>,
    pub(super) main_package: Option<String>,
    #[serde(default)]
    pub(super) launch_command: Option<String>,
    #[serde(default)]
    pub(super) install_packages: Option<String>,
    #[serde(default)]
    pub(super) remove_packages: Option<String>,
    #[serde(default)]
    pub(super) upgradable: Option<bool>,
    #[serde(default)]
    pub(super) upgrade_packages: Option<String>,
    #[serde(default)]
    pub(super) description: Option<Vec<String>>,
    #[serde(default)]
    pub(super) alternate_to: Option<String>,
    #[serde(default)]
    pub(super) subcategory: Option<String>,
    #[serde(default)]
    pub(super) open_source: Option<bool>,
    #[serde(default)]
    pub(super) url_info: Option<String>,
    #[serde(default)]
    pub(super) url_android: Option<String>,
    #[serde(default)]
    pub(super) url_ios: Option<String>,
    #[serde(default)]
    pub(super) arch: Option<String>,
    #[serde(default)]
    pub(super) releases: Option<String>,
    #[serde(default)]
    pub(super) working: Option<bool>,
    #[serde(default)]
    pub(super) notes: Option<String>,
    #[serde(default)]
    pub(super) pre_install: Option<BTreeMap<String, RawRecipe>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct RawRecipe {
    #[serde(default)]
    pub(super) method: Option<String>,
    #[serde(default)]
    pub(super) source_file: Option<String>,
    #[serde(default)]
    pub(super) enable_ppa: Option<String>,
    #[serde(default)]
    pub(super) apt_key_url: Option<String>,
    #[serde(default)]
    pub(super) apt_key_server: Option<Vec<String>>,
    #[serde(default)]
    pub(super) apt_sources: Option<Vec<String>>,
}

/// Splits a comma-separated document field, dropping blanks.
pub(super) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Empty strings in the document mean "absent".
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
