use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use super::recipe::{KeyServer, Method, Recipe};
use super::schema::{AppEntry, Category, PackageSet, RawEntry, RawRecipe, non_empty, split_list};

/// A single problem found in the catalog document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ValidationIssue {
    pub(crate) category: String,
    pub(crate) program_id: Option<String>,
    pub(crate) message: String,
}

impl ValidationIssue {
    fn for_category(category: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            program_id: None,
            message: message.into(),
        }
    }

    fn for_entry(category: &str, program_id: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            program_id: Some(program_id.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.program_id {
            Some(id) => write!(f, "{}/{}: {}", self.category, id, self.message),
            None => write!(f, "{}: {}", self.category, self.message),
        }
    }
}

#[derive(Debug)]
pub(crate) enum CatalogError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Invalid(Vec<ValidationIssue>),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            CatalogError::Parse(err) => write!(f, "malformed catalog document: {}", err),
            CatalogError::Invalid(issues) => {
                write!(f, "catalog has {} invalid field(s)", issues.len())?;
                for issue in issues {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            CatalogError::Parse(err) => Some(err),
            CatalogError::Invalid(_) => None,
        }
    }
}

/// Validates one category object of the document and converts its entries.
pub(super) fn validate_category(
    key: &str,
    value: serde_json::Value,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<AppEntry> {
    let Some(category) = Category::from_key(key) else {
        issues.push(ValidationIssue::for_category(key, "unknown category"));
        return Vec::new();
    };

    let serde_json::Value::Object(map) = value else {
        issues.push(ValidationIssue::for_category(key, "category must be an object"));
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (program_id, raw) in map {
        let raw = match serde_json::from_value::<RawEntry>(raw) {
            Ok(raw) => raw,
            Err(err) => {
                issues.push(ValidationIssue::for_entry(key, &program_id, err.to_string()));
                continue;
            }
        };
        if let Some(entry) = validate_entry(category, &program_id, raw, issues) {
            entries.push(entry);
        }
    }
    entries
}

fn validate_entry(
    category: Category,
    program_id: &str,
    raw: RawEntry,
    issues: &mut Vec<ValidationIssue>,
) -> Option<AppEntry> {
    let key = category.key();
    let before = issues.len();
    let mut require = |field: &str, value: Option<String>| -> String {
        match non_empty(value) {
            Some(value) => value,
            None => {
                issues.push(ValidationIssue::for_entry(
                    key,
                    program_id,
                    format!("missing '{}'", field),
                ));
                String::new()
            }
        }
    };

    let name = require("name", raw.name);
    let img = require("img", raw.img);
    let main_package = require("main-package", raw.main_package);
    let subcategory = require("subcategory", raw.subcategory);
    let arch = split_list(&require("arch", raw.arch));
    let releases = split_list(&require("releases", raw.releases));

    let upgrade_only = raw.upgradable.unwrap_or(false);
    let packages = if upgrade_only {
        PackageSet {
            install: Vec::new(),
            remove: Vec::new(),
            upgrade: split_list(&require("upgrade-packages", raw.upgrade_packages)),
        }
    } else {
        PackageSet {
            install: split_list(&require("install-packages", raw.install_packages)),
            remove: split_list(&require("remove-packages", raw.remove_packages)),
            upgrade: raw
                .upgrade_packages
                .as_deref()
                .map(split_list)
                .unwrap_or_default(),
        }
    };

    let description = match raw.description {
        Some(lines) if !lines.is_empty() => lines.join(" "),
        _ => {
            issues.push(ValidationIssue::for_entry(key, program_id, "missing 'description'"));
            String::new()
        }
    };

    let open_source = flag(key, program_id, "open-source", raw.open_source, issues);
    let working = flag(key, program_id, "working", raw.working, issues);

    let pre_install = match raw.pre_install {
        Some(recipes) if !recipes.is_empty() => {
            let mut converted = BTreeMap::new();
            for (target, recipe) in recipes {
                if let Some(recipe) = validate_recipe(key, program_id, &target, recipe, issues) {
                    converted.insert(target, recipe);
                }
            }
            converted
        }
        _ => {
            issues.push(ValidationIssue::for_entry(key, program_id, "missing 'pre-install'"));
            BTreeMap::new()
        }
    };

    if issues.len() != before {
        return None;
    }

    Some(AppEntry {
        id: program_id.to_string(),
        category,
        name,
        img,
        main_package,
        launch_command: non_empty(raw.launch_command),
        packages,
        upgrade_only,
        description,
        alternate_to: non_empty(raw.alternate_to),
        subcategory,
        open_source,
        url_info: non_empty(raw.url_info),
        url_android: non_empty(raw.url_android),
        url_ios: non_empty(raw.url_ios),
        arch,
        releases,
        working,
        notes: non_empty(raw.notes),
        pre_install,
    })
}

fn flag(
    category: &str,
    program_id: &str,
    field: &str,
    value: Option<bool>,
    issues: &mut Vec<ValidationIssue>,
) -> bool {
    value.unwrap_or_else(|| {
        issues.push(ValidationIssue::for_entry(
            category,
            program_id,
            format!("missing '{}'", field),
        ));
        false
    })
}

fn validate_recipe(
    category: &str,
    program_id: &str,
    target: &str,
    raw: RawRecipe,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Recipe> {
    let mut problem = |message: String| {
        issues.push(ValidationIssue::for_entry(
            category,
            program_id,
            format!("pre-install '{}': {}", target, message),
        ));
    };

    let Some(method_field) = non_empty(raw.method) else {
        problem("missing 'method'".to_string());
        return None;
    };

    let source_file = non_empty(raw.source_file);
    let mut methods = Vec::new();
    let mut valid = true;

    for name in method_field.split('+').map(str::trim) {
        match name {
            "skip" => methods.push(Method::Skip),
            "partner-repo" => methods.push(Method::PartnerRepo),
            "ppa" => match raw.enable_ppa.as_deref().map(str::trim) {
                Some(ppa) if !ppa.is_empty() => methods.push(Method::Ppa {
                    ppa: ppa.to_string(),
                }),
                _ => {
                    problem("method 'ppa' requires 'enable-ppa'".to_string());
                    valid = false;
                }
            },
            "manual" => {
                let key_server = match raw.apt_key_server.as_deref() {
                    None => None,
                    Some([server, key]) => Some(KeyServer {
                        server: server.clone(),
                        key: key.clone(),
                    }),
                    Some(_) => {
                        problem("'apt-key-server' must be [server, key]".to_string());
                        valid = false;
                        None
                    }
                };
                let sources = raw.apt_sources.clone().unwrap_or_default();
                if !sources.is_empty() && source_file.is_none() {
                    problem("'apt-sources' requires 'source-file'".to_string());
                    valid = false;
                }
                methods.push(Method::Manual {
                    key_url: non_empty(raw.apt_key_url.clone()),
                    key_server,
                    sources,
                });
            }
            other => {
                problem(format!("unknown method '{}'", other));
                valid = false;
            }
        }
    }

    valid.then_some(Recipe {
        methods,
        source_file,
    })
}
