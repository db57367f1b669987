use std::collections::BTreeMap;
use std::fmt;

/// Recipe key used when no codename-specific recipe exists.
pub(crate) const ALL_RELEASES_KEY: &str = "all";

const CODENAME_TOKEN: &str = "CODENAME";
const OS_VERSION_TOKEN: &str = "OSVERSION";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct KeyServer {
    pub(crate) server: String,
    pub(crate) key: String,
}

/// One repository preparation step, applied in document order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Method {
    Skip,
    PartnerRepo,
    Ppa {
        ppa: String,
    },
    Manual {
        key_url: Option<String>,
        key_server: Option<KeyServer>,
        sources: Vec<String>,
    },
}

impl Method {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Method::Skip => "skip",
            Method::PartnerRepo => "partner-repo",
            Method::Ppa { .. } => "ppa",
            Method::Manual { .. } => "manual",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Recipe {
    pub(crate) methods: Vec<Method>,
    /// Name of the `sources.list.d` file (without `.list`), may hold placeholders.
    pub(crate) source_file: Option<String>,
}

/// A recipe chosen for the running release, with the key it was stored under.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedRecipe<'a> {
    pub(crate) target: &'a str,
    pub(crate) recipe: &'a Recipe,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RecipeError {
    NoRecipe { program_id: String, codename: String },
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::NoRecipe {
                program_id,
                codename,
            } => write!(
                f,
                "{} has no pre-install recipe for '{}' or '{}'",
                program_id, codename, ALL_RELEASES_KEY
            ),
        }
    }
}

impl std::error::Error for RecipeError {}

/// Picks the recipe for `codename`, falling back to the `all` recipe.
pub(crate) fn resolve<'a>(
    program_id: &str,
    recipes: &'a BTreeMap<String, Recipe>,
    codename: &str,
) -> Result<ResolvedRecipe<'a>, RecipeError> {
    recipes
        .get_key_value(codename)
        .or_else(|| recipes.get_key_value(ALL_RELEASES_KEY))
        .map(|(target, recipe)| ResolvedRecipe {
            target: target.as_str(),
            recipe,
        })
        .ok_or_else(|| RecipeError::NoRecipe {
            program_id: program_id.to_string(),
            codename: codename.to_string(),
        })
}

/// Values substituted for the `CODENAME` and `OSVERSION` tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Placeholders {
    pub(crate) codename: String,
    pub(crate) os_version: String,
}

impl Placeholders {
    pub(crate) fn new(codename: impl Into<String>, os_version: impl Into<String>) -> Self {
        Self {
            codename: codename.into(),
            os_version: os_version.into(),
        }
    }

    pub(crate) fn apply(&self, text: &str) -> String {
        text.replace(OS_VERSION_TOKEN, &self.os_version)
            .replace(CODENAME_TOKEN, &self.codename)
    }
}

/// Drops the placeholder tokens so the helper can match any release by wildcard.
pub(crate) fn strip_placeholders(text: &str) -> String {
    text.replace(CODENAME_TOKEN, "").replace(OS_VERSION_TOKEN, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip_recipe() -> Recipe {
        Recipe {
            methods: vec![Method::Skip],
            source_file: None,
        }
    }

    fn ppa_recipe() -> Recipe {
        Recipe {
            methods: vec![Method::Ppa {
                ppa: "ppa:example/stable".to_string(),
            }],
            source_file: Some("example-stable-CODENAME".to_string()),
        }
    }

    #[test]
    fn codename_recipe_wins_over_all() {
        let mut recipes = BTreeMap::new();
        recipes.insert("all".to_string(), skip_recipe());
        recipes.insert("bionic".to_string(), ppa_recipe());

        let resolved = resolve("demo", &recipes, "bionic").expect("recipe");
        assert_eq!(resolved.target, "bionic");
        assert_eq!(resolved.recipe, &ppa_recipe());
    }

    #[test]
    fn falls_back_to_all_recipe() {
        let mut recipes = BTreeMap::new();
        recipes.insert("all".to_string(), skip_recipe());
        recipes.insert("xenial".to_string(), ppa_recipe());

        let resolved = resolve("demo", &recipes, "bionic").expect("recipe");
        assert_eq!(resolved.target, "all");
        assert_eq!(resolved.recipe.methods, vec![Method::Skip]);
    }

    #[test]
    fn missing_recipe_is_an_error() {
        let mut recipes = BTreeMap::new();
        recipes.insert("xenial".to_string(), ppa_recipe());

        let err = resolve("demo", &recipes, "bionic").unwrap_err();
        assert_eq!(
            err,
            RecipeError::NoRecipe {
                program_id: "demo".to_string(),
                codename: "bionic".to_string(),
            }
        );
        assert!(err.to_string().contains("bionic"));
    }

    #[test]
    fn placeholders_are_replaced_everywhere() {
        let placeholders = Placeholders::new("bionic", "18.04");
        let line = "deb http://repo.example/OSVERSION CODENAME main # CODENAME-OSVERSION";
        let applied = placeholders.apply(line);
        assert_eq!(
            applied,
            "deb http://repo.example/18.04 bionic main # bionic-18.04"
        );
        assert!(!applied.contains("CODENAME"));
        assert!(!applied.contains("OSVERSION"));
    }

    #[test]
    fn strip_leaves_wildcard_friendly_name() {
        assert_eq!(strip_placeholders("example-stable-CODENAME"), "example-stable-");
        assert_eq!(strip_placeholders("vendor-OSVERSION-CODENAME"), "vendor--");
    }
}
