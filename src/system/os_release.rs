use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub(crate) const OS_RELEASE_PATH: &str = "/etc/os-release";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct OsRelease {
    pub(crate) name: String,
    pub(crate) pretty_name: String,
    pub(crate) version_id: String,
    pub(crate) codename: String,
}

impl OsRelease {
    pub(crate) fn detect() -> Result<Self, String> {
        Self::load(Path::new(OS_RELEASE_PATH))
    }

    pub(crate) fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
        Ok(Self::parse(&contents))
    }

    pub(crate) fn parse(contents: &str) -> Self {
        let mut map = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim_matches('"').trim_matches('\'');
                map.insert(key.to_string(), value.to_string());
            }
        }

        let field = |key: &str| map.get(key).cloned().unwrap_or_default();
        let name = field("NAME");
        let pretty_name = map.get("PRETTY_NAME").cloned().unwrap_or_else(|| name.clone());
        // Derivatives carry the upstream codename the catalog is keyed on.
        let codename = map
            .get("UBUNTU_CODENAME")
            .filter(|value| !value.is_empty())
            .or_else(|| map.get("VERSION_CODENAME"))
            .cloned()
            .unwrap_or_default();

        Self {
            name,
            pretty_name,
            version_id: field("VERSION_ID"),
            codename,
        }
    }
}
