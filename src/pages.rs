//! Locating the HTML pages: the data directory, translated copies of each
//! slide and the page the window opens on.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use gtk::glib;
use gtk4 as gtk;
use walkdir::WalkDir;

pub(crate) const SYSTEM_DATA_DIR: &str = "/pardus";
const SPLASH_PAGE: &str = "splash.html";
const SOFTWARE_ONLY_PAGE: &str = "software-only.html";

fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
}

/// Data directory: the `--data-dir` flag, a `data/` directory next to the
/// binary for development trees, then the system location.
pub(crate) fn resolve_data_dir(custom: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = custom {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        bail!("Data directory {} does not exist", path.display());
    }

    let candidates = executable_dir()
        .map(|dir| dir.join("data"))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(SYSTEM_DATA_DIR)));
    for candidate in candidates {
        if candidate.is_dir() {
            log::info!("Using data directory {}", candidate.display());
            return Ok(candidate);
        }
    }
    bail!("Unable to find the welcome data directory")
}

/// Locale from the environment, without the encoding suffix.
pub(crate) fn system_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
        .map(|value| {
            value
                .split(['.', '@'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .filter(|value| !value.is_empty() && value != "C" && value != "POSIX")
}

/// First directory holding `locale` (then its language part, `tr` for `tr_TR`).
pub(crate) fn locale_dir(roots: &[PathBuf], locale: &str) -> Option<PathBuf> {
    let generic = locale.split('_').next().unwrap_or(locale);
    let mut wanted = vec![locale];
    if generic != locale {
        wanted.push(generic);
    }

    for name in wanted {
        if let Some(dir) = roots.iter().map(|root| root.join(name)).find(|dir| dir.is_dir()) {
            log::info!("Using {} translations from {}", name, dir.display());
            return Some(dir);
        }
        log::debug!("Locale {} not available", name);
    }
    None
}

pub(crate) fn locale_roots() -> Vec<PathBuf> {
    executable_dir()
        .map(|dir| dir.join("i18n"))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(SYSTEM_DATA_DIR)))
        .collect()
}

/// Page file name → file to load, translated where a translation exists.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlideSet {
    slides: HashMap<String, PathBuf>,
}

impl SlideSet {
    pub(crate) fn scan(data_dir: &Path, locale_dir: Option<&Path>) -> Self {
        let mut slides = HashMap::new();
        let pages = WalkDir::new(data_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|extension| extension == "html")
            });

        for page in pages {
            let name = page.file_name().to_string_lossy().into_owned();
            let translated = locale_dir
                .map(|dir| dir.join(&name))
                .filter(|path| path.is_file());
            let path = match translated {
                Some(path) => {
                    log::debug!("Will use translation {}", path.display());
                    path
                }
                None => page.path().to_path_buf(),
            };
            slides.insert(name, path);
        }
        Self { slides }
    }

    pub(crate) fn lookup(&self, page: &str) -> Option<&Path> {
        self.slides.get(page).map(PathBuf::as_path)
    }

    /// Translated HTML for `page`, if the page has a translation outside `data_dir`.
    pub(crate) fn translated_html(&self, data_dir: &Path, page: &str) -> Option<String> {
        let path = self.lookup(page)?;
        if path.starts_with(data_dir) {
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(err) => {
                log::warn!("Couldn't read translation {}: {}", path.display(), err);
                None
            }
        }
    }
}

/// Page the window opens on.
pub(crate) fn start_page(software_only: bool, jump_to: Option<&str>) -> String {
    match jump_to {
        Some(page) if !page.is_empty() => format!("{}.html", page.trim_end_matches(".html")),
        _ if software_only => SOFTWARE_ONLY_PAGE.to_string(),
        _ => SPLASH_PAGE.to_string(),
    }
}

pub(crate) fn page_uri(data_dir: &Path, page: &str) -> Result<String> {
    let path = data_dir.join(page);
    let absolute = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .context("Failed to read the working directory")?
            .join(path)
    };
    let uri = glib::filename_to_uri(&absolute, None)
        .with_context(|| format!("Failed to build a URI for {}", absolute.display()))?;
    Ok(uri.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_page_selection() {
        assert_eq!(start_page(false, None), "splash.html");
        assert_eq!(start_page(true, None), "software-only.html");
        assert_eq!(start_page(true, Some("rpi")), "rpi.html");
        assert_eq!(start_page(false, Some("index.html")), "index.html");
        assert_eq!(start_page(false, Some("")), "splash.html");
    }

    #[test]
    fn translations_replace_only_existing_pages() {
        let data = tempfile::tempdir().expect("data dir");
        let i18n = tempfile::tempdir().expect("i18n dir");
        for page in ["index.html", "splash.html"] {
            fs::write(data.path().join(page), "<html>en</html>").expect("page");
        }
        fs::write(data.path().join("notes.txt"), "skip").expect("notes");
        let tr = i18n.path().join("tr");
        fs::create_dir_all(&tr).expect("tr dir");
        fs::write(tr.join("index.html"), "<html>tr</html>").expect("translation");

        let dir = locale_dir(&[i18n.path().to_path_buf()], "tr_TR").expect("generic locale");
        assert_eq!(dir, tr);
        assert!(locale_dir(&[i18n.path().to_path_buf()], "de_DE").is_none());

        let slides = SlideSet::scan(data.path(), Some(&dir));
        assert_eq!(slides.lookup("index.html"), Some(tr.join("index.html").as_path()));
        assert_eq!(
            slides.lookup("splash.html"),
            Some(data.path().join("splash.html").as_path())
        );
        assert!(slides.lookup("notes.txt").is_none());
        assert_eq!(
            slides.translated_html(data.path(), "index.html").as_deref(),
            Some("<html>tr</html>")
        );
        assert_eq!(slides.translated_html(data.path(), "splash.html"), None);
    }

    #[test]
    fn explicit_data_dir_must_exist() {
        let data = tempfile::tempdir().expect("data dir");
        assert_eq!(
            resolve_data_dir(Some(data.path())).expect("existing dir"),
            data.path()
        );
        assert!(resolve_data_dir(Some(&data.path().join("missing"))).is_err());
    }

    #[test]
    fn page_uris_are_file_uris() {
        let uri = page_uri(Path::new("/pardus"), "index.html").expect("uri");
        assert_eq!(uri, "file:///pardus/index.html");
    }
}
