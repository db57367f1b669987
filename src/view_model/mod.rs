//! Turns catalog and system state into jQuery snippets for the WebView.
//!
//! The pages own their markup; everything here only targets ids and classes
//! the pages already carry, so the functions return a [`Script`] instead of
//! touching the view directly.

mod apps;
mod page;
mod specs;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub(crate) use apps::{
    FilterState, ListingContext, apply_filter, info_toggle, mark_applying, update_all_app_status,
    update_app_status,
};
pub(crate) use page::{
    PageContext, autostart_script, connectivity_script, page_name, push_config,
    rpi_resize_script, subscribing_script, wants_smooth_footer,
};
pub(crate) use specs::{placeholder_script, specs_scripts};

pub(crate) const SCREENSHOT_RELATIVE_DIR: &str = "img/applications/screenshots";

/// Quotes `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// A batch of statements evaluated in one `evaluate_javascript` call.
#[derive(Clone, Debug, Default)]
pub(crate) struct Script {
    lines: Vec<String>,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(crate) fn extend(&mut self, other: Script) {
        self.lines.extend(other.lines);
    }

    fn call(&mut self, selector: &str, method: &str, argument: Option<&str>) {
        let argument = argument.map(js_string).unwrap_or_default();
        self.lines.push(format!(
            "$({}).{}({});",
            js_string(selector),
            method,
            argument
        ));
    }

    pub(crate) fn show(&mut self, selector: &str) {
        self.call(selector, "show", None);
    }

    pub(crate) fn hide(&mut self, selector: &str) {
        self.call(selector, "hide", None);
    }

    pub(crate) fn toggle(&mut self, selector: &str, visible: bool) {
        if visible {
            self.show(selector);
        } else {
            self.hide(selector);
        }
    }

    pub(crate) fn fade_in(&mut self, selector: &str, speed: &str) {
        self.call(selector, "fadeIn", Some(speed));
    }

    pub(crate) fn fade_out(&mut self, selector: &str, speed: &str) {
        self.call(selector, "fadeOut", Some(speed));
    }

    pub(crate) fn set_html(&mut self, selector: &str, html: &str) {
        self.call(selector, "html", Some(html));
    }

    pub(crate) fn append(&mut self, selector: &str, html: &str) {
        self.call(selector, "append", Some(html));
    }

    pub(crate) fn add_class(&mut self, selector: &str, class: &str) {
        self.call(selector, "addClass", Some(class));
    }

    pub(crate) fn remove_class(&mut self, selector: &str, class: &str) {
        self.call(selector, "removeClass", Some(class));
    }

    pub(crate) fn set_css(&mut self, selector: &str, property: &str, value: &str) {
        self.lines.push(format!(
            "$({}).css({}, {});",
            js_string(selector),
            js_string(property),
            js_string(value)
        ));
    }

    pub(crate) fn set_width(&mut self, selector: &str, width: &str) {
        self.call(selector, "width", Some(width));
    }

    /// `var name = value;` with the value already in JavaScript syntax.
    pub(crate) fn set_var(&mut self, name: &str, value: &str) {
        self.lines.push(format!("var {} = {};", name, value));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn render(&self) -> String {
        self.lines.join("\n")
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// Screenshot file stems available under the data directory.
#[derive(Clone, Debug, Default)]
pub(crate) struct ScreenshotIndex {
    dir: PathBuf,
    stems: BTreeSet<String>,
}

impl ScreenshotIndex {
    pub(crate) fn scan(data_dir: &Path) -> Self {
        let dir = data_dir.join(SCREENSHOT_RELATIVE_DIR);
        let stems = WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|extension| extension == "jpg")
            })
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .collect::<BTreeSet<_>>();
        log::debug!("Found {} screenshots in {}", stems.len(), dir.display());
        Self { dir, stems }
    }

    /// `<img>-1`, `<img>-2`, ... up to the first gap.
    pub(crate) fn for_image(&self, img: &str) -> Vec<String> {
        (1..)
            .map(|number| format!("{}-{}", img, number))
            .take_while(|stem| self.stems.contains(stem))
            .collect()
    }

    pub(crate) fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.jpg", stem))
    }
}
