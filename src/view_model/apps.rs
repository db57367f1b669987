use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;

use super::page::SOFTWARE_PAGE;
use super::{Script, ScreenshotIndex};
use crate::catalog::{ALL_RELEASES_KEY, AppEntry, Catalog, Category, Method, Placeholders};
use crate::types::AppAction;

const FEATURED_GRID_SIZE: usize = 17;
const NOTHING_HERE: &str = "Sorry, Welcome could not feature any software for this category that is compatible on this system.";
const UBUNTU_LOGO: &str = r#"<img src="img/logos/ubuntu-mono.png" width="16px" height="16px"/>&nbsp;"#;

/// Everything besides the catalog that decides how an entry renders.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ListingContext<'a> {
    pub(crate) arch: &'a str,
    pub(crate) placeholders: &'a Placeholders,
    /// Directory holding `*.list` files, normally `/etc/apt/sources.list.d`.
    pub(crate) sources_dir: &'a Path,
    pub(crate) screenshots: &'a ScreenshotIndex,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct PopulateStats {
    pub(crate) added: usize,
    pub(crate) skipped: usize,
    pub(crate) unsupported: usize,
}

impl PopulateStats {
    pub(crate) fn total(&self) -> usize {
        self.added + self.skipped + self.unsupported
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Listing {
    Shown,
    Unlisted,
    Unsupported,
}

fn listing(entry: &AppEntry, arch: &str, codename: &str) -> Listing {
    if !entry.working {
        Listing::Unlisted
    } else if entry.supports_arch(arch) && entry.supports_release(codename) {
        Listing::Shown
    } else {
        Listing::Unsupported
    }
}

/// Fills every category pane of the software page and its subcategory filter.
pub(crate) fn populate_categories(catalog: &Catalog, ctx: &ListingContext<'_>) -> (Script, PopulateStats) {
    let mut script = Script::new();
    let mut stats = PopulateStats::default();
    let codename = ctx.placeholders.codename.as_str();

    for category in Category::ALL {
        log::debug!("Processing category {}", category.key());
        let pane = format!("#{}", category.key());
        let mut subcategories = BTreeSet::new();
        let mut listed = 0;

        for entry in catalog.in_category(category) {
            match listing(entry, ctx.arch, codename) {
                Listing::Unlisted => {
                    log::debug!("Unlisted: {}", entry.name);
                    stats.skipped += 1;
                }
                Listing::Unsupported => {
                    log::debug!(
                        "Unsupported: {} (only for architectures {} and releases {})",
                        entry.name,
                        entry.arch.join(","),
                        entry.releases.join(",")
                    );
                    stats.unsupported += 1;
                }
                Listing::Shown => {
                    log::debug!("Added: {}", entry.name);
                    subcategories.insert(entry.subcategory.as_str());
                    script.append(&pane, &render_entry(entry, ctx));
                    script.hide(&format!("#info-hide-{}", entry.css_id()));
                    listed += 1;
                    stats.added += 1;
                }
            }
        }

        if listed == 0 {
            script.append(
                &pane,
                &format!(
                    "<p class='center'><span class='fa fa-warning'></span>&nbsp; {}</p>",
                    NOTHING_HERE
                ),
            );
        }

        script.add_class(&format!(".{}", ctx.arch), "arch-in-use");

        let filter = format!("#Filter-{}", category.key());
        for subcategory in subcategories {
            script.append(
                &filter,
                &format!(
                    r#"<option value="{}">{}</option>"#,
                    crate::catalog::css_subcategory(subcategory),
                    subcategory
                ),
            );
        }
    }

    log::debug!(
        "Applications added: {}, unsupported on this system: {}, unlisted: {}, total: {}",
        stats.added,
        stats.unsupported,
        stats.skipped,
        stats.total()
    );
    (script, stats)
}

/// `true` when an upgrade-only entry's repository list is already in place.
fn already_upgraded(entry: &AppEntry, ctx: &ListingContext<'_>) -> bool {
    if !entry.upgrade_only {
        return false;
    }
    entry
        .pre_install
        .get(ALL_RELEASES_KEY)
        .and_then(|recipe| recipe.source_file.as_deref())
        .map(|source| {
            ctx.sources_dir
                .join(format!("{}.list", ctx.placeholders.apply(source)))
                .exists()
        })
        .unwrap_or(false)
}

fn render_entry(entry: &AppEntry, ctx: &ListingContext<'_>) -> String {
    let css = entry.css_id();
    let mut html = String::new();

    let proprietary = if entry.open_source { "" } else { " proprietary" };
    html.push_str(&format!(
        r#"<div id="{css}" class="app-entry filter-{}{proprietary}"><div class="row-fluid"><div class="span2 center-inside">"#,
        entry.css_subcategory()
    ));
    html.push_str(&format!(
        r#"<img src="img/applications/{}.png"><span class="fa fa-check-circle fa-2x installed-check {css}-remove"></span></div><div class="span10">"#,
        entry.img
    ));
    html.push_str(&format!(r#"<p><b class="{css}-text">{}</b></p>"#, entry.name));
    html.push_str(&format!(r#"<p class="{css}-text">{}</p>"#, entry.description));

    let upgraded = already_upgraded(entry, ctx);
    if upgraded {
        html.push_str(&format!(
            r#"<h5 class="{css}-text"><span class="fa fa-check-circle"></span> This application is set to receive the latest updates.</h5>"#
        ));
    }

    if let Some(alternate) = &entry.alternate_to {
        html.push_str(&format!(
            r#"<ul><li class="{css}-text"><b>Alternative to: </b><i>{alternate}</i></li></ul>"#
        ));
    }

    html.push_str(r#"<p class="text-right">"#);
    html.push_str(&format!(
        r#"<a id="info-show-{css}" class="btn" href="cmd://app-info-show?{css}"><span class="fa fa-chevron-down"></span> Show</a>&nbsp;"#
    ));
    html.push_str(&format!(
        r#"<a hidden id="info-hide-{css}" class="btn" href="cmd://app-info-hide?{css}"><span class="fa fa-chevron-up"></span> Hide</a>&nbsp;"#
    ));
    html.push_str(&action_buttons(entry, &css, upgraded));
    html.push_str("</p>");
    html.push_str(&details_table(entry, &css, ctx));
    html.push_str(r#"<br><hr class="soften"></div></div></div>"#);
    html
}

fn action_buttons(entry: &AppEntry, css: &str, upgraded: bool) -> String {
    let id = &entry.id;
    let mut html = String::new();

    if entry.upgrade_only {
        if !upgraded {
            html.push_str(&format!(
                r#"<a class="{css}-upgrade btn btn-warning" href="cmd://upgrade-appid?{id}"><span class="fa fa-level-up"></span>&nbsp; Upgrade</a>&nbsp;"#
            ));
        }
    } else {
        html.push_str(&format!(
            r#"<span class="{css}-applying"> <span class="{css}-applying-status"></span> &nbsp;<img src="img/welcome/processing.gif" width="24px" height="24px"/></span>"#
        ));
        html.push_str(&format!(
            r#"<a class="{css}-install btn btn-success" href="cmd://install-appid?{id}"><span class="fa fa-download"></span>&nbsp; Install</a>&nbsp;"#
        ));
        html.push_str(&format!(
            r#"<a class="{css}-reinstall btn btn-warning" href="cmd://install-appid?{id}" data-toggle="tooltip" data-placement="top" title="Reinstall"><span class="fa fa-refresh"></span></a>&nbsp;"#
        ));
        html.push_str(&format!(
            r#"<a class="{css}-remove btn btn-danger" href="cmd://remove-appid?{id}" data-toggle="tooltip" data-placement="top" title="Remove"><span class="fa fa-trash"></span></a>&nbsp;"#
        ));
    }

    if entry.launch_command.is_some() {
        html.push_str(&format!(
            r#"<a class="{css}-launch btn btn-inverse" href="cmd://launch-appid?{id}"><img src="img/applications/{}.png" width="20px" height="20px" />&nbsp; Launch</a>&nbsp;"#,
            entry.img
        ));
    }
    html
}

fn platform_badges(entry: &AppEntry) -> String {
    let mut html = String::new();
    for arch in &entry.arch {
        let badge = match arch.as_str() {
            "i386" => r#"<span class="i386"><span class="i386 fa fa-laptop"></span> 32-bit</span>"#,
            "amd64" => r#"<span class="amd64"><span class="fa fa-laptop"></span> 64-bit</span>"#,
            "armhf" => r#"<span class="armhf"><span class="fa fa-tv"></span> aarch32 (ARMv7)</span>"#,
            "arm64" => r#"<span class="arm64"><span class="fa fa-tv"></span> aarch64 (ARMv8)</span>"#,
            "powerpc" => r#"<span class="powerpc"><span class="fa fa-desktop"></span> PowerPC</span>"#,
            _ => continue,
        };
        html.push_str(badge);
        html.push_str(" &nbsp;&nbsp;");
    }
    if let Some(url) = &entry.url_android {
        html.push_str(&format!(
            r#"<a href="cmd://link?{url}"><span class="fa fa-android"></span> Android</a> &nbsp;&nbsp;"#
        ));
    }
    if let Some(url) = &entry.url_ios {
        html.push_str(&format!(
            r#"<a href="cmd://link?{url}"><span class="fa fa-apple"></span> iOS</a> &nbsp;&nbsp;"#
        ));
    }
    html
}

/// Where the packages come from, one line per recipe method, last method first.
pub(crate) fn source_descriptions(entry: &AppEntry, placeholders: &Placeholders) -> Vec<String> {
    let resolved = match entry.resolve_recipe(&placeholders.codename) {
        Ok(resolved) => resolved,
        Err(err) => {
            log::warn!("Skipped source for {}: {}", entry.id, err);
            return vec!["Unknown".to_string()];
        }
    };

    resolved
        .recipe
        .methods
        .iter()
        .rev()
        .map(|method| match method {
            Method::Skip => format!("{}Ubuntu Repository", UBUNTU_LOGO),
            Method::PartnerRepo => format!("{}Canonical Partner Repository", UBUNTU_LOGO),
            Method::Ppa { ppa } => ppa_link(ppa),
            Method::Manual { sources, .. } => {
                let url = sources
                    .iter()
                    .flat_map(|line| line.split(' '))
                    .find(|word| word.starts_with("http"))
                    .map(|word| placeholders.apply(word))
                    .unwrap_or_else(|| "Unknown".to_string());
                format!(r#"<span class="fa fa-globe"></span>&nbsp; {}"#, url)
            }
        })
        .collect()
}

fn ppa_link(ppa: &str) -> String {
    let icon = r#"<span class="fa fa-cube"></span>&nbsp;"#;
    let name = ppa.strip_prefix("ppa:").unwrap_or(ppa);
    match name.split_once('/') {
        Some((author, archive)) => format!(
            r#"{icon} <a href="cmd://link?https://launchpad.net/~{author}/+archive/ubuntu/{archive}">{ppa}</a>"#
        ),
        None => format!("{icon} {ppa}"),
    }
}

fn details_table(entry: &AppEntry, css: &str, ctx: &ListingContext<'_>) -> String {
    let license = if entry.open_source {
        "Open Source"
    } else {
        "Proprietary"
    };

    let mut html = format!(r#"<div hidden id="details-{css}"><table class="more-details table table-striped">"#);
    html.push_str(&format!("<tr><th>License</th><td>{}</td></tr>", license));
    html.push_str(&format!("<tr><th>Platform</th><td>{}</td></tr>", platform_badges(entry)));
    html.push_str(&format!("<tr><th>Category</th><td>{}</td></tr>", entry.subcategory));

    if let Some(url) = &entry.url_info {
        html.push_str(&format!(
            r#"<tr><th>Website</th><td><a href="cmd://link?{url}">{url}</a></td></tr>"#
        ));
    }

    let sources = source_descriptions(entry, ctx.placeholders);
    if sources.len() > 1 {
        html.push_str("<tr><th>Source</th><td><ul>");
        for source in &sources {
            html.push_str(&format!("<li>{}</li>", source));
        }
        html.push_str("</ul></td></tr>");
    } else if let Some(source) = sources.first() {
        html.push_str(&format!("<tr><th>Source</th><td>{}</td></tr>", source));
    }

    let screenshots = ctx.screenshots.for_image(&entry.img);
    if !screenshots.is_empty() {
        html.push_str("<tr><th>Screenshot</th><td>");
        for stem in &screenshots {
            html.push_str(&format!(
                r#"<a class="screenshot-link" href="cmd://screenshot?{stem}"><img src="{}" class="screenshot"/></a>"#,
                ctx.screenshots.path_for(stem).display()
            ));
        }
        html.push_str("</td></tr>");
    }

    html.push_str("</table></div>");
    html
}

/// Button states for one entry from the installed-package set.
pub(crate) fn update_app_status(entry: &AppEntry, installed: &HashSet<String>) -> Script {
    let css = entry.css_id();
    let is_installed = installed.contains(&entry.main_package);
    if is_installed {
        log::debug!("Installed: {}", entry.main_package);
    } else {
        log::debug!("Not present: {}", entry.main_package);
    }

    let mut script = Script::new();
    script.hide(&format!(".{}-applying", css));
    script.toggle(&format!(".{}-launch", css), is_installed);
    script.toggle(&format!(".{}-install", css), !is_installed);
    script.toggle(&format!(".{}-reinstall", css), is_installed);
    script.toggle(&format!(".{}-remove", css), is_installed);
    script.toggle(&format!(".{}-upgrade", css), is_installed);
    script
}

pub(crate) fn update_all_app_status(catalog: &Catalog, arch: &str, installed: &HashSet<String>) -> Script {
    let mut script = Script::new();
    for entry in catalog.entries().iter().filter(|entry| entry.supports_arch(arch)) {
        script.extend(update_app_status(entry, installed));
    }
    script
}

/// Hides the buttons of an entry while its transaction runs.
pub(crate) fn mark_applying(entry: &AppEntry, action: AppAction) -> Script {
    let css = entry.css_id();
    let mut script = Script::new();
    script.show(&format!(".{}-applying", css));
    for suffix in ["launch", "install", "reinstall", "remove", "upgrade"] {
        script.hide(&format!(".{}-{}", css, suffix));
    }
    script.set_css(&format!(".{}-text", css), "color", "#000");
    script.set_html(&format!(".{}-applying-status", css), action.progress_label());
    script
}

/// Expands or collapses the details table of an entry.
pub(crate) fn info_toggle(css_id: &str, show: bool) -> Script {
    let mut script = Script::new();
    script.toggle(&format!("#info-show-{}", css_id), !show);
    script.toggle(&format!("#info-hide-{}", css_id), show);
    let details = format!("#details-{}", css_id);
    if show {
        script.fade_in(&details, "fast");
    } else {
        script.fade_out(&details, "fast");
    }
    script
}

/// Session-only filter state of the software page.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct FilterState {
    pub(crate) hide_non_free: bool,
}

impl FilterState {
    /// A freshly rendered software page shows every entry and an unchecked box.
    pub(crate) fn page_opened(&mut self, page: &str) {
        if page == SOFTWARE_PAGE {
            *self = FilterState::default();
        }
    }
}

const NO_FILTER: &str = "none";

/// Ids of the entries a filter leaves visible.
pub(crate) fn visible_ids<'a>(catalog: &'a Catalog, filter: &str, hide_non_free: bool) -> Vec<&'a str> {
    catalog
        .entries()
        .iter()
        .filter(|entry| !(hide_non_free && !entry.open_source))
        .filter(|entry| filter == NO_FILTER || entry.css_subcategory() == filter)
        .map(|entry| entry.id.as_str())
        .collect()
}

pub(crate) fn apply_filter(
    state: &mut FilterState,
    catalog: &Catalog,
    filter: &str,
    toggle_non_free: bool,
) -> Script {
    let mut script = Script::new();

    if toggle_non_free {
        state.hide_non_free = !state.hide_non_free;
        if state.hide_non_free {
            script.remove_class("#nonFreeCheckBox", "fa-square");
            script.add_class("#nonFreeCheckBox", "fa-check-square");
        } else {
            script.add_class("#nonFreeCheckBox", "fa-square");
            script.remove_class("#nonFreeCheckBox", "fa-check-square");
        }
    }

    if filter == NO_FILTER {
        log::debug!("Filter reset");
        script.show(".app-entry");
        if state.hide_non_free {
            log::debug!("Hiding all proprietary software");
            script.hide(".proprietary");
        }
        return script;
    }

    log::debug!("Applying filter: {}", filter);
    script.hide(".app-entry");
    for id in visible_ids(catalog, filter, state.hide_non_free) {
        script.show(&format!("#{}", id.replace('.', "-")));
    }
    script
}

/// Random icons for the featured grid, drawn from entries this system supports.
pub(crate) fn featured_apps<R: Rng + ?Sized>(catalog: &Catalog, arch: &str, rng: &mut R) -> Vec<String> {
    let mut candidates: Vec<String> = catalog
        .entries()
        .iter()
        .filter(|entry| entry.working && entry.supports_arch(arch))
        .map(|entry| entry.img.clone())
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(FEATURED_GRID_SIZE);
    candidates
}

pub(crate) fn featured_grid_script(images: &[String]) -> Script {
    let mut script = Script::new();
    for img in images {
        script.push(format!("addToGrid({});", super::js_string(img)));
    }
    script.push("initGrid();");
    script
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::tests::sample_catalog;

    fn context<'a>(
        arch: &'a str,
        placeholders: &'a Placeholders,
        sources_dir: &'a Path,
        screenshots: &'a ScreenshotIndex,
    ) -> ListingContext<'a> {
        ListingContext {
            arch,
            placeholders,
            sources_dir,
            screenshots,
        }
    }

    #[test]
    fn armhf_bionic_listing_counts() {
        let catalog = sample_catalog();
        let placeholders = Placeholders::new("bionic", "18.04");
        let sources = tempfile::tempdir().expect("tempdir");
        let screenshots = ScreenshotIndex::default();
        let ctx = context("armhf", &placeholders, sources.path(), &screenshots);

        let (script, stats) = populate_categories(&catalog, &ctx);
        assert_eq!(
            stats,
            PopulateStats {
                added: 4,
                skipped: 1,
                unsupported: 0
            }
        );
        assert_eq!(stats.total(), catalog.len());
        assert!(script.contains(r#"id=\"partition-pro\" class=\"app-entry filter-Partitioning proprietary\""#));
        assert!(script.contains(r#"id=\"chromium\" class=\"app-entry filter-Web-Browser\""#));
        assert!(!script.contains("broken"));
        assert!(script.contains(r##"$("#Filter-Internet").append("<option value=\"Web-Browser\">Web Browser</option>");"##));
        assert!(script.contains(r##"$("#Education").append("<p class='center'>"##));
    }

    #[test]
    fn release_and_arch_mismatches_are_unsupported() {
        let catalog = sample_catalog();
        let placeholders = Placeholders::new("trusty", "14.04");
        let sources = tempfile::tempdir().expect("tempdir");
        let screenshots = ScreenshotIndex::default();

        let ctx = context("armhf", &placeholders, sources.path(), &screenshots);
        let (_, stats) = populate_categories(&catalog, &ctx);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.unsupported, 4);
        assert_eq!(stats.skipped, 1);

        let bionic = Placeholders::new("bionic", "18.04");
        let ctx = context("i386", &bionic, sources.path(), &screenshots);
        let (_, stats) = populate_categories(&catalog, &ctx);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.unsupported, 3);
    }

    #[test]
    fn partitioning_filter_respects_non_free() {
        let catalog = sample_catalog();
        assert_eq!(
            visible_ids(&catalog, "Partitioning", false),
            ["gparted", "partition.pro"]
        );
        assert_eq!(visible_ids(&catalog, "Partitioning", true), ["gparted"]);
        assert_eq!(visible_ids(&catalog, "Web-Browser", false), ["broken.app", "chromium"]);

        let mut state = FilterState::default();
        let script = apply_filter(&mut state, &catalog, "Partitioning", true);
        assert!(state.hide_non_free);
        assert!(script.contains(r##"$("#gparted").show();"##));
        assert!(!script.contains(r##"$("#partition-pro").show();"##));
        assert!(script.contains(r##"$("#nonFreeCheckBox").addClass("fa-check-square");"##));

        let script = apply_filter(&mut state, &catalog, "none", false);
        assert!(state.hide_non_free);
        assert_eq!(
            script.lines(),
            [r#"$(".app-entry").show();"#, r#"$(".proprietary").hide();"#]
        );
    }

    #[test]
    fn reopening_software_page_clears_non_free_toggle() {
        let catalog = sample_catalog();
        let mut state = FilterState::default();
        apply_filter(&mut state, &catalog, "none", true);
        assert!(state.hide_non_free);

        state.page_opened("index.html");
        assert!(state.hide_non_free);

        state.page_opened(SOFTWARE_PAGE);
        assert!(!state.hide_non_free);
        let script = apply_filter(&mut state, &catalog, "Partitioning", false);
        assert!(script.contains(r##"$("#partition-pro").show();"##));
        assert!(!script.contains(r#"$(".proprietary").hide();"#));

        let script = apply_filter(&mut state, &catalog, "none", true);
        assert!(state.hide_non_free);
        assert!(script.contains(r##"$("#nonFreeCheckBox").addClass("fa-check-square");"##));
    }

    #[test]
    fn upgrade_only_entry_marked_when_list_exists() {
        let catalog = sample_catalog();
        let placeholders = Placeholders::new("bionic", "18.04");
        let sources = tempfile::tempdir().expect("tempdir");
        let screenshots = ScreenshotIndex::default();
        let ctx = context("armhf", &placeholders, sources.path(), &screenshots);
        let entry = catalog.get("welcome.updates").expect("entry");

        let html = render_entry(entry, &ctx);
        assert!(html.contains("welcome-updates-upgrade"));
        assert!(!html.contains("welcome-updates-install"));

        std::fs::write(
            sources.path().join("ubuntu-mate-dev-ubuntu-welcome-bionic.list"),
            b"deb http://ppa.launchpad.net/ubuntu-mate-dev/welcome/ubuntu bionic main\n",
        )
        .expect("list file");
        let html = render_entry(entry, &ctx);
        assert!(html.contains("set to receive the latest updates"));
        assert!(!html.contains("welcome-updates-upgrade"));
    }

    #[test]
    fn source_descriptions_follow_recipe() {
        let catalog = sample_catalog();
        let bionic = Placeholders::new("bionic", "18.04");

        let chromium = catalog.get("chromium").expect("chromium");
        let sources = source_descriptions(chromium, &bionic);
        assert_eq!(sources.len(), 1);
        assert!(sources[0].contains("https://launchpad.net/~chromium-team/+archive/ubuntu/stable"));

        let pro = catalog.get("partition.pro").expect("partition.pro");
        assert_eq!(
            source_descriptions(pro, &bionic),
            [r#"<span class="fa fa-globe"></span>&nbsp; http://example.com/apt"#]
        );
        let xenial = Placeholders::new("xenial", "16.04");
        assert!(source_descriptions(pro, &xenial)[0].contains("Canonical Partner Repository"));

        let trusty = Placeholders::new("trusty", "14.04");
        assert_eq!(source_descriptions(chromium, &trusty), ["Unknown"]);
    }

    #[test]
    fn status_follows_installed_set() {
        let catalog = sample_catalog();
        let gparted = catalog.get("gparted").expect("gparted");

        let installed: HashSet<String> = ["gparted".to_string()].into_iter().collect();
        let script = update_app_status(gparted, &installed);
        assert!(script.contains(r#"$(".gparted-launch").show();"#));
        assert!(script.contains(r#"$(".gparted-install").hide();"#));

        let script = update_app_status(gparted, &HashSet::new());
        assert!(script.contains(r#"$(".gparted-install").show();"#));
        assert!(script.contains(r#"$(".gparted-remove").hide();"#));

        let all = update_all_app_status(&catalog, "i386", &installed);
        assert_eq!(all.lines().len(), 6);
    }

    #[test]
    fn applying_and_details_toggles() {
        let catalog = sample_catalog();
        let entry = catalog.get("partition.pro").expect("entry");
        let script = mark_applying(entry, AppAction::Remove);
        assert!(script.contains(r#"$(".partition-pro-applying").show();"#));
        assert!(script.contains(r#"$(".partition-pro-applying-status").html("Removing...");"#));

        let script = info_toggle("partition-pro", true);
        assert_eq!(
            script.lines(),
            [
                r##"$("#info-show-partition-pro").hide();"##,
                r##"$("#info-hide-partition-pro").show();"##,
                r##"$("#details-partition-pro").fadeIn("fast");"##,
            ]
        );
    }

    #[test]
    fn featured_grid_only_uses_supported_entries() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let mut images = featured_apps(&catalog, "armhf", &mut rng);
        images.sort();
        assert_eq!(images, ["chromium", "gparted", "partition-pro", "welcome"]);

        let script = featured_grid_script(&images);
        assert_eq!(script.lines().last().map(String::as_str), Some("initGrid();"));
        assert!(script.contains(r#"addToGrid("gparted");"#));
    }
}
