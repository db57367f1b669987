use std::collections::HashSet;

use rand::Rng;

use super::apps::{self, ListingContext};
use super::{Script, js_string};
use crate::catalog::Catalog;
use crate::system::{SessionKind, SystemState};

pub(crate) const SPLASH_PAGE: &str = "splash.html";
pub(crate) const INDEX_PAGE: &str = "index.html";
pub(crate) const SOFTWARE_PAGE: &str = "software.html";
const CHATROOM_PAGE: &str = "chatroom.html";
const DONATE_PAGE: &str = "donate.html";
const GETTING_STARTED_PAGE: &str = "gettingstarted.html";
const RPI_PAGE: &str = "rpi.html";

/// Catalog entries with buttons on the Getting Started page.
const GETTING_STARTED_APPS: &[&str] = &[
    "hardinfo",
    "gparted",
    "gnome-disk-utility",
    "mate-disk-usage-analyzer",
    "mate-system-monitor",
    "psensor",
    "boot-repair",
    "codecs",
    "firmware",
    "hp-printer",
    "keyboard-chinese",
    "keyboard-japanese",
    "keyboard-korean",
];

const SOCIAL_FOOTER: &str = concat!(
    r#"<div id="social" class="pull-left">"#,
    r#"<a href="cmd://link?https://www.pardus.org.tr" title="pardus.org.tr"><img src="img/humanity/website.svg"></a> "#,
    r#"<a href="cmd://link?https://twitter.com/pardus" title="Twitter"><img src="img/social/twitter.svg"></a> "#,
    r#"<a href="cmd://link?https://www.facebook.com/pardus" title="Facebook"><img src="img/social/facebook.svg"></a>"#,
    "</div>"
);

const BOUTIQUE_FOOTER: &str = concat!(
    r#"<div id="boutique-footer" class="pull-left">"#,
    r#"<p hidden id="update-subscribed"><span class="fa fa-check"></span> Set to retrieve the latest software listings.</p>"#,
    r#"<p hidden id="update-notification"><a href="cmd://subscribe-updates"><span class="fa fa-exclamation-circle"></span> Retrieve the latest software listings.</a></p>"#,
    r#"<p hidden id="update-subscribing"><img src="img/welcome/processing-dark.gif" width="16px" height="16px"> Please wait while the application is being updated...</p>"#,
    r#"<p><b>Version:</b> <span id="boutique-version"></span></p>"#,
    "</div>"
);

/// Phrases the index page's date countdowns are assembled from.
const SPECIAL_EVENT_STRINGS: &[(&str, &str)] = &[
    ("days_in", "in"),
    ("future_days", "days."),
    ("days_ago", "days ago."),
    ("yesterday", "yesterday."),
    ("tomorrow", "tomorrow."),
    ("years_ago", "years ago today."),
    ("today_string", "today."),
    ("years_old", "years old"),
    ("flavour_anniversary_future", "Ubuntu MATE's official flavour anniversary"),
    ("flavour_anniversary_present", "Ubuntu MATE become an official flavour"),
    ("flavour_anniversary_past", "Ubuntu MATE's official flavour anniversary was"),
    ("project_birthday_future", "Ubuntu MATE will be"),
    ("project_birthday_present", "Ubuntu MATE is"),
    ("project_birthday_past", "Ubuntu MATE turned"),
    ("project_birthday", "Happy Birthday!"),
    ("celebrate_new_year", "Happy New Year from Ubuntu MATE!"),
    ("project_release_future", "will be released"),
    ("project_release_present", "is released today!"),
    ("project_release_past", "was released"),
    ("project_release_thanks", "Thank you for testing"),
];

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FOOTER_CLOSE: &str = r#"<a href="cmd://quit" class="btn btn-inverse">Close&zwnj;</a>"#;
const FOOTER_SKIP: &str = r#"<a onclick="continueToPage(true)" class="btn btn-inverse">Skip</a>"#;

/// Inputs for the script pushed after every page load.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PageContext<'a> {
    /// File name of the loaded page, e.g. `index.html`.
    pub(crate) page: &'a str,
    pub(crate) system: &'a SystemState,
    pub(crate) catalog: Option<&'a Catalog>,
    pub(crate) listing: ListingContext<'a>,
    pub(crate) installed: &'a HashSet<String>,
    pub(crate) autostart: bool,
    pub(crate) software_only: bool,
    /// Fade the footer in, set after leaving the splash or software page.
    pub(crate) smooth_footer: bool,
    pub(crate) rpi_resized: bool,
    pub(crate) welcome_version: &'a str,
}

/// Page name from a URI, ignoring any fragment or query.
pub(crate) fn page_name(uri: &str) -> &str {
    let path = uri.split(['#', '?']).next().unwrap_or(uri);
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether the page after `page` should fade its footer in.
pub(crate) fn wants_smooth_footer(page: &str) -> bool {
    page == SPLASH_PAGE || page == SOFTWARE_PAGE
}

pub(crate) fn autostart_script(enabled: bool) -> Script {
    let mut script = Script::new();
    script.push(format!(
        "$('#autostart').toggleClass('fa-check-square', {}).toggleClass('fa-square', {});",
        enabled, !enabled
    ));
    script
}

pub(crate) fn connectivity_script(online: bool) -> Script {
    let mut script = Script::new();
    script.toggle(".offline", !online);
    script.toggle(".online", online);
    script
}

pub(crate) fn rpi_resize_script(resized: bool, pending_reboot: bool) -> Script {
    let mut script = Script::new();
    if pending_reboot {
        script.hide("#rpi-resized");
        script.hide("#rpi-not-resized");
        script.show("#rpi-restart-now");
    } else {
        script.toggle("#rpi-resized", resized);
        script.toggle("#rpi-not-resized", !resized);
    }
    script
}

/// Footer while the update subscription runs (`true`) or after it failed.
pub(crate) fn subscribing_script(in_progress: bool) -> Script {
    let mut script = Script::new();
    script.toggle("#update-notification", !in_progress);
    script.toggle("#update-subscribing", in_progress);
    script
}

pub(crate) fn push_config<R: Rng + ?Sized>(ctx: &PageContext<'_>, rng: &mut R) -> Script {
    let system = ctx.system;
    let mut script = Script::new();

    script.set_html("#os_title", &system.os_title);
    script.set_html("#os_version", &system.os_version);
    script.extend(autostart_script(ctx.autostart));

    let live = system.session == SessionKind::Live;
    script.toggle("#install", live);
    script.toggle("#software", !live);
    script.toggle(".live-session", !live);
    script.toggle(".live-session-only", live);
    script.toggle(".rpi-only", system.session == SessionKind::Pi);
    script.extend(connectivity_script(system.is_online()));

    if !ctx.software_only && ctx.page != SPLASH_PAGE && ctx.page != SOFTWARE_PAGE {
        script.set_html("#footer-global-left", SOCIAL_FOOTER);
    }
    if ctx.page == SPLASH_PAGE {
        script.set_html("#footer-global-right", FOOTER_SKIP);
    } else if !ctx.software_only {
        script.set_html("#footer-global-right", FOOTER_CLOSE);
    }
    if ctx.smooth_footer || ctx.page == SOFTWARE_PAGE {
        script.hide("#footer-left");
        script.push("$('#footer-left').fadeIn();");
    }

    match ctx.page {
        INDEX_PAGE => index_page(ctx, &mut script),
        SPLASH_PAGE => {
            let next = match system.session {
                SessionKind::Live => "hellolive",
                SessionKind::Guest => "helloguest",
                _ => "index",
            };
            script.set_var("splashNextPage", &js_string(next));
        }
        CHATROOM_PAGE => {
            let hexchat = ctx.installed.contains("hexchat");
            script.toggle(".hexchat", hexchat);
            script.toggle(".webchat", !hexchat);
        }
        DONATE_PAGE => donate_page(&mut script),
        GETTING_STARTED_PAGE => getting_started_page(ctx, &mut script),
        SOFTWARE_PAGE => software_page(ctx, rng, &mut script),
        RPI_PAGE => script.extend(rpi_resize_script(ctx.rpi_resized, system.rpi_resize_pending)),
        _ => {}
    }
    script
}

fn index_page(ctx: &PageContext<'_>, script: &mut Script) {
    let system = ctx.system;
    if system.session == SessionKind::Guest {
        script.hide("#gettingstarted");
        script.hide("#software");
        script.add_class("#introduction", "btn-success");
        script.add_class("#community", "btn-success");
    }

    script.hide("#update-subscribing");
    if system.updates_subscribed {
        script.hide("#update-notification");
    } else if system.is_online() {
        script.fade_in("#update-notification", "slow");
    }

    let low_power = matches!(system.arch.as_str(), "armhf" | "powerpc");
    script.set_var("disable_confetti", if low_power { "true" } else { "false" });

    for (name, text) in SPECIAL_EVENT_STRINGS {
        script.set_var(name, &js_string(&format!("&zwnj;{}&zwnj;", text)));
    }
    script.push("checkDates();");
}

/// Short month names for the supporters grid.
fn donate_page(script: &mut Script) {
    for month in SHORT_MONTHS {
        script.set_var(&format!("short_{}", month.to_lowercase()), &js_string(month));
    }
}

fn getting_started_page(ctx: &PageContext<'_>, script: &mut Script) {
    let system = ctx.system;
    let vendor = system
        .graphics_vendor
        .map(|vendor| vendor.label())
        .unwrap_or_default();
    script.set_var("graphicsVendor", &js_string(vendor));
    script.set_var(
        "graphicsGrep",
        &js_string(system.graphics_description.as_deref().unwrap_or_default()),
    );
    script.set_html("#boot-mode", system.boot_mode.label());

    if let Some(catalog) = ctx.catalog {
        for entry in GETTING_STARTED_APPS.iter().filter_map(|id| catalog.get(id)) {
            script.extend(apps::update_app_status(entry, ctx.installed));
        }
    }
}

fn software_page<R: Rng + ?Sized>(ctx: &PageContext<'_>, rng: &mut R, script: &mut Script) {
    if ctx.software_only {
        script.hide("#menu-button");
        script.set_html(
            "#navigation-title",
            "<span id='navigation-sub-title'>Curated software collection</span>",
        );
        script.set_css("#navigation-sub-title", "color", "#DED9CB");
    }
    script.set_var("server_string", &js_string("Servers"));

    match ctx.catalog {
        Some(catalog) => {
            let (listing, _) = apps::populate_categories(catalog, &ctx.listing);
            script.extend(listing);
            script.extend(apps::update_all_app_status(
                catalog,
                &ctx.system.arch,
                ctx.installed,
            ));
            let featured = apps::featured_apps(catalog, &ctx.system.arch, rng);
            script.extend(apps::featured_grid_script(&featured));
        }
        None => log::error!("Application index not loaded, cannot populate categories"),
    }

    script.set_html("#footer-global-left", BOUTIQUE_FOOTER);
    script.set_html("#boutique-version", ctx.welcome_version);
    if ctx.system.updates_subscribed {
        script.show("#update-subscribed");
    } else {
        script.show("#update-notification");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::Placeholders;
    use crate::catalog::tests::sample_catalog;
    use crate::system::tests::sample_state;
    use crate::view_model::ScreenshotIndex;

    struct Fixture {
        system: SystemState,
        catalog: Catalog,
        placeholders: Placeholders,
        screenshots: ScreenshotIndex,
        installed: HashSet<String>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                system: sample_state(),
                catalog: sample_catalog(),
                placeholders: Placeholders::new("bionic", "18.04"),
                screenshots: ScreenshotIndex::default(),
                installed: HashSet::new(),
            }
        }

        fn push(&self, page: &str, software_only: bool) -> Script {
            let ctx = PageContext {
                page,
                system: &self.system,
                catalog: Some(&self.catalog),
                listing: ListingContext {
                    arch: &self.system.arch,
                    placeholders: &self.placeholders,
                    sources_dir: Path::new("/nonexistent/sources.list.d"),
                    screenshots: &self.screenshots,
                },
                installed: &self.installed,
                autostart: true,
                software_only,
                smooth_footer: false,
                rpi_resized: false,
                welcome_version: "0.4.0",
            };
            push_config(&ctx, &mut StdRng::seed_from_u64(1))
        }
    }

    #[test]
    fn page_names_drop_fragments() {
        assert_eq!(page_name("file:///pardus/index.html#top"), "index.html");
        assert_eq!(page_name("file:///pardus/software.html"), "software.html");
        assert_eq!(page_name("splash.html"), "splash.html");
    }

    #[test]
    fn splash_gets_skip_and_next_page() {
        let mut fixture = Fixture::new();
        let script = fixture.push(SPLASH_PAGE, false);
        assert!(script.contains("continueToPage(true)"));
        assert!(script.contains(r#"var splashNextPage = "index";"#));
        assert!(!script.contains("#footer-global-left"));

        fixture.system.session = SessionKind::Live;
        let script = fixture.push(SPLASH_PAGE, false);
        assert!(script.contains(r#"var splashNextPage = "hellolive";"#));
        assert!(script.contains(r##"$("#install").show();"##));
        assert!(script.contains(r#"$(".live-session-only").show();"#));
    }

    #[test]
    fn index_for_guests_on_arm() {
        let mut fixture = Fixture::new();
        fixture.system.session = SessionKind::Guest;
        let script = fixture.push(INDEX_PAGE, false);
        assert!(script.contains(r##"$("#gettingstarted").hide();"##));
        assert!(script.contains(r##"$("#introduction").addClass("btn-success");"##));
        assert!(script.contains(r##"$("#update-notification").fadeIn("slow");"##));
        assert!(script.contains("var disable_confetti = true;"));
        assert!(script.contains("cmd://quit"));
        assert!(script.contains("toggleClass('fa-check-square', true)"));
        assert!(script.contains(r#"var celebrate_new_year = "&zwnj;Happy New Year from Ubuntu MATE!&zwnj;";"#));
        assert_eq!(script.lines().last().map(String::as_str), Some("checkDates();"));
    }

    #[test]
    fn donate_page_gets_month_names() {
        let fixture = Fixture::new();
        let script = fixture.push(DONATE_PAGE, false);
        assert!(script.contains(r#"var short_jan = "Jan";"#));
        assert!(script.contains(r#"var short_dec = "Dec";"#));
        assert!(!script.contains("checkDates();"));
    }

    #[test]
    fn software_only_page_has_no_close_button() {
        let fixture = Fixture::new();
        let script = fixture.push(SOFTWARE_PAGE, true);
        assert!(!script.contains("cmd://quit"));
        assert!(script.contains(r##"$("#menu-button").hide();"##));
        assert!(script.contains("initGrid();"));
        assert!(script.contains(r##"$("#boutique-version").html("0.4.0");"##));
        assert!(script.contains(r##"$("#update-notification").show();"##));
    }

    #[test]
    fn getting_started_reports_graphics() {
        let mut fixture = Fixture::new();
        fixture.installed.insert("gparted".to_string());
        let script = fixture.push(GETTING_STARTED_PAGE, false);
        assert!(script.contains(r#"var graphicsVendor = "Intel";"#));
        assert!(script.contains(r##"$("#boot-mode").html("BIOS");"##));
        assert!(script.contains(r#"$(".gparted-launch").show();"#));
    }

    #[test]
    fn rpi_resize_states() {
        assert!(rpi_resize_script(true, false).contains(r##"$("#rpi-resized").show();"##));
        assert!(rpi_resize_script(false, false).contains(r##"$("#rpi-not-resized").show();"##));
        assert!(rpi_resize_script(true, true).contains(r##"$("#rpi-restart-now").show();"##));
        assert_eq!(
            connectivity_script(false).lines(),
            [r#"$(".offline").show();"#, r#"$(".online").hide();"#]
        );
    }
}
