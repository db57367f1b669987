use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use gtk4 as gtk;
use libadwaita as adw;
use webkit6 as webkit;

use adw::prelude::*;
use gtk::{gdk, glib};
use webkit::prelude::*;

use crate::command::{COMMAND_SCHEME, Command};
use crate::settings::{load_app_settings, save_app_settings};
use crate::state::controller::{AppController, Startup};
use crate::state::types::AppMessage;
use crate::system::{read_state, window_size};

/// How often worker results are picked up on the GTK thread.
const MESSAGE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Hands every queued message to `handle`; returns how many there were.
fn drain_messages<T>(receiver: &mpsc::Receiver<T>, mut handle: impl FnMut(T)) -> usize {
    let mut handled = 0;
    while let Ok(msg) = receiver.try_recv() {
        handle(msg);
        handled += 1;
    }
    handled
}

pub(crate) struct AppWidgets {
    pub(crate) web_view: webkit::WebView,
}

/// What to do with a navigation request from the page.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Navigation {
    /// Let the view continue, e.g. a fragment of the page already shown.
    Allow,
    Command(Command),
    /// A new page; `uri` has any fragment removed.
    Open { uri: String },
}

pub(crate) fn classify_navigation(uri: &str, last_uri: Option<&str>) -> Navigation {
    if uri.starts_with(COMMAND_SCHEME) {
        return Navigation::Command(Command::parse(uri));
    }
    let page_uri = uri.split('#').next().unwrap_or(uri);
    if last_uri == Some(page_uri) {
        return Navigation::Allow;
    }
    Navigation::Open {
        uri: page_uri.to_string(),
    }
}

fn monitor_height() -> Option<i32> {
    let display = gdk::Display::default()?;
    let monitor = display.monitors().item(0).and_downcast::<gdk::Monitor>()?;
    Some(monitor.geometry().height())
}

fn navigation_uri(decision: &webkit::PolicyDecision) -> Option<String> {
    let navigation = decision.downcast_ref::<webkit::NavigationPolicyDecision>()?;
    let mut action = navigation.navigation_action()?;
    let request = action.request()?;
    request.uri().map(|uri| uri.to_string())
}

pub(crate) fn build_ui(app: &adw::Application, startup: &Startup) {
    let settings = Rc::new(RefCell::new(load_app_settings()));
    let (zoom_level, (default_width, default_height)) = {
        let system = read_state(&startup.system);
        (
            system.zoom_level,
            window_size(system.zoom_level, startup.software_only, monitor_height()),
        )
    };
    let (initial_width, initial_height) = {
        let settings = settings.borrow();
        (
            settings.window_width.unwrap_or(default_width),
            settings.window_height.unwrap_or(default_height),
        )
    };

    let title = if startup.software_only {
        "Software Boutique"
    } else {
        "Welcome"
    };
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(title)
        .icon_name("ubuntu-mate")
        .default_width(initial_width)
        .default_height(initial_height)
        .build();

    let root_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
    window.set_content(Some(&root_box));

    let header_bar = adw::HeaderBar::new();
    header_bar.set_title_widget(Some(&adw::WindowTitle::new(title, "")));
    root_box.append(&header_bar);

    let web_view = webkit::WebView::new();
    web_view.set_vexpand(true);
    web_view.set_hexpand(true);
    web_view.set_zoom_level(zoom_level);
    if let Some(web_settings) = WebViewExt::settings(&web_view) {
        web_settings.set_allow_file_access_from_file_urls(true);
    }
    web_view.connect_context_menu(|_, _, _| true);
    root_box.append(&web_view);

    let widgets = AppWidgets {
        web_view: web_view.clone(),
    };

    let (sender, receiver) = mpsc::channel::<AppMessage>();
    let controller = Rc::new(AppController::new(
        widgets,
        sender,
        app.clone(),
        window.clone(),
        startup,
    ));

    let controller_clone = controller.clone();
    glib::timeout_add_local(MESSAGE_POLL_INTERVAL, move || {
        drain_messages(&receiver, |msg| controller_clone.handle_message(msg));
        glib::ControlFlow::Continue
    });

    {
        let controller_weak = Rc::downgrade(&controller);
        web_view.connect_decide_policy(move |_, decision, decision_type| {
            let Some(controller) = controller_weak.upgrade() else {
                return false;
            };
            let new_window = match decision_type {
                webkit::PolicyDecisionType::NavigationAction => false,
                webkit::PolicyDecisionType::NewWindowAction => true,
                _ => return false,
            };
            let Some(uri) = navigation_uri(decision) else {
                return false;
            };

            if new_window && !uri.starts_with(COMMAND_SCHEME) {
                controller.open_link(&uri);
                decision.ignore();
            } else if controller.handle_navigation(&uri) {
                decision.ignore();
            } else {
                decision.use_();
            }
            true
        });
    }

    {
        let controller_weak = Rc::downgrade(&controller);
        web_view.connect_load_changed(move |_, event| {
            if event != webkit::LoadEvent::Finished {
                return;
            }
            if let Some(controller) = controller_weak.upgrade() {
                controller.page_loaded();
            }
        });
    }

    let controller_weak = Rc::downgrade(&controller);
    let settings_for_close = Rc::clone(&settings);
    window.connect_close_request(move |win| {
        if let Some(controller) = controller_weak.upgrade() {
            if matches!(controller.on_close_request(), glib::Propagation::Stop) {
                return glib::Propagation::Stop;
            }
        }

        let width = win.width();
        let height = win.height();
        if width > 0 && height > 0 {
            {
                let mut data = settings_for_close.borrow_mut();
                data.window_width = Some(width);
                data.window_height = Some(height);
            }
            if let Err(err) = save_app_settings(&settings_for_close.borrow()) {
                log::warn!("Failed to save settings: {}", err);
            }
        }
        glib::Propagation::Proceed
    });

    controller.start();
    window.present();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppAction;

    const PAGE: &str = "file:///pardus/index.html";

    #[test]
    fn commands_are_intercepted() {
        assert_eq!(
            classify_navigation("cmd://install-appid?gparted", Some(PAGE)),
            Navigation::Command(Command::ModifyApp {
                action: AppAction::Install,
                program_id: "gparted".to_string()
            })
        );
        assert_eq!(
            classify_navigation("cmd://link?https://example.com/#top", None),
            Navigation::Command(Command::Link("https://example.com/#top".to_string()))
        );
    }

    #[test]
    fn fragment_of_the_current_page_is_allowed() {
        assert_eq!(
            classify_navigation("file:///pardus/index.html#community", Some(PAGE)),
            Navigation::Allow
        );
        assert_eq!(classify_navigation(PAGE, Some(PAGE)), Navigation::Allow);
    }

    #[test]
    fn other_pages_are_opened_without_fragment() {
        assert_eq!(
            classify_navigation("file:///pardus/software.html#Games", Some(PAGE)),
            Navigation::Open {
                uri: "file:///pardus/software.html".to_string()
            }
        );
        assert_eq!(
            classify_navigation(PAGE, None),
            Navigation::Open {
                uri: PAGE.to_string()
            }
        );
    }

    #[test]
    fn drain_handles_queued_messages_in_order() {
        let (sender, receiver) = mpsc::channel();
        assert_eq!(drain_messages(&receiver, |_: u32| {}), 0);

        for value in [1, 2, 3] {
            sender.send(value).expect("send");
        }
        let mut seen = Vec::new();
        assert_eq!(drain_messages(&receiver, |value| seen.push(value)), 3);
        assert_eq!(seen, [1, 2, 3]);

        drop(sender);
        assert_eq!(drain_messages(&receiver, |_| {}), 0);
    }
}
