use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;

use gtk4 as gtk;
use libadwaita as adw;
use webkit6 as webkit;

use adw::prelude::*;
use gtk::glib::{self, Propagation};
use gtk::gio;
use webkit::prelude::*;

use crate::apt::BusyLock;
use crate::catalog::{CATALOG_RELATIVE_PATH, Catalog, Placeholders};
use crate::command::{self, Command};
use crate::notify::NotificationContent;
use crate::pages::{self, SlideSet};
use crate::preinstall::{PkexecHelper, PreInstaller, helper_path};
use crate::settings::Autostart;
use crate::state::types::{AppMessage, AppState, DEFAULT_OPERATION_HISTORY};
use crate::system::{SOURCES_LIST_DIR, SharedSystemState, read_state, rpi};
use crate::ui::{AppWidgets, Navigation, classify_navigation};
use crate::view_model::{self, ListingContext, PageContext, ScreenshotIndex, Script};

pub(crate) const DIALOG_TITLE: &str = "Software Boutique";
const NOTIFICATION_ID: &str = "welcome-status";
const DIALOG_CLOSE_RESPONSE: &str = "close";

/// Everything decided before the window exists.
#[derive(Clone, Debug)]
pub(crate) struct Startup {
    pub(crate) data_dir: PathBuf,
    pub(crate) system: SharedSystemState,
    pub(crate) software_only: bool,
    pub(crate) simulate: bool,
    pub(crate) jump_to: Option<String>,
    pub(crate) locale_dir: Option<PathBuf>,
}

pub(crate) struct AppController {
    pub(crate) widgets: AppWidgets,
    pub(crate) state: RefCell<AppState>,
    pub(crate) sender: mpsc::Sender<AppMessage>,
    pub(crate) app: adw::Application,
    pub(crate) window: adw::ApplicationWindow,
    pub(crate) system: SharedSystemState,
    pub(crate) busy: BusyLock,
    pub(crate) installer: PreInstaller,
    pub(crate) helper: PkexecHelper,
    pub(crate) placeholders: Placeholders,
    pub(crate) data_dir: PathBuf,
    pub(crate) slides: SlideSet,
    pub(crate) screenshots: ScreenshotIndex,
    pub(crate) autostart: Option<Autostart>,
    pub(crate) software_only: bool,
    start_page: String,
}

impl AppController {
    pub(crate) fn new(
        widgets: AppWidgets,
        sender: mpsc::Sender<AppMessage>,
        app: adw::Application,
        window: adw::ApplicationWindow,
        startup: &Startup,
    ) -> Self {
        let placeholders = {
            let system = read_state(&startup.system);
            Placeholders::new(system.codename.clone(), system.os_version.clone())
        };

        let catalog_path = startup.data_dir.join(CATALOG_RELATIVE_PATH);
        let catalog = match Catalog::load(&catalog_path) {
            Ok(catalog) => {
                log::info!(
                    "Loaded {} applications from {}",
                    catalog.len(),
                    catalog.path().display()
                );
                Some(catalog)
            }
            Err(err) => {
                log::error!("Application index not loaded: {}", err);
                None
            }
        };

        let state = AppState {
            catalog,
            max_operation_history: DEFAULT_OPERATION_HISTORY,
            ..AppState::default()
        };

        if startup.simulate {
            log::warn!("Simulating software changes; nothing will be installed or removed");
        }

        Self {
            widgets,
            state: RefCell::new(state),
            sender,
            app,
            window,
            system: startup.system.clone(),
            busy: BusyLock::new(),
            installer: PreInstaller::new(placeholders.clone(), startup.simulate),
            helper: PkexecHelper {
                helper: helper_path(None),
                catalog: catalog_path,
            },
            placeholders,
            slides: SlideSet::scan(&startup.data_dir, startup.locale_dir.as_deref()),
            screenshots: ScreenshotIndex::scan(&startup.data_dir),
            data_dir: startup.data_dir.clone(),
            autostart: Autostart::for_user(),
            software_only: startup.software_only,
            start_page: pages::start_page(startup.software_only, startup.jump_to.as_deref()),
        }
    }

    pub(crate) fn start(self: &Rc<Self>) {
        self.refresh_installed_packages(None);
        let page = self.start_page.clone();
        self.load_page(&page);
    }

    pub(crate) fn load_page(&self, page: &str) {
        match pages::page_uri(&self.data_dir, page) {
            Ok(uri) => {
                log::debug!("Loading {}", uri);
                self.widgets.web_view.load_uri(&uri);
            }
            Err(err) => {
                log::error!("{:#}", err);
                self.show_error_dialog("Unable to open page", &format!("{:#}", err));
            }
        }
    }

    /// Returns `true` when the view must not continue with the navigation itself.
    pub(crate) fn handle_navigation(self: &Rc<Self>, uri: &str) -> bool {
        let last_uri = self.state.borrow().last_uri.clone();
        match classify_navigation(uri, last_uri.as_deref()) {
            Navigation::Allow => false,
            Navigation::Command(command) => {
                self.dispatch(command);
                true
            }
            Navigation::Open { uri } => {
                let page = view_model::page_name(&uri).to_string();
                {
                    let mut state = self.state.borrow_mut();
                    state.smooth_footer = view_model::wants_smooth_footer(&state.current_page);
                    state.filter.page_opened(&page);
                    state.current_page = page.clone();
                    state.last_uri = Some(uri.clone());
                }
                match self.slides.translated_html(&self.data_dir, &page) {
                    Some(html) => {
                        // The original URI stays the base so scripts and images resolve.
                        self.widgets.web_view.load_html(&html, Some(&uri));
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub(crate) fn page_loaded(&self) {
        self.push_config();
    }

    pub(crate) fn push_config(&self) {
        let script = {
            let state = self.state.borrow();
            let system = read_state(&self.system);
            let ctx = PageContext {
                page: &state.current_page,
                system: &system,
                catalog: state.catalog.as_ref(),
                listing: ListingContext {
                    arch: &system.arch,
                    placeholders: &self.placeholders,
                    sources_dir: Path::new(SOURCES_LIST_DIR),
                    screenshots: &self.screenshots,
                },
                installed: &state.installed,
                autostart: self.autostart_enabled(),
                software_only: self.software_only,
                smooth_footer: state.smooth_footer,
                rpi_resized: rpi::already_resized(),
                welcome_version: env!("CARGO_PKG_VERSION"),
            };
            view_model::push_config(&ctx, &mut rand::thread_rng())
        };
        self.run_script(&script);
    }

    pub(crate) fn autostart_enabled(&self) -> bool {
        self.autostart
            .as_ref()
            .is_some_and(|autostart| autostart.enabled())
    }

    pub(crate) fn run_script(&self, script: &Script) {
        if script.is_empty() {
            return;
        }
        let source = script.render();
        self.widgets.web_view.evaluate_javascript(
            &source,
            None,
            None,
            None::<&gio::Cancellable>,
            |result| {
                if let Err(err) = result {
                    log::warn!("Page script failed: {}", err);
                }
            },
        );
    }

    pub(crate) fn dispatch(self: &Rc<Self>, command: Command) {
        log::debug!("Command: {:?}", command);
        match command {
            Command::ModifyApp { action, program_id } => self.modify_app(action, &program_id),
            Command::LaunchApp(program_id) => self.launch_app(&program_id),
            Command::FilterApps {
                filter,
                toggle_non_free,
            } => self.filter_apps(&filter, toggle_non_free),
            Command::AppInfo { css_id, show } => {
                self.run_script(&view_model::info_toggle(&css_id, show))
            }
            Command::Screenshot(stem) => self.show_screenshot(&stem),
            Command::Quit => self.window.close(),
            Command::Autostart => self.toggle_autostart(),
            Command::AptUpdate => self.update_repos(),
            Command::FixIncompleteInstall => self.fix_incomplete_install(),
            Command::FixBrokenDepends => self.fix_broken_depends(),
            Command::GetAacsDb => self.get_aacs_db(),
            Command::ResizeRpi => self.resize_rpi(),
            Command::RebootRpi => {
                if let Err(err) = rpi::open_shutdown_dialog() {
                    log::warn!("{}", err);
                }
            }
            Command::SubscribeUpdates => self.subscribe_updates(),
            Command::InitSystemInfo => self.init_system_info(),
            Command::CheckInternetConnection => self.check_internet_connection(),
            Command::Tool(name) => {
                if let Err(err) = command::launch_tool(name) {
                    log::warn!("{}", err);
                }
            }
            Command::Run(program) => {
                if let Err(err) = command::spawn_detached(&[program.as_str()]) {
                    log::warn!("{}", err);
                }
            }
            Command::Link(uri) => self.open_link(&uri),
            Command::Unknown(raw) => log::warn!("Unknown command: {}", raw),
        }
    }

    pub(crate) fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::TransactionProgress { origin, state } => {
                self.record_transaction_progress(&origin, state);
            }
            AppMessage::TransactionFinished {
                origin,
                request,
                outcome,
            } => {
                self.finish_transaction(origin, request, outcome);
            }
            AppMessage::InstalledRefreshed { program_id, result } => {
                self.finish_installed_refresh(program_id, result);
            }
            AppMessage::SpecsGathered { specs } => {
                self.finish_system_info(*specs);
            }
            AppMessage::ConnectivityChecked { online } => {
                self.run_script(&view_model::connectivity_script(online));
            }
            AppMessage::AacsFinished { result } => {
                self.finish_aacs(result);
            }
            AppMessage::RpiResizeFinished { outcome } => {
                self.finish_rpi_resize(outcome);
            }
        }
    }

    /// Refuses to close while software changes are running.
    pub(crate) fn on_close_request(&self) -> Propagation {
        if self.busy.is_busy() {
            log::warn!("Software changes are in progress, refusing to close");
            self.show_error_dialog(
                DIALOG_TITLE,
                "Software changes are in progress. Please allow them to complete before closing Welcome.",
            );
            return Propagation::Stop;
        }
        log::info!("Application closed");
        Propagation::Proceed
    }

    pub(crate) fn open_link(&self, uri: &str) {
        if let Err(err) = gio::AppInfo::launch_default_for_uri(uri, None::<&gio::AppLaunchContext>) {
            log::warn!("Failed to open {}: {}", uri, err);
        }
    }

    pub(crate) fn show_screenshot(&self, stem: &str) {
        let path = self.screenshots.path_for(stem);
        if !path.is_file() {
            log::warn!("Screenshot {} not found", path.display());
            return;
        }

        let picture = gtk::Picture::for_filename(&path);
        picture.set_can_shrink(false);
        let preview = gtk::Window::builder()
            .title("Preview Screenshot")
            .transient_for(&self.window)
            .resizable(false)
            .child(&picture)
            .build();

        // Click anywhere to close.
        let click = gtk::GestureClick::new();
        click.connect_released(glib::clone!(
            #[weak]
            preview,
            move |_, _, _, _| {
                preview.close();
            },
        ));
        preview.add_controller(click);
        preview.present();
    }

    pub(crate) fn send_notification(&self, content: &NotificationContent) {
        let notification = gio::Notification::new(&content.summary);
        notification.set_body(Some(&content.body));
        notification.set_icon(&gio::ThemedIcon::new(content.icon));
        self.app
            .send_notification(Some(NOTIFICATION_ID), &notification);
    }

    pub(crate) fn show_error_dialog(&self, title: &str, message: &str) {
        let dialog = adw::MessageDialog::builder()
            .transient_for(&self.window)
            .modal(true)
            .heading(title)
            .body(message)
            .build();
        dialog.add_response(DIALOG_CLOSE_RESPONSE, "OK");
        dialog.set_default_response(Some(DIALOG_CLOSE_RESPONSE));
        dialog.set_close_response(DIALOG_CLOSE_RESPONSE);
        dialog.present();
    }
}
