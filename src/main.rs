mod apt;
mod catalog;
mod cli;
mod command;
mod notify;
mod pages;
mod preinstall;
mod settings;
mod state;
mod system;
mod types;
mod ui;
mod view_model;

use std::sync::{Arc, RwLock};

use adw::prelude::*;
use clap::Parser;
use gtk4::gio;
use gtk4::glib;
use libadwaita as adw;

use crate::cli::Args;
use crate::state::controller::Startup;
use crate::system::SystemState;
use crate::ui::build_ui;

const APP_ID: &str = "org.pardus.Welcome";

fn startup(args: &Args) -> anyhow::Result<Startup> {
    let data_dir = pages::resolve_data_dir(args.data_dir.as_deref())?;
    log::info!("Data directory: {}", data_dir.display());

    let locale = args.locale.clone().or_else(pages::system_locale);
    let locale_dir = locale
        .as_deref()
        .and_then(|locale| pages::locale_dir(&pages::locale_roots(), locale));

    let system = Arc::new(RwLock::new(SystemState::detect(&args.probe_overrides())));
    system::spawn_background_probes(&system);

    Ok(Startup {
        data_dir,
        system,
        software_only: args.software_only,
        simulate: args.simulate_changes,
        jump_to: args.jump_to.clone(),
        locale_dir,
    })
}

fn main() -> glib::ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let startup = match startup(&args) {
        Ok(startup) => startup,
        Err(err) => {
            log::error!("{:#}", err);
            return glib::ExitCode::FAILURE;
        }
    };

    if let Err(err) = adw::init() {
        log::error!("Failed to initialize libadwaita: {}", err);
        return glib::ExitCode::FAILURE;
    }

    let app = adw::Application::builder()
        .application_id(APP_ID)
        .flags(gio::ApplicationFlags::FLAGS_NONE)
        .build();

    app.connect_activate(move |app| build_ui(app, &startup));

    // GTK must not see our own flags.
    let program = std::env::args().next().unwrap_or_else(|| "welcome-gtk".to_string());
    app.run_with_args(&[program])
}
