use std::collections::HashSet;
use std::path::Path;
use std::process;
use std::rc::Rc;
use std::thread;

use libadwaita::prelude::*;

use crate::apt::{AptDaemon, TransactionOutcome, TransactionRequest, query_installed_packages};
use crate::command::launch_command_line;
use crate::notify::transaction_notification;
use crate::state::controller::app::DIALOG_TITLE;
use crate::state::controller::{AppController, WELCOME_PROGRAM_ID};
use crate::state::types::{AppMessage, TransactionOrigin};
use crate::system::{self, SOURCES_LIST_DIR, read_state};
use crate::types::AppAction;
use crate::view_model;

impl AppController {
    pub(crate) fn modify_app(self: &Rc<Self>, action: AppAction, program_id: &str) {
        self.start_app_transaction(TransactionOrigin::App(program_id.to_string()), action);
    }

    /// Adds the welcome update PPA by installing its catalog entry.
    pub(crate) fn subscribe_updates(self: &Rc<Self>) {
        log::info!("Subscribing to welcome updates...");
        self.state.borrow_mut().subscribing = true;
        self.run_script(&view_model::subscribing_script(true));
        if !self.start_app_transaction(TransactionOrigin::Subscribe, AppAction::Install) {
            self.state.borrow_mut().subscribing = false;
            self.run_script(&view_model::subscribing_script(false));
        }
    }

    /// Plans and starts a catalog transaction. Returns `false` when nothing was started.
    fn start_app_transaction(self: &Rc<Self>, origin: TransactionOrigin, action: AppAction) -> bool {
        let Some(program_id) = origin.program_id().map(str::to_string) else {
            return false;
        };

        let Some(guard) = self.busy.try_acquire() else {
            log::warn!(
                "Software changes are already in progress, ignoring {} of {}",
                action.key(),
                program_id
            );
            return false;
        };

        let (plan, applying) = {
            let state = self.state.borrow();
            let Some(catalog) = state.catalog.as_ref() else {
                log::error!("Application index not loaded, cannot {} {}", action.key(), program_id);
                return false;
            };
            let plan = match self.installer.configure(catalog, &program_id, action) {
                Ok(plan) => plan,
                Err(err) => {
                    log::error!("Cannot {} {}: {}", action.key(), program_id, err);
                    return false;
                }
            };
            let applying = catalog
                .get(&program_id)
                .map(|entry| view_model::mark_applying(entry, action));
            (plan, applying)
        };

        if let Some(script) = applying {
            self.run_script(&script);
        }
        log::info!(
            "{} {} ({})",
            action.progress_label(),
            plan.name,
            plan.request.package_list()
        );
        self.start_operation_tracking(&origin, &plan.request);

        let installer = self.installer.clone();
        let helper = self.helper.clone();
        let sender = self.sender.clone();
        thread::spawn(move || {
            let _guard = guard;
            let progress = sender.clone();
            let progress_origin = origin.clone();
            let outcome = installer.execute(&plan, &helper, &AptDaemon, |state| {
                let _ = progress.send(AppMessage::TransactionProgress {
                    origin: progress_origin.clone(),
                    state,
                });
            });
            let _ = sender.send(AppMessage::TransactionFinished {
                origin,
                request: plan.request,
                outcome,
            });
        });
        true
    }

    pub(crate) fn finish_transaction(
        self: &Rc<Self>,
        origin: TransactionOrigin,
        request: TransactionRequest,
        outcome: Option<TransactionOutcome>,
    ) {
        self.complete_operation_tracking(&origin, outcome.as_ref());

        if let Some(outcome) = &outcome {
            if let TransactionOutcome::Error(message) = outcome {
                self.show_error_dialog(
                    &format!("{} failed", request.action.title()),
                    message,
                );
            }
            if let Some(content) = transaction_notification(&request, outcome) {
                self.send_notification(&content);
            }
        }

        if origin == TransactionOrigin::Subscribe {
            self.finish_subscription();
        }
        self.refresh_installed_packages(origin.program_id().map(str::to_string));
    }

    fn finish_subscription(&self) {
        self.state.borrow_mut().subscribing = false;
        let codename = read_state(&self.system).codename.clone();
        if system::welcome_ppa_subscribed(Path::new(SOURCES_LIST_DIR), &codename) {
            log::info!("Update PPA added, restarting");
            self.restart();
        } else {
            log::warn!("Update PPA not detected after subscribing");
            self.run_script(&view_model::subscribing_script(false));
        }
    }

    /// Starts a fresh copy with the same arguments and quits this one.
    fn restart(&self) {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(err) => {
                log::error!("Cannot locate the running executable: {}", err);
                return;
            }
        };
        match process::Command::new(&exe)
            .args(std::env::args_os().skip(1))
            .spawn()
        {
            Ok(_) => self.app.quit(),
            Err(err) => log::error!("Failed to restart {}: {}", exe.display(), err),
        }
    }

    /// Re-reads the dpkg database; `program_id` limits the page update to one entry.
    pub(crate) fn refresh_installed_packages(&self, program_id: Option<String>) {
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = query_installed_packages();
            let _ = sender.send(AppMessage::InstalledRefreshed { program_id, result });
        });
    }

    pub(crate) fn finish_installed_refresh(
        &self,
        program_id: Option<String>,
        result: Result<HashSet<String>, String>,
    ) {
        let installed = match result {
            Ok(installed) => installed,
            Err(err) => {
                log::warn!("Failed to read installed packages: {}", err);
                return;
            }
        };
        log::debug!("{} packages installed", installed.len());

        let script = {
            let mut state = self.state.borrow_mut();
            state.installed = installed;
            let Some(catalog) = state.catalog.as_ref() else {
                return;
            };
            match program_id.as_deref().and_then(|id| catalog.get(id)) {
                Some(entry) => view_model::update_app_status(entry, &state.installed),
                None => {
                    let arch = read_state(&self.system).arch.clone();
                    view_model::update_all_app_status(catalog, &arch, &state.installed)
                }
            }
        };
        self.run_script(&script);
    }

    pub(crate) fn launch_app(&self, program_id: &str) {
        let (name, command_line) = {
            let state = self.state.borrow();
            let Some(entry) = state.catalog.as_ref().and_then(|catalog| catalog.get(program_id))
            else {
                log::error!("Cannot launch unknown application {}", program_id);
                return;
            };
            (entry.name.clone(), entry.launch_command.clone())
        };
        let Some(command_line) = command_line else {
            log::warn!("{} has no launch command", name);
            return;
        };

        log::info!("Launching \"{}\" (command: \"{}\")", name, command_line);
        if let Err(err) = launch_command_line(&command_line) {
            log::warn!("{}", err);
            self.show_error_dialog(
                DIALOG_TITLE,
                &format!(
                    "An error occurred while launching {}. Please consider re-installing the application.\n\nCommand: \"{}\"",
                    name, command_line
                ),
            );
        }
    }

    pub(crate) fn filter_apps(&self, filter: &str, toggle_non_free: bool) {
        let script = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let Some(catalog) = state.catalog.as_ref() else {
                log::error!("Application index not loaded, cannot filter");
                return;
            };
            view_model::apply_filter(&mut state.filter, catalog, filter, toggle_non_free)
        };
        self.run_script(&script);
    }
}
