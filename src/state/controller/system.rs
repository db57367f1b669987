use std::sync::Arc;
use std::thread;

use crate::apt::{AptDaemon, TransactionRequest, run_transaction};
use crate::notify::NotificationContent;
use crate::state::controller::AppController;
use crate::state::types::{AppMessage, TransactionOrigin};
use crate::system::{self, SessionKind, SystemSpecs, aacs, read_state, rpi, write_state};
use crate::view_model::{self, Script};

impl AppController {
    pub(crate) fn update_repos(&self) {
        self.run_maintenance(TransactionRequest::update_repos());
    }

    pub(crate) fn fix_incomplete_install(&self) {
        self.run_maintenance(TransactionRequest::fix_incomplete_install());
    }

    pub(crate) fn fix_broken_depends(&self) {
        self.run_maintenance(TransactionRequest::fix_broken_depends());
    }

    /// A bare package-daemon transaction with no catalog entry behind it.
    fn run_maintenance(&self, request: TransactionRequest) {
        let Some(guard) = self.busy.try_acquire() else {
            log::warn!(
                "Software changes are already in progress, ignoring {}",
                request.action.title()
            );
            return;
        };

        let origin = TransactionOrigin::Maintenance;
        self.start_operation_tracking(&origin, &request);
        let simulate = self.installer.simulating();
        let sender = self.sender.clone();
        thread::spawn(move || {
            let _guard = guard;
            let outcome = if simulate {
                log::info!("[simulate] would run {}", request.action.title());
                None
            } else {
                let progress = sender.clone();
                Some(run_transaction(&AptDaemon, &request, |state| {
                    let _ = progress.send(AppMessage::TransactionProgress {
                        origin: TransactionOrigin::Maintenance,
                        state,
                    });
                }))
            };
            let _ = sender.send(AppMessage::TransactionFinished {
                origin,
                request,
                outcome,
            });
        });
    }

    pub(crate) fn toggle_autostart(&self) {
        let Some(autostart) = self.autostart.as_ref() else {
            log::warn!("Cannot locate the autostart directory");
            return;
        };
        match autostart.toggle() {
            Ok(enabled) => {
                log::info!("Autostart {}", if enabled { "enabled" } else { "disabled" });
                self.run_script(&view_model::autostart_script(enabled));
            }
            Err(err) => log::warn!("{}", err),
        }
    }

    pub(crate) fn get_aacs_db(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.aacs_in_progress {
                return;
            }
            state.aacs_in_progress = true;
        }
        let mut script = Script::new();
        script.show(".bluray-applying");
        self.run_script(&script);

        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = aacs::download_keydb().map_err(|err| format!("{:#}", err));
            let _ = sender.send(AppMessage::AacsFinished { result });
        });
    }

    pub(crate) fn finish_aacs(&self, result: Result<std::path::PathBuf, String>) {
        self.state.borrow_mut().aacs_in_progress = false;
        let mut script = Script::new();
        script.hide(".bluray-applying");
        self.run_script(&script);

        let content = match result {
            Ok(_) => NotificationContent::new(
                "Successfully installed the Blu-ray AACS database.",
                "Installation of the Blu-ray AACS database was successful.",
                "dialog-information",
            ),
            Err(err) => {
                log::warn!("AACS database download failed: {}", err);
                NotificationContent::new(
                    "Failed to install the Blu-ray AACS database.",
                    "Installation of the Blu-ray AACS database failed.",
                    "dialog-error",
                )
            }
        };
        self.send_notification(&content);
    }

    pub(crate) fn resize_rpi(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.rpi_resizing {
                return;
            }
            state.rpi_resizing = true;
        }
        let sender = self.sender.clone();
        thread::spawn(move || {
            let outcome = rpi::resize_partition();
            let _ = sender.send(AppMessage::RpiResizeFinished { outcome });
        });
    }

    pub(crate) fn finish_rpi_resize(&self, outcome: rpi::ResizeOutcome) {
        self.state.borrow_mut().rpi_resizing = false;
        let pending = outcome == rpi::ResizeOutcome::PendingReboot;
        if pending {
            write_state(&self.system).rpi_resize_pending = true;
        }

        let (summary, body, icon) = outcome.message();
        self.send_notification(&NotificationContent::new(summary, body, icon));
        self.run_script(&view_model::rpi_resize_script(
            rpi::already_resized(),
            pending,
        ));
    }

    pub(crate) fn init_system_info(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.specs_loading {
                return;
            }
            state.specs_loading = true;
        }
        self.run_script(&view_model::placeholder_script());

        let (arch, skip_storage) = {
            let system = read_state(&self.system);
            (system.arch.clone(), system.session == SessionKind::Live)
        };
        let sender = self.sender.clone();
        thread::spawn(move || {
            let specs = system::gather_specs(&arch, skip_storage);
            let _ = sender.send(AppMessage::SpecsGathered {
                specs: Box::new(specs),
            });
        });
    }

    pub(crate) fn finish_system_info(&self, specs: SystemSpecs) {
        self.state.borrow_mut().specs_loading = false;
        let script = {
            let system = read_state(&self.system);
            view_model::specs_scripts(&specs, &system)
        };
        self.run_script(&script);
    }

    pub(crate) fn check_internet_connection(&self) {
        let shared = Arc::clone(&self.system);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let online = system::check_connectivity(&shared);
            let _ = sender.send(AppMessage::ConnectivityChecked { online });
        });
    }
}
