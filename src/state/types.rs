use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::apt::{TransactionAction, TransactionOutcome, TransactionRequest, TransactionState};
use crate::catalog::Catalog;
use crate::system::SystemSpecs;
use crate::system::rpi::ResizeOutcome;
use crate::view_model::FilterState;

pub(crate) const DEFAULT_OPERATION_HISTORY: usize = 50;

#[derive(Default)]
pub(crate) struct AppState {
    pub(crate) catalog: Option<Catalog>,
    pub(crate) installed: HashSet<String>,
    pub(crate) filter: FilterState,
    /// Last URI the view loaded, used to let fragment-only navigation through.
    pub(crate) last_uri: Option<String>,
    pub(crate) current_page: String,
    pub(crate) smooth_footer: bool,
    pub(crate) specs_loading: bool,
    pub(crate) aacs_in_progress: bool,
    pub(crate) rpi_resizing: bool,
    pub(crate) subscribing: bool,
    pub(crate) operation_history: Vec<TransactionRecord>,
    pub(crate) max_operation_history: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OperationStatus {
    InProgress,
    Success,
    Cancelled,
    Failed,
    Simulated,
}

/// One finished or running transaction, kept for the session log.
#[derive(Clone, Debug)]
pub(crate) struct TransactionRecord {
    pub(crate) program_id: Option<String>,
    pub(crate) action: TransactionAction,
    pub(crate) packages: Vec<String>,
    pub(crate) status: OperationStatus,
    pub(crate) last_state: Option<TransactionState>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) error_message: Option<String>,
}

/// Why a transaction was started; decides what happens once it ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TransactionOrigin {
    /// A catalog entry's install/remove/upgrade button.
    App(String),
    /// `apt-update`, `fix-incomplete-install` or `fix-broken-depends`.
    Maintenance,
    /// Adding the welcome update PPA; success restarts the application.
    Subscribe,
}

impl TransactionOrigin {
    pub(crate) fn program_id(&self) -> Option<&str> {
        match self {
            TransactionOrigin::App(id) => Some(id),
            TransactionOrigin::Maintenance => None,
            TransactionOrigin::Subscribe => Some(crate::state::controller::WELCOME_PROGRAM_ID),
        }
    }
}

pub(crate) enum AppMessage {
    TransactionProgress {
        origin: TransactionOrigin,
        state: TransactionState,
    },
    /// `outcome` is `None` for a simulated run.
    TransactionFinished {
        origin: TransactionOrigin,
        request: TransactionRequest,
        outcome: Option<TransactionOutcome>,
    },
    /// `program_id` names the entry to refresh; `None` refreshes every entry.
    InstalledRefreshed {
        program_id: Option<String>,
        result: Result<HashSet<String>, String>,
    },
    SpecsGathered {
        specs: Box<SystemSpecs>,
    },
    ConnectivityChecked {
        online: bool,
    },
    AacsFinished {
        result: Result<PathBuf, String>,
    },
    RpiResizeFinished {
        outcome: ResizeOutcome,
    },
}
