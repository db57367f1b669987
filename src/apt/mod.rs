mod daemon;
mod dpkg;
mod privilege;
mod transaction;

pub(crate) use daemon::{AptDaemon, PackageDaemon};
pub(crate) use dpkg::{print_architecture, query_installed_packages};
pub(crate) use privilege::{
    PKEXEC_DISMISSED, PKEXEC_NOT_AUTHORIZED, run_privileged_command, run_repository_helper,
};
pub(crate) use transaction::{
    BusyLock, TransactionAction, TransactionOutcome, TransactionRequest,
    TransactionState, run as run_transaction,
};

#[cfg(test)]
pub(crate) use daemon::{DaemonStep, ExitState};
#[cfg(test)]
pub(crate) use transaction::tests::FakeDaemon;
