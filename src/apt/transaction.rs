//! Package transactions as a sequential state machine over [`PackageDaemon`]
//! steps, guarded by a process-wide single-flight lock.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::daemon::{DaemonError, DaemonStep, ExitState, PackageDaemon};

/// Allows at most one transaction in flight. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct BusyLock {
    busy: Arc<AtomicBool>,
}

impl BusyLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the [`BusyLock`] when dropped.
#[derive(Debug)]
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum TransactionAction {
    Install,
    Remove,
    Upgrade,
    Update,
    FixBroken,
    FixIncomplete,
}

impl TransactionAction {
    /// Noun used in notifications and logs.
    pub(crate) fn title(self) -> &'static str {
        match self {
            TransactionAction::Install => "Install",
            TransactionAction::Remove => "Remove",
            TransactionAction::Upgrade => "Upgrade",
            TransactionAction::Update => "Update",
            TransactionAction::FixBroken => "Fix Broken Packages",
            TransactionAction::FixIncomplete => "Fix Incomplete Install",
        }
    }

    /// Past tense used in the success notification.
    pub(crate) fn past_tense(self) -> &'static str {
        match self {
            TransactionAction::Install => "installed",
            TransactionAction::Remove => "removed",
            TransactionAction::Upgrade => "upgraded",
            TransactionAction::Update => "updated",
            TransactionAction::FixBroken | TransactionAction::FixIncomplete => "repaired",
        }
    }

    fn main_state(self) -> TransactionState {
        match self {
            TransactionAction::Install => TransactionState::Installing,
            TransactionAction::Remove => TransactionState::Removing,
            TransactionAction::Upgrade => TransactionState::Upgrading,
            TransactionAction::Update => TransactionState::UpdatingCache,
            TransactionAction::FixBroken => TransactionState::FixingBroken,
            TransactionAction::FixIncomplete => TransactionState::FixingIncomplete,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TransactionRequest {
    pub(crate) action: TransactionAction,
    pub(crate) packages: Vec<String>,
    /// Run a cache update before the main step.
    pub(crate) refresh_cache: bool,
    /// Narrows the cache update to one `sources.list.d` file.
    pub(crate) source_to_update: Option<String>,
}

impl TransactionRequest {
    pub(crate) fn new(action: TransactionAction, packages: Vec<String>) -> Self {
        Self {
            action,
            packages,
            refresh_cache: false,
            source_to_update: None,
        }
    }

    pub(crate) fn update_repos() -> Self {
        Self::new(TransactionAction::Update, Vec::new())
    }

    pub(crate) fn fix_incomplete_install() -> Self {
        Self::new(TransactionAction::FixIncomplete, Vec::new())
    }

    pub(crate) fn fix_broken_depends() -> Self {
        Self::new(TransactionAction::FixBroken, Vec::new())
    }

    fn wants_cache_refresh(&self) -> bool {
        match self.action {
            TransactionAction::Install | TransactionAction::Upgrade => self.refresh_cache,
            _ => false,
        }
    }

    pub(crate) fn package_list(&self) -> String {
        self.packages.join(", ")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TransactionState {
    Idle,
    UpdatingCache,
    Installing,
    Removing,
    Upgrading,
    FixingBroken,
    FixingIncomplete,
    Done,
    Failed,
}

impl TransactionState {
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Done | TransactionState::Failed)
    }

    /// State entered once the current step reports `exit-success`.
    fn advance(self, request: &TransactionRequest) -> TransactionState {
        match self {
            TransactionState::Idle if request.wants_cache_refresh() => {
                TransactionState::UpdatingCache
            }
            TransactionState::Idle => request.action.main_state(),
            TransactionState::UpdatingCache if request.action != TransactionAction::Update => {
                request.action.main_state()
            }
            TransactionState::Done | TransactionState::Failed => self,
            _ => TransactionState::Done,
        }
    }

    fn step(self, request: &TransactionRequest) -> Option<DaemonStep> {
        match self {
            TransactionState::UpdatingCache => Some(DaemonStep::UpdateCache {
                source_file: request.source_to_update.clone(),
            }),
            TransactionState::Installing => Some(DaemonStep::Install(request.packages.clone())),
            TransactionState::Removing => Some(DaemonStep::Remove(request.packages.clone())),
            TransactionState::Upgrading => Some(DaemonStep::Upgrade),
            TransactionState::FixingBroken => Some(DaemonStep::FixBroken),
            TransactionState::FixingIncomplete => Some(DaemonStep::FixIncomplete),
            TransactionState::Idle | TransactionState::Done | TransactionState::Failed => None,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::Idle => "idle",
            TransactionState::UpdatingCache => "updating cache",
            TransactionState::Installing => "installing",
            TransactionState::Removing => "removing",
            TransactionState::Upgrading => "upgrading",
            TransactionState::FixingBroken => "fixing broken dependencies",
            TransactionState::FixingIncomplete => "fixing incomplete install",
            TransactionState::Done => "done",
            TransactionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum TransactionOutcome {
    Success,
    Cancelled {
        during: TransactionState,
    },
    Failed {
        during: TransactionState,
        exit: ExitState,
    },
    NotAuthorized,
    Error(String),
}

impl TransactionOutcome {
    pub(crate) fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success)
    }
}

/// Runs `request` to completion, reporting each state entered to `on_state`.
pub(crate) fn run(
    daemon: &dyn PackageDaemon,
    request: &TransactionRequest,
    mut on_state: impl FnMut(TransactionState),
) -> TransactionOutcome {
    let mut state = TransactionState::Idle.advance(request);

    while !state.is_terminal() {
        on_state(state);
        let Some(step) = state.step(request) else {
            break;
        };

        let outcome = match daemon.run_step(&step) {
            Ok(exit) if exit.is_success() => None,
            Ok(ExitState::Cancelled) => Some(TransactionOutcome::Cancelled { during: state }),
            Ok(exit) => Some(TransactionOutcome::Failed {
                during: state,
                exit,
            }),
            Err(DaemonError::NotAuthorized) => Some(TransactionOutcome::NotAuthorized),
            Err(err) => Some(TransactionOutcome::Error(err.to_string())),
        };

        if let Some(outcome) = outcome {
            log::warn!(
                "{} transaction stopped while {}: {:?}",
                request.action.title(),
                state,
                outcome
            );
            on_state(TransactionState::Failed);
            return outcome;
        }

        state = state.advance(request);
    }

    on_state(TransactionState::Done);
    TransactionOutcome::Success
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted daemon recording every step it is asked to run.
    #[derive(Default)]
    pub(crate) struct FakeDaemon {
        pub(crate) replies: Mutex<VecDeque<Result<ExitState, DaemonError>>>,
        pub(crate) steps: Mutex<Vec<DaemonStep>>,
    }

    impl FakeDaemon {
        pub(crate) fn with_replies(replies: Vec<Result<ExitState, DaemonError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                steps: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn steps(&self) -> Vec<DaemonStep> {
            self.steps.lock().unwrap().clone()
        }
    }

    impl PackageDaemon for FakeDaemon {
        fn run_step(&self, step: &DaemonStep) -> Result<ExitState, DaemonError> {
            self.steps.lock().unwrap().push(step.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ExitState::Success))
        }
    }

    fn collect(daemon: &FakeDaemon, request: &TransactionRequest) -> (TransactionOutcome, Vec<TransactionState>) {
        let mut states = Vec::new();
        let outcome = run(daemon, request, |state| states.push(state));
        (outcome, states)
    }

    #[test]
    fn install_with_refresh_updates_cache_first() {
        let daemon = FakeDaemon::default();
        let mut request = TransactionRequest::new(
            TransactionAction::Install,
            vec!["chromium-browser".to_string()],
        );
        request.refresh_cache = true;
        request.source_to_update = Some("chromium-team-ubuntu-stable-bionic.list".to_string());

        let (outcome, states) = collect(&daemon, &request);

        assert_eq!(outcome, TransactionOutcome::Success);
        assert_eq!(
            states,
            vec![
                TransactionState::UpdatingCache,
                TransactionState::Installing,
                TransactionState::Done
            ]
        );
        assert_eq!(
            daemon.steps(),
            vec![
                DaemonStep::UpdateCache {
                    source_file: Some("chromium-team-ubuntu-stable-bionic.list".to_string())
                },
                DaemonStep::Install(vec!["chromium-browser".to_string()]),
            ]
        );
    }

    #[test]
    fn failed_cache_refresh_never_installs() {
        let daemon = FakeDaemon::with_replies(vec![Ok(ExitState::Failed)]);
        let mut request =
            TransactionRequest::new(TransactionAction::Install, vec!["gparted".to_string()]);
        request.refresh_cache = true;

        let (outcome, states) = collect(&daemon, &request);

        assert_eq!(
            outcome,
            TransactionOutcome::Failed {
                during: TransactionState::UpdatingCache,
                exit: ExitState::Failed,
            }
        );
        assert!(!states.contains(&TransactionState::Installing));
        assert_eq!(states.last(), Some(&TransactionState::Failed));
        assert_eq!(daemon.steps().len(), 1);
    }

    #[test]
    fn remove_ignores_refresh_flag() {
        let daemon = FakeDaemon::default();
        let mut request =
            TransactionRequest::new(TransactionAction::Remove, vec!["gparted".to_string()]);
        request.refresh_cache = true;

        let (_, states) = collect(&daemon, &request);
        assert_eq!(
            states,
            vec![TransactionState::Removing, TransactionState::Done]
        );
    }

    #[test]
    fn update_only_refreshes_the_cache() {
        let daemon = FakeDaemon::default();
        let (outcome, states) = collect(&daemon, &TransactionRequest::update_repos());
        assert!(outcome.is_success());
        assert_eq!(
            states,
            vec![TransactionState::UpdatingCache, TransactionState::Done]
        );
        assert_eq!(
            daemon.steps(),
            vec![DaemonStep::UpdateCache { source_file: None }]
        );
    }

    #[test]
    fn maintenance_requests_run_single_steps() {
        let daemon = FakeDaemon::default();
        collect(&daemon, &TransactionRequest::fix_broken_depends());
        collect(&daemon, &TransactionRequest::fix_incomplete_install());
        assert_eq!(
            daemon.steps(),
            vec![DaemonStep::FixBroken, DaemonStep::FixIncomplete]
        );
    }

    #[test]
    fn cancellation_and_authorization_are_distinguished() {
        let daemon = FakeDaemon::with_replies(vec![Ok(ExitState::Cancelled)]);
        let request = TransactionRequest::new(TransactionAction::Upgrade, vec!["x".to_string()]);
        let (outcome, _) = collect(&daemon, &request);
        assert_eq!(
            outcome,
            TransactionOutcome::Cancelled {
                during: TransactionState::Upgrading
            }
        );

        let daemon = FakeDaemon::with_replies(vec![Err(DaemonError::NotAuthorized)]);
        let (outcome, _) = collect(&daemon, &request);
        assert_eq!(outcome, TransactionOutcome::NotAuthorized);

        let daemon = FakeDaemon::with_replies(vec![Err(DaemonError::Bus("gone".to_string()))]);
        let (outcome, _) = collect(&daemon, &request);
        assert_eq!(outcome, TransactionOutcome::Error("D-Bus error: gone".to_string()));
    }

    #[test]
    fn busy_lock_is_single_flight() {
        let lock = BusyLock::new();
        let guard = lock.try_acquire().expect("first acquire");
        assert!(lock.is_busy());
        assert!(lock.try_acquire().is_none());
        assert!(lock.clone().try_acquire().is_none());

        drop(guard);
        assert!(!lock.is_busy());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn guard_released_after_worker_completes() {
        let lock = BusyLock::new();
        let guard = lock.try_acquire().expect("acquire");
        let daemon = Arc::new(FakeDaemon::default());

        let worker_daemon = Arc::clone(&daemon);
        std::thread::spawn(move || {
            let _guard = guard;
            run(worker_daemon.as_ref(), &TransactionRequest::update_repos(), |_| {})
        })
        .join()
        .expect("worker");

        assert!(!lock.is_busy());
    }
}
