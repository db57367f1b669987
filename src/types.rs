use crate::apt::{PKEXEC_DISMISSED, PKEXEC_NOT_AUTHORIZED};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub(crate) fn success(&self) -> bool {
        self.code.unwrap_or(-1) == 0
    }

    /// The user dismissed or failed the pkexec authentication prompt.
    pub(crate) fn auth_dismissed(&self) -> bool {
        matches!(self.code, Some(PKEXEC_DISMISSED | PKEXEC_NOT_AUTHORIZED))
    }

    /// Best human-readable explanation of a failed command.
    pub(crate) fn failure_message(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            format!("Exit code: {}", self.code.unwrap_or(-1))
        }
    }
}

/// What the user asked to do with a catalog entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AppAction {
    Install,
    Remove,
    Upgrade,
}

impl AppAction {
    pub(crate) fn key(self) -> &'static str {
        match self {
            AppAction::Install => "install",
            AppAction::Remove => "remove",
            AppAction::Upgrade => "upgrade",
        }
    }

    pub(crate) fn progress_label(self) -> &'static str {
        match self {
            AppAction::Install => "Installing...",
            AppAction::Remove => "Removing...",
            AppAction::Upgrade => "Upgrading...",
        }
    }
}
