//! Desktop notification text for finished transactions and system tasks.

use crate::apt::{TransactionAction, TransactionOutcome, TransactionRequest, TransactionState};

const ICON_INFO: &str = "dialog-information";
const ICON_ERROR: &str = "dialog-error";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NotificationContent {
    pub(crate) summary: String,
    pub(crate) body: String,
    pub(crate) icon: &'static str,
}

impl NotificationContent {
    pub(crate) fn new(summary: impl Into<String>, body: impl Into<String>, icon: &'static str) -> Self {
        Self {
            summary: summary.into(),
            body: body.into(),
            icon,
        }
    }
}

fn noun(action: TransactionAction) -> &'static str {
    match action {
        TransactionAction::Install => "Installation of",
        TransactionAction::Remove => "Removal of",
        TransactionAction::Upgrade => "Upgrade of",
        _ => "Update of",
    }
}

fn repair_notification(action: TransactionAction, success: bool) -> NotificationContent {
    let (subject, verb) = match action {
        TransactionAction::FixBroken => ("broken dependencies", "Fixing the broken dependencies"),
        _ => ("an incomplete install", "Fixing the incomplete install"),
    };
    if success {
        NotificationContent::new(
            format!("Successfully fixed {}.", subject),
            format!("{} was successful.", verb),
            ICON_INFO,
        )
    } else {
        NotificationContent::new(
            format!("Failed to fix {}.", subject.trim_start_matches("an ")),
            format!("{} failed.", verb),
            ICON_ERROR,
        )
    }
}

/// What to tell the user once `request` has finished, if anything.
///
/// Plain cache updates stay quiet and refused authorization is never reported.
pub(crate) fn transaction_notification(
    request: &TransactionRequest,
    outcome: &TransactionOutcome,
) -> Option<NotificationContent> {
    let action = request.action;
    if matches!(outcome, TransactionOutcome::NotAuthorized | TransactionOutcome::Error(_)) {
        return None;
    }

    match action {
        TransactionAction::Update => None,
        TransactionAction::FixBroken | TransactionAction::FixIncomplete => {
            Some(repair_notification(action, outcome.is_success()))
        }
        TransactionAction::Install | TransactionAction::Remove | TransactionAction::Upgrade => {
            let title = action.title();
            let packages = request.package_list();
            Some(match outcome {
                TransactionOutcome::Success => NotificationContent::new(
                    format!("{} complete", title),
                    format!("{} has been successfully {}.", packages, action.past_tense()),
                    ICON_INFO,
                ),
                TransactionOutcome::Cancelled { .. } => NotificationContent::new(
                    format!("{} cancelled", title),
                    format!("{} {} was cancelled.", noun(action), packages),
                    ICON_INFO,
                ),
                TransactionOutcome::Failed { during, exit } => {
                    let body = if *during == TransactionState::UpdatingCache {
                        format!(
                            "{} {} failed while refreshing the package lists ({}).",
                            noun(action),
                            packages,
                            exit
                        )
                    } else {
                        format!("{} {} failed.", noun(action), packages)
                    };
                    NotificationContent::new(format!("{} failed", title), body, ICON_ERROR)
                }
                TransactionOutcome::NotAuthorized | TransactionOutcome::Error(_) => return None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apt::ExitState;

    fn install_request() -> TransactionRequest {
        TransactionRequest::new(
            TransactionAction::Install,
            vec!["gparted".to_string(), "dosfstools".to_string()],
        )
    }

    #[test]
    fn install_outcomes() {
        let request = install_request();
        let success = transaction_notification(&request, &TransactionOutcome::Success)
            .expect("success notification");
        assert_eq!(success.summary, "Install complete");
        assert_eq!(success.body, "gparted, dosfstools has been successfully installed.");
        assert_eq!(success.icon, "dialog-information");

        let cancelled = transaction_notification(
            &request,
            &TransactionOutcome::Cancelled {
                during: TransactionState::Installing,
            },
        )
        .expect("cancel notification");
        assert_eq!(cancelled.summary, "Install cancelled");
        assert_eq!(cancelled.body, "Installation of gparted, dosfstools was cancelled.");

        let failed = transaction_notification(
            &request,
            &TransactionOutcome::Failed {
                during: TransactionState::Installing,
                exit: ExitState::Failed,
            },
        )
        .expect("failure notification");
        assert_eq!(failed.summary, "Install failed");
        assert_eq!(failed.icon, "dialog-error");
    }

    #[test]
    fn quiet_outcomes() {
        assert_eq!(
            transaction_notification(&install_request(), &TransactionOutcome::NotAuthorized),
            None
        );
        assert_eq!(
            transaction_notification(
                &TransactionRequest::update_repos(),
                &TransactionOutcome::Success
            ),
            None
        );
    }

    #[test]
    fn repair_wording() {
        let fixed = transaction_notification(
            &TransactionRequest::fix_broken_depends(),
            &TransactionOutcome::Success,
        )
        .expect("notification");
        assert_eq!(fixed.summary, "Successfully fixed broken dependencies.");

        let failed = transaction_notification(
            &TransactionRequest::fix_incomplete_install(),
            &TransactionOutcome::Failed {
                during: TransactionState::FixingIncomplete,
                exit: ExitState::Failed,
            },
        )
        .expect("notification");
        assert_eq!(failed.summary, "Failed to fix incomplete install.");
        assert_eq!(failed.body, "Fixing the incomplete install failed.");
    }
}
