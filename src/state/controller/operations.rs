use chrono::Utc;

use crate::apt::{TransactionOutcome, TransactionRequest, TransactionState};
use crate::state::controller::AppController;
use crate::state::types::{
    DEFAULT_OPERATION_HISTORY, OperationStatus, TransactionOrigin, TransactionRecord,
};

impl AppController {
    /// Start tracking a new transaction
    pub(crate) fn start_operation_tracking(
        &self,
        origin: &TransactionOrigin,
        request: &TransactionRequest,
    ) {
        let record = TransactionRecord {
            program_id: origin.program_id().map(str::to_string),
            action: request.action,
            packages: request.packages.clone(),
            status: OperationStatus::InProgress,
            last_state: None,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        };

        let mut state = self.state.borrow_mut();
        let max = if state.max_operation_history == 0 {
            DEFAULT_OPERATION_HISTORY
        } else {
            state.max_operation_history
        };
        push_capped(&mut state.operation_history, record, max);
    }

    pub(crate) fn record_transaction_progress(
        &self,
        origin: &TransactionOrigin,
        transaction_state: TransactionState,
    ) {
        log::info!(
            "Transaction for {} is {}",
            origin.program_id().unwrap_or("the system"),
            transaction_state
        );
        let mut state = self.state.borrow_mut();
        if let Some(record) = running_record(&mut state.operation_history, origin) {
            record.last_state = Some(transaction_state);
        }
    }

    /// Complete a transaction record and log how it ended
    pub(crate) fn complete_operation_tracking(
        &self,
        origin: &TransactionOrigin,
        outcome: Option<&TransactionOutcome>,
    ) {
        let mut state = self.state.borrow_mut();
        let Some(record) = running_record(&mut state.operation_history, origin) else {
            return;
        };
        finish_record(record, outcome);

        let elapsed = record
            .completed_at
            .map(|done| (done - record.started_at).num_seconds())
            .unwrap_or_default();
        match record.status {
            OperationStatus::Failed => log::warn!(
                "{} of {} failed after {}s: {}",
                record.action.title(),
                record.packages.join(", "),
                elapsed,
                record.error_message.as_deref().unwrap_or("unknown error")
            ),
            status => log::info!(
                "{} of {} finished as {:?} after {}s",
                record.action.title(),
                record.packages.join(", "),
                status,
                elapsed
            ),
        }
    }
}

fn running_record<'a>(
    history: &'a mut [TransactionRecord],
    origin: &TransactionOrigin,
) -> Option<&'a mut TransactionRecord> {
    history.iter_mut().rev().find(|record| {
        record.status == OperationStatus::InProgress
            && record.program_id.as_deref() == origin.program_id()
    })
}

fn push_capped(history: &mut Vec<TransactionRecord>, record: TransactionRecord, max: usize) {
    history.push(record);
    if history.len() > max {
        let excess = history.len() - max;
        history.drain(0..excess);
    }
}

fn finish_record(record: &mut TransactionRecord, outcome: Option<&TransactionOutcome>) {
    record.completed_at = Some(Utc::now());
    let (status, message) = match outcome {
        None => (OperationStatus::Simulated, None),
        Some(TransactionOutcome::Success) => (OperationStatus::Success, None),
        Some(TransactionOutcome::Cancelled { during }) => (
            OperationStatus::Cancelled,
            Some(format!("cancelled while {}", during)),
        ),
        Some(TransactionOutcome::Failed { during, exit }) => (
            OperationStatus::Failed,
            Some(format!("{} while {}", exit, during)),
        ),
        Some(TransactionOutcome::NotAuthorized) => (
            OperationStatus::Cancelled,
            Some("authorization refused".to_string()),
        ),
        Some(TransactionOutcome::Error(err)) => (OperationStatus::Failed, Some(err.clone())),
    };
    record.status = status;
    record.error_message = message;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apt::{ExitState, TransactionAction};

    fn record(program_id: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            program_id: program_id.map(str::to_string),
            action: TransactionAction::Install,
            packages: vec!["gparted".to_string()],
            status: OperationStatus::InProgress,
            last_state: None,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    #[test]
    fn history_keeps_the_newest_entries() {
        let mut history = Vec::new();
        for index in 0..55 {
            let mut entry = record(None);
            entry.packages = vec![format!("pkg-{}", index)];
            push_capped(&mut history, entry, 50);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].packages, vec!["pkg-5".to_string()]);
        assert_eq!(history[49].packages, vec!["pkg-54".to_string()]);
    }

    #[test]
    fn running_record_matches_origin() {
        let mut history = vec![record(Some("gparted")), record(None)];
        history[0].status = OperationStatus::Success;
        history.push(record(Some("gparted")));

        let origin = TransactionOrigin::App("gparted".to_string());
        let found = running_record(&mut history, &origin).expect("running record");
        assert_eq!(found.status, OperationStatus::InProgress);
        found.status = OperationStatus::Failed;
        assert!(running_record(&mut history, &origin).is_none());
        assert!(running_record(&mut history, &TransactionOrigin::Maintenance).is_some());
    }

    #[test]
    fn outcomes_set_status_and_message() {
        let mut entry = record(Some("gparted"));
        finish_record(
            &mut entry,
            Some(&TransactionOutcome::Failed {
                during: TransactionState::Installing,
                exit: ExitState::Failed,
            }),
        );
        assert_eq!(entry.status, OperationStatus::Failed);
        assert_eq!(
            entry.error_message.as_deref(),
            Some("exit-failed while installing")
        );
        assert!(entry.completed_at.is_some());

        let mut simulated = record(None);
        finish_record(&mut simulated, None);
        assert_eq!(simulated.status, OperationStatus::Simulated);
        assert_eq!(simulated.error_message, None);
    }
}
