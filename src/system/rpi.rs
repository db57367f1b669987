use std::fs;
use std::path::Path;

use crate::apt::run_privileged_command;
use crate::command::spawn_detached;

const RESIZE_HELPER: &str = "/usr/lib/ubuntu-mate/ubuntu-mate-welcome-rpi2-partition-resize";
const STATUS_FILE: &str = "/tmp/notify_rpi_status";
const TEXT_FILE: &str = "/tmp/notify_rpi_text";
pub(crate) const RESIZED_MARKER: &str = "/.resized";

/// Result reported by the partition resize helper.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ResizeOutcome {
    /// Partition grown; the filesystem follows on the next reboot.
    PendingReboot,
    NotSymlink(String),
    NotSdCard(String),
    UnsupportedLayout,
    NotLastPartition(String),
    Failed(i32),
}

impl ResizeOutcome {
    pub(crate) fn from_status(code: i32, text: &str) -> Self {
        let text = text.trim().to_string();
        match code {
            1 => ResizeOutcome::PendingReboot,
            2 => ResizeOutcome::NotSymlink(text),
            3 => ResizeOutcome::NotSdCard(text),
            4 => ResizeOutcome::UnsupportedLayout,
            5 => ResizeOutcome::NotLastPartition(text),
            other => ResizeOutcome::Failed(other),
        }
    }

    /// Notification summary, body and icon.
    pub(crate) fn message(&self) -> (String, String, &'static str) {
        let cannot_expand = "Don't know how to expand.".to_string();
        match self {
            ResizeOutcome::PendingReboot => (
                "Root partition has been resized.".to_string(),
                "The filesystem will be enlarged upon the next reboot.".to_string(),
                "dialog-information",
            ),
            ResizeOutcome::NotSymlink(device) => (
                cannot_expand,
                format!("{} does not exist or is not a symlink.", device),
                "dialog-error",
            ),
            ResizeOutcome::NotSdCard(device) => (
                cannot_expand,
                format!("{} is not an SD card.", device),
                "dialog-error",
            ),
            ResizeOutcome::UnsupportedLayout => (
                cannot_expand,
                "Your partition layout is not currently supported by this tool.".to_string(),
                "dialog-error",
            ),
            ResizeOutcome::NotLastPartition(device) => (
                cannot_expand,
                format!("{} is not the last partition.", device),
                "dialog-error",
            ),
            ResizeOutcome::Failed(code) => (
                "Failed to run resize script.".to_string(),
                format!("The returned error code is: {}", code),
                "dialog-error",
            ),
        }
    }
}

/// Runs the resize helper and reads back the status it left behind.
pub(crate) fn resize_partition() -> ResizeOutcome {
    if let Err(err) = run_privileged_command(RESIZE_HELPER, &[]) {
        log::warn!("{}", err);
    }
    read_outcome(Path::new(STATUS_FILE), Path::new(TEXT_FILE))
}

fn read_outcome(status_file: &Path, text_file: &Path) -> ResizeOutcome {
    let code = fs::read_to_string(status_file)
        .ok()
        .and_then(|text| text.trim().parse::<i32>().ok())
        .unwrap_or(0);
    let text = fs::read_to_string(text_file).unwrap_or_default();
    let outcome = ResizeOutcome::from_status(code, &text);
    if let ResizeOutcome::Failed(code) = outcome {
        log::warn!("Unrecognised return code for Raspberry Pi resize: {}", code);
    }
    outcome
}

pub(crate) fn already_resized() -> bool {
    Path::new(RESIZED_MARKER).exists()
}

pub(crate) fn open_shutdown_dialog() -> Result<(), String> {
    spawn_detached(&["mate-session-save", "--shutdown-dialog"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_outcomes() {
        assert_eq!(ResizeOutcome::from_status(1, ""), ResizeOutcome::PendingReboot);
        assert_eq!(
            ResizeOutcome::from_status(3, "/dev/sda\n"),
            ResizeOutcome::NotSdCard("/dev/sda".to_string())
        );
        assert_eq!(ResizeOutcome::from_status(4, "x"), ResizeOutcome::UnsupportedLayout);
        assert_eq!(ResizeOutcome::from_status(9, ""), ResizeOutcome::Failed(9));

        let (summary, body, icon) = ResizeOutcome::NotLastPartition("/dev/mmcblk0p2".into()).message();
        assert_eq!(summary, "Don't know how to expand.");
        assert_eq!(body, "/dev/mmcblk0p2 is not the last partition.");
        assert_eq!(icon, "dialog-error");
    }

    #[test]
    fn missing_status_file_is_a_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = read_outcome(&dir.path().join("status"), &dir.path().join("text"));
        assert_eq!(outcome, ResizeOutcome::Failed(0));

        fs::write(dir.path().join("status"), "2\n").expect("status");
        fs::write(dir.path().join("text"), "/dev/root").expect("text");
        let outcome = read_outcome(&dir.path().join("status"), &dir.path().join("text"));
        assert_eq!(outcome, ResizeOutcome::NotSymlink("/dev/root".to_string()));
    }
}
