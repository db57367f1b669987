use std::path::Path;
use std::process::Command;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{BootMode, GraphicsVendor, SessionKind};

pub(crate) const CONNECTIVITY_URL: &str = "http://pardusarm.com/";
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(2);

const LIVE_SESSION_MARKER: &str = "usr/share/glib-2.0/schemas/zubuntu-mate-live.gschema.override";
const PI_KERNEL_MARKER: &str = "boot/kernel7.img";
const EFI_FIRMWARE_DIR: &str = "sys/firmware/efi";

static VGA_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*(?:VGA compatible controller|3D controller|Display controller): (.+)$")
        .expect("valid VGA regex")
});

/// Session kind from markers under `root` and the login name.
pub(crate) fn detect_session(root: &Path, user_name: &str) -> SessionKind {
    if root.join(LIVE_SESSION_MARKER).exists() {
        SessionKind::Live
    } else if user_name.starts_with("guest-") {
        SessionKind::Guest
    } else if root.join(PI_KERNEL_MARKER).is_file() {
        SessionKind::Pi
    } else {
        SessionKind::Normal
    }
}

pub(crate) fn detect_boot_mode(root: &Path, session: SessionKind, arch: &str) -> BootMode {
    if root.join(EFI_FIRMWARE_DIR).exists() {
        BootMode::Uefi
    } else if session == SessionKind::Pi {
        BootMode::RaspberryPi
    } else if arch == "powerpc" {
        BootMode::Yaboot
    } else {
        BootMode::Bios
    }
}

pub(crate) fn current_user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_default()
}

/// `true` when the connectivity URL answers within the timeout.
pub(crate) fn probe_connectivity() -> bool {
    log::info!("Checking for internet connectivity...");
    let client = match reqwest::blocking::Client::builder()
        .timeout(CONNECTIVITY_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            log::warn!("Failed to build HTTP client: {}", err);
            return false;
        }
    };

    match client.get(CONNECTIVITY_URL).send() {
        Ok(response) => {
            log::info!("Reached {} ({})", CONNECTIVITY_URL, response.status());
            true
        }
        Err(err) if err.is_timeout() => {
            log::warn!("Connection to {} timed out", CONNECTIVITY_URL);
            false
        }
        Err(err) => {
            log::warn!("Could not connect to {}: {}", CONNECTIVITY_URL, err);
            false
        }
    }
}

/// Graphics vendor and controller description from `lspci` output.
pub(crate) fn parse_graphics(lspci: &str) -> (GraphicsVendor, Option<String>) {
    let description = VGA_LINE
        .captures(lspci)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().trim().to_string());

    let haystack = description.as_deref().unwrap_or(lspci);
    let vendor = if haystack.contains("NVIDIA") {
        GraphicsVendor::Nvidia
    } else if haystack.contains("AMD") {
        GraphicsVendor::Amd
    } else if haystack.contains("Intel") {
        GraphicsVendor::Intel
    } else if haystack.contains("VirtualBox") {
        GraphicsVendor::VirtualBox
    } else {
        GraphicsVendor::Unknown
    };

    (vendor, description)
}

pub(crate) fn detect_graphics() -> (GraphicsVendor, Option<String>) {
    log::debug!("Detecting graphics vendor...");
    let output = match Command::new("lspci").output() {
        Ok(output) => output,
        Err(err) => {
            log::debug!("Failed to launch lspci: {}", err);
            return (GraphicsVendor::Unknown, None);
        }
    };
    let (vendor, description) = parse_graphics(&String::from_utf8_lossy(&output.stdout));
    log::debug!(
        "Detected graphics: {} ({})",
        vendor.label(),
        description.as_deref().unwrap_or("no VGA controller")
    );
    (vendor, description)
}

/// Font DPI from the MATE font-rendering settings.
pub(crate) fn font_dpi() -> Option<u32> {
    let output = Command::new("gsettings")
        .args(["get", "org.mate.font-rendering", "dpi"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_dpi(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_dpi(value: &str) -> Option<u32> {
    let dpi = value.trim().parse::<f64>().ok()?;
    (dpi.is_finite() && dpi >= 0.0).then_some(dpi as u32)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn session_markers_in_priority_order() {
        let root = tempfile::tempdir().expect("tempdir");
        assert_eq!(detect_session(root.path(), "alice"), SessionKind::Normal);
        assert_eq!(detect_session(root.path(), "guest-x1y2"), SessionKind::Guest);

        fs::create_dir_all(root.path().join("boot")).expect("boot dir");
        fs::write(root.path().join(PI_KERNEL_MARKER), b"").expect("kernel");
        assert_eq!(detect_session(root.path(), "pi"), SessionKind::Pi);
        assert_eq!(detect_session(root.path(), "guest-x1y2"), SessionKind::Guest);

        let live = root.path().join(LIVE_SESSION_MARKER);
        fs::create_dir_all(live.parent().expect("parent")).expect("schemas dir");
        fs::write(&live, b"").expect("override");
        assert_eq!(detect_session(root.path(), "guest-x1y2"), SessionKind::Live);
    }

    #[test]
    fn boot_mode_detection() {
        let root = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            detect_boot_mode(root.path(), SessionKind::Normal, "amd64"),
            BootMode::Bios
        );
        assert_eq!(
            detect_boot_mode(root.path(), SessionKind::Pi, "armhf"),
            BootMode::RaspberryPi
        );
        assert_eq!(
            detect_boot_mode(root.path(), SessionKind::Normal, "powerpc"),
            BootMode::Yaboot
        );

        fs::create_dir_all(root.path().join(EFI_FIRMWARE_DIR)).expect("efi dir");
        assert_eq!(
            detect_boot_mode(root.path(), SessionKind::Pi, "armhf"),
            BootMode::Uefi
        );
    }

    #[test]
    fn lspci_vendor_detection() {
        let output = "00:00.0 Host bridge: Intel Corporation Device 3e0f\n\
                      01:00.0 VGA compatible controller: NVIDIA Corporation GP107 [GeForce GTX 1050]\n";
        let (vendor, description) = parse_graphics(output);
        assert_eq!(vendor, GraphicsVendor::Nvidia);
        assert_eq!(
            description.as_deref(),
            Some("NVIDIA Corporation GP107 [GeForce GTX 1050]")
        );

        let (vendor, _) = parse_graphics(
            "00:02.0 VGA compatible controller: InnoTek Systemberatung GmbH VirtualBox Graphics Adapter\n",
        );
        assert_eq!(vendor, GraphicsVendor::VirtualBox);

        let (vendor, _) = parse_graphics(
            "00:02.0 VGA compatible controller: Intel Corporation HD Graphics 620 (rev 02)\n",
        );
        assert_eq!(vendor, GraphicsVendor::Intel);

        let (vendor, description) = parse_graphics("");
        assert_eq!(vendor, GraphicsVendor::Unknown);
        assert_eq!(description, None);
    }

    #[test]
    fn dpi_values_from_gsettings() {
        assert_eq!(parse_dpi("96.0\n"), Some(96));
        assert_eq!(parse_dpi("120"), Some(120));
        assert_eq!(parse_dpi("not-a-number"), None);
        assert_eq!(parse_dpi("-5"), None);
    }
}
