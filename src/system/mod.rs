//! Facts about the running system, gathered once at start-up and refined by
//! two background probes.

pub(crate) mod aacs;
mod os_release;
mod probe;
pub(crate) mod rpi;
mod specs;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use crate::apt::print_architecture;

pub(crate) use os_release::OsRelease;
pub(crate) use probe::{current_user_name, detect_boot_mode, detect_session};
pub(crate) use specs::{DiskUsage, SystemSpecs, gather_specs};

const DEFAULT_DPI: u32 = 96;
pub(crate) const SOURCES_LIST_DIR: &str = "/etc/apt/sources.list.d";
const WELCOME_PPA_PREFIX: &str = "ubuntu-mate-dev-ubuntu-welcome-";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SessionKind {
    Normal,
    Live,
    Guest,
    Pi,
}

impl SessionKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SessionKind::Normal => "normal",
            SessionKind::Live => "live",
            SessionKind::Guest => "guest",
            SessionKind::Pi => "pi",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BootMode {
    Uefi,
    Bios,
    RaspberryPi,
    Yaboot,
}

impl BootMode {
    pub(crate) fn label(self) -> &'static str {
        match self {
            BootMode::Uefi => "UEFI",
            BootMode::Bios => "BIOS",
            BootMode::RaspberryPi => "Raspberry Pi",
            BootMode::Yaboot => "Yaboot",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum GraphicsVendor {
    Nvidia,
    Amd,
    Intel,
    VirtualBox,
    RaspberryPi,
    Unknown,
}

impl GraphicsVendor {
    pub(crate) fn label(self) -> &'static str {
        match self {
            GraphicsVendor::Nvidia => "NVIDIA",
            GraphicsVendor::Amd => "AMD",
            GraphicsVendor::Intel => "Intel",
            GraphicsVendor::VirtualBox => "VirtualBox",
            GraphicsVendor::RaspberryPi => "Raspberry Pi",
            GraphicsVendor::Unknown => "Unknown",
        }
    }
}

/// Session forced from the command line. `VirtualBox` only fakes the graphics vendor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SessionOverride {
    Guest,
    Live,
    Pi,
    VirtualBox,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ProbeOverrides {
    pub(crate) arch: Option<String>,
    pub(crate) session: Option<SessionOverride>,
    pub(crate) codename: Option<String>,
    pub(crate) force_offline: bool,
    pub(crate) force_online: bool,
    pub(crate) font_dpi: Option<u32>,
}

#[derive(Clone, Debug)]
pub(crate) struct SystemState {
    pub(crate) arch: String,
    pub(crate) codename: String,
    pub(crate) os_title: String,
    pub(crate) os_version: String,
    pub(crate) session: SessionKind,
    pub(crate) boot_mode: BootMode,
    /// `None` until the connectivity probe reports.
    pub(crate) online: Option<bool>,
    pub(crate) updates_subscribed: bool,
    pub(crate) graphics_vendor: Option<GraphicsVendor>,
    pub(crate) graphics_description: Option<String>,
    pub(crate) font_dpi: u32,
    pub(crate) zoom_level: f64,
    pub(crate) rpi_resize_pending: bool,
    force_offline_once: bool,
    force_online: bool,
    forced_graphics: Option<GraphicsVendor>,
}

pub(crate) type SharedSystemState = Arc<RwLock<SystemState>>;

pub(crate) fn read_state(shared: &SharedSystemState) -> RwLockReadGuard<'_, SystemState> {
    shared.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write_state(shared: &SharedSystemState) -> RwLockWriteGuard<'_, SystemState> {
    shared.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SystemState {
    pub(crate) fn detect(overrides: &ProbeOverrides) -> Self {
        let arch = overrides.arch.clone().unwrap_or_else(|| {
            print_architecture().unwrap_or_else(|err| {
                log::warn!("Could not determine architecture: {}", err);
                "unknown".to_string()
            })
        });

        let release = OsRelease::detect().unwrap_or_else(|err| {
            log::warn!("{}", err);
            OsRelease::default()
        });
        let codename = overrides
            .codename
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| release.codename.clone());

        let root = Path::new("/");
        let session = match overrides.session {
            Some(SessionOverride::Guest) => SessionKind::Guest,
            Some(SessionOverride::Live) => SessionKind::Live,
            Some(SessionOverride::Pi) => SessionKind::Pi,
            Some(SessionOverride::VirtualBox) | None => {
                detect_session(root, &current_user_name())
            }
        };
        let boot_mode = detect_boot_mode(root, session, &arch);

        let font_dpi = sanitize_dpi(overrides.font_dpi.or_else(probe::font_dpi));
        let zoom_level = zoom_for_dpi(font_dpi);

        let forced_graphics = match (overrides.session, session) {
            (Some(SessionOverride::VirtualBox), _) => Some(GraphicsVendor::VirtualBox),
            (_, SessionKind::Pi) => Some(GraphicsVendor::RaspberryPi),
            _ => None,
        };

        let state = Self {
            updates_subscribed: welcome_ppa_subscribed(Path::new(SOURCES_LIST_DIR), &codename),
            arch,
            codename,
            os_title: release.pretty_name,
            os_version: release.version_id,
            session,
            boot_mode,
            online: None,
            graphics_vendor: None,
            graphics_description: None,
            font_dpi,
            zoom_level,
            rpi_resize_pending: false,
            force_offline_once: overrides.force_offline,
            force_online: overrides.force_online,
            forced_graphics,
        };

        log::debug!(
            "System: arch={} codename={} session={} boot={} dpi={} zoom={}",
            state.arch,
            state.codename,
            state.session.label(),
            state.boot_mode.label(),
            state.font_dpi,
            state.zoom_level
        );
        state
    }

    pub(crate) fn is_online(&self) -> bool {
        self.online.unwrap_or(false)
    }
}

fn welcome_ppa_path(dir: &Path, codename: &str) -> PathBuf {
    dir.join(format!("{}{}.list", WELCOME_PPA_PREFIX, codename))
}

/// Subscribed when the update PPA list exists and is non-empty.
pub(crate) fn welcome_ppa_subscribed(dir: &Path, codename: &str) -> bool {
    fs::metadata(welcome_ppa_path(dir, codename))
        .map(|meta| meta.len() > 0)
        .unwrap_or(false)
}

/// Out-of-range DPI readings fall back to 96.
pub(crate) fn sanitize_dpi(dpi: Option<u32>) -> u32 {
    match dpi {
        Some(value) if (50..=500).contains(&value) => value,
        Some(value) => {
            log::warn!("Ignoring font DPI {}, using {}", value, DEFAULT_DPI);
            DEFAULT_DPI
        }
        None => {
            log::info!("Couldn't retrieve font DPI, using {}", DEFAULT_DPI);
            DEFAULT_DPI
        }
    }
}

pub(crate) fn zoom_for_dpi(dpi: u32) -> f64 {
    match dpi {
        0..=80 => 0.75,
        81..=87 => 0.85,
        88..=94 => 0.9,
        95..=101 => 1.0,
        102..=108 => 1.1,
        109..=115 => 1.2,
        116..=122 => 1.3,
        123..=129 => 1.4,
        _ => 1.5,
    }
}

/// Initial window size for the zoom level; small screens get a fixed compact size.
pub(crate) fn window_size(zoom: f64, software_only: bool, screen_height: Option<i32>) -> (i32, i32) {
    if screen_height.is_some_and(|height| height <= 600) {
        return (768, 528);
    }

    let (width, height) = if software_only { (900, 600) } else { (800, 552) };
    let (extra_width, extra_height) = if zoom >= 1.5 {
        (160, 120)
    } else if zoom >= 1.4 {
        (130, 100)
    } else if zoom >= 1.3 {
        (100, 60)
    } else if zoom >= 1.2 {
        (60, 40)
    } else if zoom >= 1.1 {
        (20, 20)
    } else {
        (0, 0)
    };
    (width + extra_width, height + extra_height)
}

/// Resolves connectivity, honoring the command-line overrides.
pub(crate) fn check_connectivity(shared: &SharedSystemState) -> bool {
    let forced = {
        let mut state = write_state(shared);
        if state.force_offline_once {
            // Only the first check is forced offline; retrying probes for real.
            state.force_offline_once = false;
            Some(false)
        } else if state.force_online {
            log::warn!("Connectivity forced online; installing software offline will fail");
            Some(true)
        } else {
            None
        }
    };

    let online = forced.unwrap_or_else(probe::probe_connectivity);
    write_state(shared).online = Some(online);
    online
}

fn resolve_graphics(shared: &SharedSystemState) {
    let forced = read_state(shared).forced_graphics;
    let (vendor, description) = match forced {
        Some(vendor) => (vendor, Some(vendor.label().to_string())),
        None => probe::detect_graphics(),
    };

    let mut state = write_state(shared);
    state.graphics_vendor = Some(vendor);
    state.graphics_description = description;
}

/// Starts the connectivity and graphics probes.
pub(crate) fn spawn_background_probes(shared: &SharedSystemState) {
    let connectivity = Arc::clone(shared);
    thread::spawn(move || {
        check_connectivity(&connectivity);
    });

    let graphics = Arc::clone(shared);
    thread::spawn(move || resolve_graphics(&graphics));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_state() -> SystemState {
        SystemState {
            arch: "armhf".to_string(),
            codename: "bionic".to_string(),
            os_title: "Pardus ARM 18.04".to_string(),
            os_version: "18.04".to_string(),
            session: SessionKind::Normal,
            boot_mode: BootMode::Bios,
            online: Some(true),
            updates_subscribed: false,
            graphics_vendor: Some(GraphicsVendor::Intel),
            graphics_description: Some("Intel Corporation HD Graphics 620".to_string()),
            font_dpi: 96,
            zoom_level: 1.0,
            rpi_resize_pending: false,
            force_offline_once: false,
            force_online: false,
            forced_graphics: None,
        }
    }

    #[test]
    fn dpi_to_zoom_table() {
        let cases = [
            (72, 0.75),
            (80, 0.75),
            (81, 0.85),
            (87, 0.85),
            (94, 0.9),
            (96, 1.0),
            (101, 1.0),
            (108, 1.1),
            (115, 1.2),
            (122, 1.3),
            (129, 1.4),
            (130, 1.5),
            (192, 1.5),
        ];
        for (dpi, zoom) in cases {
            assert_eq!(zoom_for_dpi(dpi), zoom, "dpi {}", dpi);
        }
    }

    #[test]
    fn implausible_dpi_falls_back() {
        assert_eq!(sanitize_dpi(Some(49)), 96);
        assert_eq!(sanitize_dpi(Some(501)), 96);
        assert_eq!(sanitize_dpi(None), 96);
        assert_eq!(sanitize_dpi(Some(120)), 120);
    }

    #[test]
    fn window_grows_with_zoom() {
        assert_eq!(window_size(1.0, false, Some(1080)), (800, 552));
        assert_eq!(window_size(1.1, false, None), (820, 572));
        assert_eq!(window_size(1.5, true, Some(1440)), (1060, 720));
        assert_eq!(window_size(1.5, false, Some(600)), (768, 528));
    }

    #[test]
    fn forced_offline_applies_once() {
        let mut state = sample_state();
        state.force_offline_once = true;
        state.online = None;
        let shared: SharedSystemState = Arc::new(RwLock::new(state));

        assert!(!check_connectivity(&shared));
        assert_eq!(read_state(&shared).online, Some(false));
        assert!(!read_state(&shared).force_offline_once);
    }

    #[test]
    fn forced_online_skips_probe() {
        let mut state = sample_state();
        state.force_online = true;
        let shared: SharedSystemState = Arc::new(RwLock::new(state));
        assert!(check_connectivity(&shared));
        assert!(read_state(&shared).is_online());
    }

    #[test]
    fn forced_graphics_vendor_is_used() {
        let mut state = sample_state();
        state.forced_graphics = Some(GraphicsVendor::VirtualBox);
        state.graphics_vendor = None;
        let shared: SharedSystemState = Arc::new(RwLock::new(state));
        resolve_graphics(&shared);
        assert_eq!(
            read_state(&shared).graphics_vendor,
            Some(GraphicsVendor::VirtualBox)
        );
    }

    #[test]
    fn welcome_ppa_marker_must_be_non_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!welcome_ppa_subscribed(dir.path(), "bionic"));

        let marker = welcome_ppa_path(dir.path(), "bionic");
        fs::write(&marker, b"").expect("empty marker");
        assert!(!welcome_ppa_subscribed(dir.path(), "bionic"));

        fs::write(&marker, b"deb http://ppa.launchpad.net/ bionic main\n").expect("marker");
        assert!(welcome_ppa_subscribed(dir.path(), "bionic"));
        assert!(!welcome_ppa_subscribed(dir.path(), "xenial"));
    }
}
