use super::Script;
use crate::system::{GraphicsVendor, SessionKind, SystemSpecs, SystemState};

const SPEC_FIELDS: &[&str] = &[
    "distro",
    "kernel",
    "motherboard",
    "boot-mode",
    "cpu-model",
    "cpu-speed",
    "arch-use",
    "arch-supported",
    "memory",
    "graphics",
    "filesystem",
    "capacity",
    "allocated-space",
    "free-space",
];

const ERROR_MARKER: &str = "<a data-toggle='tooltip' data-placement='top' title='Could not gather data.'><span class='fa fa-warning specs-error'></span></a>";

/// Width in pixels of the disk usage bar.
const DISK_BAR_WIDTH: u64 = 200;

const KB: f64 = 1000.0;
const KIB: f64 = 1024.0;

/// `"31.2 GB <span class='secondary-value'>(29.1 GiB)</span>"`, dropping to
/// MB/MiB when the decimal value does not exceed one gigabyte.
pub(crate) fn size_pair(bytes: u64) -> String {
    let value = bytes as f64;
    let gb = round_tenth(value / KB / KB / KB);
    let (decimal, binary) = if gb <= 1.0 {
        (
            format!("{:.1} MB", value / KB / KB),
            format!("{:.1} MiB", value / KIB / KIB),
        )
    } else {
        (format!("{:.1} GB", gb), format!("{:.1} GiB", value / KIB / KIB / KIB))
    };
    format!("{} <span class='secondary-value'>({})</span>", decimal, binary)
}

fn memory_pair(bytes: u64) -> String {
    let value = bytes as f64;
    let (decimal, binary) = if (value / KIB / KIB).round() < 1024.0 {
        (
            format!("{:.1} MB", value / KB / KB),
            format!("{:.1} MiB", value / KIB / KIB),
        )
    } else {
        (
            format!("{:.1} GB", value / KB / KB / KB),
            format!("{:.1} GiB", value / KIB / KIB / KIB),
        )
    };
    format!("{} <span class='secondary-value'>({})</span>", decimal, binary)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Bar widths `(used, free, other)` in pixels.
pub(crate) fn disk_bar(used: u64, free: u64, capacity: u64) -> (u64, u64, u64) {
    if capacity == 0 {
        return (0, 0, DISK_BAR_WIDTH);
    }
    let percent = |part: u64| ((part as f64 / capacity as f64) * 100.0).round() as u64;
    let used_px = (percent(used) * 2).min(DISK_BAR_WIDTH);
    let free_px = (percent(free) * 2).min(DISK_BAR_WIDTH - used_px);
    (used_px, free_px, DISK_BAR_WIDTH - used_px - free_px)
}

fn arch_in_use(arch: &str) -> &str {
    match arch {
        "i386" => "32-bit",
        "amd64" => "64-bit",
        other => other,
    }
}

/// Error markers shown until the gathered values replace them.
pub(crate) fn placeholder_script() -> Script {
    let mut script = Script::new();
    for field in SPEC_FIELDS {
        script.set_html(&format!("#spec-{}", field), ERROR_MARKER);
    }
    script
}

/// Fills the system specifications page.
pub(crate) fn specs_scripts(specs: &SystemSpecs, system: &SystemState) -> Script {
    let mut script = placeholder_script();
    let live = system.session == SessionKind::Live;

    let text_fields = [
        ("#spec-distro", specs.distro.as_deref()),
        ("#spec-kernel", specs.kernel.as_deref()),
        ("#spec-motherboard", specs.motherboard.as_deref()),
        ("#spec-cpu-model", specs.cpu_model.as_deref()),
        ("#spec-cpu-speed", specs.cpu_speed.as_deref()),
        ("#spec-arch-supported", specs.arch_supported.as_deref()),
    ];
    for (selector, value) in text_fields {
        if let Some(value) = value {
            script.set_html(selector, value);
        }
    }
    script.set_html("#spec-arch-use", arch_in_use(&system.arch));

    if live {
        script.hide(".specs-hide-live-session");
    } else if let (Some(partition), Some(disk)) = (&specs.root_partition, specs.disk) {
        script.set_html("#spec-filesystem", partition);
        script.set_html("#spec-capacity", &size_pair(disk.capacity));
        script.set_html("#spec-allocated-space", &size_pair(disk.allocated));
        script.set_html("#spec-used-space", &size_pair(disk.used()));
        script.set_html("#spec-free-space", &size_pair(disk.free));
        script.set_html("#spec-other-space", &size_pair(disk.other()));
        if round_tenth(disk.free as f64 / KB / KB / KB) <= 1.0 {
            script.add_class("#spec-free-space", "specs-error");
        }

        let (used, free, other) = disk_bar(disk.used(), disk.free, disk.capacity);
        log::debug!(
            "Disk bar for {}: used {}px, free {}px, other {}px",
            partition,
            used,
            free,
            other
        );
        script.set_width("#disk-used", &format!("{}px", used));
        script.set_width("#disk-free", &format!("{}px", free));
        script.set_width("#disk-other", &format!("{}px", other));
    }

    if let Some(memory) = specs.memory_bytes {
        script.set_html("#spec-memory", &memory_pair(memory));
    }

    if let Some(graphics) = &system.graphics_description {
        script.set_html("#spec-graphics", graphics);
    }

    if system.arch == "powerpc" {
        if let Some(generation) = &specs.mac_generation {
            script.set_html("#spec-boot-mode", &format!("Yaboot ({})", generation));
        }
    }

    if let Some(inxi) = &specs.inxi {
        let lines: String = inxi
            .lines()
            .map(|line| format!("{}<br>", line.trim_matches(['"', '\''])))
            .collect();
        script.set_html("#specs-inxi", &lines);
    }

    script.toggle("#specs-has-net", system.is_online());
    script.toggle("#specs-has-no-net", !system.is_online());

    if system.session == SessionKind::Pi {
        script.show("#specs-device-rpi");
        script.hide(".specs-hide-pi");
    } else if system.arch == "powerpc" {
        script.show("#specs-device-powerpc");
        script.hide(".specs-hide-ppc");
    } else if system.graphics_vendor == Some(GraphicsVendor::VirtualBox) {
        script.show("#specs-device-vbox");
        script.hide(".specs-hide-vbox");
    } else if live {
        script.show("#specs-live-session");
        script.hide(".specs-hide-live");
    } else {
        script.show("#specs-device-normal");
    }

    if matches!(system.arch.as_str(), "i386" | "amd64") {
        script.set_html("#spec-boot-mode", system.boot_mode.label());
    }

    if live {
        script.hide(".spec-3");
    }

    script.fade_out("#specs-loading", "fast");
    script.fade_in("#specs-tabs", "fast");
    script.fade_in("#specs-basic", "medium");
    script.push("setCursorNormal();");
    script
}
