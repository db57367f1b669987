use std::collections::HashMap;
use std::fs;
use std::process::Command;

/// Byte counts for the disk holding the root filesystem.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct DiskUsage {
    pub(crate) capacity: u64,
    pub(crate) allocated: u64,
    pub(crate) free: u64,
}

impl DiskUsage {
    pub(crate) fn used(&self) -> u64 {
        self.allocated.saturating_sub(self.free)
    }

    /// Space on the disk outside the root partition.
    pub(crate) fn other(&self) -> u64 {
        self.capacity.saturating_sub(self.allocated)
    }
}

/// Everything the system specifications page shows. `None` marks a failed probe.
#[derive(Clone, Debug, Default)]
pub(crate) struct SystemSpecs {
    pub(crate) distro: Option<String>,
    pub(crate) kernel: Option<String>,
    pub(crate) motherboard: Option<String>,
    pub(crate) cpu_model: Option<String>,
    pub(crate) cpu_speed: Option<String>,
    pub(crate) arch_supported: Option<String>,
    pub(crate) memory_bytes: Option<u64>,
    pub(crate) root_partition: Option<String>,
    pub(crate) disk: Option<DiskUsage>,
    pub(crate) mac_generation: Option<String>,
    pub(crate) inxi: Option<String>,
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        log::debug!("{} exited with {:?}", program, output.status.code());
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn read_trimmed(path: &str) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Collects the specs. Blocking; run it off the GTK thread.
pub(crate) fn gather_specs(arch: &str, skip_storage: bool) -> SystemSpecs {
    log::info!("Gathering system specifications...");
    let mut specs = SystemSpecs {
        distro: command_output("lsb_release", &["-d", "-s"]),
        kernel: command_output("uname", &["-r"]),
        motherboard: read_trimmed("/sys/devices/virtual/dmi/id/board_name"),
        ..SystemSpecs::default()
    };

    match command_output("lscpu", &[]) {
        Some(output) => {
            let fields = parse_colon_fields(&output);
            specs.cpu_model = fields.get("Model name").cloned();
            specs.cpu_speed = cpu_speed_mhz(&fields).map(|mhz| format!("{} MHz", mhz));
            specs.arch_supported = fields.get("CPU op-mode(s)").cloned();
        }
        None => log::warn!("Failed to retrieve data: CPU"),
    }

    specs.memory_bytes = fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|text| parse_mem_total(&text));

    if !skip_storage {
        specs.root_partition = fs::read_to_string("/proc/mounts")
            .ok()
            .and_then(|text| parse_root_device(&text));
        specs.disk = specs.root_partition.as_deref().and_then(disk_usage);
        if specs.disk.is_none() {
            log::warn!("Failed to retrieve data: Storage");
        }
    }

    if arch == "powerpc" {
        apply_powerpc_cpuinfo(&mut specs);
    }

    specs.inxi = command_output("inxi", &["-c", "0", "-v", "5", "-p", "-d", "-xx"]);
    if specs.inxi.is_none() {
        log::warn!("Failed to collect advanced information. Is \"inxi\" installed?");
    }

    specs
}

fn disk_usage(root_partition: &str) -> Option<DiskUsage> {
    let df = command_output("df", &["-B1", "--output=size,avail", "/"])?;
    let (allocated, free) = parse_df(&df)?;
    let parent = command_output("lsblk", &["-no", "PKNAME", root_partition])
        .and_then(|name| name.lines().next().map(|line| line.trim().to_string()))
        .filter(|name| !name.is_empty());
    let capacity = match parent {
        Some(disk) => command_output("lsblk", &["-ndbo", "SIZE", &format!("/dev/{}", disk)])
            .and_then(|size| size.trim().parse::<u64>().ok())
            .unwrap_or(allocated),
        None => allocated,
    };
    log::debug!("Root {} on a {} byte disk", root_partition, capacity);
    Some(DiskUsage {
        capacity,
        allocated,
        free,
    })
}

fn apply_powerpc_cpuinfo(specs: &mut SystemSpecs) {
    let Some(cpuinfo) = fs::read_to_string("/proc/cpuinfo").ok() else {
        return;
    };
    let fields = parse_colon_fields(&cpuinfo);
    if let Some(board) = fields.get("motherboard") {
        let revision = fields.get("revision").map(String::as_str).unwrap_or_default();
        let mut name = format!("{} {}", board, revision).trim().to_string();
        if let Some(detected) = fields.get("detected as") {
            name = format!("{} / {}", name, detected);
        }
        specs.motherboard = Some(name);
    }
    if let Some(cpu) = fields.get("cpu") {
        specs.cpu_model = Some(cpu.clone());
    }
    if let Some(clock) = fields.get("clock") {
        specs.cpu_speed = Some(clock.clone());
    }
    specs.mac_generation = fields.get("pmac-generation").cloned();
}

/// `key: value` lines, first occurrence wins.
pub(crate) fn parse_colon_fields(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() && !fields.contains_key(key) {
                fields.insert(key.to_string(), value.to_string());
            }
        }
    }
    fields
}

fn cpu_speed_mhz(fields: &HashMap<String, String>) -> Option<u64> {
    ["CPU max MHz", "CPU MHz"].iter().find_map(|key| {
        let value = fields.get(*key)?;
        let whole = value.split(['.', ',']).next()?;
        whole.trim().parse::<u64>().ok()
    })
}

pub(crate) fn parse_mem_total(meminfo: &str) -> Option<u64> {
    let fields = parse_colon_fields(meminfo);
    let value = fields.get("MemTotal")?;
    let kib = value.split_whitespace().next()?.parse::<u64>().ok()?;
    Some(kib * 1024)
}

pub(crate) fn parse_root_device(mounts: &str) -> Option<String> {
    mounts.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let device = parts.next()?;
        let mount_point = parts.next()?;
        (mount_point == "/" && device.starts_with("/dev/")).then(|| device.to_string())
    })
}

/// `(size, avail)` in bytes from `df -B1 --output=size,avail`.
pub(crate) fn parse_df(output: &str) -> Option<(u64, u64)> {
    let line = output.lines().nth(1)?;
    let mut values = line.split_whitespace().map(|value| value.parse::<u64>().ok());
    let size = values.next()??;
    let avail = values.next()??;
    Some((size, avail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lscpu_fields() {
        let output = "Architecture:        armv7l\n\
                      CPU op-mode(s):      32-bit\n\
                      Model name:          Cortex-A53\n\
                      CPU max MHz:         1400.0000\n\
                      CPU MHz:             600.000\n";
        let fields = parse_colon_fields(output);
        assert_eq!(fields.get("Model name").map(String::as_str), Some("Cortex-A53"));
        assert_eq!(cpu_speed_mhz(&fields), Some(1400));

        let fields = parse_colon_fields("CPU MHz: 2394.454\n");
        assert_eq!(cpu_speed_mhz(&fields), Some(2394));
    }

    #[test]
    fn memory_and_mounts() {
        assert_eq!(
            parse_mem_total("MemTotal:        1000 kB\nMemFree: 10 kB\n"),
            Some(1_024_000)
        );
        assert_eq!(parse_mem_total("MemFree: 10 kB\n"), None);

        let mounts = "sysfs /sys sysfs rw 0 0\n\
                      rootfs / rootfs rw 0 0\n\
                      /dev/mmcblk0p2 / ext4 rw,relatime 0 0\n";
        assert_eq!(parse_root_device(mounts).as_deref(), Some("/dev/mmcblk0p2"));
    }

    #[test]
    fn df_output() {
        let output = "    1B-blocks        Avail\n 31218368512  20811644928\n";
        assert_eq!(parse_df(output), Some((31_218_368_512, 20_811_644_928)));
        assert_eq!(parse_df("header only\n"), None);
    }

    #[test]
    fn disk_usage_arithmetic() {
        let usage = DiskUsage {
            capacity: 100,
            allocated: 60,
            free: 20,
        };
        assert_eq!(usage.used(), 40);
        assert_eq!(usage.other(), 40);
    }
}
