use std::collections::HashSet;
use std::process::Command;

/// Packages dpkg reports as installed (`ii`, `hi`, ...).
pub(crate) fn query_installed_packages() -> Result<HashSet<String>, String> {
    let output = Command::new("dpkg-query")
        .args(["-W", "-f=${db:Status-Abbrev}\t${Package}\n"])
        .output()
        .map_err(|err| format!("Failed to launch dpkg-query: {}", err))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(stderr.trim().to_string());
    }

    Ok(parse_installed_output(&String::from_utf8_lossy(&output.stdout)))
}

pub(crate) fn parse_installed_output(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let (status, package) = line.split_once('\t')?;
            // Second letter of the abbreviation is the current state.
            let state = status.chars().nth(1)?;
            let package = package.trim();
            (state == 'i' && !package.is_empty()).then(|| {
                package
                    .split_once(':')
                    .map_or(package, |(name, _arch)| name)
                    .to_string()
            })
        })
        .collect()
}

pub(crate) fn print_architecture() -> Result<String, String> {
    let output = Command::new("dpkg")
        .arg("--print-architecture")
        .output()
        .map_err(|err| format!("Failed to launch dpkg: {}", err))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(stderr.trim().to_string());
    }

    let arch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if arch.is_empty() {
        return Err("dpkg printed no architecture".to_string());
    }
    Ok(arch)
}
