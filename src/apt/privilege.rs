use std::path::Path;
use std::process::Command;

use crate::types::CommandResult;

/// pkexec exit code when the authentication dialog was dismissed.
pub(crate) const PKEXEC_DISMISSED: i32 = 126;
/// pkexec exit code when authorization was refused or could not be obtained.
pub(crate) const PKEXEC_NOT_AUTHORIZED: i32 = 127;

/// Runs `program` as root through pkexec and captures its output.
pub(crate) fn run_privileged_command(
    program: &str,
    args: &[&str],
) -> Result<CommandResult, String> {
    log::debug!("pkexec {} {}", program, args.join(" "));
    let output = Command::new("pkexec")
        .arg(program)
        .args(args)
        .output()
        .map_err(|err| format!("Failed to launch pkexec for {}: {}", program, err))?;

    Ok(CommandResult {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Runs the repository helper as root: `<helper> <catalog> <function> <category> <id> <target>`.
pub(crate) fn run_repository_helper(
    helper: &Path,
    catalog: &Path,
    function: &str,
    category: &str,
    program_id: &str,
    target: &str,
) -> Result<CommandResult, String> {
    let helper = helper.to_string_lossy();
    let catalog = catalog.to_string_lossy();
    run_privileged_command(
        &helper,
        &[&catalog, function, category, program_id, target],
    )
}
