//! `cmd://` pseudo-URLs raised by the pages, and the external tools some of
//! them start.

use std::process::{Command as Process, Stdio};

use phf::phf_map;

use crate::types::AppAction;

pub(crate) const COMMAND_SCHEME: &str = "cmd://";

/// Desktop tools reachable from the pages, by command name.
static TOOL_COMMANDS: phf::Map<&'static str, &'static str> = phf_map! {
    "install" => "ubiquity gtk_ui",
    "backup" => "deja-dup-preferences",
    "chatroom" => "hexchat IRC://irc.freenode.net/ubuntu-mate",
    "control" => "mate-control-center",
    "drivers" => "software-properties-gtk --open-tab=4",
    "firewall" => "gufw",
    "language" => "gnome-language-selector",
    "users" => "users-admin",
    "tweak" => "mate-tweak",
    "update" => "update-manager",
    "printers" => "system-config-printer",
    "gparted" => "gparted-pkexec",
    "sysmonitor" => "mate-system-monitor",
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    ModifyApp { action: AppAction, program_id: String },
    LaunchApp(String),
    FilterApps { filter: String, toggle_non_free: bool },
    AppInfo { css_id: String, show: bool },
    Screenshot(String),
    Quit,
    Autostart,
    AptUpdate,
    FixIncompleteInstall,
    FixBrokenDepends,
    GetAacsDb,
    ResizeRpi,
    RebootRpi,
    SubscribeUpdates,
    InitSystemInfo,
    CheckInternetConnection,
    Tool(&'static str),
    Run(String),
    Link(String),
    Unknown(String),
}

impl Command {
    /// Classifies a `cmd://` URI (the scheme prefix is optional).
    pub(crate) fn parse(uri: &str) -> Self {
        let body = uri.strip_prefix(COMMAND_SCHEME).unwrap_or(uri);

        let Some((verb, rest)) = body.split_once('?') else {
            return Self::parse_bare(body);
        };

        match verb {
            "install-appid" => Command::ModifyApp {
                action: AppAction::Install,
                program_id: rest.to_string(),
            },
            "remove-appid" => Command::ModifyApp {
                action: AppAction::Remove,
                program_id: rest.to_string(),
            },
            "upgrade-appid" => Command::ModifyApp {
                action: AppAction::Upgrade,
                program_id: rest.to_string(),
            },
            "launch-appid" => Command::LaunchApp(rest.to_string()),
            "filter-apps" => {
                let mut parts = rest.split('?');
                let filter = parts.next().unwrap_or_default().to_string();
                let toggle_non_free = parts.next() == Some("toggle");
                Command::FilterApps {
                    filter,
                    toggle_non_free,
                }
            }
            "app-info-show" | "app-info-hide" => Command::AppInfo {
                css_id: first_argument(rest),
                show: verb == "app-info-show",
            },
            "screenshot" => Command::Screenshot(first_argument(rest)),
            "run" => Command::Run(rest.to_string()),
            "link" => Command::Link(rest.to_string()),
            _ => Command::Unknown(body.to_string()),
        }
    }

    fn parse_bare(body: &str) -> Self {
        match body {
            "quit" => Command::Quit,
            "autostart" => Command::Autostart,
            "apt-update" => Command::AptUpdate,
            "fix-incomplete-install" => Command::FixIncompleteInstall,
            "fix-broken-depends" => Command::FixBrokenDepends,
            "get-aacs-db" => Command::GetAacsDb,
            "resize-rpi" => Command::ResizeRpi,
            "reboot-rpi" => Command::RebootRpi,
            "subscribe-updates" => Command::SubscribeUpdates,
            "init-system-info" => Command::InitSystemInfo,
            "checkInternetConnection" => Command::CheckInternetConnection,
            other => match TOOL_COMMANDS.get_entry(other) {
                Some((name, _)) => Command::Tool(*name),
                None => Command::Unknown(other.to_string()),
            },
        }
    }
}

fn first_argument(rest: &str) -> String {
    rest.split('?').next().unwrap_or_default().to_string()
}

/// Spawns `argv` detached from the welcome screen.
pub(crate) fn spawn_detached(argv: &[&str]) -> Result<(), String> {
    let Some((program, args)) = argv.split_first() else {
        return Err("Empty command line".to_string());
    };
    Process::new(program)
        .args(args)
        .stdin(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|err| format!("Failed to launch {}: {}", program, err))
}

pub(crate) fn launch_tool(name: &str) -> Result<(), String> {
    let command_line = TOOL_COMMANDS
        .get(name)
        .ok_or_else(|| format!("Unknown tool '{}'", name))?;
    launch_command_line(command_line)
}

/// Runs a catalog launch command, split on spaces.
pub(crate) fn launch_command_line(command_line: &str) -> Result<(), String> {
    let argv: Vec<&str> = command_line.split_whitespace().collect();
    spawn_detached(&argv)
}
