use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::system::{ProbeOverrides, SessionOverride};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum ArchArg {
    I386,
    Amd64,
    Armhf,
    Arm64,
    Powerpc,
}

impl ArchArg {
    fn dpkg_name(self) -> &'static str {
        match self {
            ArchArg::I386 => "i386",
            ArchArg::Amd64 => "amd64",
            ArchArg::Armhf => "armhf",
            ArchArg::Arm64 => "arm64",
            ArchArg::Powerpc => "powerpc",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum SessionArg {
    Guest,
    Live,
    Pi,
    Vbox,
}

impl From<SessionArg> for SessionOverride {
    fn from(value: SessionArg) -> Self {
        match value {
            SessionArg::Guest => SessionOverride::Guest,
            SessionArg::Live => SessionOverride::Live,
            SessionArg::Pi => SessionOverride::Pi,
            SessionArg::Vbox => SessionOverride::VirtualBox,
        }
    }
}

/// Welcome screen and software boutique.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "welcome-gtk", version, about)]
pub(crate) struct Args {
    /// Log debugging messages.
    #[arg(short, long)]
    pub(crate) verbose: bool,

    /// Pretend to run on another architecture.
    #[arg(long, value_enum)]
    pub(crate) force_arch: Option<ArchArg>,

    /// Pretend to run in another kind of session.
    #[arg(long, value_enum)]
    pub(crate) force_session: Option<SessionArg>,

    /// Pretend to run on another release.
    #[arg(long, value_name = "CODENAME")]
    pub(crate) force_codename: Option<String>,

    /// Report no internet connection on the first check.
    #[arg(long, conflicts_with = "force_net")]
    pub(crate) force_no_net: bool,

    /// Always report an internet connection.
    #[arg(long)]
    pub(crate) force_net: bool,

    /// Open only the software boutique.
    #[arg(long)]
    pub(crate) software_only: bool,

    /// Log package changes instead of applying them.
    #[arg(long)]
    pub(crate) simulate_changes: bool,

    /// Use translated pages for this locale.
    #[arg(long, value_name = "LOCALE")]
    pub(crate) locale: Option<String>,

    /// Open this page (without `.html`) instead of the splash screen.
    #[arg(long, value_name = "PAGE")]
    pub(crate) jump_to: Option<String>,

    /// Override the font DPI used to pick the zoom level.
    #[arg(long, value_name = "DPI")]
    pub(crate) font_dpi: Option<u32>,

    /// Directory holding the HTML pages and the application index.
    #[arg(long, value_name = "PATH")]
    pub(crate) data_dir: Option<PathBuf>,
}

impl Args {
    pub(crate) fn probe_overrides(&self) -> ProbeOverrides {
        ProbeOverrides {
            arch: self.force_arch.map(|arch| arch.dpkg_name().to_string()),
            session: self.force_session.map(SessionOverride::from),
            codename: self.force_codename.clone(),
            force_offline: self.force_no_net,
            force_online: self.force_net,
            font_dpi: self.font_dpi,
        }
    }

    pub(crate) fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_from_flags() {
        let args = Args::try_parse_from([
            "welcome-gtk",
            "--force-arch",
            "armhf",
            "--force-session",
            "vbox",
            "--force-codename",
            "bionic",
            "--force-no-net",
            "--font-dpi",
            "120",
        ])
        .expect("valid flags");
        let overrides = args.probe_overrides();
        assert_eq!(overrides.arch.as_deref(), Some("armhf"));
        assert_eq!(overrides.session, Some(SessionOverride::VirtualBox));
        assert_eq!(overrides.codename.as_deref(), Some("bionic"));
        assert!(overrides.force_offline);
        assert!(!overrides.force_online);
        assert_eq!(overrides.font_dpi, Some(120));
    }

    #[test]
    fn boutique_and_paths() {
        let args = Args::try_parse_from([
            "welcome-gtk",
            "-v",
            "--software-only",
            "--simulate-changes",
            "--jump-to",
            "rpi",
            "--data-dir",
            "/tmp/welcome-data",
        ])
        .expect("valid flags");
        assert!(args.software_only);
        assert!(args.simulate_changes);
        assert_eq!(args.jump_to.as_deref(), Some("rpi"));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/welcome-data")));
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn conflicting_and_unknown_values_fail() {
        assert!(Args::try_parse_from(["welcome-gtk", "--force-net", "--force-no-net"]).is_err());
        assert!(Args::try_parse_from(["welcome-gtk", "--force-arch", "sparc"]).is_err());
    }
}
