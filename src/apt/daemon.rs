use std::fmt;

use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::OwnedObjectPath;

const APT_SERVICE: &str = "org.debian.apt";
const APT_PATH: &str = "/org/debian/apt";
const APT_INTERFACE: &str = "org.debian.apt";
const APT_TRANSACTION_INTERFACE: &str = "org.debian.apt.transaction";

/// One daemon transaction. Each is started, run and awaited to its `Finished` signal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum DaemonStep {
    UpdateCache { source_file: Option<String> },
    Install(Vec<String>),
    Remove(Vec<String>),
    Upgrade,
    FixBroken,
    FixIncomplete,
}

impl DaemonStep {
    fn method(&self) -> &'static str {
        match self {
            DaemonStep::UpdateCache { source_file: None } => "UpdateCache",
            DaemonStep::UpdateCache { source_file: Some(_) } => "UpdateCachePartially",
            DaemonStep::Install(_) => "InstallPackages",
            DaemonStep::Remove(_) => "RemovePackages",
            DaemonStep::Upgrade => "UpgradeSystem",
            DaemonStep::FixBroken => "FixBrokenDepends",
            DaemonStep::FixIncomplete => "FixIncompleteInstall",
        }
    }
}

/// Exit status carried by the transaction's `Finished` signal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ExitState {
    Success,
    Cancelled,
    Failed,
    PreviousFailed,
    Unfinished,
    Other(String),
}

impl ExitState {
    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "exit-success" => ExitState::Success,
            "exit-cancelled" => ExitState::Cancelled,
            "exit-failed" => ExitState::Failed,
            "exit-previous-failed" => ExitState::PreviousFailed,
            "exit-unfinished" => ExitState::Unfinished,
            other => ExitState::Other(other.to_string()),
        }
    }

    pub(crate) fn is_success(&self) -> bool {
        matches!(self, ExitState::Success)
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::Success => f.write_str("exit-success"),
            ExitState::Cancelled => f.write_str("exit-cancelled"),
            ExitState::Failed => f.write_str("exit-failed"),
            ExitState::PreviousFailed => f.write_str("exit-previous-failed"),
            ExitState::Unfinished => f.write_str("exit-unfinished"),
            ExitState::Other(value) => f.write_str(value),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum DaemonError {
    /// The user dismissed or failed the polkit prompt.
    NotAuthorized,
    Bus(String),
    Method { name: String, detail: String },
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::NotAuthorized => f.write_str("authorization was not granted"),
            DaemonError::Bus(message) => write!(f, "D-Bus error: {}", message),
            DaemonError::Method { name, detail } if detail.is_empty() => f.write_str(name),
            DaemonError::Method { name, detail } => write!(f, "{}: {}", name, detail),
        }
    }
}

impl std::error::Error for DaemonError {}

/// The privileged package daemon, one blocking step at a time.
pub(crate) trait PackageDaemon: Send + Sync {
    fn run_step(&self, step: &DaemonStep) -> Result<ExitState, DaemonError>;
}

pub(crate) fn is_authorization_error(name: &str) -> bool {
    name.ends_with("NotAuthorized") || name.ends_with("AuthorizationFailed")
}

fn classify(err: zbus::Error) -> DaemonError {
    match err {
        zbus::Error::MethodError(name, detail, _) => {
            let name = name.as_str().to_string();
            if is_authorization_error(&name) {
                DaemonError::NotAuthorized
            } else {
                DaemonError::Method {
                    name,
                    detail: detail.unwrap_or_default(),
                }
            }
        }
        other => DaemonError::Bus(other.to_string()),
    }
}

/// aptdaemon on the system bus.
#[derive(Debug, Default)]
pub(crate) struct AptDaemon;

impl AptDaemon {
    fn create_transaction(
        &self,
        connection: &Connection,
        step: &DaemonStep,
    ) -> Result<OwnedObjectPath, DaemonError> {
        let method = step.method();
        let reply = match step {
            DaemonStep::UpdateCache {
                source_file: Some(file),
            } => connection.call_method(
                Some(APT_SERVICE),
                APT_PATH,
                Some(APT_INTERFACE),
                method,
                &(file.as_str(),),
            ),
            DaemonStep::Install(packages) | DaemonStep::Remove(packages) => connection
                .call_method(
                    Some(APT_SERVICE),
                    APT_PATH,
                    Some(APT_INTERFACE),
                    method,
                    &(packages,),
                ),
            DaemonStep::Upgrade => connection.call_method(
                Some(APT_SERVICE),
                APT_PATH,
                Some(APT_INTERFACE),
                method,
                // safe mode: never remove packages to satisfy an upgrade
                &(true,),
            ),
            DaemonStep::UpdateCache { source_file: None }
            | DaemonStep::FixBroken
            | DaemonStep::FixIncomplete => connection.call_method(
                Some(APT_SERVICE),
                APT_PATH,
                Some(APT_INTERFACE),
                method,
                &(),
            ),
        }
        .map_err(classify)?;

        let body = reply.body();
        body.deserialize::<OwnedObjectPath>().map_err(|err| {
            DaemonError::Bus(format!("{} returned no transaction path: {}", method, err))
        })
    }
}

impl PackageDaemon for AptDaemon {
    fn run_step(&self, step: &DaemonStep) -> Result<ExitState, DaemonError> {
        let connection = Connection::system()
            .map_err(|err| DaemonError::Bus(format!("Failed to connect to system bus: {}", err)))?;

        let path = self.create_transaction(&connection, step)?;
        log::debug!("aptdaemon transaction {} for {}", path.as_str(), step.method());

        let proxy = Proxy::new(
            &connection,
            APT_SERVICE,
            path.as_str(),
            APT_TRANSACTION_INTERFACE,
        )
        .map_err(classify)?;

        // Subscribe before Run so a fast transaction cannot finish unseen.
        let mut finished = proxy.receive_signal("Finished").map_err(classify)?;
        proxy.call_method("Run", &()).map_err(classify)?;

        let Some(message) = finished.next() else {
            return Err(DaemonError::Bus(
                "transaction signal stream closed before it finished".to_string(),
            ));
        };
        let body = message.body();
        let exit = body
            .deserialize::<String>()
            .map_err(|err| DaemonError::Bus(format!("malformed Finished signal: {}", err)))?;

        Ok(ExitState::parse(&exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_states_parse_and_display() {
        for raw in [
            "exit-success",
            "exit-cancelled",
            "exit-failed",
            "exit-previous-failed",
            "exit-unfinished",
        ] {
            assert_eq!(ExitState::parse(raw).to_string(), raw);
        }
        assert_eq!(
            ExitState::parse("exit-weird"),
            ExitState::Other("exit-weird".to_string())
        );
        assert!(ExitState::parse("exit-success").is_success());
        assert!(!ExitState::parse("exit-cancelled").is_success());
    }

    #[test]
    fn authorization_errors_are_recognized() {
        assert!(is_authorization_error(
            "org.freedesktop.PolicyKit.Error.NotAuthorized"
        ));
        assert!(is_authorization_error("org.debian.apt.AuthorizationFailed"));
        assert!(!is_authorization_error("org.debian.apt.TransactionFailed"));
    }

    #[test]
    fn partial_cache_update_uses_its_own_method() {
        let partial = DaemonStep::UpdateCache {
            source_file: Some("example.list".to_string()),
        };
        let full = DaemonStep::UpdateCache { source_file: None };
        assert_eq!(partial.method(), "UpdateCachePartially");
        assert_eq!(full.method(), "UpdateCache");
    }
}
