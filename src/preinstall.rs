//! Repository preparation before a catalog transaction: resolves the
//! entry's recipe, runs the privileged repository helper and builds the
//! daemon request.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::apt::{
    PackageDaemon, TransactionAction, TransactionOutcome, TransactionRequest, TransactionState,
    run_repository_helper, run_transaction,
};
use crate::catalog::{
    AppEntry, Catalog, Category, Method, Placeholders, RecipeError, strip_placeholders,
};
use crate::types::{AppAction, CommandResult};

pub(crate) const DEFAULT_HELPER_PATH: &str = "/usr/lib/welcome/welcome-repository-installer";

/// Functions understood by the repository helper.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum HelperFunction {
    EnablePartnerRepository,
    EnablePpa,
    AddAptKeyFromUrl,
    AddAptKeyFromKeyserver,
    AddAptSources,
    DelAptSources,
}

impl HelperFunction {
    pub(crate) fn name(self) -> &'static str {
        match self {
            HelperFunction::EnablePartnerRepository => "enable_partner_repository",
            HelperFunction::EnablePpa => "enable_ppa",
            HelperFunction::AddAptKeyFromUrl => "add_apt_key_from_url",
            HelperFunction::AddAptKeyFromKeyserver => "add_apt_key_from_keyserver",
            HelperFunction::AddAptSources => "add_apt_sources",
            HelperFunction::DelAptSources => "del_apt_sources",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct HelperStep {
    pub(crate) function: HelperFunction,
    /// What the step touches, for the log.
    pub(crate) detail: String,
}

#[derive(Clone, Debug)]
pub(crate) struct InstallPlan {
    pub(crate) program_id: String,
    pub(crate) name: String,
    pub(crate) category: Category,
    pub(crate) target: String,
    pub(crate) action: AppAction,
    pub(crate) helper_steps: Vec<HelperStep>,
    pub(crate) request: TransactionRequest,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ConfigureError {
    UnknownProgram(String),
    NoPackages {
        program_id: String,
        action: AppAction,
    },
    Recipe(RecipeError),
}

impl fmt::Display for ConfigureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigureError::UnknownProgram(id) => write!(f, "'{}' is not in the catalog", id),
            ConfigureError::NoPackages { program_id, action } => write!(
                f,
                "{} lists no packages to {}",
                program_id,
                action.key()
            ),
            ConfigureError::Recipe(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ConfigureError {}

impl From<RecipeError> for ConfigureError {
    fn from(err: RecipeError) -> Self {
        ConfigureError::Recipe(err)
    }
}

impl From<AppAction> for TransactionAction {
    fn from(action: AppAction) -> Self {
        match action {
            AppAction::Install => TransactionAction::Install,
            AppAction::Remove => TransactionAction::Remove,
            AppAction::Upgrade => TransactionAction::Upgrade,
        }
    }
}

/// Runs helper functions with root privileges.
pub(crate) trait RepositoryHelper: Send + Sync {
    fn run(&self, function: HelperFunction, plan: &InstallPlan) -> Result<CommandResult, String>;
}

/// The helper binary launched through pkexec.
#[derive(Clone, Debug)]
pub(crate) struct PkexecHelper {
    pub(crate) helper: PathBuf,
    pub(crate) catalog: PathBuf,
}

impl RepositoryHelper for PkexecHelper {
    fn run(&self, function: HelperFunction, plan: &InstallPlan) -> Result<CommandResult, String> {
        run_repository_helper(
            &self.helper,
            &self.catalog,
            function.name(),
            plan.category.key(),
            &plan.program_id,
            &plan.target,
        )
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PreInstaller {
    placeholders: Placeholders,
    simulate: bool,
}

impl PreInstaller {
    pub(crate) fn new(placeholders: Placeholders, simulate: bool) -> Self {
        Self {
            placeholders,
            simulate,
        }
    }

    pub(crate) fn simulating(&self) -> bool {
        self.simulate
    }

    /// Resolves the recipe for `program_id` and plans every step of `action`.
    pub(crate) fn configure(
        &self,
        catalog: &Catalog,
        program_id: &str,
        action: AppAction,
    ) -> Result<InstallPlan, ConfigureError> {
        let entry = catalog
            .get(program_id)
            .ok_or_else(|| ConfigureError::UnknownProgram(program_id.to_string()))?;
        let resolved = entry.resolve_recipe(&self.placeholders.codename)?;

        let packages = packages_for(entry, action).to_vec();
        if packages.is_empty() {
            return Err(ConfigureError::NoPackages {
                program_id: program_id.to_string(),
                action,
            });
        }

        let recipe = resolved.recipe;
        let mut helper_steps = Vec::new();
        let mut refresh_cache = false;
        let mut narrowed: Option<String> = None;
        let mut full_refresh = false;
        let source_list = recipe
            .source_file
            .as_deref()
            .map(|file| format!("{}.list", self.placeholders.apply(file)));

        match action {
            AppAction::Install | AppAction::Upgrade => {
                for method in &recipe.methods {
                    match method {
                        Method::Skip => {}
                        Method::PartnerRepo => {
                            helper_steps.push(HelperStep {
                                function: HelperFunction::EnablePartnerRepository,
                                detail: "partner repository".to_string(),
                            });
                            refresh_cache = true;
                            full_refresh = true;
                        }
                        Method::Ppa { ppa } => {
                            helper_steps.push(HelperStep {
                                function: HelperFunction::EnablePpa,
                                detail: ppa.clone(),
                            });
                            refresh_cache = true;
                            match &source_list {
                                Some(list) => narrowed = Some(list.clone()),
                                None => full_refresh = true,
                            }
                        }
                        Method::Manual {
                            key_url,
                            key_server,
                            sources,
                        } => {
                            if let Some(url) = key_url {
                                helper_steps.push(HelperStep {
                                    function: HelperFunction::AddAptKeyFromUrl,
                                    detail: self.placeholders.apply(url),
                                });
                            }
                            if let Some(server) = key_server {
                                helper_steps.push(HelperStep {
                                    function: HelperFunction::AddAptKeyFromKeyserver,
                                    detail: format!("{} from {}", server.key, server.server),
                                });
                            }
                            if !sources.is_empty() {
                                let lines: Vec<String> = sources
                                    .iter()
                                    .map(|line| self.placeholders.apply(line))
                                    .collect();
                                helper_steps.push(HelperStep {
                                    function: HelperFunction::AddAptSources,
                                    detail: lines.join("; "),
                                });
                                refresh_cache = true;
                                narrowed = source_list.clone();
                            }
                        }
                    }
                }
            }
            AppAction::Remove => {
                let has_manual = recipe
                    .methods
                    .iter()
                    .any(|method| matches!(method, Method::Manual { .. }));
                if let (true, Some(file)) = (has_manual, recipe.source_file.as_deref()) {
                    helper_steps.push(HelperStep {
                        function: HelperFunction::DelAptSources,
                        detail: strip_placeholders(file),
                    });
                }
            }
        }

        let mut request = TransactionRequest::new(action.into(), packages);
        request.refresh_cache = refresh_cache;
        request.source_to_update = if full_refresh { None } else { narrowed };

        Ok(InstallPlan {
            program_id: entry.id.clone(),
            name: entry.name.clone(),
            category: entry.category,
            target: resolved.target.to_string(),
            action,
            helper_steps,
            request,
        })
    }

    /// Runs the plan's helper steps then its transaction. Returns `None` when simulating.
    pub(crate) fn execute(
        &self,
        plan: &InstallPlan,
        helper: &dyn RepositoryHelper,
        daemon: &dyn PackageDaemon,
        on_state: impl FnMut(TransactionState),
    ) -> Option<TransactionOutcome> {
        if self.simulate {
            for step in &plan.helper_steps {
                log::info!(
                    "[simulate] {} for {}: {}",
                    step.function.name(),
                    plan.program_id,
                    step.detail
                );
            }
            log::info!(
                "[simulate] would {} {} (refresh cache: {}, source: {})",
                plan.action.key(),
                plan.request.package_list(),
                plan.request.refresh_cache,
                plan.request.source_to_update.as_deref().unwrap_or("all")
            );
            return None;
        }

        for step in &plan.helper_steps {
            log::info!(
                "{} for {}: {}",
                step.function.name(),
                plan.program_id,
                step.detail
            );
            match HelperStatus::of(helper.run(step.function, plan)) {
                HelperStatus::Done => {}
                HelperStatus::Dismissed => log::info!(
                    "{} for {} cancelled at the authentication prompt",
                    step.function.name(),
                    plan.program_id
                ),
                HelperStatus::Failed(message) => log::warn!(
                    "{} failed for {}: {}",
                    step.function.name(),
                    plan.program_id,
                    message
                ),
            }
        }

        Some(run_transaction(daemon, &plan.request, on_state))
    }
}

/// How a single helper step ended.
#[derive(Debug, Eq, PartialEq)]
enum HelperStatus {
    Done,
    Dismissed,
    Failed(String),
}

impl HelperStatus {
    fn of(result: Result<CommandResult, String>) -> Self {
        match result {
            Ok(result) if result.success() => HelperStatus::Done,
            Ok(result) if result.auth_dismissed() => HelperStatus::Dismissed,
            Ok(result) => HelperStatus::Failed(result.failure_message()),
            Err(err) => HelperStatus::Failed(err),
        }
    }
}

fn packages_for(entry: &AppEntry, action: AppAction) -> &[String] {
    match action {
        AppAction::Install => &entry.packages.install,
        AppAction::Remove => &entry.packages.remove,
        AppAction::Upgrade => &entry.packages.upgrade,
    }
}

/// Path of the helper binary, honoring an explicit override.
pub(crate) fn helper_path(custom: Option<&Path>) -> PathBuf {
    custom
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HELPER_PATH))
}
