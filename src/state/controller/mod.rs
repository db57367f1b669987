pub(crate) mod app;
pub(crate) mod apps;
pub(crate) mod operations;
pub(crate) mod system;

pub(crate) use app::{AppController, Startup};

/// Catalog entry whose install adds the welcome update PPA.
pub(crate) const WELCOME_PROGRAM_ID: &str = "ubuntu-mate-welcome";
