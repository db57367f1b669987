pub(crate) mod app;

pub(crate) use app::{AppWidgets, Navigation, build_ui, classify_navigation};
