//! Application-level orchestration.
//!
//! This module owns submission dispatch and results-page navigation. UI/CLI
//! layers send commands here and render the events that come back.

mod controller;
mod navigation;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use navigation::{load_page, PageSource};
