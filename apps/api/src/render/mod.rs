//! Server-rendered HTML for the search form, progress and results pages.
//!
//! Pages are askama templates under `templates/`; every interpolated value
//! goes through askama's HTML escaper.

pub mod form;
pub mod results;

/// One `<option>` of a select box.
#[derive(Debug, Clone, Copy)]
pub struct Choice {
    pub label: &'static str,
    pub selected: bool,
}
