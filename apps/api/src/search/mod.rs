// Job search: form normalization, resume staging, background dispatch to the
// search backend, and the HTTP handlers that drive it.

pub mod backend;
pub mod criteria;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod resume;

#[cfg(test)]
pub mod testing;
