//! This crate contains all shared UI for the workspace.

// Dioxus `rsx!` macro expands to unwraps internally; allow to avoid false positives.
#![allow(clippy::disallowed_methods)]

mod error_page;
pub use error_page::ErrorPage;

mod job_list;
pub use job_list::JobList;

mod job_row;
pub use job_row::JobRow;

mod jobs_page;
pub use jobs_page::JobsPage;
