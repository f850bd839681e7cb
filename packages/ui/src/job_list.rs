//! Job list component for the workspace's jobs.

use dioxus::prelude::*;
use kiln_core::Job;

use crate::JobRow;

/// Props for JobList component.
#[derive(Props, Clone, PartialEq)]
pub struct JobListProps {
    /// Jobs to display, in server response order.
    pub jobs: Vec<Job>,
    /// Callback when a job's poll action is activated.
    pub on_poll: EventHandler<Job>,
    /// Whether the initial fetch is still outstanding.
    #[props(default = false)]
    pub loading: bool,
}

/// List component for displaying jobs.
#[component]
pub fn JobList(props: JobListProps) -> Element {
    rsx! {
        div { class: "job-list",
            if props.loading {
                p { class: "loading", "Loading..." }
            } else {
                for job in props.jobs.iter() {
                    JobRow {
                        key: "{job.name}",
                        job: job.clone(),
                        on_poll: props.on_poll,
                    }
                }
            }
        }
    }
}
