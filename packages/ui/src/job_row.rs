//! Job row component for displaying a single job in the list.

use dioxus::prelude::*;
use kiln_core::Job;

/// Props for JobRow component.
#[derive(Props, Clone, PartialEq)]
pub struct JobRowProps {
    /// The job to display.
    pub job: Job,
    /// Callback when the poll action is activated.
    pub on_poll: EventHandler<Job>,
}

/// One job: its name and a "Poll now" action.
///
/// The action carries no in-flight state; repeated activation issues one
/// request per activation.
#[component]
pub fn JobRow(props: JobRowProps) -> Element {
    let job_for_poll = props.job.clone();

    rsx! {
        div { class: "job-row",
            div { class: "job-name", "{props.job.name}" }
            div { class: "job-actions",
                a {
                    class: "poll-link",
                    href: "#",
                    onclick: move |e| {
                        e.prevent_default();
                        props.on_poll.call(job_for_poll.clone());
                    },
                    "Poll now"
                }
            }
        }
    }
}
