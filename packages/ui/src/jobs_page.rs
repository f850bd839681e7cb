//! Jobs page: fetches the workspace's jobs once and renders them.

use dioxus::prelude::*;
use kiln_core::Job;

use crate::JobList;

/// The job list view.
///
/// Exactly one fetch, on mount. `loading` clears when the request settles
/// either way; a failed fetch leaves the list empty. Unmounting drops the
/// in-flight future, so a late response never touches dead state.
#[component]
pub fn JobsPage() -> Element {
    let mut jobs = use_signal(Vec::<Job>::new);
    let mut loading = use_signal(|| true);

    let _jobs_resource = use_resource(move || async move {
        match api::list_jobs().await {
            Ok(list) => jobs.set(list),
            Err(e) => tracing::warn!("failed to load jobs: {}", e),
        }
        loading.set(false);
    });

    // Polls are fire-and-forget: the ack is logged, never rendered.
    let on_poll = move |job: Job| {
        spawn(async move {
            match api::poll_job(job.name.clone()).await {
                Ok(ack) => tracing::info!(job = %job.name, "poll response: {}", ack),
                Err(e) => tracing::debug!(job = %job.name, "poll failed: {}", e),
            }
        });
    };

    rsx! {
        div { class: "jobs",
            JobList {
                jobs: jobs(),
                loading: loading(),
                on_poll,
            }
        }
    }
}
