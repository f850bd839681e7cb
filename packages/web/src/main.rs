// Dioxus `rsx!` macro expands to unwraps internally; allow to avoid false positives.
#![allow(clippy::disallowed_methods)]

use dioxus::prelude::*;

use ui::{ErrorPage, JobsPage};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Shell)]
        #[route("/")]
        Home {},
        #[route("/:..segments")]
        NotFound { segments: Vec<String> },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(feature = "server")]
    {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        // Global app resources
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        Router::<Route> {}
    }
}

/// Static shell around both routes.
#[component]
fn Shell() -> Element {
    rsx! {
        div { class: "root",
            header { class: "masthead",
                Link { to: Route::Home {}, class: "masthead-title", "Kiln" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

/// Default route: the job list.
#[component]
fn Home() -> Element {
    rsx! {
        JobsPage {}
    }
}

/// Catch-all route: a 404 carrying the requested path.
#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let url = format!("/{}", segments.join("/"));
    rsx! {
        ErrorPage { kind: "404".to_string(), url }
    }
}
